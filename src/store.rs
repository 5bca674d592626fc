//! Deduplicated, append-only CSV store.
//!
//! The store is read once at the start of a run, extended in memory through a
//! [`MergeBatch`] and written back in a single step by [`commit`]. Existing
//! rows are never rewritten or dropped; a row is only added when its identity
//! key (`title_published`) has not been seen before. Rows that cannot be
//! decoded are left out of the batch, after the file has been copied aside.
//!
//! # File Format
//!
//! UTF-8 CSV with a leading byte-order mark and a header row holding
//! [`STORE_COLUMNS`]. The file is replaced atomically: rows are written to a
//! sibling `*.tmp` file which is then renamed over the store.

use crate::models::{EnrichedRecord, STORE_COLUMNS};
use crate::utils::ensure_writable_parent;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("store header lacks columns: {0}")]
    MissingColumns(String),
    #[error("cannot write store file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Rows accumulated across runs plus the keys seen during this run.
///
/// Owned by the pipeline for the duration of one run and handed to
/// [`commit`] at the end.
#[derive(Debug, Default)]
pub struct MergeBatch {
    existing: Vec<EnrichedRecord>,
    pending: Vec<EnrichedRecord>,
    seen: HashSet<String>,
}

impl MergeBatch {
    /// Start a batch on top of previously persisted rows.
    pub fn new(existing: Vec<EnrichedRecord>) -> Self {
        let seen = existing.iter().map(EnrichedRecord::identity_key).collect();
        Self {
            existing,
            pending: Vec::new(),
            seen,
        }
    }

    /// True if no persisted or accepted row carries `key`.
    pub fn is_new(&self, key: &str) -> bool {
        !self.seen.contains(key)
    }

    /// Queue `row` for the next commit. A row whose key was already seen is
    /// rejected and `false` is returned.
    pub fn accept(&mut self, row: EnrichedRecord) -> bool {
        if !self.seen.insert(row.identity_key()) {
            return false;
        }
        self.pending.push(row);
        true
    }

    pub fn existing(&self) -> &[EnrichedRecord] {
        &self.existing
    }

    pub fn pending(&self) -> &[EnrichedRecord] {
        &self.pending
    }

    /// Existing rows followed by pending rows.
    pub fn into_rows(self) -> Vec<EnrichedRecord> {
        let mut rows = self.existing;
        rows.extend(self.pending);
        rows
    }
}

/// Result of [`commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The store was rewritten with `added` new rows, `total` rows in all.
    Written { total: usize, added: usize },
    /// Nothing new was accepted; the file was left untouched.
    NothingNew { total: usize },
}

/// Read the persisted rows at `path`.
///
/// A missing or unreadable file is treated as an empty store. Records that
/// fail to decode are skipped and the rest are kept; whenever anything is
/// dropped the original file is first copied to a `*.corrupt` sibling so the
/// next commit cannot lose it.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load(path: &Path) -> MergeBatch {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Store file does not exist yet; starting empty");
            return MergeBatch::default();
        }
        Err(e) => {
            warn!(error = %e, "Store file unreadable; starting empty");
            preserve_original(path).await;
            return MergeBatch::default();
        }
    };

    match decode_rows(&bytes) {
        Ok(decoded) if decoded.rejected_lines.is_empty() => {
            info!(rows = decoded.rows.len(), "Loaded existing store");
            MergeBatch::new(decoded.rows)
        }
        Ok(decoded) => {
            warn!(
                rows = decoded.rows.len(),
                rejected = decoded.rejected_lines.len(),
                lines = ?decoded.rejected_lines,
                "Store has undecodable rows; keeping the rest"
            );
            preserve_original(path).await;
            MergeBatch::new(decoded.rows)
        }
        Err(e) => {
            warn!(error = %e, "Store file is corrupt; starting empty");
            preserve_original(path).await;
            MergeBatch::default()
        }
    }
}

/// Copy the store to `<path>.<timestamp>.corrupt`.
async fn preserve_original(path: &Path) {
    let mut backup = path.as_os_str().to_owned();
    backup.push(format!(
        ".{}.corrupt",
        chrono::Utc::now().format("%Y%m%dT%H%M%S%.6fZ")
    ));
    let backup = PathBuf::from(backup);
    match fs::copy(path, &backup).await {
        Ok(_) => warn!(backup = %backup.display(), "Original store preserved"),
        Err(e) => warn!(error = %e, "Could not preserve the original store"),
    }
}

/// Rows recovered from a store file.
#[derive(Debug, Default, PartialEq)]
pub struct DecodedRows {
    pub rows: Vec<EnrichedRecord>,
    /// Line numbers of records that could not be decoded.
    pub rejected_lines: Vec<u64>,
}

/// Decode CSV bytes (optional BOM) record by record.
///
/// # Errors
///
/// Fails as a whole only when the header cannot be read or lacks one of
/// [`STORE_COLUMNS`]; bad records are reported in
/// [`DecodedRows::rejected_lines`].
pub fn decode_rows(bytes: &[u8]) -> Result<DecodedRows, StoreError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DecodedRows::default());
    }

    let mut reader = csv::Reader::from_reader(body);
    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = STORE_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h.trim() == *column))
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::MissingColumns(missing.join(", ")));
    }

    let mut decoded = DecodedRows::default();
    for result in reader.deserialize::<EnrichedRecord>() {
        match result {
            Ok(row) => decoded.rows.push(row),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                warn!(line, error = %e, "Skipping undecodable store row");
                decoded.rejected_lines.push(line);
            }
        }
    }
    Ok(decoded)
}

/// Encode records as CSV with a BOM. The header row is written ahead of the
/// first record.
pub fn encode_rows(rows: &[EnrichedRecord]) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| StoreError::Csv(e.into_error().into()))
}

/// Fail early if a store file cannot be written at `path`.
///
/// # Errors
///
/// [`StoreError::Write`] carrying the I/O error as reported by the system.
pub async fn check_writable(path: &Path) -> Result<(), StoreError> {
    ensure_writable_parent(path)
        .await
        .map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Persist `batch` to `path` if it holds at least one new row.
///
/// # Errors
///
/// Returns [`StoreError`] if the rows cannot be encoded or the file cannot
/// be written; the previous file is left intact in that case.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn commit(path: &Path, batch: MergeBatch) -> Result<CommitOutcome, StoreError> {
    let added = batch.pending().len();
    if added == 0 {
        let total = batch.existing().len();
        debug!(total, "No new rows; store left untouched");
        return Ok(CommitOutcome::NothingNew { total });
    }

    let rows = batch.into_rows();
    let bytes = encode_rows(&rows)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let write_err = |source: io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, &bytes).await.map_err(write_err)?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(write_err(e));
    }

    info!(total = rows.len(), added, bytes = bytes.len(), "Store written");
    Ok(CommitOutcome::Written {
        total: rows.len(),
        added,
    })
}
