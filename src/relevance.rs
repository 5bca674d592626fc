//! Relevance scoring and the region filter.

/// Spellings that mark a text as being about the target region.
pub const DEFAULT_REGION_TERMS: [&str; 2] = ["paraíba", "paraiba"];

/// Number of configured keywords that occur in `text`.
///
/// Each keyword counts at most once, however often it appears.
pub fn relevance_score(text: &str, keywords: &[String]) -> u32 {
    let lowered = text.to_lowercase();
    let hits = keywords
        .iter()
        .filter(|k| lowered.contains(&k.to_lowercase()))
        .count();
    u32::try_from(hits).unwrap_or(u32::MAX)
}

/// True if `text` mentions any of the region terms, case-insensitively.
pub fn mentions_region<S: AsRef<str>>(text: &str, region_terms: &[S]) -> bool {
    let lowered = text.to_lowercase();
    region_terms
        .iter()
        .any(|term| lowered.contains(&term.as_ref().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_relevance_counts_distinct_keywords() {
        let kw = keywords(&["homicídio", "tráfico"]);
        assert_eq!(
            relevance_score("Homicídio registrado; suspeita de tráfico", &kw),
            2
        );
    }

    #[test]
    fn test_relevance_is_membership_not_occurrences() {
        let kw = keywords(&["roubo", "assalto"]);
        assert_eq!(relevance_score("roubo, roubo e mais roubo", &kw), 1);
        assert_eq!(relevance_score("nada aqui", &kw), 0);
    }

    #[test]
    fn test_relevance_lowercases_keywords() {
        let kw = keywords(&["Violência"]);
        assert_eq!(relevance_score("onda de violência", &kw), 1);
    }

    #[test]
    fn test_region_filter_accepts_both_spellings() {
        assert!(mentions_region("Crime na PARAÍBA", &DEFAULT_REGION_TERMS));
        assert!(mentions_region("governo da paraiba", &DEFAULT_REGION_TERMS));
        assert!(!mentions_region("Crime em Pernambuco", &DEFAULT_REGION_TERMS));
    }
}
