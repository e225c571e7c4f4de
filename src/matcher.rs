/// Case-insensitive substring matcher over a fixed keyword list.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    /// (as configured, lowercased)
    keywords: Vec<(String, String)>,
}

impl KeywordMatcher {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| (k.clone(), k.to_lowercase()))
                .collect(),
        }
    }

    /// Keywords contained in `text`, as configured and in configuration order.
    ///
    /// No tokenization or word boundaries: "bike" matches "motorbike". An empty
    /// keyword is contained in every string and therefore matches every message.
    pub fn matches(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|(_, lower)| text.contains(lower.as_str()))
            .map(|(configured, _)| configured.clone())
            .collect()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|(configured, _)| configured.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(keywords: &[&str]) -> KeywordMatcher {
        let owned: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
        KeywordMatcher::new(&owned)
    }

    #[test]
    fn test_case_insensitive_match() {
        let m = matcher(&["laptop", "bike"]);
        assert_eq!(
            m.matches("Selling a used Laptop, great condition"),
            vec!["laptop"]
        );
    }

    #[test]
    fn test_uppercase_keyword_keeps_configured_form() {
        let m = matcher(&["iPhone"]);
        assert_eq!(m.matches("selling IPHONE 12"), vec!["iPhone"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let m = matcher(&["laptop", "bike"]);
        assert!(m.matches("Free sofa, pickup only").is_empty());
    }

    #[test]
    fn test_substring_without_word_boundaries() {
        let m = matcher(&["bike"]);
        assert_eq!(m.matches("Motorbike for sale"), vec!["bike"]);
    }

    #[test]
    fn test_multiple_matches_in_config_order() {
        let m = matcher(&["bike", "helmet", "laptop"]);
        assert_eq!(
            m.matches("Laptop and helmet, no bike"),
            vec!["bike", "helmet", "laptop"]
        );
    }

    #[test]
    fn test_empty_keyword_matches_everything() {
        let m = matcher(&["", "bike"]);
        assert_eq!(m.matches("Selling a sofa"), vec![""]);
        assert_eq!(m.matches("Selling a bike"), vec!["", "bike"]);
    }

    #[test]
    fn test_leading_space_is_part_of_keyword() {
        let m = matcher(&["laptop", " bike"]);
        assert!(m.matches("bike").is_empty());
        assert_eq!(m.matches("a bike"), vec![" bike"]);
    }

    #[test]
    fn test_matches_equal_filter_definition() {
        let keywords = ["Sofa", "desk", "LAMP", "chair"];
        let texts = ["Desk lamp", "sofa bed", "nothing here", "CHAIR and DESK"];
        let m = matcher(&keywords);
        for text in texts {
            let expected: Vec<String> = keywords
                .iter()
                .filter(|k| text.to_lowercase().contains(&k.to_lowercase()))
                .map(|k| k.to_string())
                .collect();
            assert_eq!(m.matches(text), expected, "text: {}", text);
        }
    }
}
