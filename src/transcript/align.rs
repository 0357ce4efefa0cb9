use crate::models::Utterance;

/// How many normalized characters of the quote tier 2 keeps
const TRUNCATED_QUOTE_LEN: usize = 40;
/// Minimum truncated length for tier 2 to be worth attempting
const MIN_TRUNCATED_LEN: usize = 15;
/// Words this short are treated as filler and excluded from overlap scoring
const MIN_SIGNIFICANT_WORD_LEN: usize = 3;

/// Locate the utterance that best matches a quote fragment
///
/// Upstream extraction may paraphrase or truncate quotes, so resolution
/// cascades through three tiers of decreasing precision:
///
/// 1. Exact normalized substring (first match wins, index ascending)
/// 2. The same scan with the quote truncated to its first 40 characters,
///    attempted only when the truncation is at least 15 characters
/// 3. Word-overlap scoring over significant words (longer than 3 chars),
///    keeping the first utterance to reach the strictly highest count
///
/// Never fails: with no tier-3 score above zero the first utterance is the
/// best guess. Returns `None` only when `utterances` is empty, which the
/// caller must handle before treating the result as an index.
pub fn resolve_quote(utterances: &[Utterance], quote_text: &str) -> Option<usize> {
    if utterances.is_empty() {
        return None;
    }

    let quote = normalize(quote_text);
    let normalized: Vec<String> = utterances.iter().map(|u| normalize(&u.text)).collect();

    // Tier 1: exact normalized substring
    if let Some(index) = normalized.iter().position(|text| text.contains(&quote)) {
        return Some(index);
    }

    // Tier 2: truncated substring, tolerates extraction steps that cut
    // long quotes short
    let truncated: String = quote.chars().take(TRUNCATED_QUOTE_LEN).collect();
    if truncated.chars().count() >= MIN_TRUNCATED_LEN {
        if let Some(index) = normalized.iter().position(|text| text.contains(&truncated)) {
            return Some(index);
        }
    }

    // Tier 3: word-overlap scoring; strict `>` means the first utterance to
    // reach the best score keeps it
    let quote_words: std::collections::HashSet<&str> = quote
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_SIGNIFICANT_WORD_LEN)
        .collect();

    let mut best_index = 0;
    let mut best_score = 0;
    for (index, text) in normalized.iter().enumerate() {
        let score = text
            .split_whitespace()
            .filter(|w| quote_words.contains(w))
            .count();
        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }

    Some(best_index)
}

/// Normalize text for matching: lowercase, drop quotation-mark variants,
/// collapse whitespace runs to single spaces
fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}' | '\u{2018}' | '\u{2019}'))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(index: usize, speaker: &str, text: &str) -> Utterance {
        Utterance {
            index,
            speaker: speaker.to_string(),
            text: text.to_string(),
            raw_text: text.to_string(),
        }
    }

    #[test]
    fn test_normalize_strips_quote_marks() {
        assert_eq!(normalize("She said \u{201c}It's  Broken\u{201d}"), "she said its broken");
        assert_eq!(normalize("\"quoted\"  'words'"), "quoted words");
    }

    #[test]
    fn test_tier1_substring_match() {
        let utterances = vec![utterance(
            0,
            "Amy",
            "I think the checkout flow is broken on mobile Safari",
        )];
        assert_eq!(resolve_quote(&utterances, "checkout flow is broken"), Some(0));
    }

    #[test]
    fn test_tier1_case_and_quote_drift() {
        let utterances = vec![
            utterance(0, "Ben", "let me share my screen"),
            utterance(1, "Amy", "the \u{201c}checkout flow\u{201d} is broken on mobile"),
        ];
        assert_eq!(resolve_quote(&utterances, "The 'CHECKOUT FLOW' is broken"), Some(1));
    }

    #[test]
    fn test_shouted_punctuated_quote_still_resolves() {
        let utterances = vec![utterance(
            0,
            "Amy",
            "I think the checkout flow is broken on mobile Safari",
        )];
        assert_eq!(
            resolve_quote(&utterances, "CHECKOUT FLOW IS BROKEN!!"),
            Some(0)
        );
    }

    #[test]
    fn test_tier1_first_match_wins() {
        let utterances = vec![
            utterance(0, "Amy", "the search bar is slow"),
            utterance(1, "Ben", "yes the search bar is slow for me too"),
        ];
        assert_eq!(resolve_quote(&utterances, "search bar is slow"), Some(0));
    }

    #[test]
    fn test_tier2_truncated_quote() {
        let utterances = vec![
            utterance(0, "Ben", "unrelated chatter about lunch plans"),
            utterance(
                1,
                "Amy",
                "we should really rewrite the payment retry logic before launch",
            ),
        ];
        // First 40 chars match verbatim, the tail was embellished upstream
        let quote = "we should really rewrite the payment retry logic before launch next quarter at the latest";
        assert_eq!(resolve_quote(&utterances, quote), Some(1));
    }

    #[test]
    fn test_tier2_skipped_for_short_quotes() {
        // Truncation of a short quote stays under 15 chars, so tier 2 never
        // fires and tier 3 decides
        let utterances = vec![
            utterance(0, "Amy", "completely different topic"),
            utterance(1, "Ben", "billing dashboards load slowly"),
        ];
        assert_eq!(resolve_quote(&utterances, "billing slow"), Some(1));
    }

    #[test]
    fn test_tier3_word_overlap() {
        let utterances = vec![
            utterance(0, "Amy", "the onboarding is confusing for new users"),
            utterance(1, "Ben", "search results are not relevant to my query"),
        ];
        assert_eq!(
            resolve_quote(&utterances, "irrelevant search results for queries"),
            Some(1)
        );
    }

    #[test]
    fn test_tier3_strict_greater_keeps_first() {
        let utterances = vec![
            utterance(0, "Amy", "deploy pipeline needs attention"),
            utterance(1, "Ben", "pipeline deploy needs attention"),
        ];
        // Equal scores: the first utterance to reach the best score wins
        assert_eq!(resolve_quote(&utterances, "deploy pipeline attention"), Some(0));
    }

    #[test]
    fn test_fallback_to_first_utterance() {
        let utterances = vec![
            utterance(0, "Amy", "hello"),
            utterance(1, "Ben", "goodbye"),
        ];
        assert_eq!(resolve_quote(&utterances, "zebra quantum xylophone"), Some(0));
    }

    #[test]
    fn test_empty_sequence_is_none() {
        assert_eq!(resolve_quote(&[], "anything"), None);
    }

    #[test]
    fn test_idempotent() {
        let utterances = vec![
            utterance(0, "Amy", "the onboarding is confusing for new users"),
            utterance(1, "Ben", "search results are not relevant to my query"),
        ];
        let quote = "irrelevant search results for queries";
        assert_eq!(
            resolve_quote(&utterances, quote),
            resolve_quote(&utterances, quote)
        );
    }
}
