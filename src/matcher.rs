//! Tiered answer matching
//!
//! A guess is compared to the canonical answer in increasingly forgiving tiers:
//! strict normalization, whitespace-insensitive, loose normalization, and finally a
//! bounded Levenshtein distance on the loose forms.

/// Returns true if `guess` should be accepted locally as `canonical`.
///
/// Fuzzy tiers only run when `fuzzy_enabled` and `max_edit_distance > 0`.
pub fn is_likely_correct(
    canonical: &str,
    guess: &str,
    fuzzy_enabled: bool,
    max_edit_distance: i32,
) -> bool {
    let correct = normalize_strict(canonical);
    let attempt = normalize_strict(guess);
    if correct.is_empty() || attempt.is_empty() {
        return false;
    }
    if correct == attempt {
        return true;
    }

    let correct_compact = remove_whitespace(&correct);
    if !correct_compact.is_empty() && correct_compact == remove_whitespace(&attempt) {
        return true;
    }

    if !fuzzy_enabled || max_edit_distance <= 0 {
        return false;
    }
    let max = max_edit_distance as usize;

    let correct_loose = normalize_loose(canonical);
    let guess_loose = normalize_loose(guess);
    if correct_loose.is_empty() {
        return false;
    }
    if correct_loose == guess_loose {
        return true;
    }

    let longest = correct_loose
        .chars()
        .count()
        .max(guess_loose.chars().count());
    levenshtein_within(&correct_loose, &guess_loose, max.min(longest))
}

/// Trim, lowercase and collapse whitespace runs into single spaces. Punctuation is kept.
pub fn normalize_strict(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase and keep only letters and digits.
pub fn normalize_loose(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn remove_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// True if the Levenshtein distance between `a` and `b` is at most `max_distance`.
///
/// Two-row DP restricted to a diagonal band of width `max_distance`; cells outside the
/// band count as `max_distance + 1`. Bails out as soon as a whole row exceeds the bound.
pub fn levenshtein_within(a: &str, b: &str, max_distance: usize) -> bool {
    if a == b {
        return true;
    }
    let mut a: Vec<char> = a.chars().collect();
    let mut b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max_distance {
        return false;
    }
    if a.is_empty() || b.is_empty() {
        return a.len().max(b.len()) <= max_distance;
    }

    // Keep the shorter string on the row axis.
    if a.len() > b.len() {
        std::mem::swap(&mut a, &mut b);
    }

    let outside = max_distance + 1;
    let mut prev: Vec<usize> = (0..=a.len()).collect();
    let mut curr = vec![0usize; a.len() + 1];

    for (j, b_ch) in b.iter().enumerate() {
        let j = j + 1;
        curr[0] = j;
        let mut row_min = j;

        let start = j.saturating_sub(max_distance).max(1);
        let end = a.len().min(j + max_distance);

        for cell in curr.iter_mut().take(start).skip(1) {
            *cell = outside;
        }

        for i in start..=end {
            let cost = usize::from(a[i - 1] != *b_ch);
            let value = (prev[i] + 1).min(curr[i - 1] + 1).min(prev[i - 1] + cost);
            curr[i] = value;
            row_min = row_min.min(value);
        }

        for cell in curr.iter_mut().skip(end + 1) {
            *cell = outside;
        }

        if row_min > max_distance {
            return false;
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[a.len()] <= max_distance
}

/// Plain edit distance between the loose forms, capped at `cap + 1`.
///
/// Used to decide whether a near miss is worth an external judgment.
pub fn loose_distance_within(canonical: &str, guess: &str, cap: usize) -> bool {
    let a = normalize_loose(canonical);
    let b = normalize_loose(guess);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    levenshtein_within(&a, &b, cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_tier_ignores_case_and_padding() {
        assert!(is_likely_correct("Paris", "  paris  ", false, 0));
    }

    #[test]
    fn test_whitespace_tier() {
        assert!(is_likely_correct("New York", "newyork", false, 0));
        assert!(is_likely_correct("New York", "new   york", false, 0));
    }

    #[test]
    fn test_fuzzy_tier_respects_toggle() {
        assert!(is_likely_correct("Tokyo", "Tokio", true, 1));
        assert!(!is_likely_correct("Tokyo", "Tokio", false, 1));
        assert!(!is_likely_correct("Tokyo", "Tokio", true, 0));
    }

    #[test]
    fn test_loose_tier_ignores_punctuation() {
        assert!(is_likely_correct("St. Louis", "st louis", true, 1));
        assert!(!is_likely_correct("St. Louis", "st louis", false, 1));
    }

    #[test]
    fn test_empty_inputs_never_match() {
        assert!(!is_likely_correct("", "", true, 3));
        assert!(!is_likely_correct("Paris", "   ", true, 3));
        assert!(!is_likely_correct("!!!", "???", true, 3));
    }

    #[test]
    fn test_wrong_answer_rejected() {
        assert!(!is_likely_correct("Berlin", "Madrid", true, 2));
    }

    #[test]
    fn test_levenshtein_within_kitten_sitting() {
        assert!(levenshtein_within("kitten", "sitting", 3));
        assert!(!levenshtein_within("kitten", "sitting", 2));
    }

    #[test]
    fn test_levenshtein_length_gap_rejected_early() {
        assert!(!levenshtein_within("a", "abcdef", 2));
        assert!(levenshtein_within("", "ab", 2));
        assert!(!levenshtein_within("", "abc", 2));
    }

    #[test]
    fn test_levenshtein_is_symmetric() {
        assert!(levenshtein_within("sitting", "kitten", 3));
        assert!(!levenshtein_within("sitting", "kitten", 2));
    }

    #[test]
    fn test_levenshtein_long_inputs() {
        let base: String = "abcdefghij".repeat(30);
        let mut edited: Vec<char> = base.chars().collect();
        for idx in [5, 50, 120, 200, 299] {
            edited[idx] = 'z';
        }
        let edited: String = edited.into_iter().collect();
        assert!(levenshtein_within(&base, &edited, 5));
        assert!(!levenshtein_within(&base, &edited, 4));
        assert!(levenshtein_within(&base, &edited, 10));
    }

    #[test]
    fn test_normalize_loose() {
        assert_eq!(normalize_loose("  Hello, World! 42 "), "helloworld42");
        assert_eq!(normalize_loose("Émile"), "émile");
    }

    #[test]
    fn test_normalize_strict_keeps_punctuation() {
        assert_eq!(normalize_strict("  St.   Louis\t"), "st. louis");
    }

    #[test]
    fn test_loose_distance_within() {
        assert!(loose_distance_within("Mississippi", "Misisipi", 3));
        assert!(!loose_distance_within("Mississippi", "Texas", 3));
        assert!(!loose_distance_within("", "anything", 10));
    }
}
