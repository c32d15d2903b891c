// Identifier mutation for IDOR probing
// Turns one victim identifier into the set of candidates an attacker would try

/// Candidate identifiers for an IDOR probe:
/// - the victim id itself
/// - neighbours within two steps (e.g. order 1002 → 1000..=1004)
/// - the usual privileged ids "0" and "1"
///
/// The list is sorted and free of duplicates.
pub fn candidate_ids(victim: &str) -> Vec<String> {
    let victim = victim.trim();
    let mut candidates = Vec::new();
    if !victim.is_empty() {
        candidates.push(victim.to_string());
    }

    candidates.extend(adjacent_ids(victim, 2));
    candidates.push("0".to_string());
    candidates.push("1".to_string());

    candidates.sort();
    candidates.dedup();
    candidates
}

/// Neighbours of a trailing number, keeping any prefix and zero padding.
///
/// - "1002" → 1000, 1001, 1003, 1004
/// - "user:7" → user:5, user:6, user:8, user:9
/// - "007" → 005, 006, 008, 009
fn adjacent_ids(id: &str, range: u64) -> Vec<String> {
    let Some((base, digits)) = split_trailing_number(id) else {
        return Vec::new();
    };
    let Ok(number) = digits.parse::<u64>() else {
        return Vec::new();
    };
    let width = if digits.len() > 1 && digits.starts_with('0') {
        digits.len()
    } else {
        0
    };

    let low = number.saturating_sub(range);
    let high = number.saturating_add(range);
    (low..=high)
        .filter(|n| *n != number)
        .map(|n| format!("{}{:0width$}", base, n, width = width))
        .collect()
}

/// Split "prefix123" into ("prefix", "123")
fn split_trailing_number(id: &str) -> Option<(&str, &str)> {
    let start = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    Some((&id[..start], &id[start..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================
    // Trailing Number Tests
    // ============================================

    #[test]
    fn test_split_trailing_number() {
        assert_eq!(split_trailing_number("1002"), Some(("", "1002")));
        assert_eq!(split_trailing_number("user:7"), Some(("user:", "7")));
        assert_eq!(split_trailing_number("order-007"), Some(("order-", "007")));
        assert_eq!(split_trailing_number("admin"), None);
        assert_eq!(split_trailing_number(""), None);
    }

    // ============================================
    // Adjacent ID Tests
    // ============================================

    #[test]
    fn test_adjacent_ids_numeric() {
        assert_eq!(adjacent_ids("1002", 2), vec!["1000", "1001", "1003", "1004"]);
    }

    #[test]
    fn test_adjacent_ids_stop_at_zero() {
        assert_eq!(adjacent_ids("1", 2), vec!["0", "2", "3"]);
    }

    #[test]
    fn test_adjacent_ids_keep_padding() {
        assert_eq!(adjacent_ids("order-007", 1), vec!["order-006", "order-008"]);
    }

    #[test]
    fn test_adjacent_ids_no_number() {
        assert!(adjacent_ids("admin", 2).is_empty());
    }

    // ============================================
    // Candidate Set Tests
    // ============================================

    #[test]
    fn test_candidates_include_victim_and_privileged() {
        let candidates = candidate_ids("3");
        for expected in ["0", "1", "2", "3", "4", "5"] {
            assert!(candidates.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_candidates_are_unique() {
        let candidates = candidate_ids("2");
        let ones = candidates.iter().filter(|c| *c == "1").count();
        assert_eq!(ones, 1);
        let mut sorted = candidates.clone();
        sorted.sort();
        assert_eq!(candidates, sorted);
    }

    #[test]
    fn test_candidates_for_blank_victim() {
        assert_eq!(candidate_ids("  "), vec!["0", "1"]);
    }
}
