/// Expands a raw user-entered city name into an ordered list of candidate
/// query strings. Upstream station names mix English, romanized, and
/// native-script forms; trying several variants before giving up raises the
/// match rate without a full geocoding service.
///
/// The raw name always comes first; the list is deduplicated preserving
/// first-seen order.
pub fn expand(raw: &str) -> Vec<String> {
    let mut candidates = vec![raw.to_string()];

    // "Meguro (目黒)" -> "Meguro"
    let stripped = strip_parentheticals(raw);
    if stripped != raw && !stripped.is_empty() {
        candidates.push(stripped.clone());
    }

    // "Meguro (目黒)" -> "目黒", for stations indexed by the localized name
    if let Some(inner) = first_parenthetical(raw) {
        candidates.push(inner);
    }

    let base = if stripped.is_empty() {
        raw
    } else {
        stripped.as_str()
    };
    candidates.push(format!("{}, Japan", base));
    candidates.push(format!("{}-shi", base));
    candidates.push(format!("{} City", base));

    dedup_preserving_order(candidates)
}

fn strip_parentheticals(raw: &str) -> String {
    let mut kept = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => kept.push(ch),
            _ => {}
        }
    }
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_parenthetical(raw: &str) -> Option<String> {
    let start = raw.find('(')?;
    let rest = &raw[start + 1..];
    let end = rest.find(')')?;
    let inner = rest[..end].trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

fn dedup_preserving_order(candidates: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parenthetical_name_expands_to_all_variants() {
        let candidates = expand("Meguro (目黒)");

        assert_eq!(candidates[0], "Meguro (目黒)");
        assert_eq!(candidates[1], "Meguro");
        assert_eq!(candidates[2], "目黒");
        assert!(candidates.contains(&"Meguro, Japan".to_string()));
        assert!(candidates.contains(&"Meguro-shi".to_string()));
        assert!(candidates.contains(&"Meguro City".to_string()));
    }

    #[test]
    fn test_plain_name_keeps_raw_first() {
        let candidates = expand("Beijing");

        assert_eq!(candidates[0], "Beijing");
        assert_eq!(
            candidates,
            vec![
                "Beijing".to_string(),
                "Beijing, Japan".to_string(),
                "Beijing-shi".to_string(),
                "Beijing City".to_string(),
            ]
        );
    }

    #[test]
    fn test_candidates_are_deduplicated() {
        let candidates = expand("Tokyo (Tokyo)");

        // raw, stripped, and inner content collapse where they repeat
        assert_eq!(candidates[0], "Tokyo (Tokyo)");
        assert_eq!(candidates[1], "Tokyo");
        let unique: std::collections::HashSet<_> = candidates.iter().collect();
        assert_eq!(unique.len(), candidates.len());
    }

    #[test]
    fn test_parenthetical_only_name_falls_back_to_raw_base() {
        let candidates = expand("(目黒)");

        assert_eq!(candidates[0], "(目黒)");
        assert_eq!(candidates[1], "目黒");
        assert!(candidates.contains(&"(目黒), Japan".to_string()));
    }

    #[test]
    fn test_strip_collapses_leftover_whitespace() {
        assert_eq!(strip_parentheticals("Osaka (大阪) Station"), "Osaka Station");
        assert_eq!(strip_parentheticals("Osaka"), "Osaka");
    }

    #[test]
    fn test_empty_parentheses_produce_no_inner_candidate() {
        assert_eq!(first_parenthetical("Kyoto ()"), None);
        assert_eq!(first_parenthetical("Kyoto"), None);
        assert_eq!(first_parenthetical("Kyoto (京都)"), Some("京都".to_string()));
    }
}
