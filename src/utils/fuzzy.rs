// Fuzzy matching utilities for organization and field-name suggestions

/// Calculate Levenshtein distance between two strings
/// Returns the minimum number of single-character edits (insertions,
/// deletions, substitutions) needed to transform one string into another
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two-row dynamic programming
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1)     // deletion
                .min(curr[j] + 1)               // insertion
                .min(prev[j] + cost);           // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Find near matches for an organization name
/// Returns up to 5 matches sorted by distance (closest first). Prefix
/// matches count as the number of extra characters so "Pref" suggests
/// "Prefeitura X" even at a large edit distance.
pub fn find_near_org_matches(
    search_name: &str,
    names: &[String],
    max_distance: usize,
) -> Vec<(String, usize)> {
    let search_lower = search_name.to_lowercase();
    let mut matches: Vec<(String, usize)> = Vec::new();

    for name in names {
        let name_lower = name.to_lowercase();
        let distance = levenshtein_distance(&search_lower, &name_lower);

        if distance <= max_distance {
            matches.push((name.clone(), distance));
        } else if name_lower.starts_with(&search_lower) {
            matches.push((name.clone(), name_lower.len() - search_lower.len()));
        }
    }

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    matches.truncate(5);
    matches
}
