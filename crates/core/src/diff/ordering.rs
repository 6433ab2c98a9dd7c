//! Column-reordering and clause-sequencing helpers that don't belong to the
//! per-column/per-index diff logic itself.

/// Returns the indices (into `sequence`) of one longest strictly-increasing
/// subsequence. Used to find the maximal set of columns that are already in
/// relative order between the old and new table, so the table differ only
/// has to emit `AFTER` clauses for the columns that actually moved.
#[must_use]
pub fn longest_increasing_subsequence(sequence: &[usize]) -> Vec<usize> {
    if sequence.is_empty() {
        return Vec::new();
    }

    // `tails[k]` holds the index into `sequence` of the smallest tail value
    // for an increasing subsequence of length `k + 1`; `predecessors` lets us
    // reconstruct the chosen subsequence afterward. Standard patience-sorting
    // O(n log n) LIS construction.
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessors: Vec<Option<usize>> = vec![None; sequence.len()];

    for (i, &value) in sequence.iter().enumerate() {
        let pos = tails.partition_point(|&t| sequence[t] < value);
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
        if pos > 0 {
            predecessors[i] = Some(tails[pos - 1]);
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        result.push(i);
        cursor = predecessors[i];
    }
    result.reverse();
    result
}

/// Computes, for each column in `new_order` that is not part of the longest
/// unmoved run (per [`longest_increasing_subsequence`] over the old
/// positions), the name of the column it should be placed `AFTER` (`None`
/// means "first").
#[must_use]
pub fn columns_needing_after_clause(old_order: &[&str], new_order: &[&str]) -> Vec<(String, Option<String>)> {
    let old_position: std::collections::HashMap<&str, usize> =
        old_order.iter().enumerate().map(|(i, &name)| (name, i)).collect();

    // Columns that exist in both; their relative old-position sequence tells
    // us which ones are already in order and can be left alone.
    let shared_positions: Vec<usize> = new_order
        .iter()
        .filter_map(|name| old_position.get(name).copied())
        .collect();
    let kept_indices = longest_increasing_subsequence(&shared_positions);

    let mut shared_cursor = 0usize;
    let mut kept_cursor = 0usize;
    let mut moved = Vec::new();

    for (i, &name) in new_order.iter().enumerate() {
        let is_shared = old_position.contains_key(name);
        let is_kept = is_shared
            && kept_cursor < kept_indices.len()
            && kept_indices[kept_cursor] == shared_cursor;
        if is_shared {
            shared_cursor += 1;
        }
        if is_kept {
            kept_cursor += 1;
            continue;
        }
        let after = if i == 0 {
            None
        } else {
            Some(new_order[i - 1].to_string())
        };
        moved.push((name.to_string(), after));
    }

    moved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lis_of_already_sorted_is_identity() {
        let seq = vec![0, 1, 2, 3];
        assert_eq!(longest_increasing_subsequence(&seq), vec![0, 1, 2, 3]);
    }

    #[test]
    fn lis_picks_longest_run() {
        let seq = vec![3, 0, 1, 2];
        assert_eq!(longest_increasing_subsequence(&seq), vec![1, 2, 3]);
    }

    #[test]
    fn unchanged_columns_need_no_after_clause() {
        let old = vec!["id", "name", "email"];
        let new = vec!["id", "name", "email"];
        assert!(columns_needing_after_clause(&old, &new).is_empty());
    }

    #[test]
    fn appended_column_needs_after_previous_last() {
        let old = vec!["id", "name"];
        let new = vec!["id", "name", "email"];
        let moved = columns_needing_after_clause(&old, &new);
        assert_eq!(moved, vec![("email".to_string(), Some("name".to_string()))]);
    }

    #[test]
    fn moved_column_gets_after_clause_but_stable_run_does_not() {
        let old = vec!["id", "a", "b", "c"];
        let new = vec!["id", "c", "a", "b"];
        let moved = columns_needing_after_clause(&old, &new);
        assert_eq!(moved, vec![("c".to_string(), Some("id".to_string()))]);
    }
}
