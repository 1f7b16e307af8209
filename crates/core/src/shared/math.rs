//! Shared math utilities.
//!
//! Union-find clustering used to split the trajectory graph into connected
//! components, and the order statistics behind alternative costs.

/// Find root of element `i` with path halving for amortized near-O(1).
pub fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`.
pub fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

/// Collect union-find clusters into groups of ids.
///
/// Each group is sorted, and groups are ordered by their smallest id, so the
/// output does not depend on the union order.
pub fn collect_groups<Id: Copy + Ord>(parent: &mut [usize], entries: &[(usize, Id)]) -> Vec<Vec<Id>> {
    let mut groups: std::collections::HashMap<usize, Vec<Id>> = std::collections::HashMap::new();
    for &(idx, id) in entries {
        let root = find(parent, idx);
        groups.entry(root).or_default().push(id);
    }

    let mut result: Vec<Vec<Id>> = groups.into_values().collect();
    for g in &mut result {
        g.sort();
    }
    result.sort_by_key(|g| g[0]);
    result
}

/// Largest value, ignoring NaN. `None` for an empty slice.
pub fn max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}

/// Percentile `p` in `[0, 1]` of `values`, with linear interpolation between
/// the two closest ranks. NaN entries are ignored. `None` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}
