use crate::model::graph::GraphRecord;

/// Flags records whose coordinates all lie within `tolerance` (Å, per
/// component) of an earlier, non-duplicate record.
///
/// Records are compared in the order given, which the pipeline keeps equal
/// to source order. Records flagged in `skip` never serve as originals and
/// are never flagged themselves.
pub fn find_duplicates(records: &[GraphRecord], skip: &[bool], tolerance: f64) -> Vec<bool> {
    let mut duplicate = vec![false; records.len()];
    let mut originals: Vec<usize> = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        if skip[idx] {
            continue;
        }
        let is_dup = originals
            .iter()
            .any(|&o| coordinates_match(&records[o].positions, &record.positions, tolerance));
        if is_dup {
            duplicate[idx] = true;
        } else {
            originals.push(idx);
        }
    }
    duplicate
}

fn coordinates_match(a: &[[f64; 3]], b: &[[f64; 3]], tolerance: f64) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(p, q)| (0..3).all(|c| (p[c] - q[c]).abs() <= tolerance))
}
