use crate::word::WordBox;

/// Two boxes whose overlap ratio exceeds this are considered the same word.
pub const DEDUP_THRESHOLD: f64 = 0.7;

/// Intersection area divided by the area of the smaller box.
///
/// Unlike IoU this treats a box lying almost entirely inside a larger one (eg. one pass reads two
/// words as a single span, another reads just one of them) as a near-total overlap.
/// Returns `0.0` if the boxes are disjoint or either has no area.
pub fn overlap_ratio(a: &WordBox, b: &WordBox) -> f64 {
    let smaller = a.area().min(b.area());
    if smaller == 0 {
        return 0.0;
    }

    let left = (a.left as u64).max(b.left as u64);
    let top = (a.top as u64).max(b.top as u64);
    let right = a.right().min(b.right());
    let bottom = a.bottom().min(b.bottom());

    if right <= left || bottom <= top {
        return 0.0;
    }

    let intersection = (right - left) * (bottom - top);
    intersection as f64 / smaller as f64
}

/// Collapse every cluster of overlapping boxes to its most confident member.
///
/// The result is ordered by descending confidence; equally confident boxes keep their input order.
/// Kept boxes are returned verbatim, nothing is merged.
pub fn dedupe(mut boxes: Vec<WordBox>) -> Vec<WordBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut accepted: Vec<WordBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let duplicate = accepted
            .iter()
            .any(|kept| overlap_ratio(&candidate, kept) > DEDUP_THRESHOLD);

        if !duplicate {
            accepted.push(candidate);
        }
    }

    accepted
}
