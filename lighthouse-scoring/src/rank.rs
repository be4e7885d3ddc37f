//! Deterministic ranking: composite score descending, then symbol ascending.

use std::cmp::Ordering;

use crate::score::ScoredRecord;

fn by_rank(a: &ScoredRecord, b: &ScoredRecord) -> Ordering {
    b.composite_score
        .total_cmp(&a.composite_score)
        .then_with(|| a.candidate.symbol.cmp(&b.candidate.symbol))
}

/// Sort in place and assign ranks `1..=n`.
pub fn rank_records(records: &mut [ScoredRecord]) {
    records.sort_by(by_rank);
    for (i, record) in records.iter_mut().enumerate() {
        record.rank = i + 1;
    }
}
