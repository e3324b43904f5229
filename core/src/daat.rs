use crate::postings::Posting;
use crate::{DocId, Error, PostingsList};
use std::cmp::Ordering;

/// Intersection result plus the charged comparison count. The count is part
/// of the query output, not incidental instrumentation.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub list: PostingsList,
    pub comparisons: u64,
}

/// Document-at-a-time AND over N postings lists, two-pointer walk only.
///
/// Lists are processed shortest-first so every intermediate result is bounded
/// by the smallest list. On a doc-id match the emitted posting carries the
/// larger of the two weights: conjunctive relevance is dominated by the
/// best-matching term, not their sum. A single input comes back as a fresh
/// copy with zero comparisons; an empty intermediate short-circuits the fold.
pub fn daat_and(lists: &[&PostingsList]) -> MergeOutcome {
    let mut order: Vec<&PostingsList> = lists.to_vec();
    order.sort_by_key(|l| l.len());
    let Some((first, rest)) = order.split_first() else {
        return MergeOutcome::default();
    };
    let mut result = (*first).clone();
    let mut comparisons = 0u64;
    for list in rest {
        if result.is_empty() {
            break;
        }
        result = merge_pair(&result, list, &mut comparisons, false);
    }
    MergeOutcome { list: result, comparisons }
}

/// Skip-accelerated variant of [`daat_and`]. The lagging pointer follows skip
/// references while the target stays at or below the other side's doc id;
/// those jumps are free of comparison charges, so the count isolates what the
/// skips save. Every input must already be skip-linked, and each intermediate
/// result is re-linked before the next pairwise merge.
pub fn daat_and_with_skips(lists: &[&PostingsList]) -> Result<MergeOutcome, Error> {
    if lists.iter().any(|l| !l.skips_built()) {
        return Err(Error::SkipBeforeFinalize);
    }
    let mut order: Vec<&PostingsList> = lists.to_vec();
    order.sort_by_key(|l| l.len());
    let Some((first, rest)) = order.split_first() else {
        return Ok(MergeOutcome::default());
    };
    let mut result = (*first).clone();
    let mut comparisons = 0u64;
    for list in rest {
        if result.is_empty() {
            break;
        }
        let mut merged = merge_pair(&result, list, &mut comparisons, true);
        merged.add_skip_connections();
        result = merged;
    }
    Ok(MergeOutcome { list: result, comparisons })
}

fn merge_pair(
    a: &PostingsList,
    b: &PostingsList,
    comparisons: &mut u64,
    use_skips: bool,
) -> PostingsList {
    let xs = a.postings();
    let ys = b.postings();
    let mut out = PostingsList::new("");
    let (mut i, mut j) = (0usize, 0usize);
    while i < xs.len() && j < ys.len() {
        *comparisons += 1;
        let (x, y) = (&xs[i], &ys[j]);
        match x.doc_id.cmp(&y.doc_id) {
            Ordering::Equal => {
                let keep = if x.weight >= y.weight { x } else { y };
                out.push_scored(keep.doc_id, keep.tf, keep.weight);
                i += 1;
                j += 1;
            }
            Ordering::Less => i = advance(xs, i, y.doc_id, use_skips),
            Ordering::Greater => j = advance(ys, j, x.doc_id, use_skips),
        }
    }
    out
}

/// Moves the lagging pointer one step, or through a chain of skip jumps while
/// each target's doc id stays <= `bound`. Jumps are not charged.
fn advance(ps: &[Posting], mut i: usize, bound: DocId, use_skips: bool) -> usize {
    if use_skips {
        let mut jumped = false;
        while let Some(t) = ps[i].skip {
            let t = t as usize;
            if ps[t].doc_id <= bound {
                i = t;
                jumped = true;
            } else {
                break;
            }
        }
        if jumped {
            return i;
        }
    }
    i + 1
}

/// Final ranked output: doc ids by weight descending, ties broken by doc id
/// ascending so equal-weight results come out deterministic.
pub fn rank_by_weight(list: &PostingsList) -> Vec<DocId> {
    let mut scored: Vec<(f32, DocId)> = list
        .postings()
        .iter()
        .map(|p| (p.weight, p.doc_id))
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });
    scored.into_iter().map(|(_, d)| d).collect()
}
