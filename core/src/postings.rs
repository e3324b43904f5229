use crate::{DocId, Error};
use serde::Serialize;

/// One (document, term) entry. `skip` is an index into the owning list's
/// arena, always pointing strictly ahead of this posting's own position.
#[derive(Debug, Clone, Serialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
    pub weight: f32,
    pub skip: Option<u32>,
}

/// Per-term postings, sorted by doc_id, stored contiguously so skip pointers
/// are plain offsets rather than node references.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostingsList {
    pub term: String,
    postings: Vec<Posting>,
    skips_built: bool,
}

impl PostingsList {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into(), postings: Vec::new(), skips_built: false }
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn skips_built(&self) -> bool {
        self.skips_built
    }

    pub(crate) fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Appends a posting. Doc ids must arrive strictly increasing, which a
    /// sequential corpus scan guarantees; anything else is an upstream
    /// contract violation and aborts the build.
    pub fn insert_at_end(&mut self, doc_id: DocId, tf: u32) -> Result<(), Error> {
        if self.skips_built {
            return Err(Error::SkipAfterMutation);
        }
        if let Some(last) = self.postings.last() {
            if doc_id <= last.doc_id {
                return Err(Error::OutOfOrderInsertion {
                    term: self.term.clone(),
                    last: last.doc_id,
                    got: doc_id,
                });
            }
        }
        self.postings.push(Posting { doc_id, tf, weight: 0.0, skip: None });
        Ok(())
    }

    /// Append used by the merge engine, which already produces ordered output
    /// with weights resolved.
    pub(crate) fn push_scored(&mut self, doc_id: DocId, tf: u32, weight: f32) {
        debug_assert!(self.postings.last().map_or(true, |p| p.doc_id < doc_id));
        debug_assert!(!self.skips_built);
        self.postings.push(Posting { doc_id, tf, weight, skip: None });
    }

    /// Doc ids in list order. Lazy and restartable; never mutates.
    pub fn traverse(&self) -> impl Iterator<Item = DocId> + '_ {
        self.postings.iter().map(|p| p.doc_id)
    }

    /// Doc ids annotated with whether the posting is a skip-target.
    /// Diagnostic output only; the merge algorithms never call this.
    pub fn traverse_with_skips(
        &self,
    ) -> Result<impl Iterator<Item = (DocId, bool)> + '_, Error> {
        if !self.skips_built {
            return Err(Error::SkipBeforeFinalize);
        }
        let mut is_target = vec![false; self.postings.len()];
        for p in &self.postings {
            if let Some(t) = p.skip {
                is_target[t as usize] = true;
            }
        }
        Ok(self
            .postings
            .iter()
            .zip(is_target)
            .map(|(p, target)| (p.doc_id, target)))
    }

    /// One-shot skip augmentation at stride floor(sqrt(len)). Idempotent on
    /// an already-linked list; lists shorter than 4 gain nothing from skips
    /// and are only marked as linked.
    pub fn add_skip_connections(&mut self) {
        if self.skips_built {
            return;
        }
        let len = self.postings.len();
        if len >= 4 {
            let stride = isqrt(len).max(1);
            let mut i = 0;
            while i + stride < len {
                self.postings[i].skip = Some((i + stride) as u32);
                i += stride;
            }
        }
        self.skips_built = true;
    }

    /// TF-IDF fill: weight = (1 + log10(tf)) * log10(N / df), df being this
    /// list's length. Runs once, inside index finalize.
    pub(crate) fn apply_weights(&mut self, num_docs: u32) {
        let df = self.postings.len();
        if df == 0 {
            return;
        }
        let idf = (num_docs as f32 / df as f32).log10();
        for p in &mut self.postings {
            p.weight = (1.0 + (p.tf as f32).log10()) * idf;
        }
    }
}

fn isqrt(n: usize) -> usize {
    (n as f64).sqrt() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn list_of(ids: &[DocId]) -> PostingsList {
        let mut l = PostingsList::new("t");
        for &id in ids {
            l.insert_at_end(id, 1).unwrap();
        }
        l
    }

    #[test]
    fn traverse_preserves_insertion_order() {
        let l = list_of(&[1, 4, 9]);
        assert_eq!(l.traverse().collect::<Vec<_>>(), vec![1, 4, 9]);
        // restartable
        assert_eq!(l.traverse().collect::<Vec<_>>(), vec![1, 4, 9]);
    }

    #[test]
    fn out_of_order_insert_is_rejected() {
        let mut l = list_of(&[5]);
        let err = l.insert_at_end(5, 1).unwrap_err();
        assert!(matches!(err, Error::OutOfOrderInsertion { last: 5, got: 5, .. }));
        let err = l.insert_at_end(3, 1).unwrap_err();
        assert!(matches!(err, Error::OutOfOrderInsertion { .. }));
    }

    #[test]
    fn short_lists_get_no_skips() {
        let mut l = list_of(&[1, 2, 3]);
        l.add_skip_connections();
        assert!(l.skips_built());
        assert!(l.postings().iter().all(|p| p.skip.is_none()));
    }

    #[test]
    fn skip_stride_is_floor_sqrt() {
        // len 9 -> stride 3: skips at 0->3, 3->6
        let mut l = list_of(&[10, 20, 30, 40, 50, 60, 70, 80, 90]);
        l.add_skip_connections();
        let skips: Vec<_> = l.postings().iter().map(|p| p.skip).collect();
        assert_eq!(skips[0], Some(3));
        assert_eq!(skips[3], Some(6));
        assert!(skips[6].is_none());
        assert!(skips.iter().enumerate().all(|(i, s)| s.map_or(true, |t| t as usize > i)));
    }

    #[test]
    fn skip_chain_reaches_tail_within_bound() {
        let n = 37;
        let mut l = list_of(&(0..n).collect::<Vec<_>>());
        l.add_skip_connections();
        let stride = isqrt(n as usize);
        let mut pos = 0usize;
        let mut hops = 0usize;
        while let Some(t) = l.postings()[pos].skip {
            pos = t as usize;
            hops += 1;
        }
        // tail is reachable from the last skip position by fewer than stride steps
        assert!(l.len() - pos <= stride);
        assert!(hops <= (n as usize + stride - 1) / stride);
    }

    #[test]
    fn add_skip_connections_is_idempotent() {
        let mut l = list_of(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        l.add_skip_connections();
        let before: Vec<_> = l.postings().iter().map(|p| p.skip).collect();
        l.add_skip_connections();
        let after: Vec<_> = l.postings().iter().map(|p| p.skip).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn append_after_skip_link_fails() {
        let mut l = list_of(&[1, 2, 3, 4]);
        l.add_skip_connections();
        assert!(matches!(l.insert_at_end(9, 1), Err(Error::SkipAfterMutation)));
    }

    #[test]
    fn skip_traversal_requires_linking() {
        let l = list_of(&[1, 2, 3, 4]);
        assert!(matches!(l.traverse_with_skips(), Err(Error::SkipBeforeFinalize)));
    }

    #[test]
    fn skip_traversal_flags_targets() {
        let mut l = list_of(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        l.add_skip_connections();
        let flagged: Vec<DocId> = l
            .traverse_with_skips()
            .unwrap()
            .filter(|(_, t)| *t)
            .map(|(d, _)| d)
            .collect();
        // stride 3: targets at positions 3 and 6
        assert_eq!(flagged, vec![4, 7]);
    }

    #[test]
    fn weights_use_base10_tf_idf() {
        let mut l = list_of(&[1]);
        l.insert_at_end(2, 10).unwrap();
        l.apply_weights(20);
        // df = 2, N = 20 -> idf = log10(10) = 1
        let w: Vec<f32> = l.postings().iter().map(|p| p.weight).collect();
        assert!((w[0] - 1.0).abs() < 1e-6); // tf 1 -> 1 + log10(1) = 1
        assert!((w[1] - 2.0).abs() < 1e-6); // tf 10 -> 1 + log10(10) = 2
    }

    #[test]
    fn term_in_every_document_weighs_zero() {
        let mut l = list_of(&[1, 2, 3]);
        l.apply_weights(3);
        assert!(l.postings().iter().all(|p| p.weight == 0.0));
    }
}
