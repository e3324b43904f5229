use crate::{DocId, Error, PostingsList};
use std::collections::{BTreeMap, HashMap};

/// Append-only accumulator for the single corpus scan. Doc ids must arrive
/// strictly increasing across `add_document` calls.
#[derive(Default)]
pub struct IndexBuilder {
    terms: HashMap<String, PostingsList>,
    num_docs: u32,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests one document's token stream, folding repeated tokens into a
    /// term frequency before touching the postings lists.
    pub fn add_document(&mut self, doc_id: DocId, tokens: &[String]) -> Result<(), Error> {
        let mut tf: HashMap<&str, u32> = HashMap::new();
        for token in tokens {
            *tf.entry(token.as_str()).or_insert(0) += 1;
        }
        for (term, tf) in tf {
            self.terms
                .entry(term.to_string())
                .or_insert_with(|| PostingsList::new(term))
                .insert_at_end(doc_id, tf)?;
        }
        self.num_docs += 1;
        Ok(())
    }

    /// Freezes the index: sort terms, skip-link every list, fill TF-IDF
    /// weights. The returned index is read-only and safe to share across
    /// query handlers.
    pub fn finalize(self) -> InvertedIndex {
        let num_docs = self.num_docs;
        let mut terms: BTreeMap<String, PostingsList> = self.terms.into_iter().collect();
        for list in terms.values_mut() {
            list.add_skip_connections();
        }
        for list in terms.values_mut() {
            list.apply_weights(num_docs);
        }
        InvertedIndex { terms, num_docs }
    }
}

/// The frozen index. No mutation after `finalize`; queries only read.
pub struct InvertedIndex {
    terms: BTreeMap<String, PostingsList>,
    num_docs: u32,
}

impl InvertedIndex {
    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn postings(&self, term: &str) -> Option<&PostingsList> {
        self.terms.get(term)
    }

    /// Terms in lexicographic order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// A deterministic sample for diagnostics: the lexicographically first
    /// term and its postings.
    pub fn sample_term(&self) -> Option<(&str, &PostingsList)> {
        self.terms.iter().next().map(|(t, l)| (t.as_str(), l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn terms_iterate_lexicographically_after_finalize() {
        let mut b = IndexBuilder::new();
        b.add_document(1, &toks(&["zebra", "apple", "mango"])).unwrap();
        b.add_document(2, &toks(&["banana"])).unwrap();
        let index = b.finalize();
        let terms: Vec<&str> = index.terms().collect();
        assert_eq!(terms, vec!["apple", "banana", "mango", "zebra"]);
    }

    #[test]
    fn repeated_tokens_fold_into_tf() {
        let mut b = IndexBuilder::new();
        b.add_document(1, &toks(&["hi", "hi", "hi"])).unwrap();
        let index = b.finalize();
        let list = index.postings("hi").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.traverse().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn out_of_order_documents_abort_the_build() {
        let mut b = IndexBuilder::new();
        b.add_document(2, &toks(&["hi"])).unwrap();
        assert!(b.add_document(1, &toks(&["hi"])).is_err());
    }

    #[test]
    fn finalize_skip_links_every_list() {
        let mut b = IndexBuilder::new();
        for id in 1..=6 {
            b.add_document(id, &toks(&["common"])).unwrap();
        }
        let index = b.finalize();
        let list = index.postings("common").unwrap();
        assert!(list.skips_built());
        assert!(list.traverse_with_skips().unwrap().any(|(_, t)| t));
    }

    #[test]
    fn document_count_is_set_at_finalize() {
        let mut b = IndexBuilder::new();
        b.add_document(1, &toks(&["a"])).unwrap();
        b.add_document(2, &toks(&["b"])).unwrap();
        assert_eq!(b.finalize().num_docs(), 2);
    }
}
