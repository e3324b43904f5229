use crate::{tokenizer, DocId, Error, IndexBuilder, InvertedIndex};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Splits a corpus line into `(doc_id, body)`. The id token is separated from
/// the body by a tab, with plain whitespace as a fallback. Returns `None` for
/// blank or malformed lines.
pub fn parse_line(line: &str) -> Option<(DocId, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (id, body) = line.split_once('\t').or_else(|| line.split_once(' '))?;
    let doc_id = id.trim().parse::<DocId>().ok()?;
    Some((doc_id, body))
}

/// Single sequential scan over a one-document-per-line corpus file, followed
/// by finalize. Out-of-order doc ids abort the build; malformed lines are
/// skipped with a warning.
pub fn build_index<P: AsRef<Path>>(path: P) -> Result<InvertedIndex, Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut builder = IndexBuilder::new();
    for line in reader.lines() {
        let line = line?;
        let Some((doc_id, body)) = parse_line(&line) else {
            if !line.trim().is_empty() {
                tracing::warn!(line = %truncate(&line), "skipping malformed corpus line");
            }
            continue;
        };
        let tokens = tokenizer::tokenize(body);
        builder.add_document(doc_id, &tokens)?;
    }
    let index = builder.finalize();
    tracing::info!(
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        "index built and finalized"
    );
    Ok(index)
}

fn truncate(line: &str) -> String {
    line.chars().take(60).collect()
}
