use axum::{extract::State, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use skipdex::tokenizer::tokenize;
use skipdex::{daat_and, daat_and_with_skips, rank_by_weight, DocId, InvertedIndex, MergeOutcome, PostingsList};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub queries: Vec<String>,
    /// Diagnostic command string; echoed back in the sanity payload.
    #[serde(default)]
    pub random_command: String,
}

#[derive(Debug, Serialize)]
pub struct MergeBucket {
    pub results: Vec<DocId>,
    pub num_docs: usize,
    pub num_comparisons: u64,
}

#[derive(Debug, Serialize)]
pub struct Sanity {
    pub num_terms: usize,
    pub num_docs: u32,
    pub sample_term: Option<String>,
    pub sample_postings: Option<String>,
    pub command_result: String,
}

/// The six per-query result buckets plus index diagnostics. Field names are
/// the wire format downstream consumers of this output expect.
#[derive(Debug, Serialize)]
pub struct QueryOutput {
    #[serde(rename = "postingsList")]
    pub postings_list: BTreeMap<String, Vec<DocId>>,
    #[serde(rename = "postingsListSkip")]
    pub postings_list_skip: BTreeMap<String, Vec<DocId>>,
    #[serde(rename = "daatAnd")]
    pub daat_and: BTreeMap<String, MergeBucket>,
    #[serde(rename = "daatAndSkip")]
    pub daat_and_skip: BTreeMap<String, MergeBucket>,
    #[serde(rename = "daatAndTfIdf")]
    pub daat_and_tfidf: BTreeMap<String, MergeBucket>,
    #[serde(rename = "daatAndSkipTfIdf")]
    pub daat_and_skip_tfidf: BTreeMap<String, MergeBucket>,
    pub sanity: Sanity,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    #[serde(rename = "Response")]
    pub response: QueryOutput,
    pub time_taken: String,
    pub username_hash: String,
}

/// Shared, read-only state: the index is frozen before the server starts, so
/// concurrent handlers need no locking.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<InvertedIndex>,
    pub output_path: PathBuf,
    pub username_hash: String,
}

pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/execute_query", post(execute_query))
        .with_state(state)
        .layer(cors)
}

pub async fn execute_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Json<QueryResponse> {
    let start = std::time::Instant::now();
    let output = run_queries(&state.index, &req);

    if let Err(err) = dump_output(&state.output_path, &output) {
        tracing::warn!(%err, path = %state.output_path.display(), "failed to write output file");
    }

    Json(QueryResponse {
        response: output,
        time_taken: start.elapsed().as_secs_f64().to_string(),
        username_hash: state.username_hash.clone(),
    })
}

fn run_queries(index: &InvertedIndex, req: &QueryRequest) -> QueryOutput {
    let mut out = QueryOutput {
        postings_list: BTreeMap::new(),
        postings_list_skip: BTreeMap::new(),
        daat_and: BTreeMap::new(),
        daat_and_skip: BTreeMap::new(),
        daat_and_tfidf: BTreeMap::new(),
        daat_and_skip_tfidf: BTreeMap::new(),
        sanity: sanity(index, &req.random_command),
    };

    for query in &req.queries {
        let key = query.trim().to_string();
        let terms = tokenize(query);

        let mut lists: Vec<&PostingsList> = Vec::with_capacity(terms.len());
        let mut all_terms_known = true;
        for term in &terms {
            match index.postings(term) {
                Some(list) => {
                    out.postings_list
                        .insert(term.clone(), list.traverse().collect());
                    out.postings_list_skip
                        .insert(term.clone(), skip_targets(list));
                    lists.push(list);
                }
                None => {
                    // unknown term: defined as an empty conjunction, not a fault
                    out.postings_list.insert(term.clone(), Vec::new());
                    out.postings_list_skip.insert(term.clone(), Vec::new());
                    all_terms_known = false;
                }
            }
        }

        // An empty or partially-unknown query short-circuits to an empty
        // result with zero comparisons; other queries are unaffected.
        let (plain, skipped) = if terms.is_empty() || !all_terms_known {
            (MergeOutcome::default(), MergeOutcome::default())
        } else {
            let plain = daat_and(&lists);
            let skipped = match daat_and_with_skips(&lists) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(%err, query = %key, "skip merge failed, falling back to plain");
                    daat_and(&lists)
                }
            };
            (plain, skipped)
        };

        out.daat_and_tfidf.insert(
            key.clone(),
            MergeBucket {
                results: rank_by_weight(&plain.list),
                num_docs: plain.list.len(),
                num_comparisons: plain.comparisons,
            },
        );
        out.daat_and_skip_tfidf.insert(
            key.clone(),
            MergeBucket {
                results: rank_by_weight(&skipped.list),
                num_docs: skipped.list.len(),
                num_comparisons: skipped.comparisons,
            },
        );
        out.daat_and.insert(
            key.clone(),
            MergeBucket {
                results: plain.list.traverse().collect(),
                num_docs: plain.list.len(),
                num_comparisons: plain.comparisons,
            },
        );
        out.daat_and_skip.insert(
            key,
            MergeBucket {
                results: skipped.list.traverse().collect(),
                num_docs: skipped.list.len(),
                num_comparisons: skipped.comparisons,
            },
        );
    }

    out
}

/// Doc ids of the skip-target postings, for the diagnostic bucket.
fn skip_targets(list: &PostingsList) -> Vec<DocId> {
    list.traverse_with_skips()
        .map(|iter| iter.filter(|(_, t)| *t).map(|(d, _)| d).collect())
        .unwrap_or_default()
}

/// Introspection of the frozen index. The diagnostic command is echoed back
/// verbatim, never evaluated.
fn sanity(index: &InvertedIndex, command: &str) -> Sanity {
    let sample = index.sample_term();
    Sanity {
        num_terms: index.num_terms(),
        num_docs: index.num_docs(),
        sample_term: sample.map(|(t, _)| t.to_string()),
        sample_postings: sample.map(|(_, l)| format!("{l:?}")),
        command_result: command.to_string(),
    }
}

fn dump_output(path: &PathBuf, output: &QueryOutput) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(output)?;
    std::fs::write(path, json)?;
    Ok(())
}
