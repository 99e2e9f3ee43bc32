//! Query execution.
//!
//! A query runs through matching, an optional sort, and streaming.
//! Results are delivered one path at a time over the request's channel
//! and the caller can cancel cooperatively at any point: the engine
//! checks the signal at bounded intervals while matching and before
//! every send, and a send to a dropped receiver ends the query too.
//! An empty result set is a valid outcome, never an error.

use crate::engine::IndexEngine;
use crate::error::{IndexError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::Sender;
use tracing::debug;

/// How many matches to collect between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 64;

/// How query text is matched against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Basename starts with the query text. Always case-sensitive.
    Prefix,
    /// Basename contains the query text anywhere.
    Substring,
    /// The query is a subsequence of the full path.
    Fuzzy,
}

/// A single search against the index. Ephemeral: built per request,
/// gone once its result stream is drained or cancelled.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub mode: QueryMode,
    pub case_insensitive: bool,
    /// Skip sorting entirely; results stream in discovery order.
    pub no_sort: bool,
    /// Emit the best result first instead of last.
    pub sort_descending: bool,
    /// Cap on emitted results, keeping the best end of the sorted
    /// order. 0 means unlimited.
    pub max_results: usize,
}

/// Cooperative cancellation signal shared between the caller and the
/// engine. Raising it stops matching and result delivery at the next
/// check.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A query plus its result sink and cancellation handle.
pub struct QueryRequest {
    pub query: Query,
    pub results: Sender<String>,
    pub cancel: CancelToken,
}

/// One matched path. `skipped` is 0 outside fuzzy mode.
struct Hit {
    path: String,
    skipped: usize,
}

impl Hit {
    /// Ascending key order = best match first.
    fn key(&self) -> (usize, usize) {
        (self.skipped, self.path.len())
    }
}

impl IndexEngine {
    /// Runs a query to completion or cancellation, streaming matching
    /// paths into the request's sink. The sink closes when this
    /// returns and the sender drops.
    pub fn search(&self, request: QueryRequest) {
        let QueryRequest {
            query,
            results,
            cancel,
        } = request;

        debug!("querying {:?} ({:?})", query.text, query.mode);
        let start = Instant::now();

        match self.collect_matches(&query, &cancel) {
            Ok(mut hits) => {
                debug!("matched {} paths in {:.2?}", hits.len(), start.elapsed());
                if !query.no_sort {
                    hits.sort_unstable_by_key(Hit::key);
                    if !query.sort_descending {
                        // Best last: an interactive caller rendering
                        // bottom-up shows the best match closest to the
                        // input line.
                        hits.reverse();
                    }
                }
                stream_hits(hits, &query, &results, &cancel);
            }
            Err(IndexError::Aborted) => debug!("query cancelled during matching"),
            Err(err) => debug!("query failed: {err}"),
        }
    }

    fn collect_matches(&self, query: &Query, cancel: &CancelToken) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        let mut since_check = 0usize;

        match query.mode {
            QueryMode::Prefix => self.names.visit_prefix(&query.text, &mut |_, nodes| {
                for &node in nodes {
                    hits.push(Hit {
                        path: self.tree.path_of(node),
                        skipped: 0,
                    });
                }
                check_cancel(&mut since_check, cancel)
            })?,
            QueryMode::Substring => self.names.visit_substring(
                &query.text,
                query.case_insensitive,
                &mut |_, nodes| {
                    for &node in nodes {
                        hits.push(Hit {
                            path: self.tree.path_of(node),
                            skipped: 0,
                        });
                    }
                    check_cancel(&mut since_check, cancel)
                },
            )?,
            QueryMode::Fuzzy => {
                self.tree
                    .visit_fuzzy(&query.text, query.case_insensitive, &mut |path, skipped| {
                        hits.push(Hit {
                            path: path.to_string(),
                            skipped,
                        });
                        check_cancel(&mut since_check, cancel)
                    })?
            }
        }

        Ok(hits)
    }
}

fn check_cancel(counter: &mut usize, cancel: &CancelToken) -> Result<()> {
    *counter += 1;
    if *counter % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
        return Err(IndexError::Aborted);
    }
    Ok(())
}

/// Delivers hits over the sink, honoring the cap and sort direction.
/// The cap always keeps the best end of the order: best-first takes
/// the head, best-last takes the tail.
fn stream_hits(hits: Vec<Hit>, query: &Query, results: &Sender<String>, cancel: &CancelToken) {
    let total = hits.len();
    let cap = if query.max_results == 0 || query.max_results > total {
        total
    } else {
        query.max_results
    };
    let start = if query.no_sort || query.sort_descending {
        0
    } else {
        total - cap
    };

    for hit in hits.into_iter().skip(start).take(cap) {
        if cancel.is_cancelled() {
            debug!("query cancelled during streaming");
            return;
        }
        if results.blocking_send(hit.path).is_err() {
            debug!("result receiver dropped, stopping delivery");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::PathFilter;
    use tokio::sync::mpsc::channel;

    /// Engine with leaves indexed under their basenames, the way the
    /// reconciler populates it.
    fn engine_with(paths: &[&str]) -> IndexEngine {
        let mut engine = IndexEngine::new(PathFilter::allow_all());
        for path in paths {
            let node = engine.tree.add(path);
            let name = path.rsplit('/').next().unwrap();
            engine.names.insert(name, node);
        }
        engine
    }

    fn run(engine: &IndexEngine, query: Query, cancel: CancelToken) -> Vec<String> {
        let (tx, mut rx) = channel(1024);
        engine.search(QueryRequest {
            query,
            results: tx,
            cancel,
        });
        let mut out = Vec::new();
        while let Ok(path) = rx.try_recv() {
            out.push(path);
        }
        out
    }

    fn query(text: &str, mode: QueryMode) -> Query {
        Query {
            text: text.to_string(),
            mode,
            case_insensitive: false,
            no_sort: false,
            sort_descending: false,
            max_results: 0,
        }
    }

    #[test]
    fn test_prefix_query_best_last() {
        let engine = engine_with(&[
            "/home/user/docs/report.txt",
            "/home/user/docs/report_final.txt",
        ]);

        let results = run(&engine, query("report", QueryMode::Prefix), CancelToken::new());
        // Shorter path is the better match and comes out last.
        assert_eq!(
            results,
            vec![
                "/home/user/docs/report_final.txt",
                "/home/user/docs/report.txt"
            ]
        );
    }

    #[test]
    fn test_prefix_query_descending() {
        let engine = engine_with(&[
            "/home/user/docs/report.txt",
            "/home/user/docs/report_final.txt",
        ]);

        let mut q = query("report", QueryMode::Prefix);
        q.sort_descending = true;
        let results = run(&engine, q, CancelToken::new());
        assert_eq!(results[0], "/home/user/docs/report.txt");
    }

    #[test]
    fn test_substring_query() {
        let engine = engine_with(&["/a/my_report_v2", "/b/unrelated.txt"]);

        let results = run(&engine, query("report", QueryMode::Substring), CancelToken::new());
        assert_eq!(results, vec!["/a/my_report_v2"]);
    }

    #[test]
    fn test_substring_case_insensitive() {
        let engine = engine_with(&["/a/README.md"]);

        let mut q = query("readme", QueryMode::Substring);
        assert!(run(&engine, q.clone(), CancelToken::new()).is_empty());
        q.case_insensitive = true;
        assert_eq!(run(&engine, q, CancelToken::new()), vec!["/a/README.md"]);
    }

    #[test]
    fn test_fuzzy_query_ranks_tighter_match_better() {
        let engine = engine_with(&[
            "/home/user/docs/report.txt",
            "/home/user/docs/report_final.txt",
        ]);

        let results = run(&engine, query("rprt", QueryMode::Fuzzy), CancelToken::new());
        // Both match the subsequence; the tighter one is emitted last.
        assert_eq!(
            results,
            vec![
                "/home/user/docs/report_final.txt",
                "/home/user/docs/report.txt"
            ]
        );
    }

    #[test]
    fn test_max_results_keeps_the_best() {
        let engine = engine_with(&[
            "/home/user/docs/report.txt",
            "/home/user/docs/report_final.txt",
        ]);

        // Best-last ordering: the cap takes the tail.
        let mut q = query("report", QueryMode::Prefix);
        q.max_results = 1;
        let results = run(&engine, q, CancelToken::new());
        assert_eq!(results, vec!["/home/user/docs/report.txt"]);

        // Best-first ordering: the cap takes the head.
        let mut q = query("report", QueryMode::Prefix);
        q.max_results = 1;
        q.sort_descending = true;
        let results = run(&engine, q, CancelToken::new());
        assert_eq!(results, vec!["/home/user/docs/report.txt"]);
    }

    #[test]
    fn test_no_sort_skips_ordering_but_still_caps() {
        let engine = engine_with(&["/a/x1", "/a/x2", "/a/x3"]);

        let mut q = query("x", QueryMode::Prefix);
        q.no_sort = true;
        q.max_results = 2;
        let results = run(&engine, q, CancelToken::new());
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_no_match_is_an_empty_stream() {
        let engine = engine_with(&["/a/something"]);
        let results = run(&engine, query("missing", QueryMode::Prefix), CancelToken::new());
        assert!(results.is_empty());
    }

    #[test]
    fn test_cancelled_query_emits_nothing_and_closes() {
        let engine = engine_with(&["/a/report.txt", "/b/report.md"]);

        let cancel = CancelToken::new();
        cancel.cancel();

        let (tx, mut rx) = channel(1024);
        engine.search(QueryRequest {
            query: query("report", QueryMode::Prefix),
            results: tx,
            cancel,
        });

        // Sender dropped, nothing delivered: the channel reports closed.
        assert!(rx.blocking_recv().is_none());
    }

    #[test]
    fn test_dropped_receiver_stops_delivery() {
        let engine = engine_with(&["/a/report.txt"]);

        let (tx, rx) = channel(1);
        drop(rx);
        // Must return instead of blocking on a channel no one reads.
        engine.search(QueryRequest {
            query: query("report", QueryMode::Prefix),
            results: tx,
            cancel: CancelToken::new(),
        });
    }
}
