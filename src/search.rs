use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::digest;

/// Default number of attempts per batch. Balances throughput against how
/// quickly a stop request becomes observable; not a correctness requirement.
pub const DEFAULT_BATCH_SIZE: u64 = 5000;

/// State of one search. Owned exclusively by a `SearchLoop` and mutated
/// only between yield points.
#[derive(Debug, Clone)]
pub struct SearchState {
    /// Fixed data string fed to the hash ahead of the nonce
    pub prefix: String,

    /// The string of zero characters a matching digest must start with
    pub target_prefix: String,

    /// Next nonce to attempt
    pub nonce: u64,

    /// Total attempts made since the last start
    pub total_attempts: u64,

    /// True while a search is active
    pub running: bool,

    /// When the current search started
    pub started_at: Option<Instant>,
}

impl SearchState {
    /// Time since the current search started
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }
}

/// Result of a single attempt
#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub nonce: u64,
    pub digest_hex: String,
    pub matched: bool,
}

/// Result of one batch of attempts
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub found: bool,
    pub nonce: Option<u64>,
    pub digest_hex: Option<String>,

    /// Attempts consumed by this batch (offset+1 on a match, the full
    /// batch size otherwise)
    pub attempts: u64,
}

/// Events emitted to the display side
#[derive(Debug, Clone)]
pub enum SearchEvent {
    Progress {
        nonce: u64,
        total_attempts: u64,
        /// Digest at the new nonce, computed for display only
        last_digest: String,
    },
    Found {
        nonce: u64,
        digest_hex: String,
        total_attempts: u64,
    },
}

/// Brute-force search loop: attempts nonces in strictly increasing order
/// from 0, in fixed-size batches, until the digest of prefix+nonce starts
/// with the target prefix or the stop flag is raised.
///
/// Only one search may be active per instance; `run` takes `&mut self`.
pub struct SearchLoop {
    state: SearchState,
    batch_size: u64,
    stop: Arc<AtomicBool>,
    events: Option<mpsc::Sender<SearchEvent>>,
}

impl SearchLoop {
    pub fn new(prefix: impl Into<String>, difficulty: u32, batch_size: u64) -> Self {
        Self {
            state: SearchState {
                prefix: prefix.into(),
                target_prefix: "0".repeat(difficulty as usize),
                nonce: 0,
                total_attempts: 0,
                running: false,
                started_at: None,
            },
            batch_size: batch_size.max(1),
            stop: Arc::new(AtomicBool::new(false)),
            events: None,
        }
    }

    /// Attach a channel for progress/found events
    pub fn with_events(mut self, tx: mpsc::Sender<SearchEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Flag that cancels the search at the next batch boundary
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Reset counters and mark the search as running. Begins a fresh
    /// search regardless of any previous completed or stopped one; a stop
    /// request left over from an earlier run is cleared.
    pub fn start(&mut self) {
        self.state.nonce = 0;
        self.state.total_attempts = 0;
        self.state.running = true;
        self.state.started_at = Some(Instant::now());
        self.stop.store(false, Ordering::SeqCst);

        tracing::debug!(
            prefix = %self.state.prefix,
            target = %self.state.target_prefix,
            batch_size = self.batch_size,
            "search started"
        );
    }

    /// Run one batch of sequential attempts.
    ///
    /// On a match at offset i, total_attempts advances by i+1, the state
    /// nonce is left at the matching value and running becomes false.
    /// Otherwise both nonce and total_attempts advance by the batch size.
    /// The stop flag is not checked here; a batch runs to completion or to
    /// a match.
    pub fn attempt_batch(&mut self) -> BatchResult {
        for i in 0..self.batch_size {
            let candidate = self.state.nonce.wrapping_add(i);
            let digest_hex = digest::attempt_digest(&self.state.prefix, candidate);
            // Plain case-sensitive prefix equality over the hex alphabet,
            // not a numeric leading-zero-bits comparison
            let matched = digest_hex.starts_with(&self.state.target_prefix);

            if matched {
                let attempt = AttemptResult {
                    nonce: candidate,
                    digest_hex,
                    matched,
                };
                self.state.total_attempts += i + 1;
                self.state.nonce = attempt.nonce;
                self.state.running = false;
                return BatchResult {
                    found: true,
                    nonce: Some(attempt.nonce),
                    digest_hex: Some(attempt.digest_hex),
                    attempts: i + 1,
                };
            }
        }

        self.state.nonce = self.state.nonce.wrapping_add(self.batch_size);
        self.state.total_attempts += self.batch_size;

        BatchResult {
            found: false,
            nonce: None,
            digest_hex: None,
            attempts: self.batch_size,
        }
    }

    /// Drive the search to completion or cancellation.
    ///
    /// Control returns to the scheduler after every batch so that a stop
    /// request raised from another task becomes observable within one
    /// batch boundary.
    pub async fn run(&mut self) -> Option<AttemptResult> {
        self.start();

        loop {
            if self.stop.load(Ordering::SeqCst) {
                self.state.running = false;
                tracing::info!(
                    nonce = self.state.nonce,
                    total_attempts = self.state.total_attempts,
                    "search stopped at batch boundary"
                );
                return None;
            }

            let batch = self.attempt_batch();

            if batch.found {
                let nonce = batch.nonce.unwrap_or_default();
                let digest_hex = batch.digest_hex.unwrap_or_default();

                tracing::info!(
                    nonce,
                    digest = %digest_hex,
                    elapsed_secs = self.state.elapsed().as_secs_f64(),
                    "match found"
                );

                if let Some(tx) = &self.events {
                    let _ = tx
                        .send(SearchEvent::Found {
                            nonce,
                            digest_hex: digest_hex.clone(),
                            total_attempts: self.state.total_attempts,
                        })
                        .await;
                }

                return Some(AttemptResult {
                    nonce,
                    digest_hex,
                    matched: true,
                });
            }

            // Extra digest at the new nonce, display only
            if let Some(tx) = &self.events {
                let last_digest = digest::attempt_digest(&self.state.prefix, self.state.nonce);
                let _ = tx
                    .send(SearchEvent::Progress {
                        nonce: self.state.nonce,
                        total_attempts: self.state.total_attempts,
                        last_digest,
                    })
                    .await;
            }

            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::attempt_digest;

    #[test]
    fn test_difficulty_zero_matches_immediately() {
        // Every string starts with the empty target prefix
        let mut search = SearchLoop::new("hello", 0, DEFAULT_BATCH_SIZE);
        search.start();
        let batch = search.attempt_batch();

        assert!(batch.found);
        assert_eq!(batch.nonce, Some(0));
        assert_eq!(batch.attempts, 1);
        assert_eq!(batch.digest_hex.unwrap(), attempt_digest("hello", 0));
        assert_eq!(search.state().total_attempts, 1);
        assert!(!search.state().running);
    }

    #[test]
    fn test_finds_minimal_nonce() {
        // sha256("hello28") = 02a13c40... is the first digest with a
        // leading zero for this prefix
        let mut search = SearchLoop::new("hello", 1, DEFAULT_BATCH_SIZE);
        search.start();
        let batch = search.attempt_batch();

        assert!(batch.found);
        assert_eq!(batch.nonce, Some(28));
        assert_eq!(
            batch.digest_hex.as_deref(),
            Some("02a13c40ba00dc0fb199d3cbe5b01be59d937775890243fd411bdf001935ffc8")
        );

        // Minimality: no earlier nonce passes the prefix test
        for n in 0u64..28 {
            assert!(
                !attempt_digest("hello", n).starts_with('0'),
                "nonce {} should not match",
                n
            );
        }
    }

    #[test]
    fn test_batch_accounting_across_batches() {
        // sha256("abc252") is the first digest starting with "00"; with a
        // batch size of 100 the match lands in the third batch at offset 52
        let mut search = SearchLoop::new("abc", 2, 100);
        search.start();

        let b1 = search.attempt_batch();
        assert!(!b1.found);
        assert_eq!(search.state().nonce, 100);
        assert_eq!(search.state().total_attempts, 100);
        assert!(search.state().running);

        let b2 = search.attempt_batch();
        assert!(!b2.found);
        assert_eq!(search.state().nonce, 200);
        assert_eq!(search.state().total_attempts, 200);

        let b3 = search.attempt_batch();
        assert!(b3.found);
        assert_eq!(b3.nonce, Some(252));
        assert_eq!(b3.attempts, 53);
        assert_eq!(search.state().nonce, 252);
        assert_eq!(search.state().total_attempts, 253);
        assert!(!search.state().running);
    }

    #[test]
    fn test_found_digest_matches_recomputation() {
        let mut search = SearchLoop::new("abc", 2, 100);
        search.start();
        loop {
            let batch = search.attempt_batch();
            if batch.found {
                let nonce = batch.nonce.unwrap();
                assert_eq!(batch.digest_hex.unwrap(), attempt_digest("abc", nonce));
                assert!(attempt_digest("abc", nonce).starts_with("00"));
                break;
            }
        }
    }

    #[test]
    fn test_restart_resets_counters() {
        let mut search = SearchLoop::new("hello", 1, DEFAULT_BATCH_SIZE);
        search.start();
        let batch = search.attempt_batch();
        assert!(batch.found);
        assert_eq!(search.state().total_attempts, 29);

        search.start();
        assert_eq!(search.state().nonce, 0);
        assert_eq!(search.state().total_attempts, 0);
        assert!(search.state().running);

        // Same search finds the same nonce again
        let batch = search.attempt_batch();
        assert_eq!(batch.nonce, Some(28));
    }

    #[test]
    fn test_impossible_difficulty_never_matches() {
        // 65 zero characters can never prefix a 64-character digest;
        // bounded number of batches here, the core itself has no ceiling
        let mut search = SearchLoop::new("hello", 65, 500);
        search.start();
        for _ in 0..4 {
            let batch = search.attempt_batch();
            assert!(!batch.found);
        }
        assert_eq!(search.state().total_attempts, 2000);
        assert!(search.state().running);
    }

    #[test]
    fn test_empty_prefix_search() {
        // sha256("39") = 0b9189... is the first leading-zero digest for
        // the empty prefix
        let mut search = SearchLoop::new("", 1, DEFAULT_BATCH_SIZE);
        search.start();
        let batch = search.attempt_batch();
        assert!(batch.found);
        assert_eq!(batch.nonce, Some(39));
    }

    #[tokio::test]
    async fn test_run_finds_match() {
        // sha256("hello227") = 001b9254... is the first "00" digest for
        // this prefix; with batch size 50 the match consumes 28 attempts
        // of its batch (200..=227)
        let mut search = SearchLoop::new("hello", 2, 50);
        let result = search.run().await.expect("search should find a match");

        assert_eq!(result.nonce, 227);
        assert!(result.matched);
        assert!(result.digest_hex.starts_with("00"));
        assert!(!search.state().running);
        assert_eq!(search.state().total_attempts, 228);
    }

    #[tokio::test]
    async fn test_stop_flag_cancels_run() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut search = SearchLoop::new("hello", 65, 100).with_events(tx);
        let stop = search.stop_flag();

        let handle = tokio::spawn(async move {
            let result = search.run().await;
            (result, search)
        });

        // Wait for a progress event so the run is past start() (which
        // clears the flag), then request the stop. Dropping the receiver
        // keeps the sender from blocking on a full channel.
        let _ = rx.recv().await.expect("search should report progress");
        stop.store(true, Ordering::SeqCst);
        drop(rx);

        let (result, search) = handle.await.unwrap();
        assert!(result.is_none());
        assert!(!search.state().running);

        // Stopped at a batch boundary: whole batches only, no partial
        // advancement past the stop
        assert_eq!(search.state().nonce % 100, 0);
        assert_eq!(search.state().total_attempts, search.state().nonce);
        assert!(search.state().total_attempts >= 100);
    }
}
