//! Submission loop: one accepted broadcast per nonce, in order

use super::{RetryPolicy, Submit};
use crate::error::{MintError, MintResult};
use crate::tx::NonceCursor;

use ethers::types::H256;
use tracing::{debug, error, info};

/// Upper bound on hashes reserved up front; longer runs grow the vector
const MAX_PREALLOCATED_HASHES: u64 = 1024;

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintSummary {
    /// First nonce used
    pub start_nonce: u64,
    /// Nonce the next run would start from
    pub next_nonce: u64,
    /// Hashes of accepted broadcasts, in nonce order
    pub tx_hashes: Vec<H256>,
    /// Attempts that returned an error
    pub failed_attempts: u64,
}

/// Drives a [`Submit`] implementation through a contiguous nonce range
pub struct SubmissionEngine<S> {
    submitter: S,
    policy: RetryPolicy,
}

impl<S: Submit> SubmissionEngine<S> {
    pub fn new(submitter: S, policy: RetryPolicy) -> Self {
        Self { submitter, policy }
    }

    /// Perform `count` mints starting at `start_nonce`.
    ///
    /// Returns only after `count` accepted broadcasts, or with an error if the
    /// retry policy gives up on a nonce.
    pub async fn run(&self, start_nonce: u64, count: u64) -> MintResult<MintSummary> {
        let mut cursor = NonceCursor::new(start_nonce);
        let mut summary = MintSummary {
            start_nonce,
            next_nonce: start_nonce,
            tx_hashes: Vec::with_capacity(count.min(MAX_PREALLOCATED_HASHES) as usize),
            failed_attempts: 0,
        };

        info!("Minting {} inscriptions from nonce {}", count, start_nonce);

        for i in 0..count {
            let tx_hash = self
                .submit_until_accepted(cursor.current(), &mut summary.failed_attempts)
                .await?;

            summary.tx_hashes.push(tx_hash);
            cursor.advance()?;
            summary.next_nonce = cursor.current();
            crate::metrics::record_nonce(cursor.current());

            debug!("Mint {}/{} accepted, next nonce {}", i + 1, count, cursor.current());
        }

        info!(
            "Minted {} inscriptions, nonces {}..{}, {} failed attempts",
            cursor.issued(),
            cursor.start(),
            summary.next_nonce,
            summary.failed_attempts
        );

        Ok(summary)
    }

    /// Retry a single nonce until it is accepted or the policy gives up
    async fn submit_until_accepted(&self, nonce: u64, failed: &mut u64) -> MintResult<H256> {
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            info!(nonce, attempt = attempts, "Submitting mint");
            crate::metrics::record_attempt();

            let err = match self.submitter.submit(nonce).await {
                Ok(tx_hash) => {
                    crate::metrics::record_success();
                    return Ok(tx_hash);
                }
                Err(e) => e,
            };

            error!("{}", err);
            *failed += 1;
            crate::metrics::record_failure(&err);

            if self.policy.fail_fast_on_config && err.is_config_error() {
                return Err(err);
            }

            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    return Err(MintError::RetriesExhausted { nonce, attempts });
                }
            }

            if self.policy.delay.is_zero() {
                // Keep the task cancellable when retrying back to back
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::MockSubmit;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock that records every nonce it sees and answers from `outcome`
    fn recording_submitter<F>(outcome: F) -> (MockSubmit, Arc<Mutex<Vec<u64>>>)
    where
        F: Fn(u64, usize) -> MintResult<H256> + Send + 'static,
    {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        let mut submitter = MockSubmit::new();
        submitter.expect_submit().returning(move |nonce| {
            let mut log = log.lock().unwrap();
            log.push(nonce);
            outcome(nonce, log.len())
        });

        (submitter, seen)
    }

    fn hash_for(nonce: u64) -> H256 {
        H256::from_low_u64_be(nonce)
    }

    #[tokio::test]
    async fn test_all_success_uses_contiguous_nonces() {
        let (submitter, seen) = recording_submitter(|nonce, _| Ok(hash_for(nonce)));
        let engine = SubmissionEngine::new(submitter, RetryPolicy::default());

        let summary = engine.run(100, 3).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![100, 101, 102]);
        assert_eq!(summary.start_nonce, 100);
        assert_eq!(summary.next_nonce, 103);
        assert_eq!(
            summary.tx_hashes,
            vec![hash_for(100), hash_for(101), hash_for(102)]
        );
        assert_eq!(summary.failed_attempts, 0);
    }

    #[tokio::test]
    async fn test_zero_count_submits_nothing() {
        let mut submitter = MockSubmit::new();
        submitter.expect_submit().never();
        let engine = SubmissionEngine::new(submitter, RetryPolicy::default());

        let summary = engine.run(9, 0).await.unwrap();
        assert_eq!(summary.next_nonce, 9);
        assert!(summary.tx_hashes.is_empty());
    }

    #[tokio::test]
    async fn test_failed_nonce_is_retried_before_advancing() {
        let (submitter, seen) = recording_submitter(|nonce, call| {
            if call <= 2 {
                Err(MintError::Broadcast("replacement transaction underpriced".into()))
            } else {
                Ok(hash_for(nonce))
            }
        });
        let engine = SubmissionEngine::new(submitter, RetryPolicy::default());

        let summary = engine.run(5, 2).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![5, 5, 5, 6]);
        assert_eq!(summary.tx_hashes, vec![hash_for(5), hash_for(6)]);
        assert_eq!(summary.failed_attempts, 2);
        assert_eq!(summary.next_nonce, 7);
    }

    #[tokio::test]
    async fn test_persistent_rejection_never_advances() {
        let (submitter, seen) =
            recording_submitter(|_, _| Err(MintError::Broadcast("nonce too low".into())));
        let engine = SubmissionEngine::new(submitter, RetryPolicy::default());

        let result = tokio::time::timeout(Duration::from_millis(50), engine.run(12, 1)).await;
        assert!(result.is_err(), "run should still be retrying");

        let seen = seen.lock().unwrap();
        assert!(seen.len() > 1);
        assert!(seen.iter().all(|&nonce| nonce == 12));
    }

    #[tokio::test]
    async fn test_config_errors_retry_by_default() {
        let (submitter, seen) = recording_submitter(|nonce, call| {
            if call == 1 {
                Err(MintError::Key("odd number of digits".into()))
            } else {
                Ok(hash_for(nonce))
            }
        });
        let engine = SubmissionEngine::new(submitter, RetryPolicy::default());

        engine.run(0, 1).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0, 0]);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_on_config_error() {
        let (submitter, seen) =
            recording_submitter(|_, _| Err(MintError::Key("odd number of digits".into())));
        let policy = RetryPolicy {
            fail_fast_on_config: true,
            ..RetryPolicy::default()
        };
        let engine = SubmissionEngine::new(submitter, policy);

        let err = engine.run(0, 3).await.unwrap_err();
        assert!(matches!(err, MintError::Key(_)));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_fast_still_retries_transient_errors() {
        let (submitter, seen) = recording_submitter(|nonce, call| {
            if call == 1 {
                Err(MintError::ChainConnection("connection reset".into()))
            } else {
                Ok(hash_for(nonce))
            }
        });
        let policy = RetryPolicy {
            fail_fast_on_config: true,
            ..RetryPolicy::default()
        };
        let engine = SubmissionEngine::new(submitter, policy);

        engine.run(4, 1).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![4, 4]);
    }

    #[tokio::test]
    async fn test_huge_count_does_not_reserve_upfront() {
        let (submitter, seen) =
            recording_submitter(|_, _| Err(MintError::Broadcast("nonce too low".into())));
        let policy = RetryPolicy {
            max_attempts: Some(1),
            ..RetryPolicy::default()
        };
        let engine = SubmissionEngine::new(submitter, policy);

        let err = engine.run(0, 1u64 << 40).await.unwrap_err();
        assert!(matches!(
            err,
            MintError::RetriesExhausted {
                nonce: 0,
                attempts: 1
            }
        ));
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_nonce_overflow_stops_the_run() {
        let (submitter, seen) = recording_submitter(|nonce, _| Ok(hash_for(nonce)));
        let engine = SubmissionEngine::new(submitter, RetryPolicy::default());

        let err = engine.run(u64::MAX, 2).await.unwrap_err();
        assert!(matches!(err, MintError::Nonce(_)));
        assert_eq!(*seen.lock().unwrap(), vec![u64::MAX]);
    }

    #[tokio::test]
    async fn test_max_attempts_gives_up_on_nonce() {
        let (submitter, seen) =
            recording_submitter(|_, _| Err(MintError::GasPrice("rate limited".into())));
        let policy = RetryPolicy {
            delay: Duration::from_millis(1),
            max_attempts: Some(3),
            fail_fast_on_config: false,
        };
        let engine = SubmissionEngine::new(submitter, policy);

        let err = engine.run(20, 2).await.unwrap_err();
        assert!(matches!(
            err,
            MintError::RetriesExhausted {
                nonce: 20,
                attempts: 3
            }
        ));
        assert_eq!(*seen.lock().unwrap(), vec![20, 20, 20]);
    }
}
