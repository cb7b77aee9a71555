//! Generic suspend-until-condition primitive.
//!
//! Every wait in the scrape flow (selector appearance, the post-login
//! redirect, the client app global, the balance element) goes through
//! [`wait_until`] so timeout behavior is uniform.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum WaitError {
    /// The deadline elapsed before the predicate turned true.
    #[error("timed out after {timeout:?} {description}")]
    Timeout {
        description: String,
        timeout: Duration,
    },
    /// The predicate itself failed; its error wins over the deadline.
    #[error(transparent)]
    Predicate(#[from] anyhow::Error),
}

/// Poll `predicate` every `poll_interval` until it resolves `true`, the
/// predicate fails, or `timeout` elapses.
///
/// The deadline is raced against the poll loop via [`tokio::time::timeout`],
/// so the timer is dropped as soon as the predicate succeeds. `description`
/// only surfaces in the timeout error.
pub async fn wait_until<F, Fut>(
    mut predicate: F,
    description: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    let poll = async {
        loop {
            if predicate().await? {
                break Ok(());
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(WaitError::Predicate(err)),
        Err(_) => Err(WaitError::Timeout {
            description: description.to_string(),
            timeout,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn resolves_once_predicate_turns_true() {
        let polls = AtomicUsize::new(0);

        let result = wait_until(
            || {
                let seen = polls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(seen >= 2) }
            },
            "waiting for the third poll",
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn resolves_immediately_when_already_true() {
        let result = wait_until(
            || async { Ok(true) },
            "already satisfied",
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn times_out_with_the_supplied_description() {
        let result = wait_until(
            || async { Ok(false) },
            "waiting for something that never happens",
            Duration::from_millis(60),
            Duration::from_millis(10),
        )
        .await;

        match result {
            Err(WaitError::Timeout { description, .. }) => {
                assert_eq!(description, "waiting for something that never happens");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn predicate_error_wins_over_the_deadline() {
        let result = wait_until(
            || async { Err(anyhow::anyhow!("boom")) },
            "waiting on a broken predicate",
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .await;

        match result {
            Err(WaitError::Predicate(err)) => assert_eq!(err.to_string(), "boom"),
            other => panic!("expected predicate error, got {other:?}"),
        }
    }
}
