use std::{error::Error, future::Future, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("concurrency conflict")]
pub struct ConflictError;

const MAX_RETRIES: u64 = 10;

/// This function implements a retry loop for concurrency conflicts. It will keep retrying the
/// callback as long as the callback returns an error whose chain includes [`ConflictError`]. If
/// [`MAX_RETRIES`] are exceeded, the last error is returned to the caller as-is.
pub async fn retry_loop<F: Future<Output = Result<T, E>>, T, E: Error + 'static>(
    mut cb: impl FnMut() -> F,
) -> Result<T, E> {
    for i in 1..MAX_RETRIES {
        match cb().await {
            Ok(result) => return Ok(result),
            Err(e) if is_conflict(Some(&e)) => {
                let timeout = Duration::from_millis(i * 25);
                log::info!("got a conflict error, sleeping for {:?}", timeout);
                tokio::time::sleep(timeout).await;
            }
            Err(e) => return Err(e),
        }
    }
    cb().await
}

fn is_conflict(e: Option<&(dyn Error + 'static)>) -> bool {
    e.map(|e| e.is::<ConflictError>() || is_conflict(e.source()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("conflict")]
        Conflict(#[from] ConflictError),
        #[error("fatal")]
        Fatal,
    }

    #[tokio::test]
    async fn retries_until_conflict_resolves() {
        let attempts = Cell::new(0);
        let result: Result<u64, TestError> = retry_loop(|| async {
            attempts.set(attempts.get() + 1);
            if attempts.get() < 3 {
                Err(ConflictError.into())
            } else {
                Ok(attempts.get())
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_other_errors() {
        let attempts = Cell::new(0);
        let result: Result<(), TestError> = retry_loop(|| async {
            attempts.set(attempts.get() + 1);
            Err(TestError::Fatal)
        })
        .await;
        assert!(matches!(result, Err(TestError::Fatal)));
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_the_bound() {
        let attempts = Cell::new(0u64);
        let result: Result<(), TestError> = retry_loop(|| async {
            attempts.set(attempts.get() + 1);
            Err(ConflictError.into())
        })
        .await;
        assert!(matches!(result, Err(TestError::Conflict(_))));
        assert_eq!(attempts.get(), MAX_RETRIES);
    }
}
