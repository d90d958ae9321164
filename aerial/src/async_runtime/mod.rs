use std::future::Future;

use tokio::task::JoinHandle;

/// Spawns a future on the tokio runtime of the caller.
pub fn spawn<T>(future: T) -> JoinHandle<T::Output>
where
    T: Future + Send + 'static,
    T::Output: Send + 'static,
{
    tokio::spawn(future)
}

/// Runs blocking file system work on the blocking thread pool and waits for its result.
pub async fn run_blocking<F, R>(f: F) -> Option<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => Some(result),
        Err(err) => {
            log::warn!("Blocking task failed: {err}");
            None
        }
    }
}

/// Runs blocking file system work on the blocking thread pool without waiting for it.
pub fn spawn_blocking<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    tokio::task::spawn_blocking(f);
}
