use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;

use anyhow::anyhow;
use tokio::sync::oneshot;

use crate::{Error, Result};

fn worker_lost() -> Error {
    Error::internal(anyhow!("Query worker thread terminated without a reply."))
}

/// Handle to a query running on its own thread.
///
/// Either block on it with [`PendingQuery::wait`] or `.await` it. There is no
/// cancellation: dropping the handle lets the query run to completion.
/// The owning session has to stay connected until the handle resolved.
pub struct PendingQuery<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T: Send + 'static> PendingQuery<T> {
    pub(crate) fn spawn<F>(job: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        thread::spawn(move || {
            let _ = tx.send(job());
        });
        PendingQuery { rx }
    }

    pub(crate) fn ready(result: Result<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        PendingQuery { rx }
    }

    /// Block the calling thread until the query finished.
    ///
    /// Must not be called from within an async runtime, use `.await` there.
    pub fn wait(self) -> Result<T> {
        self.rx.blocking_recv().map_err(|_| worker_lost())?
    }
}

impl<T> Future for PendingQuery<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(ret)) => Poll::Ready(ret),
            Poll::Ready(Err(_)) => Poll::Ready(Err(worker_lost())),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn wait_returns_result() {
        let pending = PendingQuery::spawn(|| Ok(42_u32));
        assert_eq!(pending.wait().unwrap(), 42);
    }

    #[tokio::test]
    async fn await_returns_error() {
        let pending: PendingQuery<u32> = PendingQuery::spawn(|| Err(Error::instrument("boom")));
        assert_eq!(pending.await.unwrap_err().kind(), ErrorKind::Instrument);
    }

    #[test]
    fn panicking_worker_is_internal_error() {
        let pending: PendingQuery<u32> = PendingQuery::spawn(|| panic!("worker died"));
        assert_eq!(pending.wait().unwrap_err().kind(), ErrorKind::Internal);
    }
}
