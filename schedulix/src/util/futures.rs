//! Internal future primitives.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Returns a future that yields control back to the executor exactly once
/// before completing.
pub(crate) fn yield_now() -> YieldNow {
    YieldNow { was_polled: false }
}

/// Future returned by [`yield_now`].
#[derive(Debug)]
pub(crate) struct YieldNow {
    was_polled: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.was_polled {
            return Poll::Ready(());
        }
        self.was_polled = true;
        cx.waker().wake_by_ref();

        Poll::Pending
    }
}
