use crate::Async;
use futures_core::stream::Stream;
use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stream helpers for watching effect state.
pub trait EffectStreamExt: Stream {
    /// Yields items until one matches `test`; that item is yielded too and
    /// the stream ends after it.
    ///
    /// ```
    /// use effectrx::EffectStreamExt;
    /// use futures_signals::signal::{always, SignalExt};
    ///
    /// async fn example() {
    ///     let stream = always(0).to_stream().stop_if(|&value| value == 0);
    ///     // ends after the first item
    /// }
    /// ```
    fn stop_if<F>(self, test: F) -> StopIf<Self, F>
    where
        F: FnMut(&Self::Item) -> bool,
        Self: Sized,
    {
        StopIf {
            stream: self,
            stopped: false,
            test,
        }
    }

    /// Ends after the first state that is ready or failed.
    fn until_settled<T>(self) -> StopIf<Self, fn(&Async<T>) -> bool>
    where
        Self: Stream<Item = Async<T>> + Sized,
    {
        self.stop_if(Async::<T>::is_complete as fn(&Async<T>) -> bool)
    }
}

impl<S: ?Sized> EffectStreamExt for S where S: Stream {}

#[pin_project(project = StopIfProj)]
#[derive(Debug)]
#[must_use = "Streams do nothing unless polled"]
pub struct StopIf<S, F> {
    #[pin]
    stream: S,
    stopped: bool,
    test: F,
}

impl<S, F> Stream for StopIf<S, F>
where
    S: Stream,
    F: FnMut(&S::Item) -> bool,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let StopIfProj {
            stream,
            stopped,
            test,
        } = self.project();

        if *stopped {
            return Poll::Ready(None);
        }
        match stream.poll_next(cx) {
            Poll::Ready(Some(item)) => {
                *stopped = test(&item);
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                *stopped = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
