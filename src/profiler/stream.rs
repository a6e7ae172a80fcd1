use std::pin::Pin;
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread;

use futures::Stream;

use super::Profiler;
use crate::error::Result;
use crate::rb::{Mode, Reader, Samples};

/// Stream of profile chunks, ending after the end-of-stream chunk.
///
/// Created by [`Profiler::samples`]. Each stream owns a helper thread that
/// waits on the log for it. The thread exits once the stream is dropped and
/// the log has data or is closed, so dropping a stream while profiling stays
/// idle keeps it parked until [`Profiler::stop`].
pub struct SampleStream<'a, T> {
    profiler: &'a Profiler<T>,
    reader: Arc<Reader>,
    waker: SyncSender<Waker>,
    done: bool,
}

impl<'a, T> SampleStream<'a, T> {
    pub(super) fn new(profiler: &'a Profiler<T>, reader: Arc<Reader>) -> Self {
        let (tx, rx) = sync_channel::<Waker>(1);

        // The log can only be waited on by blocking a thread.
        let log = Arc::clone(&reader);
        thread::spawn(move || {
            while let Ok(waker) = rx.recv() {
                log.wait();
                waker.wake();
            }
        });

        Self {
            profiler,
            reader,
            waker: tx,
            done: false,
        }
    }
}

impl<T> Stream for SampleStream<'_, T> {
    type Item = Result<Samples>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let samples = match this.reader.read(Mode::NonBlocking) {
            Ok(chunk) => chunk.into_owned(),
            Err(e) => return Poll::Ready(Some(Err(e))),
        };

        if samples.is_empty() && !samples.eof {
            return match this.waker.try_send(cx.waker().clone()) {
                // A waker is already queued for this stream.
                Ok(()) | Err(TrySendError::Full(_)) => Poll::Pending,
                // The waiting thread died, nothing more will arrive.
                Err(TrySendError::Disconnected(_)) => Poll::Ready(None),
            };
        }

        if samples.is_empty() && samples.eof {
            this.done = true;
            this.profiler.finish(&this.reader);
        }
        Poll::Ready(Some(Ok(samples)))
    }
}
