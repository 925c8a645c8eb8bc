// # Position change stream
//
// Adapts the callback-style listener contract into an async stream for
// front-ends that push live updates.
//
// ```rust,ignore
// use tokio_stream::StreamExt;
//
// let mut changes = shutter_core::position_changes(&shutter);
// while let Some(position) = changes.next().await {
//     println!("{} is now at {}", shutter.name(), position);
// }
// ```

use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::position::Position;
use crate::traits::{Listener, Shutter};

/// Stream of the shutter's position after every change notification
///
/// The listener holds only a weak reference, so the stream never keeps the
/// shutter alive. Dropping the stream unregisters its listener.
pub fn position_changes<S>(shutter: &Arc<S>) -> PositionChanges<S>
where
    S: Shutter + ?Sized + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let weak = Arc::downgrade(shutter);

    let listener: Listener = {
        let weak = Weak::clone(&weak);
        Arc::new(move || {
            let Some(shutter) = weak.upgrade() else {
                return;
            };
            if let Ok(position) = shutter.position() {
                // Receiver dropped: the stream is being torn down
                let _ = tx.send(position);
            }
        })
    };
    shutter.add_listener(Arc::clone(&listener));

    PositionChanges {
        shutter: weak,
        listener,
        inner: UnboundedReceiverStream::new(rx),
    }
}

/// Stream returned by [`position_changes`]
pub struct PositionChanges<S: Shutter + ?Sized + 'static> {
    shutter: Weak<S>,
    listener: Listener,
    inner: UnboundedReceiverStream<Position>,
}

impl<S: Shutter + ?Sized + 'static> Stream for PositionChanges<S> {
    type Item = Position;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Position>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<S: Shutter + ?Sized + 'static> Drop for PositionChanges<S> {
    fn drop(&mut self) {
        if let Some(shutter) = self.shutter.upgrade() {
            shutter.remove_listener(&self.listener);
        }
    }
}
