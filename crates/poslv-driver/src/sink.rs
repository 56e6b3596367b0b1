//! Output channels for decoded samples.
//!
//! The pipeline owns one sink per sample type. Anything that can accept a
//! sample can be a sink: a `Vec`, an `mpsc` sender, a closure, or (with the
//! `async` feature) a tokio `mpsc`/`broadcast` sender.

/// The receiving side of a sink has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("sink closed")]
pub struct SinkClosed;

/// Accepts decoded samples of type `T`.
pub trait Sink<T> {
    fn publish(&mut self, item: T) -> Result<(), SinkClosed>;
}

impl<T> Sink<T> for Vec<T> {
    fn publish(&mut self, item: T) -> Result<(), SinkClosed> {
        self.push(item);
        Ok(())
    }
}

impl<T> Sink<T> for std::sync::mpsc::Sender<T> {
    fn publish(&mut self, item: T) -> Result<(), SinkClosed> {
        self.send(item).map_err(|_| SinkClosed)
    }
}

impl<T> Sink<T> for std::sync::mpsc::SyncSender<T> {
    fn publish(&mut self, item: T) -> Result<(), SinkClosed> {
        self.send(item).map_err(|_| SinkClosed)
    }
}

impl<T, S: Sink<T> + ?Sized> Sink<T> for &mut S {
    fn publish(&mut self, item: T) -> Result<(), SinkClosed> {
        (**self).publish(item)
    }
}

impl<T, S: Sink<T> + ?Sized> Sink<T> for Box<S> {
    fn publish(&mut self, item: T) -> Result<(), SinkClosed> {
        (**self).publish(item)
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<T, F: FnMut(T)> Sink<T> for FnSink<F> {
    fn publish(&mut self, item: T) -> Result<(), SinkClosed> {
        (self.0)(item);
        Ok(())
    }
}

/// Drops every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl<T> Sink<T> for Discard {
    fn publish(&mut self, _item: T) -> Result<(), SinkClosed> {
        Ok(())
    }
}

#[cfg(feature = "async")]
impl<T> Sink<T> for tokio::sync::mpsc::UnboundedSender<T> {
    fn publish(&mut self, item: T) -> Result<(), SinkClosed> {
        self.send(item).map_err(|_| SinkClosed)
    }
}

/// Publish/subscribe: having no subscribers right now is not an error.
#[cfg(feature = "async")]
impl<T> Sink<T> for tokio::sync::broadcast::Sender<T> {
    fn publish(&mut self, item: T) -> Result<(), SinkClosed> {
        if self.send(item).is_err() {
            tracing::trace!("no subscribers; sample dropped");
        }
        Ok(())
    }
}
