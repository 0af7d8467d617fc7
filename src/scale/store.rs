//! Durable storage for the font scale.
//!
//! A store holds one float under [`FONT_SCALE_KEY`]. Readers subscribe with
//! [`ScalePreferenceStore::observe`] and get the current value first, then
//! every later write made through any handle to the same store. The store
//! does not clamp; that is the state's job.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{oneshot, watch};

use super::bounds::DEFAULT_SCALE;
use super::error::StoreError;

/// Key of the persisted record.
pub const FONT_SCALE_KEY: &str = "font_scale";

/// Completion of a [`ScalePreferenceStore::save`] call.
pub type SaveFuture = Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'static>>;

pub trait ScalePreferenceStore: Send + Sync + 'static {
    /// Subscribe to the stored value.
    fn observe(&self) -> ScaleStream;

    /// Persist `value`, overwriting the previous one.
    ///
    /// The returned future resolves only after the value is durable, and
    /// subscribers are notified before it resolves. Failures are returned
    /// as-is; retrying is up to the caller.
    fn save(&self, value: f32) -> SaveFuture;
}

impl<S: ScalePreferenceStore + ?Sized> ScalePreferenceStore for Arc<S> {
    fn observe(&self) -> ScaleStream {
        (**self).observe()
    }

    fn save(&self, value: f32) -> SaveFuture {
        (**self).save(value)
    }
}

/// Stream of stored values.
///
/// Yields the value current at subscription immediately, then the latest
/// value after each write. Values are never reordered; a subscriber that
/// falls behind skips straight to the newest one. Dropping the stream ends
/// the subscription.
///
/// A backend whose observation can break attaches a failure channel with
/// [`with_failure`](Self::with_failure); a failure sent on it is yielded once
/// as an `Err` item, after which values keep flowing while the store lives.
pub struct ScaleStream {
    receiver: watch::Receiver<f32>,
    failure: Option<oneshot::Receiver<StoreError>>,
    primed: bool,
}

impl ScaleStream {
    pub fn new(receiver: watch::Receiver<f32>) -> Self {
        Self {
            receiver,
            failure: None,
            primed: false,
        }
    }

    pub fn with_failure(
        receiver: watch::Receiver<f32>,
        failure: oneshot::Receiver<StoreError>,
    ) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(receiver)
        }
    }

    /// The next value or observation failure, or `None` once the store has
    /// gone away.
    pub async fn next(&mut self) -> Option<Result<f32, StoreError>> {
        if !self.primed {
            self.primed = true;
            return Some(Ok(*self.receiver.borrow_and_update()));
        }

        let Self {
            receiver, failure, ..
        } = self;
        tokio::select! {
            biased;
            Some(err) = next_failure(failure) => Some(Err(err)),
            changed = receiver.changed() => {
                changed.ok()?;
                Some(Ok(*receiver.borrow_and_update()))
            }
        }
    }

    /// Treat everything written so far as already delivered.
    pub fn mark_seen(&mut self) {
        self.primed = true;
        self.receiver.borrow_and_update();
    }

    /// The newest stored value, without consuming it.
    pub fn latest(&self) -> f32 {
        *self.receiver.borrow()
    }
}

// Resolves at most once; pends forever when there is nothing left to report
async fn next_failure(failure: &mut Option<oneshot::Receiver<StoreError>>) -> Option<StoreError> {
    let Some(receiver) = failure.as_mut() else {
        return std::future::pending().await;
    };
    let result = receiver.await.ok();
    *failure = None;
    result
}

/// In-process store. Clones share the same slot.
#[derive(Clone)]
pub struct MemoryStore {
    slot: Arc<watch::Sender<f32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_value(DEFAULT_SCALE)
    }

    /// A store that already holds `value`.
    pub fn with_value(value: f32) -> Self {
        Self {
            slot: Arc::new(watch::Sender::new(value)),
        }
    }

    pub fn value(&self) -> f32 {
        *self.slot.borrow()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalePreferenceStore for MemoryStore {
    fn observe(&self) -> ScaleStream {
        ScaleStream::new(self.slot.subscribe())
    }

    fn save(&self, value: f32) -> SaveFuture {
        let slot = self.slot.clone();
        Box::pin(async move {
            slot.send_replace(value);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn next_value(stream: &mut ScaleStream) -> Option<f32> {
        stream.next().await.map(|item| item.unwrap())
    }

    #[tokio::test]
    async fn observe_emits_default_when_empty() {
        let store = MemoryStore::new();
        let mut stream = store.observe();
        assert_eq!(next_value(&mut stream).await, Some(1.0));
    }

    #[tokio::test]
    async fn observe_emits_current_then_writes() {
        let store = MemoryStore::with_value(1.3);
        let mut stream = store.observe();
        assert_eq!(next_value(&mut stream).await, Some(1.3));

        store.save(0.8).await.unwrap();
        assert_eq!(next_value(&mut stream).await, Some(0.8));
    }

    #[tokio::test]
    async fn writes_through_clone_reach_other_subscribers() {
        let store = MemoryStore::new();
        let writer = store.clone();
        let mut stream = store.observe();
        stream.next().await;

        writer.save(1.7).await.unwrap();
        assert_eq!(next_value(&mut stream).await, Some(1.7));
        assert_eq!(store.value(), 1.7);
    }

    #[tokio::test]
    async fn slow_subscriber_skips_to_latest() {
        let store = MemoryStore::new();
        let mut stream = store.observe();
        stream.next().await;

        store.save(1.1).await.unwrap();
        store.save(1.2).await.unwrap();
        assert_eq!(next_value(&mut stream).await, Some(1.2));
    }

    #[tokio::test]
    async fn resubscribing_starts_from_current_value() {
        let store = MemoryStore::new();
        store.save(1.4).await.unwrap();
        let mut stream = store.observe();
        assert_eq!(next_value(&mut stream).await, Some(1.4));
    }

    #[tokio::test]
    async fn mark_seen_skips_pending_value() {
        let store = MemoryStore::with_value(1.3);
        let mut stream = store.observe();
        stream.mark_seen();
        assert_eq!(stream.latest(), 1.3);

        store.save(0.9).await.unwrap();
        assert_eq!(next_value(&mut stream).await, Some(0.9));
    }

    #[tokio::test]
    async fn stream_ends_when_store_dropped() {
        let store = MemoryStore::new();
        let mut stream = store.observe();
        stream.next().await;
        drop(store);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn failure_is_yielded_once_between_values() {
        let store = MemoryStore::with_value(1.3);
        let (fail, failure) = oneshot::channel();
        let mut stream = ScaleStream::with_failure(store.slot.subscribe(), failure);
        assert_eq!(next_value(&mut stream).await, Some(1.3));

        fail.send(StoreError::NoConfigDir).unwrap();
        assert!(matches!(
            stream.next().await,
            Some(Err(StoreError::NoConfigDir))
        ));

        store.save(0.9).await.unwrap();
        assert_eq!(next_value(&mut stream).await, Some(0.9));
    }

    #[tokio::test]
    async fn dropped_failure_channel_is_not_an_error() {
        let store = MemoryStore::new();
        let (fail, failure) = oneshot::channel::<StoreError>();
        let mut stream = ScaleStream::with_failure(store.slot.subscribe(), failure);
        stream.next().await;
        drop(fail);

        store.save(1.1).await.unwrap();
        assert_eq!(next_value(&mut stream).await, Some(1.1));
    }
}
