//! The authoritative in-memory font scale.
//!
//! A [`ScaleState`] holds the current scale in a signal so UI code can read
//! it synchronously and reactively, while a background service keeps it in
//! sync with a [`ScalePreferenceStore`] and writes local changes back.
//!
//! # Ordering
//!
//! The service handles store emissions and save requests one at a time, in
//! arrival order, so saves reach the store in the order `update` was called.
//! A store emission that is already waiting is applied before the next
//! queued command, so [`ScaleState::flush`] also waits for the store's
//! initial value.
//!
//! Local edits win over stale persisted reads: emissions that arrive while a
//! local save is queued or in flight are discarded, and a save marks both
//! everything the store emitted before it and its own echo as seen. Once all
//! local saves have completed, later store writes (from another state sharing
//! the store, say) are applied again.
//!
//! Storage failures, whether from a save or from the store's observation
//! stream, are logged and sent once to [`ScaleState::subscribe_errors`]
//! subscribers. They never change the in-memory value.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::{debug, warn};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::bounds::{DEFAULT_SCALE, ScaleBounds};
use super::error::{ScaleError, StoreError};
use super::store::{ScalePreferenceStore, ScaleStream};
use crate::reactive::{ReadSignal, Service, ServiceContext, Signal, create_service};

const ERROR_CHANNEL_CAPACITY: usize = 16;

/// Receiver for storage failures reported by a [`ScaleState`].
pub type ErrorReceiver = broadcast::Receiver<Arc<ScaleError>>;

enum Command {
    Save(f32),
    Flush(oneshot::Sender<()>),
}

/// Clamped, persisted, observable font scale.
///
/// Create it on the UI thread inside a tokio runtime. The store subscription
/// lives until [`dispose`](Self::dispose) is called, the state is dropped, or
/// the owner scope it was created in is disposed.
///
/// Effects rerun on store emissions only when the runtime drives the service
/// on the UI thread (a current-thread runtime, as in the demos). On a
/// multi-threaded runtime the value still changes and the next read sees it.
pub struct ScaleState {
    bounds: ScaleBounds,
    value: Signal<f32>,
    service: Service<Command>,
    pending_saves: Arc<AtomicUsize>,
    errors: broadcast::Sender<Arc<ScaleError>>,
    disposed: AtomicBool,
}

impl ScaleState {
    /// Validate `[min_scale, max_scale]` and start observing `store`.
    ///
    /// `initial` (clamped) is the value until the store's first emission
    /// arrives; from then on the store is the source of truth.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new<S: ScalePreferenceStore>(
        min_scale: f32,
        max_scale: f32,
        initial: f32,
        store: S,
    ) -> Result<Self, ScaleError> {
        let bounds = ScaleBounds::new(min_scale, max_scale)?;
        Ok(Self::with_bounds(bounds, initial, store))
    }

    /// Like [`new`](Self::new) with already validated bounds.
    pub fn with_bounds<S: ScalePreferenceStore>(
        bounds: ScaleBounds,
        initial: f32,
        store: S,
    ) -> Self {
        let value = Signal::new(bounds.clamp(initial));
        let pending_saves = Arc::new(AtomicUsize::new(0));
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);

        let sync = StoreSync {
            bounds,
            value: value.clone(),
            pending_saves: pending_saves.clone(),
            errors: errors.clone(),
        };
        let service = create_service(move |commands, ctx| sync.run(store, commands, ctx));

        Self {
            bounds,
            value,
            service,
            pending_saves,
            errors,
            disposed: AtomicBool::new(false),
        }
    }

    /// The latest clamped value. Never blocks.
    ///
    /// Reading inside an effect subscribes the effect to later changes.
    pub fn current_value(&self) -> f32 {
        self.value.get()
    }

    /// Clamp `requested`, adopt it immediately and queue a save.
    ///
    /// A failed save does not roll the value back; it is logged and reported
    /// once on [`subscribe_errors`](Self::subscribe_errors). After
    /// [`dispose`](Self::dispose) only the in-memory value changes.
    pub fn update(&self, requested: f32) {
        let clamped = self.bounds.clamp(requested);
        if self.is_disposed() {
            self.value.set(clamped);
            return;
        }

        // Counted before the write so a concurrent store emission backs off
        self.pending_saves.fetch_add(1, Ordering::SeqCst);
        self.value.set(clamped);
        if !self.service.send(Command::Save(clamped)) {
            self.pending_saves.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Return to the neutral scale (1.0, or the nearest bound when the range
    /// excludes it).
    pub fn reset(&self) {
        self.update(DEFAULT_SCALE);
    }

    pub fn bounds(&self) -> ScaleBounds {
        self.bounds
    }

    pub fn min_value(&self) -> f32 {
        self.bounds.min()
    }

    pub fn max_value(&self) -> f32 {
        self.bounds.max()
    }

    /// A live read handle on the current value.
    pub fn signal(&self) -> ReadSignal<f32> {
        self.value.read_only()
    }

    /// Subscribe to storage failures reported after this call.
    pub fn subscribe_errors(&self) -> ErrorReceiver {
        self.errors.subscribe()
    }

    /// Number of saves queued or in flight.
    pub fn pending_saves(&self) -> usize {
        self.pending_saves.load(Ordering::SeqCst)
    }

    /// Wait until every save queued before this call has completed.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.service.send(Command::Flush(ack)) {
            let _ = done.await;
        }
    }

    /// Stop observing the store. Saves already queued are still written.
    ///
    /// Idempotent; also runs on drop.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            debug!("Disposing font scale state");
            self.service.stop();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst) || !self.service.is_running()
    }
}

impl Drop for ScaleState {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Background half of a [`ScaleState`].
struct StoreSync {
    bounds: ScaleBounds,
    value: Signal<f32>,
    pending_saves: Arc<AtomicUsize>,
    errors: broadcast::Sender<Arc<ScaleError>>,
}

impl StoreSync {
    async fn run<S: ScalePreferenceStore>(
        self,
        store: S,
        mut commands: mpsc::UnboundedReceiver<Command>,
        ctx: ServiceContext,
    ) {
        let mut stream = store.observe();
        let mut observing = true;

        loop {
            tokio::select! {
                biased;
                _ = ctx.stopped() => break,
                emitted = stream.next(), if observing => match emitted {
                    Some(Ok(raw)) => self.apply(raw),
                    Some(Err(err)) => {
                        warn!("Failed to observe stored font scale: {err}");
                        self.report(err);
                    }
                    None => {
                        debug!("Font scale store closed its stream");
                        observing = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => self.handle(&store, &mut stream, command).await,
                    None => break,
                },
            }
        }

        // Write out saves requested before the state went away
        commands.close();
        while let Some(command) = commands.recv().await {
            self.handle(&store, &mut stream, command).await;
        }
        debug!("Font scale store subscription ended");
    }

    fn apply(&self, raw: f32) {
        let clamped = self.bounds.clamp(raw);
        let mut adopted = false;
        // Checked under the signal's write lock, which `update` also takes
        self.value.update(|current| {
            if self.pending_saves.load(Ordering::SeqCst) == 0 {
                *current = clamped;
                adopted = true;
            }
        });

        if adopted {
            debug!("Adopted stored font scale {raw} as {clamped}");
        } else {
            debug!("Discarding stored font scale {raw}: local change pending");
        }
    }

    // The in-memory value is left as is
    fn report(&self, err: StoreError) {
        let _ = self.errors.send(Arc::new(ScaleError::Storage(err)));
    }

    async fn handle<S: ScalePreferenceStore>(
        &self,
        store: &S,
        stream: &mut ScaleStream,
        command: Command,
    ) {
        match command {
            Command::Save(value) => {
                stream.mark_seen();
                let result = store.save(value).await;
                // Skip the echo of our own write
                stream.mark_seen();
                self.pending_saves.fetch_sub(1, Ordering::SeqCst);
                if let Err(err) = result {
                    warn!("Failed to save font scale {value}: {err}");
                    self.report(err);
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
