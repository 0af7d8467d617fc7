use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RUNTIME_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

/// Identifies the thread-local runtime a signal was created on.
pub type RuntimeId = u64;
pub type SignalId = usize;
pub type EffectId = usize;

struct EffectSlot {
    callback: Option<Box<dyn FnMut()>>,
    dependencies: HashSet<SignalId>,
    alive: bool,
}

/// Dependency graph between signals and effects for one thread.
///
/// Effect callbacks are never invoked while the runtime is borrowed: they are
/// taken out of their slot, run, and put back. This lets a callback read and
/// write signals (which borrow the runtime themselves) without tripping the
/// `RefCell`.
pub struct Runtime {
    id: RuntimeId,
    current_effect: Option<EffectId>,
    pending_effects: VecDeque<EffectId>,
    effects: Vec<EffectSlot>,
    signal_subscribers: Vec<HashSet<EffectId>>,
    batch_depth: usize,
    flushing: bool,
}

impl Runtime {
    fn new() -> Self {
        Self {
            id: NEXT_RUNTIME_ID.fetch_add(1, Ordering::Relaxed),
            current_effect: None,
            pending_effects: VecDeque::new(),
            effects: Vec::new(),
            signal_subscribers: Vec::new(),
            batch_depth: 0,
            flushing: false,
        }
    }

    pub fn id(&self) -> RuntimeId {
        self.id
    }

    pub fn allocate_signal(&mut self) -> SignalId {
        self.signal_subscribers.push(HashSet::new());
        self.signal_subscribers.len() - 1
    }

    pub fn allocate_effect(&mut self, callback: Box<dyn FnMut()>) -> EffectId {
        self.effects.push(EffectSlot {
            callback: Some(callback),
            dependencies: HashSet::new(),
            alive: true,
        });
        self.effects.len() - 1
    }

    fn track_read(&mut self, signal_id: SignalId) {
        let Some(effect_id) = self.current_effect else {
            return;
        };
        if let Some(subscribers) = self.signal_subscribers.get_mut(signal_id) {
            subscribers.insert(effect_id);
            self.effects[effect_id].dependencies.insert(signal_id);
        }
    }

    /// Queue every effect subscribed to `signal_id`. Returns whether anything
    /// was queued.
    fn queue_subscribers(&mut self, signal_id: SignalId) -> bool {
        let Some(subscribers) = self.signal_subscribers.get(signal_id) else {
            return false;
        };
        let mut queued = false;
        for &effect_id in subscribers {
            if !self.pending_effects.contains(&effect_id) {
                self.pending_effects.push_back(effect_id);
                queued = true;
            }
        }
        queued
    }

    fn begin_effect(
        &mut self,
        effect_id: EffectId,
    ) -> Option<(Box<dyn FnMut()>, Option<EffectId>)> {
        let slot = self.effects.get_mut(effect_id)?;
        if !slot.alive {
            return None;
        }
        let callback = slot.callback.take()?;

        // Dependencies are rediscovered on every run
        for signal_id in std::mem::take(&mut slot.dependencies) {
            self.signal_subscribers[signal_id].remove(&effect_id);
        }

        let previous = self.current_effect.replace(effect_id);
        Some((callback, previous))
    }

    fn end_effect(
        &mut self,
        effect_id: EffectId,
        callback: Box<dyn FnMut()>,
        previous: Option<EffectId>,
    ) -> Option<Box<dyn FnMut()>> {
        self.current_effect = previous;
        let slot = &mut self.effects[effect_id];
        if slot.alive {
            slot.callback = Some(callback);
            None
        } else {
            Some(callback)
        }
    }

    /// Returns the callback so it can be dropped after the runtime borrow is
    /// released; it may own other effects whose `Drop` touches the runtime.
    fn dispose_effect(&mut self, effect_id: EffectId) -> Option<Box<dyn FnMut()>> {
        let slot = self.effects.get_mut(effect_id)?;
        slot.alive = false;
        let callback = slot.callback.take();
        for signal_id in std::mem::take(&mut slot.dependencies) {
            self.signal_subscribers[signal_id].remove(&effect_id);
        }
        self.pending_effects.retain(|&id| id != effect_id);
        callback
    }
}

pub fn with_runtime<F, R>(f: F) -> R
where
    F: FnOnce(&mut Runtime) -> R,
{
    RUNTIME.with(|rt| f(&mut rt.borrow_mut()))
}

/// Run `f` against this thread's runtime if it is the one identified by
/// `origin` and is not currently borrowed.
///
/// Signals are shared across threads; only the thread that created a signal
/// tracks reads of it and runs its effects. Writes from other threads update
/// the value and skip notification.
fn try_with_runtime<F, R>(origin: RuntimeId, f: F) -> Option<R>
where
    F: FnOnce(&mut Runtime) -> R,
{
    RUNTIME
        .try_with(|rt| {
            let mut runtime = rt.try_borrow_mut().ok()?;
            (runtime.id == origin).then(|| f(&mut runtime))
        })
        .ok()
        .flatten()
}

pub(crate) fn track_read(origin: RuntimeId, signal_id: SignalId) {
    try_with_runtime(origin, |rt| rt.track_read(signal_id));
}

pub(crate) fn notify_write(origin: RuntimeId, signal_id: SignalId) {
    if try_with_runtime(origin, |rt| rt.queue_subscribers(signal_id)) == Some(true) {
        flush_effects();
    }
}

pub(crate) fn run_effect(effect_id: EffectId) {
    let Some((mut callback, previous)) = with_runtime(|rt| rt.begin_effect(effect_id)) else {
        return;
    };
    callback();
    let disposed = with_runtime(|rt| rt.end_effect(effect_id, callback, previous));
    drop(disposed);
}

pub(crate) fn dispose_effect(effect_id: EffectId) {
    let callback = RUNTIME
        .try_with(|rt| {
            rt.try_borrow_mut()
                .ok()
                .and_then(|mut runtime| runtime.dispose_effect(effect_id))
        })
        .ok()
        .flatten();
    drop(callback);
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        with_runtime(|rt| rt.flushing = false);
    }
}

fn flush_effects() {
    let start = with_runtime(|rt| {
        if rt.flushing || rt.batch_depth > 0 {
            return false;
        }
        rt.flushing = true;
        true
    });
    if !start {
        return;
    }

    let _guard = FlushGuard;
    while let Some(effect_id) = with_runtime(|rt| rt.pending_effects.pop_front()) {
        run_effect(effect_id);
    }
}

/// Defer effect execution until `f` returns, then run every effect that was
/// invalidated inside it once.
pub fn batch<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    with_runtime(|rt| rt.batch_depth += 1);
    let result = f();
    with_runtime(|rt| rt.batch_depth -= 1);
    flush_effects();
    result
}
