use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::runtime::{RuntimeId, SignalId, notify_write, track_read, with_runtime};

struct SignalInner<T> {
    origin: RuntimeId,
    id: SignalId,
    value: RwLock<T>,
}

impl<T> SignalInner<T> {
    fn read(&self) -> RwLockReadGuard<'_, T> {
        self.value.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.value.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn track(&self) {
        track_read(self.origin, self.id);
    }

    fn notify(&self) {
        notify_write(self.origin, self.id);
    }
}

impl<T: PartialEq> SignalInner<T> {
    fn set(&self, value: T) {
        let mut guard = self.write();
        if *guard != value {
            *guard = value;
            drop(guard);
            self.notify();
        }
    }
}

impl<T: PartialEq + Clone> SignalInner<T> {
    fn update(&self, f: impl FnOnce(&mut T)) {
        let mut guard = self.write();
        let old_value = guard.clone();
        f(&mut *guard);
        if *guard != old_value {
            drop(guard);
            self.notify();
        }
    }
}

/// A reactive value that can be read and written from any thread.
///
/// When a signal's value changes, effects that read it are re-run on the
/// thread that created the signal.
///
/// # Thread Safety
/// Values can be read and written from any thread, but dependency tracking
/// and effect notification only happen on the creating thread. A `set()`
/// from a background task updates the value immediately without running
/// effects; the next read on the UI thread sees it.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        let (origin, id) = with_runtime(|rt| (rt.id(), rt.allocate_signal()));
        Self {
            inner: Arc::new(SignalInner {
                origin,
                id,
                value: RwLock::new(value),
            }),
        }
    }

    pub fn split(self) -> (ReadSignal<T>, WriteSignal<T>) {
        (
            ReadSignal {
                inner: self.inner.clone(),
            },
            WriteSignal { inner: self.inner },
        )
    }

    /// A read-only handle sharing this signal's value.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            inner: self.inner.clone(),
        }
    }

    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.track();
        f(&*self.inner.read())
    }

    pub fn with_untracked<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&*self.inner.read())
    }
}

impl<T: Clone> Signal<T> {
    pub fn get(&self) -> T {
        self.inner.track();
        self.inner.read().clone()
    }

    pub fn get_untracked(&self) -> T {
        self.inner.read().clone()
    }
}

impl<T: PartialEq> Signal<T> {
    /// Sets the value, notifying dependents only if it actually changed.
    pub fn set(&self, value: T) {
        self.inner.set(value);
    }
}

impl<T: PartialEq + Clone> Signal<T> {
    /// Updates the value in place, notifying dependents only if it changed.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        self.inner.update(f);
    }
}

/// Read-only handle to a signal.
pub struct ReadSignal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> ReadSignal<T> {
    pub fn get(&self) -> T {
        self.inner.track();
        self.inner.read().clone()
    }

    pub fn get_untracked(&self) -> T {
        self.inner.read().clone()
    }
}

impl<T> ReadSignal<T> {
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.track();
        f(&*self.inner.read())
    }
}

/// Write-only handle to a signal.
pub struct WriteSignal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: PartialEq> WriteSignal<T> {
    pub fn set(&self, value: T) {
        self.inner.set(value);
    }
}

impl<T: PartialEq + Clone> WriteSignal<T> {
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        self.inner.update(f);
    }
}

pub fn create_signal<T>(value: T) -> Signal<T> {
    Signal::new(value)
}
