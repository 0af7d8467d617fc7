//! Reactive ownership for scoped cleanup.
//!
//! Effects, services and cleanup callbacks created inside [`with_owner`]
//! belong to that owner. Disposing the owner tears them down: child owners
//! first, then cleanup callbacks in reverse registration order, then effects.
//!
//! A font scale state created inside an owner scope registers its background
//! service here, so disposing the scope that built a UI subtree also stops
//! the state's store subscription.
//!
//! ```ignore
//! let (state, owner) = with_owner(|| ScaleState::new(0.5, 2.0, 1.0, store));
//! // ...
//! dispose_owner(owner); // store subscription cancelled
//! ```

use std::cell::RefCell;

use super::runtime::{EffectId, dispose_effect};

/// Unique identifier for an owner in the owner arena.
pub type OwnerId = usize;

#[derive(Default)]
struct Owner {
    effects: Vec<EffectId>,
    cleanups: Vec<Box<dyn FnOnce()>>,
    children: Vec<OwnerId>,
}

#[derive(Default)]
struct OwnerArena {
    owners: Vec<Option<Owner>>,
}

impl OwnerArena {
    fn allocate(&mut self, parent: Option<OwnerId>) -> OwnerId {
        let id = self.owners.len();
        self.owners.push(Some(Owner::default()));
        if let Some(parent) = parent.and_then(|parent| self.get_mut(parent)) {
            parent.children.push(id);
        }
        id
    }

    fn get_mut(&mut self, id: OwnerId) -> Option<&mut Owner> {
        self.owners.get_mut(id).and_then(Option::as_mut)
    }

    fn take(&mut self, id: OwnerId) -> Option<Owner> {
        self.owners.get_mut(id).and_then(Option::take)
    }
}

thread_local! {
    static CURRENT_OWNER: RefCell<Option<OwnerId>> = const { RefCell::new(None) };
    static OWNERS: RefCell<OwnerArena> = RefCell::new(OwnerArena::default());
}

struct RestoreOwner(Option<OwnerId>);

impl Drop for RestoreOwner {
    fn drop(&mut self) {
        CURRENT_OWNER.with(|current| *current.borrow_mut() = self.0);
    }
}

/// Execute a closure within a new owner scope, nested under the current one.
///
/// Returns the closure's result and the new owner's id.
pub fn with_owner<T>(f: impl FnOnce() -> T) -> (T, OwnerId) {
    let parent = current_owner();
    let owner_id = OWNERS.with(|owners| owners.borrow_mut().allocate(parent));

    let previous = CURRENT_OWNER.with(|current| current.borrow_mut().replace(owner_id));
    let _restore = RestoreOwner(previous);

    (f(), owner_id)
}

/// The innermost owner scope, if any.
pub fn current_owner() -> Option<OwnerId> {
    CURRENT_OWNER.with(|current| *current.borrow())
}

/// Dispose an owner and everything it owns. Disposing twice is a no-op.
pub fn dispose_owner(id: OwnerId) {
    let Some(owner) = OWNERS.with(|owners| owners.borrow_mut().take(id)) else {
        return;
    };

    for child_id in owner.children {
        dispose_owner(child_id);
    }

    for cleanup in owner.cleanups.into_iter().rev() {
        cleanup();
    }

    for effect_id in owner.effects {
        dispose_effect(effect_id);
    }
}

/// Register a callback to run when the current owner is disposed.
///
/// Does nothing outside an owner scope.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    with_current_owner(|owner| owner.cleanups.push(Box::new(f)));
}

pub(crate) fn register_effect(id: EffectId) {
    with_current_owner(|owner| owner.effects.push(id));
}

/// Whether some live owner will dispose this effect.
pub(crate) fn effect_has_owner(id: EffectId) -> bool {
    OWNERS
        .try_with(|owners| {
            owners
                .borrow()
                .owners
                .iter()
                .flatten()
                .any(|owner| owner.effects.contains(&id))
        })
        .unwrap_or(false)
}

fn with_current_owner(f: impl FnOnce(&mut Owner)) {
    let Some(owner_id) = current_owner() else {
        return;
    };
    OWNERS.with(|owners| {
        if let Some(owner) = owners.borrow_mut().get_mut(owner_id) {
            f(owner);
        }
    });
}
