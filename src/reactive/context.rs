//! Scoped context for sharing values with a subtree.
//!
//! A value provided with [`provide_context`] is visible to every lookup made
//! while the provided closure runs, however deeply nested, and to nothing
//! outside it. Values are keyed by their concrete type. Providing a value of
//! a type that is already in scope shadows the outer one until the inner
//! scope ends.
//!
//! ## Storage
//!
//! A thread-local `Vec<(TypeId, Rc<dyn Any>)>` used as a stack. Lookups scan
//! from the top, so the innermost provider wins. Scopes hold a handful of
//! entries in practice, which keeps the linear scan cheap.
//!
//! ## Reactive Context
//!
//! Provide a signal handle rather than a plain value when consumers must see
//! later updates:
//!
//! ```ignore
//! provide_context(scale.read_only(), || {
//!     let scale = expect_context::<ReadSignal<f32>>();
//!     create_effect(move || println!("scale is now {}", scale.get()));
//! });
//! ```

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static CONTEXTS: RefCell<Vec<(TypeId, Rc<dyn Any>)>> = const { RefCell::new(Vec::new()) };
}

struct ScopeGuard {
    depth: usize,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        CONTEXTS.with(|ctx| ctx.borrow_mut().truncate(self.depth));
    }
}

/// Make `value` visible to context lookups made while `f` runs.
///
/// The scope is unwound when `f` returns or panics.
pub fn provide_context<T: 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
    let depth = CONTEXTS.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        let depth = ctx.len();
        ctx.push((TypeId::of::<T>(), Rc::new(value)));
        depth
    });
    let _guard = ScopeGuard { depth };
    f()
}

fn lookup<T: 'static>() -> Option<Rc<dyn Any>> {
    let type_id = TypeId::of::<T>();
    CONTEXTS.with(|ctx| {
        ctx.borrow()
            .iter()
            .rev()
            .find(|entry| entry.0 == type_id)
            .map(|entry| entry.1.clone())
    })
}

/// The innermost value of type `T` in scope, cloned.
pub fn use_context<T: Clone + 'static>() -> Option<T> {
    with_context::<T, _>(T::clone)
}

/// The innermost value of type `T` in scope.
///
/// # Panics
///
/// Panics with the type name if no value of type `T` is in scope.
pub fn expect_context<T: Clone + 'static>() -> T {
    use_context::<T>().unwrap_or_else(|| {
        panic!(
            "Context not found for type `{}`.\n\
             Did you forget to wrap this code in provide_context()?",
            std::any::type_name::<T>()
        )
    })
}

/// Borrow the innermost value of type `T` in scope without cloning it.
///
/// `f` may itself provide or look up context.
pub fn with_context<T: 'static, R>(f: impl FnOnce(&T) -> R) -> Option<R> {
    let entry = lookup::<T>()?;
    entry.downcast_ref::<T>().map(f)
}

pub fn has_context<T: 'static>() -> bool {
    lookup::<T>().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_context_returns_none_when_missing() {
        assert_eq!(use_context::<String>(), None);
    }

    #[test]
    fn test_value_visible_inside_scope_only() {
        provide_context(42u32, || {
            assert_eq!(use_context::<u32>(), Some(42));
        });
        assert_eq!(use_context::<u32>(), None);
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        provide_context(1.0f32, || {
            provide_context(1.5f32, || {
                assert_eq!(use_context::<f32>(), Some(1.5));
            });
            assert_eq!(use_context::<f32>(), Some(1.0));
        });
    }

    #[test]
    fn test_multiple_types() {
        provide_context(42u32, || {
            provide_context("hello".to_string(), || {
                assert_eq!(use_context::<u32>(), Some(42));
                assert_eq!(use_context::<String>(), Some("hello".to_string()));
            })
        });
    }

    #[test]
    fn test_with_context_borrows_without_clone() {
        provide_context(vec![1, 2, 3], || {
            let sum = with_context::<Vec<i32>, _>(|v| v.iter().sum::<i32>());
            assert_eq!(sum, Some(6));
        });
    }

    #[test]
    fn test_with_context_allows_nested_provide() {
        provide_context(1u8, || {
            let nested =
                with_context::<u8, _>(|outer| provide_context(*outer + 1, use_context::<u8>));
            assert_eq!(nested, Some(Some(2)));
        });
    }

    #[test]
    fn test_has_context() {
        assert!(!has_context::<u64>());
        provide_context(99u64, || assert!(has_context::<u64>()));
    }

    #[test]
    #[should_panic(expected = "Context not found for type")]
    fn test_expect_context_panics_when_missing() {
        expect_context::<f64>();
    }

    #[test]
    fn test_scope_unwinds_on_panic() {
        let result = std::panic::catch_unwind(|| {
            provide_context(7i16, || {
                if use_context::<i16>() == Some(7) {
                    panic!("boom");
                }
            });
        });
        assert!(result.is_err());
        assert_eq!(use_context::<i16>(), None);
    }
}
