use super::owner::{effect_has_owner, register_effect};
use super::runtime::{EffectId, dispose_effect, run_effect, with_runtime};

/// A side effect that re-runs whenever a signal it read changes.
///
/// The effect lives until its handle is dropped, unless it was created inside
/// an owner scope, in which case the owner disposes it.
pub struct Effect {
    id: EffectId,
}

impl Effect {
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut() + 'static,
    {
        let id = with_runtime(|rt| rt.allocate_effect(Box::new(f)));
        register_effect(id);
        run_effect(id);
        Self { id }
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if !effect_has_owner(self.id) {
            dispose_effect(self.id);
        }
    }
}

pub fn create_effect<F>(f: F) -> Effect
where
    F: FnMut() + 'static,
{
    Effect::new(f)
}
