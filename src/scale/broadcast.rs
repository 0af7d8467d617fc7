//! Ambient font scale for a UI subtree.
//!
//! [`provide_font_scale`] makes a [`ScaleState`]'s live value the font scale
//! of everything built inside it. Consumers call [`font_scale`] (or capture a
//! [`FontScale`] handle for code that runs later, such as paint closures).
//! Outside any provider the scale is the neutral 1.0.
//!
//! ```ignore
//! provide_font_scale(&state, || {
//!     let scale = use_font_scale();
//!     text("Body").font_size(move || scale.scale(14.0))
//! })
//! ```

use super::bounds::DEFAULT_SCALE;
use super::state::ScaleState;
use crate::reactive::{ReadSignal, provide_context, use_context};

// Private key type, so only this module can provide the ambient scale
#[derive(Clone)]
struct AmbientScale(ReadSignal<f32>);

/// Handle on the ambient font scale captured at build time.
///
/// Reads go to the provider's live value, so a handle captured once keeps
/// following updates. A handle captured with no provider in scope always
/// reads the neutral scale.
#[derive(Clone)]
pub struct FontScale {
    source: Option<ReadSignal<f32>>,
}

impl FontScale {
    /// The handle used when no provider is in scope.
    pub fn neutral() -> Self {
        Self { source: None }
    }

    /// Current scale; tracked when read inside an effect.
    pub fn get(&self) -> f32 {
        self.source.as_ref().map_or(DEFAULT_SCALE, ReadSignal::get)
    }

    pub fn get_untracked(&self) -> f32 {
        self.source
            .as_ref()
            .map_or(DEFAULT_SCALE, ReadSignal::get_untracked)
    }

    /// `base_size` multiplied by the current scale.
    pub fn scale(&self, base_size: f32) -> f32 {
        base_size * self.get()
    }

    pub fn is_provided(&self) -> bool {
        self.source.is_some()
    }
}

impl Default for FontScale {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Run `subtree` with `state` as its ambient font scale.
///
/// Nested providers shadow this one for their own subtree only.
pub fn provide_font_scale<R>(state: &ScaleState, subtree: impl FnOnce() -> R) -> R {
    provide_context(AmbientScale(state.signal()), subtree)
}

/// Capture the innermost ambient font scale.
pub fn use_font_scale() -> FontScale {
    FontScale {
        source: use_context::<AmbientScale>().map(|ambient| ambient.0),
    }
}

/// The innermost ambient font scale, or 1.0 with no provider. Never fails.
pub fn font_scale() -> f32 {
    use_font_scale().get()
}

/// `base_size` scaled by the ambient font scale.
pub fn scaled_size(base_size: f32) -> f32 {
    use_font_scale().scale(base_size)
}
