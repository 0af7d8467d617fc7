//! Persisted, clamped font scale with an ambient reactive context.
//!
//! A [`ScaleState`](scale::ScaleState) owns the current scale, keeps it in
//! sync with a [`ScalePreferenceStore`](scale::ScalePreferenceStore) and
//! exposes it as a signal. [`provide_font_scale`](scale::provide_font_scale)
//! makes that value the font scale of a UI subtree, where text reads it
//! through [`font_scale`](scale::font_scale).
//!
//! ```ignore
//! use font_resizify::prelude::*;
//!
//! let store = FileStore::open_default("my-app")?;
//! let state = ScaleState::new(0.5, 2.0, 1.0, store)?;
//!
//! provide_font_scale(&state, || {
//!     let body = resizable_text("Body").font_slider(true);
//!     body.resolve_ambient().font_size
//! });
//! ```

pub mod reactive;
pub mod scale;
pub mod widgets;

pub mod prelude {
    pub use crate::reactive::{
        ReadSignal, Signal, WriteSignal, batch, create_effect, create_signal, dispose_owner,
        on_cleanup, with_owner,
    };
    pub use crate::scale::{
        FileStore, FontScale, MemoryStore, ScaleBounds, ScaleError, ScalePreferenceStore,
        ScaleState, StoreError, font_scale, provide_font_scale, scaled_size, use_font_scale,
    };
    pub use crate::widgets::{
        FontSliderControl, FontSliderOptions, Orientation, ResizableText, TextStyle,
        resizable_text,
    };
}
