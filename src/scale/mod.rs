//! Persisted font scale: storage, state and ambient broadcast.

pub mod bounds;
pub mod broadcast;
pub mod error;
pub mod file_store;
pub mod state;
pub mod store;

pub use bounds::{DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE, DEFAULT_SCALE, ScaleBounds};
pub use broadcast::{FontScale, font_scale, provide_font_scale, scaled_size, use_font_scale};
pub use error::{ScaleError, StoreError};
pub use file_store::{FileStore, PREFERENCES_FILE};
pub use state::{ErrorReceiver, ScaleState};
pub use store::{FONT_SCALE_KEY, MemoryStore, SaveFuture, ScalePreferenceStore, ScaleStream};
