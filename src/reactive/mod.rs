pub mod context;
pub mod effect;
pub mod owner;
pub mod runtime;
pub mod service;
pub mod signal;

pub use context::{expect_context, has_context, provide_context, use_context, with_context};
pub use effect::{Effect, create_effect};
pub use owner::{OwnerId, current_owner, dispose_owner, on_cleanup, with_owner};
pub use runtime::batch;
pub use service::{Service, ServiceContext, create_service};
pub use signal::{ReadSignal, Signal, WriteSignal, create_signal};
