//! Background services tied to an owner scope.
//!
//! A service is a tokio task that receives commands over an unbounded
//! channel. It keeps running until it is stopped explicitly, its owner is
//! disposed, or every [`Service`] handle is dropped (the command channel then
//! closes).
//!
//! # Example
//!
//! ```ignore
//! let service = create_service(move |mut rx, ctx| async move {
//!     loop {
//!         tokio::select! {
//!             _ = ctx.stopped() => break,
//!             cmd = rx.recv() => match cmd {
//!                 Some(cmd) => handle(cmd).await,
//!                 None => break,
//!             },
//!         }
//!     }
//! });
//!
//! service.send(MyCommand::DoSomething);
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Notify, mpsc};

use super::on_cleanup;

struct ServiceControl {
    running: AtomicBool,
    stop: Notify,
}

impl ServiceControl {
    fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            // notify_one stores a permit, so a task that is not yet waiting
            // still sees the stop request
            self.stop.notify_one();
        }
    }
}

/// Context passed to the service function.
pub struct ServiceContext {
    control: Arc<ServiceControl>,
}

impl ServiceContext {
    /// Returns `false` once the service has been asked to stop.
    pub fn is_running(&self) -> bool {
        self.control.running.load(Ordering::SeqCst)
    }

    /// Resolves once the service has been asked to stop.
    pub async fn stopped(&self) {
        while self.is_running() {
            self.control.stop.notified().await;
        }
    }
}

/// Handle to a background service for sending commands.
///
/// Clone this handle to send commands from multiple places.
pub struct Service<Cmd> {
    sender: mpsc::UnboundedSender<Cmd>,
    control: Arc<ServiceControl>,
}

impl<Cmd> Clone for Service<Cmd> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            control: self.control.clone(),
        }
    }
}

impl<Cmd> Service<Cmd> {
    /// Send a command to the service. Returns `false` if the task has
    /// already exited.
    pub fn send(&self, cmd: Cmd) -> bool {
        self.sender.send(cmd).is_ok()
    }

    /// Ask the service to stop. Idempotent.
    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn is_running(&self) -> bool {
        self.control.running.load(Ordering::SeqCst)
    }
}

/// Spawn a background service on the current tokio runtime, tied to the
/// current owner.
///
/// The service function receives the command receiver and a
/// [`ServiceContext`] to watch for stop requests. Disposing the current owner
/// (if any) stops the service.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn create_service<Cmd, F, Fut>(f: F) -> Service<Cmd>
where
    Cmd: Send + 'static,
    F: FnOnce(mpsc::UnboundedReceiver<Cmd>, ServiceContext) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let control = Arc::new(ServiceControl {
        running: AtomicBool::new(true),
        stop: Notify::new(),
    });

    let control_for_cleanup = control.clone();
    on_cleanup(move || control_for_cleanup.stop());

    let ctx = ServiceContext {
        control: control.clone(),
    };
    tokio::spawn(f(rx, ctx));

    Service {
        sender: tx,
        control,
    }
}
