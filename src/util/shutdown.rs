// ref: https://tokio.rs/tokio/topics/shutdown
use tokio::sync::watch;

/// Requests a stop; the pipeline honors it between two documents
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // no receiver left means nobody is running anymore
        let _ = self.sender.send(true);
    }
}

/// Cheap to clone, checked without blocking
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        create_trigger_and_signal().1
    }

    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

pub fn create_trigger_and_signal() -> (ShutdownTrigger, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownTrigger { sender }, ShutdownSignal { receiver })
}

/// Fire the returned signal on the first Ctrl-C (needs a running tokio runtime)
pub fn spawn_ctrl_c_handler() -> ShutdownSignal {
    let (trigger, signal) = create_trigger_and_signal();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("received ctrl-c, stopping after the current document");
                trigger.trigger();
            }
            Err(e) => tracing::error!("cannot listen for ctrl-c: {:?}", e),
        }
    });
    signal
}
