//! Interrupt handling
//!
//! A [`Shutdown`] is checked between stages and raced against each running
//! stage. It is flipped once, by a signal or by a [`ShutdownTrigger`]. A
//! second signal while teardown is under way exits the process immediately.

use tokio::sync::{mpsc, watch};

/// Exit status when a second signal cuts cleanup short
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    /// A token plus the handle that fires it
    pub fn new() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// Fires on SIGINT or SIGTERM; must be called inside the runtime
    pub fn on_signals() -> Shutdown {
        let (trigger, shutdown) = Shutdown::new();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_signals(tx));
        tokio::spawn(relay(rx, trigger, || {
            std::process::exit(FORCED_EXIT_CODE)
        }));
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once triggered; never resolves if the trigger is dropped unfired
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// First signal fires `trigger`, the second one calls `force`
async fn relay(
    mut signals: mpsc::UnboundedReceiver<()>,
    trigger: ShutdownTrigger,
    force: impl FnOnce(),
) {
    if signals.recv().await.is_none() {
        return;
    }
    tracing::info!("shutdown signal received");
    eprintln!("Cleaning up, interrupt again to exit immediately");
    trigger.trigger();

    if signals.recv().await.is_some() {
        tracing::warn!("second signal received, exiting without cleanup");
        force();
    }
}

/// Send one message per SIGINT or SIGTERM until the receiver is gone
///
/// Handlers are registered once, so a signal arriving between two deliveries
/// is queued rather than lost.
async fn forward_signals(tx: mpsc::UnboundedSender<()>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => loop {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
                if tx.send(()).is_err() {
                    return;
                }
            },
            _ => tracing::warn!("failed to register signal handlers, falling back to ctrl-c"),
        }
    }

    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            return;
        }
        if tx.send(()).is_err() {
            return;
        }
    }
}
