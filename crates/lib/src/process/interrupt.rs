//! Run-wide termination signal.
//!
//! One listener is installed per run. It flips a shared flag on SIGINT or
//! SIGTERM (Ctrl-C on Windows). Runners race their child against the flag,
//! and the executor checks it between targets, so a signal that lands while
//! no child is running still stops the pipeline before the next step.

use std::io;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Interrupt {
  sender: Arc<watch::Sender<bool>>,
  receiver: watch::Receiver<bool>,
}

impl Default for Interrupt {
  fn default() -> Self {
    Self::new()
  }
}

impl Interrupt {
  /// A flag that is only raised through [`Interrupt::trigger`].
  pub fn new() -> Self {
    let (sender, receiver) = watch::channel(false);
    Self {
      sender: Arc::new(sender),
      receiver,
    }
  }

  /// Raise the flag when the process receives a termination signal.
  ///
  /// Must be called from within a tokio runtime. Handlers are registered
  /// before this returns, so no signal is lost to the default action.
  pub fn listen(&self) -> io::Result<()> {
    let interrupt = self.clone();

    #[cfg(unix)]
    {
      use tokio::signal::unix::{SignalKind, signal};

      let mut sigint = signal(SignalKind::interrupt())?;
      let mut sigterm = signal(SignalKind::terminate())?;
      tokio::spawn(async move {
        let name = tokio::select! {
          _ = sigint.recv() => "SIGINT",
          _ = sigterm.recv() => "SIGTERM",
        };
        warn!(signal = name, "termination signal received");
        interrupt.trigger();
      });
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!(signal = "ctrl-c", "termination signal received");
        interrupt.trigger();
      }
    });

    Ok(())
  }

  pub fn trigger(&self) {
    self.sender.send_replace(true);
  }

  pub fn is_triggered(&self) -> bool {
    *self.receiver.borrow()
  }

  /// Let a pending signal reach the listener, then report the flag.
  pub async fn received(&self) -> bool {
    tokio::task::yield_now().await;
    self.is_triggered()
  }

  /// Resolve once the flag is raised.
  pub async fn triggered(&self) {
    let mut receiver = self.receiver.clone();
    if receiver.wait_for(|raised| *raised).await.is_err() {
      // The sender lives as long as `self`, so this never resolves early.
      std::future::pending::<()>().await;
    }
  }
}
