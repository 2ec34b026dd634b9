//! # Real-Time Driver
//!
//! Pumps a [`Session`]'s logical clock from the tokio timer.
//!
//! ## Design
//!
//! - Logical time advances with wall time from the moment the driver starts
//! - The driver sleeps until the next due timer or until a handle signals
//!   that it scheduled something new
//! - The session lives behind a `parking_lot::Mutex`; the lock is taken only
//!   between awaits

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use idleforge_core::Millis;

use crate::session::Session;

/// Shared access to a session driven in real time.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    session: Arc<Mutex<Session>>,
    wake: Arc<Notify>,
}

impl SessionHandle {
    /// Wraps a session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Runs `f` on the session and wakes the driver so newly scheduled
    /// timers are picked up.
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let result = {
            let mut session = self.session.lock();
            f(&mut session)
        };
        self.wake.notify_one();
        result
    }

    /// Creates the driver for this session.
    #[must_use]
    pub fn driver(&self) -> RealtimeDriver {
        RealtimeDriver {
            handle: self.clone(),
        }
    }
}

/// Tick statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Times the driver woke up.
    pub wakeups: u64,
    /// Timers popped across all wakeups.
    pub timers_popped: u64,
}

/// Sleeps on the tokio timer and fires due session timers.
#[derive(Debug)]
pub struct RealtimeDriver {
    handle: SessionHandle,
}

impl RealtimeDriver {
    /// Runs until `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> DriverStats {
        let mut shutdown = std::pin::pin!(shutdown);
        let origin = Instant::now();
        let base: Millis = self.handle.session.lock().now();
        let mut stats = DriverStats::default();

        let logical_now = |at: Instant| -> Millis {
            let elapsed = u64::try_from(at.duration_since(origin).as_millis()).unwrap_or(Millis::MAX);
            base.saturating_add(elapsed)
        };

        tracing::info!("Real-time driver started at logical {}", base);

        loop {
            let next_due = {
                let mut session = self.handle.session.lock();
                stats.wakeups += 1;
                stats.timers_popped += session.advance_to(logical_now(Instant::now())) as u64;
                session.next_due()
            };

            let deadline = next_due.map(|due| origin + Duration::from_millis(due.saturating_sub(base)));
            let notified = self.handle.wake.notified();

            tokio::select! {
                () = &mut shutdown => break,
                () = notified => {}
                () = sleep_until_or_forever(deadline) => {}
            }
        }

        tracing::info!(
            "Real-time driver stopped: {} wakeups, {} timers",
            stats.wakeups,
            stats.timers_popped
        );
        stats
    }
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
