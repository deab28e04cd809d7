//! Periodic gateway health checks.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, trace};

use crate::dispatch::Dispatcher;

/// Handle to the thread that calls [`Dispatcher::health_check`] on a fixed
/// period.
///
/// Dropping the handle stops the thread.
pub struct HealthMonitor {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Start ticking every `interval`. The first check runs after one interval.
    pub fn spawn(dispatcher: Arc<Dispatcher>, interval: Duration) -> io::Result<Self> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let thread = thread::Builder::new()
            .name("mysgw-health".to_string())
            .spawn(move || monitor_main(dispatcher, interval, stop_rx))?;
        Ok(HealthMonitor { stop_tx, thread: Some(thread) })
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.stop_tx.try_send(());
            let _ = thread.join();
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn monitor_main(dispatcher: Arc<Dispatcher>, interval: Duration, stop_rx: Receiver<()>) {
    debug!(interval_ms = interval.as_millis() as u64, "health monitor started");
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let status = dispatcher.health_check();
                trace!(?status, "health tick");
            }
            // Stop requested or handle dropped
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("health monitor stopped");
}
