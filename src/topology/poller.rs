use std::time::Duration;

use tokio::{runtime::Handle, sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::topology::{
    snapshot::Snapshot,
    source::{SnapshotSource, TopologyError},
};

/// Outcome of one poll cycle.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// The controller answered; `None` when it had nothing to report.
    Snapshot(Option<Snapshot>),
    Failed(TopologyError),
}

/// Self-paced poll loop: wait `interval`, fetch, publish, repeat.
///
/// The next cycle is only scheduled after the previous fetch has completed, so
/// requests never overlap. A failed fetch is published and the loop carries
/// on. The loop ends once the receiving side of `events` is dropped.
pub async fn run_poll_loop<E, F>(
    mut source: Box<dyn SnapshotSource>,
    interval: Duration,
    events: UnboundedSender<E>,
    notify: F,
) where
    E: From<PollEvent> + Send,
    F: Fn() + Send,
{
    info!(target: "poller", interval_ms = interval.as_millis() as u64, "Starting poll loop");
    loop {
        tokio::time::sleep(interval).await;

        let event = match source.fetch_snapshot().await {
            Ok(Some(snapshot)) => PollEvent::Snapshot(Some(snapshot)),
            Ok(None) => {
                debug!(target: "poller", "Controller returned an empty payload");
                PollEvent::Snapshot(None)
            }
            Err(e) => {
                warn!(target: "poller", error = %e, "Poll failed");
                PollEvent::Failed(e)
            }
        };

        if events.send(E::from(event)).is_err() {
            debug!(target: "poller", "Event receiver dropped, stopping poll loop");
            break;
        }
        notify();
    }
}

pub fn spawn_poll_loop<E, F>(
    runtime: &Handle,
    source: Box<dyn SnapshotSource>,
    interval: Duration,
    events: UnboundedSender<E>,
    notify: F,
) -> JoinHandle<()>
where
    E: From<PollEvent> + Send + 'static,
    F: Fn() + Send + 'static,
{
    runtime.spawn(run_poll_loop(source, interval, events, notify))
}
