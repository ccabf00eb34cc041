use crate::client::TelemetryClient;
use crate::state::StateUpdate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

// Each tick spawns its own fetch, so a slow fetch never delays the next tick.
#[derive(Debug)]
pub struct TelemetryPoller {
    interval: Duration,
    single_flight: bool,
    running: Option<Running>,
}

#[derive(Debug)]
struct Running {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl Default for TelemetryPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl TelemetryPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            single_flight: false,
            running: None,
        }
    }

    pub fn with_single_flight(mut self, single_flight: bool) -> Self {
        self.single_flight = single_flight;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn active_timers(&self) -> usize {
        usize::from(self.is_running())
    }

    pub fn start(&mut self, client: TelemetryClient, updates: UnboundedSender<StateUpdate>) -> bool {
        if self.running.is_some() {
            return false;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(poll_loop(
            client,
            updates,
            self.interval,
            self.single_flight,
            shutdown_rx,
        ));
        info!(interval_ms = self.interval.as_millis() as u64, "telemetry polling started");
        self.running = Some(Running { task, shutdown });
        true
    }

    pub fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };
        let _ = running.shutdown.send(true);
        running.task.abort();
        info!("telemetry polling stopped");
        true
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    client: TelemetryClient,
    updates: UnboundedSender<StateUpdate>,
    period: Duration,
    single_flight: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let in_flight = Arc::new(AtomicBool::new(false));

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                if updates.is_closed() {
                    break;
                }
                if single_flight && in_flight.swap(true, Ordering::AcqRel) {
                    debug!("previous telemetry fetch still pending, skipping tick");
                    continue;
                }
                tokio::spawn(fetch_once(
                    client.clone(),
                    updates.clone(),
                    in_flight.clone(),
                    shutdown.clone(),
                ));
            }
        }
    }
}

async fn fetch_once(
    client: TelemetryClient,
    updates: UnboundedSender<StateUpdate>,
    in_flight: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::select! {
        _ = shutdown.wait_for(|stopped| *stopped) => {}
        result = client.telemetry() => match result {
            Ok(report) => {
                if let Some(vram) = report.vram {
                    let _ = updates.send(StateUpdate::Vram(vram));
                }
                if let Some(ram) = report.ram {
                    let _ = updates.send(StateUpdate::Ram(ram));
                }
            }
            // Background failures stay quiet: keep the previous reading.
            Err(err) => debug!(error = %err, "telemetry poll failed"),
        }
    }
    in_flight.store(false, Ordering::Release);
}
