use crate::client::TelemetryClient;
use crate::state::{Snapshot, StateUpdate};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FreeVram,
    FreeRam,
    Copy,
}

impl Action {
    pub const TOOLBAR: [Action; 3] = [Action::FreeVram, Action::FreeRam, Action::Copy];

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "free_vram" => Some(Self::FreeVram),
            "free_ram" => Some(Self::FreeRam),
            "copy" => Some(Self::Copy),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::FreeVram => "free_vram",
            Self::FreeRam => "free_ram",
            Self::Copy => "copy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FreeVram => "Free VRAM",
            Self::FreeRam => "Free RAM",
            Self::Copy => "Copy",
        }
    }
}

pub fn spawn_free_vram(
    client: TelemetryClient,
    updates: UnboundedSender<StateUpdate>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match client.free_vram().await {
            Ok(report) => {
                if let Some(vram) = report.vram {
                    let _ = updates.send(StateUpdate::Vram(vram));
                }
            }
            Err(err) => {
                warn!(error = %err, "free VRAM request failed");
                let _ = updates.send(StateUpdate::Alert(format!("Free VRAM failed: {err}")));
            }
        }
    })
}

pub fn spawn_free_ram(
    client: TelemetryClient,
    updates: UnboundedSender<StateUpdate>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match client.free_ram().await {
            Ok(report) => {
                if let Some(ram) = report.ram {
                    let _ = updates.send(StateUpdate::Ram(ram));
                }
            }
            Err(err) => {
                warn!(error = %err, "free RAM request failed");
                let _ = updates.send(StateUpdate::Alert(format!("Free RAM failed: {err}")));
            }
        }
    })
}

pub fn spawn_run(client: TelemetryClient, updates: UnboundedSender<StateUpdate>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let snapshot: Snapshot = match client.sysinfo().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "system info request failed");
                let _ = updates.send(StateUpdate::Alert(format!("Run failed: {err}")));
                return;
            }
        };
        debug!(facts = snapshot.len(), "snapshot received");
        let _ = updates.send(StateUpdate::Snapshot(snapshot));

        match client.system_info().await {
            Ok(report) => {
                if let Some(vram) = report.vram {
                    let _ = updates.send(StateUpdate::Vram(vram));
                }
                if let Some(ram) = report.ram {
                    let _ = updates.send(StateUpdate::Ram(ram));
                }
            }
            Err(err) => debug!(error = %err, "live refresh after run failed"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_from_key() {
        for action in Action::TOOLBAR {
            assert_eq!(Action::from_key(action.key()), Some(action));
        }
        assert_eq!(Action::from_key("reboot"), None);
    }
}
