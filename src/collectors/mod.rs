pub mod system;

use crate::state::{RamStats, VramStats};
use std::collections::BTreeMap;

pub use system::HostResources;

pub trait ResourceSource: Send + Sync + 'static {
    fn facts(&self) -> BTreeMap<String, String>;

    fn ram(&self) -> RamStats;

    fn vram(&self) -> VramStats;
}

#[cfg(test)]
pub struct FixedResources {
    pub facts: BTreeMap<String, String>,
    pub ram: RamStats,
    pub vram: VramStats,
}

#[cfg(test)]
impl FixedResources {
    pub fn sample() -> Self {
        let facts = [
            ("Python version", "3.11.9"),
            ("Operating System", "Linux 6.8"),
            ("CPU", "Test CPU"),
            ("RAM", "7.81 / 15.63 GB (50%)"),
            ("PyTorch", "2.1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            facts,
            ram: RamStats {
                used_mb: 8000.0,
                total_mb: 16000.0,
                free_mb: 8000.0,
            },
            vram: VramStats {
                free_mb: 6000.0,
                total_mb: 8000.0,
            },
        }
    }
}

#[cfg(test)]
impl ResourceSource for FixedResources {
    fn facts(&self) -> BTreeMap<String, String> {
        self.facts.clone()
    }

    fn ram(&self) -> RamStats {
        self.ram
    }

    fn vram(&self) -> VramStats {
        self.vram
    }
}
