use crate::collectors::ResourceSource;
use crate::state::{RamStats, VramStats};
use std::collections::BTreeMap;
use std::process::Command;
use std::sync::{Mutex, MutexGuard};
use sysinfo::{CpuExt, System, SystemExt};
use tracing::debug;

const MIB: f64 = 1024.0 * 1024.0;

pub struct HostResources {
    system: Mutex<System>,
}

impl Default for HostResources {
    fn default() -> Self {
        Self::new()
    }
}

impl HostResources {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl ResourceSource for HostResources {
    fn facts(&self) -> BTreeMap<String, String> {
        let mut facts = BTreeMap::new();
        let ram = self.ram();
        {
            let system = self.system();
            let os = match (system.name(), system.kernel_version()) {
                (Some(name), Some(kernel)) => format!("{name} {kernel}"),
                (Some(name), None) => name,
                _ => std::env::consts::OS.to_string(),
            };
            facts.insert("Operating System".to_string(), os);

            let cpu = system
                .cpus()
                .first()
                .map(|c| c.brand().trim().to_string())
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| std::env::consts::ARCH.to_string());
            facts.insert("CPU".to_string(), cpu);
        }
        facts.insert("RAM".to_string(), format_ram_fact(&ram));

        let gpus = query_nvidia_gpus();
        let gpu = match gpus.first() {
            Some(g) => format!("CUDA available: {}", g.name),
            None => "CPU only".to_string(),
        };
        facts.insert("GPU".to_string(), gpu);
        if let Some(driver) = gpus.first().and_then(|g| g.driver.clone()) {
            facts.insert("Driver version".to_string(), driver);
        }
        facts
    }

    fn ram(&self) -> RamStats {
        let mut system = self.system();
        system.refresh_memory();
        RamStats {
            used_mb: (system.used_memory() as f64 / MIB).floor(),
            total_mb: (system.total_memory() as f64 / MIB).floor(),
            free_mb: (system.available_memory() as f64 / MIB).floor(),
        }
    }

    fn vram(&self) -> VramStats {
        query_nvidia_gpus()
            .first()
            .map(|g| VramStats {
                free_mb: g.memory_free_mb,
                total_mb: g.memory_total_mb,
            })
            .unwrap_or_default()
    }
}

fn format_ram_fact(ram: &RamStats) -> String {
    if ram.total_mb <= 0.0 {
        return "Unknown".to_string();
    }
    let pct = ram.used_mb / ram.total_mb * 100.0;
    format!(
        "{:.2} / {:.2} GB ({:.0}%)",
        ram.used_mb / 1024.0,
        ram.total_mb / 1024.0,
        pct
    )
}

#[derive(Debug, Clone, PartialEq)]
struct NvidiaGpu {
    name: String,
    memory_free_mb: f64,
    memory_total_mb: f64,
    driver: Option<String>,
}

fn query_nvidia_gpus() -> Vec<NvidiaGpu> {
    let output = run_nvidia_smi(&[
        "--query-gpu=name,memory.free,memory.total,driver_version",
        "--format=csv,noheader,nounits",
    ]);

    let Some(output) = output else {
        return Vec::new();
    };
    if !output.status.success() {
        debug!(status = ?output.status, "nvidia-smi exited with failure");
        return Vec::new();
    }

    let Ok(text) = String::from_utf8(output.stdout) else {
        return Vec::new();
    };
    parse_nvidia_csv(&text)
}

fn parse_nvidia_csv(text: &str) -> Vec<NvidiaGpu> {
    text.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').map(|v| v.trim()).collect();
            if parts.len() < 3 || parts[0].is_empty() {
                return None;
            }
            Some(NvidiaGpu {
                name: parts[0].to_string(),
                memory_free_mb: parse_f64_loose(parts[1]).unwrap_or(0.0).max(0.0),
                memory_total_mb: parse_f64_loose(parts[2]).unwrap_or(0.0).max(0.0),
                driver: parts
                    .get(3)
                    .filter(|d| !d.is_empty())
                    .map(|d| d.to_string()),
            })
        })
        .collect()
}

fn run_nvidia_smi(args: &[&str]) -> Option<std::process::Output> {
    if let Ok(output) = Command::new("nvidia-smi").args(args).output() {
        return Some(output);
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(output) = Command::new(r"C:\Windows\System32\nvidia-smi.exe")
            .args(args)
            .output()
        {
            return Some(output);
        }
    }

    None
}

fn parse_f64_loose(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if let Ok(v) = trimmed.parse::<f64>() {
        return Some(v);
    }

    let filtered: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();
    if filtered.is_empty() {
        return None;
    }

    filtered.replace(',', ".").parse::<f64>().ok()
}
