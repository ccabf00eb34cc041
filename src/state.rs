use crate::catalog::{self, Category, EXPANDED_BY_DEFAULT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    facts: HashMap<String, String>,
}

impl Snapshot {
    pub fn new(facts: HashMap<String, String>) -> Self {
        Self { facts }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            facts: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.facts.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.facts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct RamStats {
    #[serde(default)]
    pub used_mb: f64,
    #[serde(default)]
    pub total_mb: f64,
    #[serde(default)]
    pub free_mb: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct VramStats {
    #[serde(default)]
    pub free_mb: f64,
    #[serde(default)]
    pub total_mb: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LiveMetrics {
    pub ram: RamStats,
    pub vram: VramStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Snapshot(Snapshot),
    Ram(RamStats),
    Vram(VramStats),
    Alert(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Snapshot { first: bool },
    Live,
    Alert,
}

#[derive(Debug, Clone)]
pub struct WidgetState {
    catalog: &'static [Category],
    snapshot: Option<Snapshot>,
    live: LiveMetrics,
    collapsed: HashMap<&'static str, bool>,
    first_run_done: bool,
    anim_seed: f64,
    report: String,
    alerts: Vec<String>,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self::new(catalog::CATEGORIES)
    }
}

impl WidgetState {
    pub fn new(catalog: &'static [Category]) -> Self {
        Self {
            catalog,
            snapshot: None,
            live: LiveMetrics::default(),
            collapsed: HashMap::new(),
            first_run_done: false,
            anim_seed: rand::random::<f64>(),
            report: String::new(),
            alerts: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &'static [Category] {
        self.catalog
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn live(&self) -> &LiveMetrics {
        &self.live
    }

    pub fn report(&self) -> &str {
        &self.report
    }

    pub fn anim_seed(&self) -> f64 {
        self.anim_seed
    }

    pub fn with_anim_seed(mut self, seed: f64) -> Self {
        self.anim_seed = seed;
        self
    }

    pub fn apply(&mut self, update: StateUpdate) -> Applied {
        match update {
            StateUpdate::Snapshot(snapshot) => {
                let first = self.apply_snapshot(snapshot);
                Applied::Snapshot { first }
            }
            StateUpdate::Ram(ram) => {
                self.live.ram = ram;
                Applied::Live
            }
            StateUpdate::Vram(vram) => {
                self.live.vram = vram;
                Applied::Live
            }
            StateUpdate::Alert(message) => {
                self.alerts.push(message);
                Applied::Alert
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) -> bool {
        let first = !self.first_run_done;
        if first {
            for (i, category) in self.catalog.iter().enumerate() {
                self.collapsed
                    .insert(category.title, i >= EXPANDED_BY_DEFAULT);
            }
            self.first_run_done = true;
        }
        self.report = catalog::format_report(&snapshot);
        self.snapshot = Some(snapshot);
        first
    }

    pub fn is_collapsed(&self, title: &str) -> bool {
        self.collapsed.get(title).copied().unwrap_or(false)
    }

    // Unknown titles are ignored and reported as `false`.
    pub fn toggle_collapsed(&mut self, title: &str) -> bool {
        let Some(category) = catalog::find_category(self.catalog, title) else {
            return false;
        };
        let flag = self.collapsed.entry(category.title).or_insert(false);
        *flag = !*flag;
        true
    }

    pub fn push_alert(&mut self, message: impl Into<String>) {
        self.alerts.push(message.into());
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }
}
