//! Configuration system for the simulator.
//!
//! This module defines all configuration structures and enums used to parameterize a run.
//! It provides:
//! 1. **Defaults:** Baseline workload, memory and scheduling constants.
//! 2. **Structures:** Hierarchical config for general, memory, scheduler and I/O settings.
//! 3. **Enums:** Memory mode, placement policy, eviction policy and presets.
//! 4. **Validation:** Rejection of malformed parameters before a simulator is built.
//!
//! Configuration is supplied as JSON (`Config::from_json`), built from a [`Preset`], or
//! taken from `Config::default()`.

use std::str::FromStr;

use serde::Deserialize;

use crate::common::{ConfigError, SimError};

/// Default configuration constants for the simulator.
mod defaults {
    /// Size of the simulated memory, in allocation units.
    pub const TOTAL_MEMORY: usize = 1024;

    /// Page (and frame) size for paged mode.
    pub const PAGE_SIZE: usize = 64;

    /// Round-robin time slice, in ticks.
    pub const QUANTUM: u64 = 3;

    /// Tick budget. Arrivals are spread over the first quarter of it.
    pub const TICK_BUDGET: u64 = 200;

    /// Hard stop for `Simulator::run`, protecting against workloads that can never finish.
    pub const MAX_TICKS: u64 = 10_000;

    /// Number of synthesized processes.
    pub const WORKLOAD_SIZE: usize = 15;

    /// Seed of the workload generator.
    pub const SEED: u64 = 42;

    /// Shortest CPU burst of a synthesized process.
    pub const BURST_MIN: u64 = 5;

    /// Longest CPU burst of a synthesized process.
    pub const BURST_MAX: u64 = 20;

    /// Smallest memory demand, as a fraction of total memory.
    pub const DEMAND_MIN_FRACTION: f64 = 0.05;

    /// Largest memory demand, as a fraction of total memory.
    pub const DEMAND_MAX_FRACTION: f64 = 0.30;

    /// Ticks a process spends blocked once it holds the peripheral.
    pub const IO_DURATION: u64 = 2;

    /// Memory size used by every preset.
    pub const PRESET_MEMORY: usize = 1024;

    /// Tick budget used by every preset.
    pub const PRESET_TICK_BUDGET: u64 = 150;

    /// Workload size used by every preset.
    pub const PRESET_WORKLOAD: usize = 18;
}

/// Memory management scheme used for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryMode {
    /// One linear address space managed as gaps and allocations.
    #[default]
    #[serde(alias = "Contiguous")]
    Contiguous,
    /// Fixed-size frames assigned page by page.
    #[serde(alias = "Paged", alias = "paging")]
    Paged,
}

impl FromStr for MemoryMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contiguous" => Ok(Self::Contiguous),
            "paged" | "paging" => Ok(Self::Paged),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// Gap selection policy for contiguous allocation.
///
/// Only gaps at least as large as the request are candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PlacementPolicy {
    /// Lowest-address candidate gap.
    #[default]
    #[serde(rename = "first", alias = "FirstFit", alias = "first_fit")]
    FirstFit,
    /// Smallest candidate gap; ties go to the lowest address.
    #[serde(rename = "best", alias = "BestFit", alias = "best_fit")]
    BestFit,
    /// Largest candidate gap; ties go to the lowest address.
    #[serde(rename = "worst", alias = "WorstFit", alias = "worst_fit")]
    WorstFit,
}

impl FromStr for PlacementPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "first_fit" | "firstfit" => Ok(Self::FirstFit),
            "best" | "best_fit" | "bestfit" => Ok(Self::BestFit),
            "worst" | "worst_fit" | "worstfit" => Ok(Self::WorstFit),
            _ => Err(ConfigError::UnknownPlacement(s.to_string())),
        }
    }
}

/// Frame replacement policy for paged mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Allocation fails when no frame is free.
    #[default]
    #[serde(alias = "None")]
    None,
    /// Evict the frame that has been loaded the longest.
    #[serde(alias = "Fifo", alias = "FIFO")]
    Fifo,
}

impl FromStr for EvictionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "fifo" => Ok(Self::Fifo),
            _ => Err(ConfigError::UnknownEviction(s.to_string())),
        }
    }
}

/// Ready-made configurations covering the classic scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Contiguous memory with first-fit placement.
    ContiguousFirstFit,
    /// Contiguous memory with best-fit placement.
    ContiguousBestFit,
    /// Paged memory without eviction.
    Paged,
    /// Paged memory with FIFO eviction.
    PagedFifo,
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contiguous-first" | "contiguous_first" => Ok(Self::ContiguousFirstFit),
            "contiguous-best" | "contiguous_best" => Ok(Self::ContiguousBestFit),
            "paged" => Ok(Self::Paged),
            "paged-fifo" | "paged_fifo" => Ok(Self::PagedFifo),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

/// Root configuration structure containing all simulator settings.
///
/// Every section and field is optional in JSON; missing values take their defaults.
///
/// # Examples
///
/// ```
/// use ossim_core::config::{Config, EvictionPolicy, MemoryMode};
///
/// let json = r#"{
///     "general": { "seed": 7, "workload_size": 4 },
///     "memory": { "mode": "paged", "total_size": 100, "page_size": 50, "eviction": "fifo" },
///     "scheduler": { "quantum": 2 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.memory.mode, MemoryMode::Paged);
/// assert_eq!(config.memory.eviction, EvictionPolicy::Fifo);
/// assert_eq!(config.general.tick_budget, 200);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Workload and run-length settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Memory manager settings
    #[serde(default)]
    pub memory: MemoryConfig,
    /// CPU scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Shared peripheral settings
    #[serde(default)]
    pub io: IoConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Parse`] for malformed JSON or unknown enum names, and
    /// [`SimError::Config`] when a parameter fails validation.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the configuration for a preset scenario.
    pub fn preset(preset: Preset) -> Self {
        let mut config = Self::default();
        config.memory.total_size = defaults::PRESET_MEMORY;
        config.memory.page_size = defaults::PAGE_SIZE;
        config.general.tick_budget = defaults::PRESET_TICK_BUDGET;
        config.general.workload_size = defaults::PRESET_WORKLOAD;
        match preset {
            Preset::ContiguousFirstFit => {
                config.memory.mode = MemoryMode::Contiguous;
                config.memory.placement = PlacementPolicy::FirstFit;
            }
            Preset::ContiguousBestFit => {
                config.memory.mode = MemoryMode::Contiguous;
                config.memory.placement = PlacementPolicy::BestFit;
            }
            Preset::Paged => {
                config.memory.mode = MemoryMode::Paged;
                config.memory.eviction = EvictionPolicy::None;
            }
            Preset::PagedFifo => {
                config.memory.mode = MemoryMode::Paged;
                config.memory.eviction = EvictionPolicy::Fifo;
            }
        }
        config
    }

    /// Checks every numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let general = &self.general;
        let memory = &self.memory;

        if memory.total_size == 0 {
            return Err(ConfigError::ZeroMemory);
        }
        if memory.mode == MemoryMode::Paged {
            if memory.page_size == 0 {
                return Err(ConfigError::ZeroPageSize);
            }
            if memory.page_size > memory.total_size {
                return Err(ConfigError::PageLargerThanMemory {
                    page_size: memory.page_size,
                    total: memory.total_size,
                });
            }
        }
        if self.scheduler.quantum == 0 {
            return Err(ConfigError::ZeroQuantum);
        }
        if general.workload_size == 0 {
            return Err(ConfigError::EmptyWorkload);
        }
        if general.tick_budget == 0 {
            return Err(ConfigError::ZeroTickBudget);
        }
        if general.burst_min == 0 || general.burst_min > general.burst_max {
            return Err(ConfigError::InvalidBurstRange {
                min: general.burst_min,
                max: general.burst_max,
            });
        }
        let (lo, hi) = (general.demand_min_fraction, general.demand_max_fraction);
        if !(lo > 0.0 && lo <= hi && hi <= 1.0) {
            return Err(ConfigError::InvalidDemandFractions { min: lo, max: hi });
        }
        if self.io.duration == 0 {
            return Err(ConfigError::ZeroIoDuration);
        }
        Ok(())
    }
}

/// Workload synthesis and run-length settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Seed of the workload generator; equal seeds give identical runs
    #[serde(default = "GeneralConfig::default_seed")]
    pub seed: u64,

    /// Number of processes to synthesize
    #[serde(default = "GeneralConfig::default_workload_size")]
    pub workload_size: usize,

    /// Nominal run length; arrivals fall in `0..=max(1, tick_budget / 4)`
    #[serde(default = "GeneralConfig::default_tick_budget")]
    pub tick_budget: u64,

    /// Upper bound on ticks executed by `Simulator::run`
    #[serde(default = "GeneralConfig::default_max_ticks")]
    pub max_ticks: u64,

    /// Shortest CPU burst
    #[serde(default = "GeneralConfig::default_burst_min")]
    pub burst_min: u64,

    /// Longest CPU burst
    #[serde(default = "GeneralConfig::default_burst_max")]
    pub burst_max: u64,

    /// Smallest memory demand as a fraction of total memory
    #[serde(default = "GeneralConfig::default_demand_min")]
    pub demand_min_fraction: f64,

    /// Largest memory demand as a fraction of total memory
    #[serde(default = "GeneralConfig::default_demand_max")]
    pub demand_max_fraction: f64,
}

impl GeneralConfig {
    fn default_seed() -> u64 {
        defaults::SEED
    }

    fn default_workload_size() -> usize {
        defaults::WORKLOAD_SIZE
    }

    fn default_tick_budget() -> u64 {
        defaults::TICK_BUDGET
    }

    fn default_max_ticks() -> u64 {
        defaults::MAX_TICKS
    }

    fn default_burst_min() -> u64 {
        defaults::BURST_MIN
    }

    fn default_burst_max() -> u64 {
        defaults::BURST_MAX
    }

    fn default_demand_min() -> f64 {
        defaults::DEMAND_MIN_FRACTION
    }

    fn default_demand_max() -> f64 {
        defaults::DEMAND_MAX_FRACTION
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: defaults::SEED,
            workload_size: defaults::WORKLOAD_SIZE,
            tick_budget: defaults::TICK_BUDGET,
            max_ticks: defaults::MAX_TICKS,
            burst_min: defaults::BURST_MIN,
            burst_max: defaults::BURST_MAX,
            demand_min_fraction: defaults::DEMAND_MIN_FRACTION,
            demand_max_fraction: defaults::DEMAND_MAX_FRACTION,
        }
    }
}

/// Memory manager configuration.
///
/// `placement` only applies to contiguous mode; `page_size`, `eviction` and
/// `rollback_partial` only apply to paged mode.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Total memory size in allocation units
    #[serde(default = "MemoryConfig::default_total_size")]
    pub total_size: usize,

    /// Memory management scheme
    #[serde(default)]
    pub mode: MemoryMode,

    /// Gap selection policy (contiguous mode)
    #[serde(default)]
    pub placement: PlacementPolicy,

    /// Page and frame size (paged mode)
    #[serde(default = "MemoryConfig::default_page_size")]
    pub page_size: usize,

    /// Frame replacement policy (paged mode)
    #[serde(default)]
    pub eviction: EvictionPolicy,

    /// Return frames bound by an admission attempt that fails partway (paged mode)
    #[serde(default)]
    pub rollback_partial: bool,
}

impl MemoryConfig {
    fn default_total_size() -> usize {
        defaults::TOTAL_MEMORY
    }

    fn default_page_size() -> usize {
        defaults::PAGE_SIZE
    }
}

impl Default for MemoryConfig {
    /// Contiguous first-fit memory of the default size.
    fn default() -> Self {
        Self {
            total_size: defaults::TOTAL_MEMORY,
            mode: MemoryMode::default(),
            placement: PlacementPolicy::default(),
            page_size: defaults::PAGE_SIZE,
            eviction: EvictionPolicy::default(),
            rollback_partial: false,
        }
    }
}

/// Round-robin scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum consecutive ticks a process runs before preemption
    #[serde(default = "SchedulerConfig::default_quantum")]
    pub quantum: u64,
}

impl SchedulerConfig {
    fn default_quantum() -> u64 {
        defaults::QUANTUM
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quantum: defaults::QUANTUM,
        }
    }
}

/// Shared peripheral configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IoConfig {
    /// Ticks a process stays blocked after acquiring the peripheral
    #[serde(default = "IoConfig::default_duration")]
    pub duration: u64,
}

impl IoConfig {
    fn default_duration() -> u64 {
        defaults::IO_DURATION
    }
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            duration: defaults::IO_DURATION,
        }
    }
}
