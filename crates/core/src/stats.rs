//! Simulation metrics, snapshots and final results.
//!
//! This module holds everything the simulator exposes to reporting layers. It provides:
//! 1. **History:** Per-tick usage ratio and secondary metric, plus compaction markers.
//! 2. **Snapshot:** A read-only view of scheduler queues and memory at the current tick.
//! 3. **Results:** Aggregates computed once the run is over, rendered as a sectioned text report.
//!
//! All records are `Serialize` so that drivers can export them as JSON.

use std::fmt;

use serde::Serialize;

use crate::common::{Pid, Tick};
use crate::mem::{MemoryView, SecondaryMetric};

/// Per-tick metric history of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    /// Usage ratio sampled at the end of each tick.
    pub usage: Vec<f64>,
    /// Secondary metric sampled at the end of each tick.
    pub secondary: Vec<SecondaryMetric>,
    /// Ticks at which memory was compacted.
    pub compactions: Vec<Tick>,
}

impl History {
    /// Appends one tick of samples.
    pub fn record(&mut self, usage: f64, secondary: SecondaryMetric) {
        self.usage.push(usage);
        self.secondary.push(secondary);
    }

    /// Number of sampled ticks.
    pub fn len(&self) -> usize {
        self.usage.len()
    }

    /// True before the first tick.
    pub fn is_empty(&self) -> bool {
        self.usage.is_empty()
    }

    /// Mean usage ratio over all sampled ticks, 0 when nothing was sampled.
    pub fn average_usage(&self) -> f64 {
        mean(&self.usage).unwrap_or(0.0)
    }

    /// Mean fragmentation degree over all sampled ticks (contiguous runs only).
    pub fn average_fragmentation(&self) -> Option<f64> {
        let frag: Vec<f64> = self
            .secondary
            .iter()
            .filter_map(|m| match *m {
                SecondaryMetric::Fragmentation(f) => Some(f),
                SecondaryMetric::PageFaults(_) => None,
            })
            .collect();
        mean(&frag)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Read-only state of the simulation after a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Ticks completed so far.
    pub tick: Tick,
    /// Process holding the CPU.
    pub running: Option<Pid>,
    /// Ready queue, head first.
    pub ready: Vec<Pid>,
    /// Blocked queue, in blocking order.
    pub blocked: Vec<Pid>,
    /// Current usage ratio.
    pub usage: f64,
    /// Current secondary metric.
    pub secondary: SecondaryMetric,
    /// Holder of the shared peripheral.
    pub resource_holder: Option<Pid>,
    /// Number of finalized processes.
    pub finished: usize,
    /// Memory layout.
    pub memory: MemoryView,
}

/// Mode-specific part of the final results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum MemorySummary {
    /// Contiguous memory summary.
    Contiguous {
        /// Mean fragmentation degree over the run.
        average_fragmentation: f64,
        /// Free units at the end of the run.
        final_free: usize,
        /// Largest free gap at the end of the run.
        largest_gap: usize,
    },
    /// Paged memory summary.
    Paged {
        /// Page faults over the whole run.
        page_faults: u64,
    },
}

/// Aggregate results of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResults {
    /// Processes that terminated.
    pub completed: usize,
    /// Processes synthesized.
    pub total: usize,
    /// Ticks simulated.
    pub ticks: Tick,
    /// Mean ready-queue wait of terminated processes.
    pub average_wait: Option<f64>,
    /// Mean turnaround (finish minus arrival) of terminated processes.
    pub average_turnaround: Option<f64>,
    /// Mean usage ratio over the run.
    pub average_usage: f64,
    /// Dispatches performed by the scheduler.
    pub dispatches: u64,
    /// Quantum expirations.
    pub preemptions: u64,
    /// Granted peripheral requests.
    pub io_grants: u64,
    /// Denied peripheral requests.
    pub io_denials: u64,
    /// Mode-specific summary.
    pub memory: MemorySummary,
}

/// Section names for selective results output.
///
/// Valid section identifiers: `"summary"`, `"scheduling"`, `"memory"`.
/// Pass an empty slice to `render_sections` to render all sections.
pub const RESULT_SECTIONS: &[&str] = &["summary", "scheduling", "memory"];

const RULE: &str = "==========================================================";
const SUB_RULE: &str = "----------------------------------------------------------";

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

impl RunResults {
    /// Renders only the requested sections as a text report.
    ///
    /// Each element of `sections` should be one of [`RESULT_SECTIONS`]. Pass an empty slice
    /// to render everything.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let mut out = String::new();
        let _ = self.write_sections(&mut out, sections);
        out
    }

    fn write_sections<W: fmt::Write>(&self, w: &mut W, sections: &[String]) -> fmt::Result {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);

        writeln!(w, "{RULE}")?;
        writeln!(w, "OS RESOURCE SIMULATION RESULTS")?;
        writeln!(w, "{RULE}")?;
        if want("summary") {
            writeln!(w, "sim_ticks                {}", self.ticks)?;
            writeln!(w, "proc_completed           {} / {}", self.completed, self.total)?;
            writeln!(w, "proc_avg_wait            {}", fmt_opt(self.average_wait))?;
            writeln!(w, "proc_avg_turnaround      {}", fmt_opt(self.average_turnaround))?;
            writeln!(w, "{SUB_RULE}")?;
        }
        if want("scheduling") {
            writeln!(w, "SCHEDULING")?;
            writeln!(w, "  rr.dispatches          {}", self.dispatches)?;
            writeln!(w, "  rr.preemptions         {}", self.preemptions)?;
            writeln!(w, "  io.grants              {}", self.io_grants)?;
            writeln!(w, "  io.denials             {}", self.io_denials)?;
            writeln!(w, "{SUB_RULE}")?;
        }
        if want("memory") {
            writeln!(w, "MEMORY")?;
            writeln!(w, "  mem.avg_usage          {:.2}%", self.average_usage * 100.0)?;
            match self.memory {
                MemorySummary::Contiguous {
                    average_fragmentation,
                    final_free,
                    largest_gap,
                } => {
                    writeln!(w, "  mem.avg_fragmentation  {average_fragmentation:.4}")?;
                    writeln!(w, "  mem.final_free         {final_free}")?;
                    writeln!(w, "  mem.largest_gap        {largest_gap}")?;
                }
                MemorySummary::Paged { page_faults } => {
                    writeln!(w, "  mem.page_faults        {page_faults}")?;
                }
            }
        }
        writeln!(w, "{RULE}")
    }
}

impl fmt::Display for RunResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_sections(f, &[])
    }
}
