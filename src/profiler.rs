//! Per-system timing, compiled in behind the `profile` feature.
//!
//! `SimWorld::step` records each pipeline stage's duration here when the
//! feature is enabled; stress tests print the summary to find the stage
//! that owns the frame budget.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Duration;

/// Accumulated timing for one named pipeline stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct SectionStats {
    pub total: Duration,
    pub calls: u64,
    pub max: Duration,
}

impl SectionStats {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }
}

/// Collects per-stage durations across ticks.
#[derive(Debug, Default)]
pub struct Profiler {
    sections: HashMap<&'static str, SectionStats>,
    ticks: u64,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one measured duration for a stage.
    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        let stats = self.sections.entry(name).or_default();
        stats.total += elapsed;
        stats.calls += 1;
        stats.max = stats.max.max(elapsed);
    }

    /// Marks the end of one tick.
    pub fn end_tick(&mut self) {
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn section(&self, name: &str) -> Option<SectionStats> {
        self.sections.get(name).copied()
    }

    /// Renders a per-stage summary, slowest stage first.
    pub fn summary(&self) -> String {
        let mut rows: Vec<_> = self.sections.iter().collect();
        rows.sort_by(|a, b| b.1.total.cmp(&a.1.total));
        let total: Duration = rows.iter().map(|(_, s)| s.total).sum();

        let mut out = String::new();
        let _ = writeln!(out, "profile over {} ticks", self.ticks);
        for (name, stats) in rows {
            let share = if total.as_nanos() > 0 {
                stats.total.as_nanos() as f64 / total.as_nanos() as f64 * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "  {name:<12} total {:>10.2?}  avg {:>9.2?}  max {:>9.2?}  {share:>5.1}%",
                stats.total,
                stats.average(),
                stats.max,
            );
        }
        out
    }

    pub fn reset(&mut self) {
        self.sections.clear();
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_accumulate() {
        let mut profiler = Profiler::new();
        profiler.record("movement", Duration::from_micros(100));
        profiler.record("movement", Duration::from_micros(300));
        profiler.end_tick();

        let stats = profiler.section("movement").unwrap();
        assert_eq!(stats.calls, 2);
        assert_eq!(stats.total, Duration::from_micros(400));
        assert_eq!(stats.max, Duration::from_micros(300));
        assert_eq!(stats.average(), Duration::from_micros(200));
    }

    #[test]
    fn test_summary_lists_sections() {
        let mut profiler = Profiler::new();
        profiler.record("collision", Duration::from_micros(50));
        profiler.end_tick();
        let summary = profiler.summary();
        assert!(summary.contains("collision"));
        assert!(summary.contains("1 ticks"));
    }
}
