//! Run-summary statistics
//!
//! In-memory aggregation for the end-of-run report, separate from the
//! Prometheus counters the pipeline records live.

/// End-of-run pipeline summary
#[derive(Debug, Clone, Default)]
pub struct PipelineSummary {
    pub received: u64,
    pub decoded: u64,
    pub rejected: u64,
    pub persisted: u64,
    pub flushes: u64,
    pub flush_failures: u64,
    pub elapsed_secs: f64,
    /// Per-flush batch size distribution
    pub batch_sizes: StatsSummary,
}

impl PipelineSummary {
    /// Rejected payloads as a percentage of received
    pub fn reject_rate(&self) -> f64 {
        if self.received == 0 {
            0.0
        } else {
            self.rejected as f64 / self.received as f64 * 100.0
        }
    }

    /// Persisted readings per second over the run
    pub fn throughput(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.persisted as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Pipeline Summary ===")?;
        writeln!(f, "Received payloads: {}", self.received)?;
        writeln!(
            f,
            "Rejected payloads: {} ({:.2}%)",
            self.rejected,
            self.reject_rate()
        )?;
        writeln!(f, "Persisted readings: {}", self.persisted)?;
        writeln!(
            f,
            "Flushes: {} ({} failed)",
            self.flushes, self.flush_failures
        )?;
        writeln!(f, "Batch size: {}", self.batch_sizes)?;
        writeln!(
            f,
            "Elapsed: {:.1}s ({:.1} readings/s)",
            self.elapsed_secs,
            self.throughput()
        )?;
        Ok(())
    }
}

/// Snapshot of a running statistic
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_empty_stats_summary_displays_na() {
        let summary = StatsSummary::default();
        assert_eq!(format!("{summary}"), "N/A");
    }

    #[test]
    fn test_summary_display() {
        let mut batch_sizes = RunningStats::default();
        batch_sizes.push(11.0);
        batch_sizes.push(11.0);
        batch_sizes.push(3.0);

        let summary = PipelineSummary {
            received: 27,
            decoded: 25,
            rejected: 2,
            persisted: 25,
            flushes: 3,
            flush_failures: 0,
            elapsed_secs: 2.5,
            batch_sizes: StatsSummary::from(&batch_sizes),
        };

        let output = format!("{summary}");
        assert!(output.contains("Received payloads: 27"));
        assert!(output.contains("7.41%"));
        assert!(output.contains("10.0 readings/s"));
        assert!(output.contains("n=3"));
    }
}
