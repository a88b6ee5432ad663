//! Pipeline statistics and summary printing.

use std::time::Duration;

use ingestion::ConsumerStats;
use observability::{PipelineSummary, StatsSummary};

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Consumer-side counters
    pub consumer: ConsumerStats,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Whether the artifact was archived on shutdown
    pub archived: bool,
}

impl PipelineStats {
    /// Persisted readings per second
    pub fn throughput(&self) -> f64 {
        self.summary().throughput()
    }

    /// Build the displayable summary
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            received: self.consumer.received,
            decoded: self.consumer.decoded,
            rejected: self.consumer.rejected,
            persisted: self.consumer.persisted,
            flushes: self.consumer.flushes,
            flush_failures: self.consumer.flush_failures,
            elapsed_secs: self.duration.as_secs_f64(),
            batch_sizes: StatsSummary::from(&self.consumer.batch_sizes),
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n{}", self.summary());
        if self.archived {
            println!("Artifact archived to object storage");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_maps_counters() {
        let mut stats = PipelineStats::default();
        stats.consumer.received = 30;
        stats.consumer.decoded = 28;
        stats.consumer.rejected = 2;
        stats.consumer.persisted = 28;
        stats.consumer.flushes = 3;
        stats.duration = Duration::from_secs(4);

        let summary = stats.summary();
        assert_eq!(summary.received, 30);
        assert_eq!(summary.persisted, 28);
        assert!((summary.throughput() - 7.0).abs() < 1e-10);
    }
}
