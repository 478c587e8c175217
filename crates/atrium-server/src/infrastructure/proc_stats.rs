//! Reads the proc filesystem and assembles [`SystemStats`].
//!
//! All parsing lives in [`crate::domain::stats`]; this module only does the
//! file reads and the CPU sampling delay.  A file that cannot be read yields
//! the same zero/"Unknown" values a malformed one would, so the stats
//! endpoints keep answering inside containers with a partial `/proc`.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::domain::stats::{self, CpuStats, MemoryStats, NetworkInterface, SystemStats};

/// Delay between the two `/proc/stat` samples used for the CPU percentage.
pub const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Source of system stats rooted at a proc directory.
#[derive(Debug, Clone)]
pub struct ProcStats {
    root: PathBuf,
    sample_interval: Duration,
}

impl ProcStats {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sample_interval: CPU_SAMPLE_INTERVAL,
        }
    }

    /// Overrides the CPU sampling delay.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn cpu(&self) -> CpuStats {
        let first = self.read("stat").await;
        tokio::time::sleep(self.sample_interval).await;
        let second = self.read("stat").await;

        let sample = |text: &Option<String>| {
            text.as_deref()
                .and_then(stats::parse_cpu_sample)
                .unwrap_or_default()
        };
        let percent = stats::cpu_percent(sample(&first), sample(&second));
        // Cores describe the machine running the server, even when the
        // proc root points elsewhere.
        let cores = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or_else(|_| second.as_deref().map_or(1, stats::count_cores));

        CpuStats { percent, cores }
    }

    pub async fn memory(&self) -> MemoryStats {
        self.read("meminfo")
            .await
            .map(|text| stats::parse_meminfo(&text))
            .unwrap_or_default()
    }

    pub async fn network(&self) -> Vec<NetworkInterface> {
        self.read("net/dev")
            .await
            .map(|text| stats::parse_net_dev(&text))
            .unwrap_or_default()
    }

    pub async fn uptime(&self) -> String {
        self.read("uptime")
            .await
            .as_deref()
            .and_then(stats::parse_uptime)
            .map_or_else(|| stats::UNKNOWN_UPTIME.to_string(), stats::format_uptime)
    }

    pub async fn load_average(&self) -> [f64; 3] {
        self.read("loadavg")
            .await
            .map_or([0.0; 3], |text| stats::parse_loadavg(&text))
    }

    /// Collects every section.  The CPU sample delay dominates the latency.
    pub async fn snapshot(&self) -> SystemStats {
        let (cpu, memory, network, uptime, load_average) = tokio::join!(
            self.cpu(),
            self.memory(),
            self.network(),
            self.uptime(),
            self.load_average()
        );
        SystemStats {
            cpu,
            memory,
            network,
            uptime,
            load_average,
        }
    }

    async fn read(&self, relative: &str) -> Option<String> {
        let path = self.root.join(relative);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read proc file");
                None
            }
        }
    }
}

impl Default for ProcStats {
    fn default() -> Self {
        Self::new("/proc")
    }
}
