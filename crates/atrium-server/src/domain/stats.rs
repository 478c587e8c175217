//! System stats model and `/proc` text parsers.
//!
//! The dashboard's system monitor panel polls these numbers.  Each parser
//! takes the raw text of one proc file and returns a typed value; missing or
//! unparsable fields degrade to zero instead of failing the whole response.
//!
//! | Source file      | Parser                 | Output                  |
//! |------------------|------------------------|-------------------------|
//! | `/proc/stat`     | [`parse_cpu_sample`]   | [`CpuSample`]           |
//! | `/proc/meminfo`  | [`parse_meminfo`]      | [`MemoryStats`]         |
//! | `/proc/net/dev`  | [`parse_net_dev`]      | `Vec<NetworkInterface>` |
//! | `/proc/uptime`   | [`parse_uptime`]       | seconds                 |
//! | `/proc/loadavg`  | [`parse_loadavg`]      | `[f64; 3]`              |

use serde::Serialize;

/// Maximum number of interfaces reported by the network section.
pub const MAX_INTERFACES: usize = 4;

/// Text reported for uptime when `/proc/uptime` cannot be read.
pub const UNKNOWN_UPTIME: &str = "Unknown";

// ── Response DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuStats {
    /// Busy share over the sampling window, 0-100, one decimal.
    pub percent: f64,
    pub cores: usize,
}

/// Memory figures in megabytes, one decimal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    #[serde(rename = "total_mb")]
    pub total: f64,
    #[serde(rename = "used_mb")]
    pub used: f64,
    #[serde(rename = "available_mb")]
    pub available: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkInterface {
    pub name: String,
    /// Received megabytes since boot.
    #[serde(rename = "rx_mb")]
    pub rx: f64,
    /// Transmitted megabytes since boot.
    #[serde(rename = "tx_mb")]
    pub tx: f64,
}

/// Full `/api/stats` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStats {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub network: Vec<NetworkInterface>,
    pub uptime: String,
    pub load_average: [f64; 3],
}

// ── CPU ───────────────────────────────────────────────────────────────────────

/// One reading of the aggregate `cpu` line in `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuSample {
    pub total: u64,
    pub idle: u64,
}

/// Parses the aggregate `cpu ` line.  Returns `None` when it is absent.
///
/// The total is the sum of the first seven counters (user through softirq);
/// steal and guest time are left out.
pub fn parse_cpu_sample(stat: &str) -> Option<CpuSample> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let counters: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(7)
        .map(|f| f.parse().unwrap_or(0))
        .collect();
    let idle = counters.get(3).copied().unwrap_or(0);
    Some(CpuSample {
        total: counters.iter().sum(),
        idle,
    })
}

/// Counts the per-core `cpuN` lines in `/proc/stat`, never less than one.
/// Used when the host processor count is unavailable.
pub fn count_cores(stat: &str) -> usize {
    let cores = stat
        .lines()
        .filter(|l| {
            l.strip_prefix("cpu")
                .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        })
        .count();
    cores.max(1)
}

/// Busy percentage between two samples.  Zero when no time elapsed.
pub fn cpu_percent(first: CpuSample, second: CpuSample) -> f64 {
    let total = second.total.saturating_sub(first.total);
    let idle = second.idle.saturating_sub(first.idle);
    if total == 0 {
        return 0.0;
    }
    round_to(100.0 * (1.0 - idle as f64 / total as f64), 1)
}

// ── Memory ────────────────────────────────────────────────────────────────────

/// Parses `/proc/meminfo` into megabyte figures.
///
/// `MemAvailable` is preferred; kernels without it fall back to `MemFree`.
pub fn parse_meminfo(meminfo: &str) -> MemoryStats {
    let field = |key: &str| -> Option<u64> {
        meminfo.lines().find_map(|line| {
            let (name, rest) = line.split_once(':')?;
            if name.trim() != key {
                return None;
            }
            rest.split_whitespace().next()?.parse().ok()
        })
    };

    let total_kb = field("MemTotal").unwrap_or(0);
    let available_kb = field("MemAvailable")
        .or_else(|| field("MemFree"))
        .unwrap_or(0);
    let used_kb = total_kb.saturating_sub(available_kb);

    let percent = if total_kb == 0 {
        0.0
    } else {
        round_to(100.0 * used_kb as f64 / total_kb as f64, 1)
    };

    MemoryStats {
        total: kb_to_mb(total_kb),
        used: kb_to_mb(used_kb),
        available: kb_to_mb(available_kb),
        percent,
    }
}

fn kb_to_mb(kb: u64) -> f64 {
    round_to(kb as f64 / 1024.0, 1)
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Parses `/proc/net/dev`, skipping the two header lines and the loopback
/// interface.  At most [`MAX_INTERFACES`] entries are returned.
pub fn parse_net_dev(net_dev: &str) -> Vec<NetworkInterface> {
    net_dev
        .lines()
        .skip(2)
        .filter_map(|line| {
            let (name, counters) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() || name == "lo" {
                return None;
            }
            let fields: Vec<&str> = counters.split_whitespace().collect();
            let bytes = |i: usize| -> u64 {
                fields.get(i).and_then(|f| f.parse().ok()).unwrap_or(0)
            };
            Some(NetworkInterface {
                name: name.to_string(),
                rx: bytes_to_mb(bytes(0)),
                tx: bytes_to_mb(bytes(8)),
            })
        })
        .take(MAX_INTERFACES)
        .collect()
}

fn bytes_to_mb(bytes: u64) -> f64 {
    round_to(bytes as f64 / (1024.0 * 1024.0), 2)
}

// ── Uptime and load ───────────────────────────────────────────────────────────

/// Seconds since boot from the first field of `/proc/uptime`.
pub fn parse_uptime(uptime: &str) -> Option<f64> {
    uptime.split_whitespace().next()?.parse().ok()
}

/// Formats whole seconds as `"{days}d {hours}h {minutes}m"`.
pub fn format_uptime(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    format!("{days}d {hours}h {minutes}m")
}

/// The 1, 5 and 15 minute load averages.  Unparsable input yields zeros.
pub fn parse_loadavg(loadavg: &str) -> [f64; 3] {
    let mut fields = loadavg.split_whitespace().map(str::parse::<f64>);
    match (fields.next(), fields.next(), fields.next()) {
        (Some(Ok(one)), Some(Ok(five)), Some(Ok(fifteen))) => [one, five, fifteen],
        _ => [0.0; 3],
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
