#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct MemoryStats {
    pub resident_bytes: u64,
    pub peak_bytes: u64,
    pub elapsed_time: Duration,
}

/// Tracks resident memory of the converter against the read budget.
#[cfg(feature = "cli")]
pub struct MemoryMonitor {
    system: System,
    pid: Option<Pid>,
    start_time: Instant,
    peak_bytes: u64,
    budget_bytes: usize,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl MemoryMonitor {
    pub fn new(enabled: bool, budget_bytes: usize) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Memory monitoring unavailable: {}", e);
                None
            }
        };

        Self {
            system: System::new(),
            pid,
            start_time: Instant::now(),
            peak_bytes: 0,
            budget_bytes,
            enabled,
        }
    }

    pub fn sample(&mut self) -> Option<MemoryStats> {
        if !self.enabled {
            return None;
        }
        let pid = self.pid?;

        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let resident = self.system.process(pid)?.memory();
        self.peak_bytes = self.peak_bytes.max(resident);

        Some(MemoryStats {
            resident_bytes: resident,
            peak_bytes: self.peak_bytes,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn log_stats(&mut self, phase: &str) {
        let budget = self.budget_bytes as u64;
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 {} - Memory: {}MB, Peak: {}MB, Time: {:?}",
                phase,
                stats.resident_bytes / 1024 / 1024,
                stats.peak_bytes / 1024 / 1024,
                stats.elapsed_time
            );
            if stats.resident_bytes > budget {
                tracing::warn!(
                    "Resident memory {}MB exceeds the {}MB read budget; consider --chunked",
                    stats.resident_bytes / 1024 / 1024,
                    budget / 1024 / 1024
                );
            }
        }
    }

    pub fn log_final_stats(&mut self) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                stats.elapsed_time,
                stats.peak_bytes / 1024 / 1024
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// No-op stand-in when built without the CLI stack
#[cfg(not(feature = "cli"))]
pub struct MemoryMonitor;

#[cfg(not(feature = "cli"))]
impl MemoryMonitor {
    pub fn new(_enabled: bool, _budget_bytes: usize) -> Self {
        Self
    }

    pub fn log_stats(&mut self, _phase: &str) {}

    pub fn log_final_stats(&mut self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
