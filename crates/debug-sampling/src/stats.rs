// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Refresh statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters updated by the refresh path.
#[derive(Debug)]
pub struct RegistryStats {
    /// Configurations decoded and installed.
    pub installs: AtomicU64,

    /// Payloads rejected by the decoder.
    pub decode_failures: AtomicU64,

    /// Poll ticks where the source could not be read.
    pub read_failures: AtomicU64,

    /// Poll ticks that found identical content.
    pub unchanged_polls: AtomicU64,

    /// Registry creation time.
    pub created: Instant,
}

impl RegistryStats {
    pub fn new() -> Self {
        Self {
            installs: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            read_failures: AtomicU64::new(0),
            unchanged_polls: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    pub fn record_install(&self) {
        self.installs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unchanged(&self) {
        self.unchanged_polls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats.
    pub fn snapshot(&self) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            installs: self.installs.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            unchanged_polls: self.unchanged_polls.load(Ordering::Relaxed),
            uptime_secs: self.created.elapsed().as_secs(),
        }
    }
}

impl Default for RegistryStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of registry statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStatsSnapshot {
    pub installs: u64,
    pub decode_failures: u64,
    pub read_failures: u64,
    pub unchanged_polls: u64,
    pub uptime_secs: u64,
}

impl RegistryStatsSnapshot {
    /// Failed refresh attempts of any kind.
    pub fn failures(&self) -> u64 {
        self.decode_failures + self.read_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counters() {
        let stats = RegistryStats::new();
        stats.record_install();
        stats.record_install();
        stats.record_decode_failure();
        stats.record_read_failure();
        stats.record_unchanged();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.installs, 2);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.read_failures, 1);
        assert_eq!(snapshot.unchanged_polls, 1);
        assert_eq!(snapshot.failures(), 2);
    }
}
