// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Atomically swapped allow-list snapshot.
//!
//! - `ArcSwap`: readers do a single atomic load, no lock
//! - `Mutex`: serializes writers so version numbers stay ordered
//!
//! A snapshot is never mutated after it is published; an install builds a
//! fresh one and swaps the pointer.

use crate::config::SamplingConfig;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Installed allow-list as seen by readers.
#[derive(Debug)]
pub struct Snapshot {
    config: Arc<SamplingConfig>,
    /// csid -> effective deadline. Duplicates keep the furthest deadline.
    deadlines: HashMap<String, i64>,
    version: u64,
}

impl Snapshot {
    fn build(config: Arc<SamplingConfig>, version: u64) -> Self {
        let mut deadlines: HashMap<String, i64> = HashMap::with_capacity(config.len());
        for entry in config.entries() {
            deadlines
                .entry(entry.csid.clone())
                .and_modify(|d| *d = (*d).max(entry.deadline))
                .or_insert(entry.deadline);
        }
        Self {
            config,
            deadlines,
            version,
        }
    }

    /// The configuration as decoded.
    pub fn config(&self) -> &Arc<SamplingConfig> {
        &self.config
    }

    /// Effective deadline for `csid`, if listed.
    #[inline]
    pub fn deadline(&self, csid: &str) -> Option<i64> {
        self.deadlines.get(csid).copied()
    }

    /// 0 for the initial empty snapshot, +1 per install.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// csids whose effective deadline is still ahead of `now_secs`, sorted.
    pub fn active_at(&self, now_secs: i64) -> Vec<&str> {
        let mut active: Vec<&str> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| now_secs < **deadline)
            .map(|(csid, _)| csid.as_str())
            .collect();
        active.sort_unstable();
        active
    }
}

/// Single slot holding the current [`Snapshot`].
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    /// Store holding the empty configuration (everything denied).
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::build(
                Arc::new(SamplingConfig::default()),
                0,
            )),
            write_lock: Mutex::new(()),
        }
    }

    /// Publish `config`, returning its version.
    ///
    /// Readers that load after this returns see `config` or a later one.
    pub fn install(&self, config: Arc<SamplingConfig>) -> u64 {
        let _guard = self.write_lock.lock();
        let version = self.current.load().version + 1;
        self.current.store(Arc::new(Snapshot::build(config, version)));
        version
    }

    /// Current snapshot.
    #[inline]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Current configuration.
    pub fn current(&self) -> Arc<SamplingConfig> {
        Arc::clone(&self.current.load().config)
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_store_starts_empty() {
        let store = SnapshotStore::new();
        assert!(store.current().is_empty());
        assert_eq!(store.version(), 0);
        assert_eq!(store.snapshot().deadline("anything"), None);
    }

    #[test]
    fn test_install_replaces_whole_config() {
        let store = SnapshotStore::new();
        store.install(Arc::new(SamplingConfig::default().with_entry("a", 10)));
        let v2 = store.install(Arc::new(SamplingConfig::default().with_entry("b", 20)));

        assert_eq!(v2, 2);
        let snap = store.snapshot();
        assert_eq!(snap.deadline("a"), None);
        assert_eq!(snap.deadline("b"), Some(20));
    }

    #[test]
    fn test_duplicate_csid_uses_furthest_deadline() {
        let store = SnapshotStore::new();
        store.install(Arc::new(
            SamplingConfig::default()
                .with_entry("a", 50)
                .with_entry("a", 10)
                .with_entry("a", 30),
        ));
        assert_eq!(store.snapshot().deadline("a"), Some(50));
    }

    #[test]
    fn test_active_at_filters_expired() {
        let store = SnapshotStore::new();
        store.install(Arc::new(
            SamplingConfig::default()
                .with_entry("late", 200)
                .with_entry("early", 100)
                .with_entry("gone", 5),
        ));
        let snap = store.snapshot();
        assert_eq!(snap.active_at(50), vec!["early", "late"]);
        assert_eq!(snap.active_at(100), vec!["late"]);
        assert!(snap.active_at(200).is_empty());
    }

    #[test]
    fn test_reader_keeps_its_snapshot_across_install() {
        let store = SnapshotStore::new();
        store.install(Arc::new(SamplingConfig::default().with_entry("a", 10)));
        let held = store.snapshot();
        store.install(Arc::new(SamplingConfig::default()));

        assert_eq!(held.deadline("a"), Some(10));
        assert_eq!(store.snapshot().deadline("a"), None);
    }

    #[test]
    fn test_concurrent_installs_are_serialized() {
        let store = Arc::new(SnapshotStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..50 {
                        let csid = format!("t{i}-{j}");
                        store.install(Arc::new(SamplingConfig::default().with_entry(csid, 1)));
                        // Never torn: exactly one entry per snapshot.
                        assert_eq!(store.current().len(), 1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.version(), 400);
    }
}
