// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Permission registry: source -> decode -> snapshot -> callback.
//!
//! # Architecture
//!
//! ```text
//! DebugSamplingRegistry
//! +-- source: Box<dyn RawConfigSource>   (inline, polled file, or nothing)
//! +-- pipeline: Arc<RefreshPipeline>
//!     +-- store: SnapshotStore           (ArcSwap, lock-free reads)
//!     +-- notifier: UpdateNotifier       (single callback slot)
//!     +-- stats: Arc<RegistryStats>
//! ```
//!
//! Every failure fails closed: an unresolved source or a bad payload leaves
//! the previous allow-list (initially empty) in place.

use crate::config::{self, SamplingConfig};
use crate::error::{DecodeError, SourceError};
use crate::notifier::{UpdateCallback, UpdateNotifier};
use crate::settings::Settings;
use crate::source::{
    open_source, RawConfigSource, SourceDescriptor, SourceKind, DEFAULT_POLL_INTERVAL,
};
use crate::stats::{RegistryStats, RegistryStatsSnapshot};
use crate::store::{Snapshot, SnapshotStore};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Decode/install/notify path shared with the source callback.
struct RefreshPipeline {
    store: SnapshotStore,
    notifier: UpdateNotifier,
    stats: Arc<RegistryStats>,
}

impl RefreshPipeline {
    fn apply(&self, bytes: &[u8]) -> Result<u64, DecodeError> {
        let config = match config::decode(bytes) {
            Ok(config) => Arc::new(config),
            Err(e) => {
                self.stats.record_decode_failure();
                tracing::warn!(
                    "rejected debug sampling config: {} (keeping v{})",
                    e,
                    self.store.version()
                );
                return Err(e);
            }
        };

        let version = self.store.install(Arc::clone(&config));
        self.stats.record_install();
        tracing::info!(
            "debug sampling config v{} installed ({} entries)",
            version,
            config.len()
        );

        // Only after the snapshot is visible to readers.
        self.notifier.notify(version, &config);
        Ok(version)
    }

    /// Hand the installed configuration to a callback that has not seen it.
    fn replay(&self) {
        let snapshot = self.store.snapshot();
        if snapshot.version() > 0 {
            self.notifier.notify(snapshot.version(), snapshot.config());
        }
    }
}

/// Answers whether a client session may sample read stream debug info.
///
/// Queries never block and never fail; the registry starts empty and denies
/// everything until a valid configuration arrives.
pub struct DebugSamplingRegistry {
    pipeline: Arc<RefreshPipeline>,
    source: Mutex<Box<dyn RawConfigSource>>,
    kind: SourceKind,
}

impl DebugSamplingRegistry {
    /// Registry for `descriptor` with the default poll interval.
    pub fn new(descriptor: &str) -> Self {
        Self::builder(descriptor).build()
    }

    pub fn builder(descriptor: impl Into<String>) -> RegistryBuilder {
        RegistryBuilder::new(descriptor)
    }

    /// Registry configured from [`Settings`].
    pub fn from_settings(settings: &Settings) -> Self {
        Self::builder(settings.source.clone())
            .poll_interval(settings.poll_interval())
            .build()
    }

    /// Whether `csid` may sample debug info right now.
    pub fn is_allowed(&self, csid: &str) -> bool {
        self.is_allowed_at(csid, SystemTime::now())
    }

    /// Whether `csid` may sample debug info at `now`.
    ///
    /// Allowed iff the csid is listed and `now` (whole UNIX seconds) is
    /// strictly before its deadline.
    pub fn is_allowed_at(&self, csid: &str, now: SystemTime) -> bool {
        match self.pipeline.store.snapshot().deadline(csid) {
            Some(deadline) => unix_secs(now) < deadline,
            None => false,
        }
    }

    /// csids allowed at `now`, sorted.
    pub fn allowed_csids_at(&self, now: SystemTime) -> Vec<String> {
        self.pipeline
            .store
            .snapshot()
            .active_at(unix_secs(now))
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Register the update callback, replacing any previous one.
    ///
    /// If a configuration was installed before any callback existed (the
    /// initial load of a `file:` or `data:` source), it is delivered once,
    /// on this thread, before this returns. Later configurations arrive on
    /// the thread that installed them (the polling thread for file sources).
    /// The callback must not block for long. It may query or stop the
    /// registry.
    pub fn set_update_callback<F>(&self, callback: F)
    where
        F: Fn(&SamplingConfig) + Send + Sync + 'static,
    {
        self.pipeline.notifier.set(Arc::new(callback));
        self.pipeline.replay();
    }

    pub fn clear_update_callback(&self) {
        self.pipeline.notifier.clear();
    }

    /// Push a payload through the same path as source updates.
    pub fn reload_from_bytes(&self, bytes: &[u8]) -> Result<u64, DecodeError> {
        self.pipeline.apply(bytes)
    }

    pub fn current_config(&self) -> Arc<SamplingConfig> {
        self.pipeline.store.current()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.pipeline.store.snapshot()
    }

    /// Number of installed configurations (0 = still empty).
    pub fn version(&self) -> u64 {
        self.pipeline.store.version()
    }

    pub fn stats(&self) -> RegistryStatsSnapshot {
        self.pipeline.stats.snapshot()
    }

    pub fn source_kind(&self) -> SourceKind {
        self.kind
    }

    /// Whether a file poller is still running.
    pub fn is_watching(&self) -> bool {
        self.source.lock().is_running()
    }

    /// Stop refreshing. The current allow-list stays queryable.
    pub fn stop(&self) {
        self.source.lock().stop();
    }
}

impl Drop for DebugSamplingRegistry {
    fn drop(&mut self) {
        self.source.get_mut().stop();
    }
}

/// Builder for [`DebugSamplingRegistry`].
pub struct RegistryBuilder {
    descriptor: String,
    poll_interval: Duration,
    on_update: Option<UpdateCallback>,
}

impl RegistryBuilder {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            on_update: None,
        }
    }

    /// File poll interval. Zero falls back to the default.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = if interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        self
    }

    /// Callback registered before the first load.
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SamplingConfig) + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(callback));
        self
    }

    /// Resolve the source and perform the initial load.
    pub fn build(self) -> DebugSamplingRegistry {
        let stats = Arc::new(RegistryStats::new());
        let pipeline = Arc::new(RefreshPipeline {
            store: SnapshotStore::new(),
            notifier: UpdateNotifier::new(),
            stats: Arc::clone(&stats),
        });
        if let Some(cb) = self.on_update {
            pipeline.notifier.set(cb);
        }

        let descriptor = SourceDescriptor::parse(&self.descriptor);
        let kind = descriptor.kind();
        let mut source = open_source(descriptor, self.poll_interval, stats);

        let sink = Arc::clone(&pipeline);
        let started = source.start(Box::new(move |bytes: &[u8]| {
            // Failures are logged and counted inside apply.
            let _ = sink.apply(bytes);
        }));
        match started {
            Ok(()) => tracing::debug!("debug sampling source started ({})", kind),
            Err(SourceError::Unresolved(d)) => {
                tracing::warn!("no debug sampling source for '{}': all sessions denied", d);
            }
            Err(e) => tracing::error!("debug sampling source failed to start: {}", e),
        }

        DebugSamplingRegistry {
            pipeline,
            source: Mutex::new(source),
            kind,
        }
    }
}

/// Whole seconds since the UNIX epoch, rounded down (negative before it).
fn unix_secs(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => {
            let d = e.duration();
            let secs = i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
            if d.subsec_nanos() > 0 {
                -secs.saturating_add(1)
            } else {
                -secs
            }
        }
    }
}
