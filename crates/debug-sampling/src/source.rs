// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Raw configuration sources.
//!
//! A source is picked from a descriptor string:
//!
//! | Descriptor       | Backend                                       |
//! |------------------|-----------------------------------------------|
//! | `data:<payload>` | [`InlineSource`]: delivered once, on `start`  |
//! | `file:<path>`    | [`FileSource`]: read on `start`, then polled  |
//! | anything else    | [`UnresolvedSource`]: never delivers          |
//!
//! # File polling
//!
//! The file is re-read every poll interval on a background thread and the
//! callback fires only when the bytes differ from the last delivered bytes.
//! Read failures skip the tick. Stopping (or dropping) the source joins the
//! thread, so no callback runs after `stop` returns. A callback running on
//! the poller may stop its own source: the join is skipped and the thread
//! exits once the callback returns.

use crate::error::SourceError;
use crate::stats::RegistryStats;
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

const INLINE_SCHEME: &str = "data";
const FILE_SCHEME: &str = "file";

/// Callback receiving raw configuration bytes.
pub type BytesCallback = Box<dyn FnMut(&[u8]) + Send>;

/// Which backend a descriptor resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Inline,
    File,
    Unresolved,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Inline => write!(f, "inline"),
            SourceKind::File => write!(f, "file"),
            SourceKind::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Parsed source descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// Literal payload.
    Inline(Vec<u8>),
    /// Path of a file to watch.
    File(PathBuf),
    /// Descriptor with no matching backend (kept for diagnostics).
    Unresolved(String),
}

impl SourceDescriptor {
    /// Parse a descriptor. Never fails: unknown forms are [`Unresolved`].
    ///
    /// [`Unresolved`]: SourceDescriptor::Unresolved
    pub fn parse(descriptor: &str) -> Self {
        let Some((scheme, rest)) = descriptor.split_once(':') else {
            return SourceDescriptor::Unresolved(descriptor.to_string());
        };

        match scheme.trim() {
            INLINE_SCHEME => SourceDescriptor::Inline(rest.trim_start().as_bytes().to_vec()),
            FILE_SCHEME => {
                let path = rest.trim();
                if path.is_empty() {
                    SourceDescriptor::Unresolved(descriptor.to_string())
                } else {
                    SourceDescriptor::File(PathBuf::from(path))
                }
            }
            _ => SourceDescriptor::Unresolved(descriptor.to_string()),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceDescriptor::Inline(_) => SourceKind::Inline,
            SourceDescriptor::File(_) => SourceKind::File,
            SourceDescriptor::Unresolved(_) => SourceKind::Unresolved,
        }
    }
}

/// Supplier of raw configuration bytes.
pub trait RawConfigSource: Send {
    fn kind(&self) -> SourceKind;

    /// Begin delivering bytes to `on_bytes`.
    ///
    /// Any synchronously available content is delivered before this returns.
    fn start(&mut self, on_bytes: BytesCallback) -> Result<(), SourceError>;

    /// Stop delivering. No callback runs after this returns.
    fn stop(&mut self);

    /// Whether a background poller is active.
    fn is_running(&self) -> bool;
}

/// Instantiate the backend named by `descriptor`.
pub fn open_source(
    descriptor: SourceDescriptor,
    poll_interval: Duration,
    stats: Arc<RegistryStats>,
) -> Box<dyn RawConfigSource> {
    match descriptor {
        SourceDescriptor::Inline(payload) => Box::new(InlineSource::new(payload)),
        SourceDescriptor::File(path) => Box::new(FileSource::new(path, poll_interval, stats)),
        SourceDescriptor::Unresolved(raw) => Box::new(UnresolvedSource::new(raw)),
    }
}

// ---------------------------------------------------------------------------
// Inline
// ---------------------------------------------------------------------------

/// Literal payload, delivered exactly once.
pub struct InlineSource {
    payload: Vec<u8>,
    delivered: bool,
}

impl InlineSource {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            delivered: false,
        }
    }
}

impl RawConfigSource for InlineSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Inline
    }

    fn start(&mut self, mut on_bytes: BytesCallback) -> Result<(), SourceError> {
        if !self.delivered {
            self.delivered = true;
            on_bytes(&self.payload);
        }
        Ok(())
    }

    fn stop(&mut self) {}

    fn is_running(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Unresolved
// ---------------------------------------------------------------------------

/// Backend that was never found. Stays empty forever.
pub struct UnresolvedSource {
    descriptor: String,
}

impl UnresolvedSource {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
        }
    }
}

impl RawConfigSource for UnresolvedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Unresolved
    }

    fn start(&mut self, _on_bytes: BytesCallback) -> Result<(), SourceError> {
        Err(SourceError::Unresolved(self.descriptor.clone()))
    }

    fn stop(&mut self) {}

    fn is_running(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// File polled on a fixed interval.
pub struct FileSource {
    path: PathBuf,
    poll_interval: Duration,
    stats: Arc<RegistryStats>,
    /// Dropping the sender wakes the poller and makes it exit.
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl FileSource {
    pub fn new(path: PathBuf, poll_interval: Duration, stats: Arc<RegistryStats>) -> Self {
        Self {
            path,
            poll_interval,
            stats,
            stop_tx: None,
            thread: None,
        }
    }

}

impl RawConfigSource for FileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn start(&mut self, mut on_bytes: BytesCallback) -> Result<(), SourceError> {
        if self.thread.is_some() {
            tracing::debug!("file source '{}' already started", self.path.display());
            return Ok(());
        }

        let mut state = PollState::default();
        state.poll(&self.path, &self.stats, &mut on_bytes);

        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let path = self.path.clone();
        let poll_interval = self.poll_interval;
        let stats = Arc::clone(&self.stats);

        let handle = thread::Builder::new()
            .name("debug-sampling-poll".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(poll_interval) {
                    Err(RecvTimeoutError::Timeout) => state.poll(&path, &stats, &mut on_bytes),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(SourceError::Spawn)?;

        self.stop_tx = Some(stop_tx);
        self.thread = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop_tx.take();
        if let Some(handle) = self.thread.take() {
            // Stopped from a callback on the poller itself: it exits once
            // the callback returns and sees the closed channel.
            if handle.thread().id() == thread::current().id() {
                tracing::debug!("poller for '{}' stopping itself", self.path.display());
                return;
            }
            if handle.join().is_err() {
                tracing::error!("poller for '{}' panicked", self.path.display());
            }
        }
    }

    fn is_running(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for FileSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Last delivered content of a watched file.
#[derive(Default)]
struct PollState {
    last: Option<Vec<u8>>,
}

impl PollState {
    fn poll(&mut self, path: &Path, stats: &RegistryStats, on_bytes: &mut BytesCallback) {
        let bytes = match read_file(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("{} (keeping current allow-list)", e);
                stats.record_read_failure();
                return;
            }
        };

        if self.last.as_deref() == Some(bytes.as_slice()) {
            tracing::trace!("'{}' unchanged", path.display());
            stats.record_unchanged();
            return;
        }

        on_bytes(&bytes);
        self.last = Some(bytes);
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, SourceError> {
    std::fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}
