// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read stream debug-info sampling allow-list.
//!
//! Decides whether a client session (csid) may emit verbose debug-sampling
//! information. The allow-list carries a deadline per csid and is reloaded
//! at runtime from an inline payload or a polled file.
//!
//! # Features
//!
//! - **Lock-free queries**: the allow-list is an `ArcSwap` snapshot
//! - **Hot reload**: `file:` sources are re-read on a fixed interval
//! - **Fail closed**: bad payloads and unknown sources never grant access
//! - **Update callback**: one listener notified per installed configuration
//!
//! # Quick Start
//!
//! ```no_run
//! use debug_sampling::DebugSamplingRegistry;
//! use std::time::Duration;
//!
//! let registry = DebugSamplingRegistry::builder("file:/etc/logdevice/debug_sampling.json")
//!     .poll_interval(Duration::from_secs(1))
//!     .on_update(|config| println!("{} sessions allowed", config.len()))
//!     .build();
//!
//! if registry.is_allowed("client-session-42") {
//!     // attach debug info
//! }
//! ```
//!
//! # Source Descriptors
//!
//! ```text
//! data: {"configs":[{"csid":"client-7","deadline":1767225600}]}
//! file:/etc/logdevice/debug_sampling.json
//! ```

pub mod config;
pub mod error;
pub mod notifier;
pub mod registry;
pub mod settings;
pub mod source;
pub mod stats;
pub mod store;

pub use config::{decode, encode, AllowListEntry, SamplingConfig};
pub use error::{DecodeError, SettingsError, SourceError};
pub use notifier::{UpdateCallback, UpdateNotifier};
pub use registry::{DebugSamplingRegistry, RegistryBuilder};
pub use settings::Settings;
pub use source::{
    open_source, BytesCallback, FileSource, InlineSource, RawConfigSource, SourceDescriptor,
    SourceKind, UnresolvedSource, DEFAULT_POLL_INTERVAL,
};
pub use stats::{RegistryStats, RegistryStatsSnapshot};
pub use store::{Snapshot, SnapshotStore};
