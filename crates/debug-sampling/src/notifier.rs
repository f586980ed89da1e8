// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Single-slot update callback.

use crate::config::SamplingConfig;
use parking_lot::Mutex;
use std::sync::Arc;

/// Callback receiving each newly installed configuration.
pub type UpdateCallback = Arc<dyn Fn(&SamplingConfig) + Send + Sync>;

#[derive(Default)]
struct Slot {
    callback: Option<UpdateCallback>,
    /// Newest version handed to a callback (0 = none yet).
    delivered: u64,
}

/// Holds at most one [`UpdateCallback`]. Registering replaces the previous one.
///
/// Each installed version is handed out at most once, and never after a
/// newer one. Installs racing on different threads may therefore skip the
/// older version, and their callbacks may overlap in time. The newest
/// configuration always reaches the callback.
#[derive(Default)]
pub struct UpdateNotifier {
    slot: Mutex<Slot>,
}

impl UpdateNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`, returning the one it replaces.
    pub fn set(&self, callback: UpdateCallback) -> Option<UpdateCallback> {
        self.slot.lock().callback.replace(callback)
    }

    pub fn clear(&self) -> Option<UpdateCallback> {
        self.slot.lock().callback.take()
    }

    /// Hand `config` (installed as `version`) to the registered callback.
    ///
    /// Returns false when there is no callback, or when `version` is not
    /// newer than the last delivered one. A version with no callback to
    /// receive it stays pending, so a later [`notify`](Self::notify) for the
    /// same version still delivers it.
    ///
    /// The slot lock is released before the call so the callback may
    /// re-register itself.
    pub fn notify(&self, version: u64, config: &SamplingConfig) -> bool {
        let callback = {
            let mut slot = self.slot.lock();
            if version <= slot.delivered {
                return false;
            }
            let Some(callback) = slot.callback.clone() else {
                return false;
            };
            slot.delivered = version;
            callback
        };
        callback(config);
        true
    }
}
