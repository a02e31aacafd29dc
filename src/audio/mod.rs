// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Audio preview playback interfaces.
//!
//! A mapset's preview is a short audio sample fetched on demand and owned by
//! the preview cache for the lifetime of the screen. This module defines the
//! handle the cache stores ([`PreviewTrack`]), the fetch boundary it calls
//! through ([`PreviewSource`]), and the silent placeholder that stands in
//! when nothing is selected. The MPV-backed implementation lives in
//! [`mpv`]; tests substitute their own fakes.

pub mod mpv;

use std::sync::Arc;

use thiserror::Error;

use crate::model::MapsetId;

/// Failures while obtaining or driving a preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// The preview could not be retrieved. Transient; the cache entry is not
    /// poisoned and a later activation retries.
    #[error("preview fetch failed: {0}")]
    Fetch(String),

    /// The audio backend could not be brought up for this track.
    #[error("audio backend failure: {0}")]
    Backend(String),
}

/// An owned, playable audio handle.
///
/// All methods are best-effort and idempotent: stopping a stopped track or
/// closing a closed one is a no-op. Handles are shared between the cache and
/// the current-playback slot, so `close` must tolerate being reached through
/// either alias (the cache guarantees it is only called once per handle).
pub trait PreviewTrack: Send + Sync {
    fn play(&self);

    fn stop(&self);

    /// Rewinds to position zero without changing the play/pause state.
    fn seek_to_start(&self);

    fn is_playing(&self) -> bool;

    /// Releases the underlying audio resources.
    fn close(&self);
}

/// Retrieves the preview audio for a mapset. Blocking network I/O; only ever
/// called from a preview worker thread.
pub trait PreviewSource: Send + Sync {
    fn fetch(&self, id: MapsetId) -> Result<Arc<dyn PreviewTrack>, PreviewError>;
}

/// The placeholder handle that is "playing" when nothing is selected.
#[derive(Debug, Default)]
pub struct SilentTrack;

impl SilentTrack {
    pub fn new() -> Self {
        Self
    }
}

impl PreviewTrack for SilentTrack {
    fn play(&self) {}

    fn stop(&self) {}

    fn seek_to_start(&self) {}

    fn is_playing(&self) -> bool {
        false
    }

    fn close(&self) {}
}
