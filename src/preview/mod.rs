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

//! Per-mapset audio preview cache.
//!
//! [`PreviewCache`] lazily fetches the preview for whichever mapset is
//! selected, stores the handle for reuse, and keeps track of the one handle
//! that is actively producing sound. Fetches run on worker threads because
//! they perform network I/O; the cache lock serializes them so two
//! activations can never interleave their fetch/insert steps.
//!
//! # Locking
//!
//! Two locks with strictly one ordering:
//!
//! * the **cache lock** (`tracks`) serializes whole activations, including
//!   the blocking fetch;
//! * the **current slot** (`current`) is held only for an instant, so
//!   stopping playback at the start of an activation never waits on an
//!   in-flight fetch.
//!
//! A worker acquires the cache lock first and the current slot second,
//! never the reverse.
//!
//! An activation that loses the selection while its fetch is in flight still
//! inserts the fetched handle into the cache (identifiers are immutable
//! keys, so the entry stays valid), but it re-checks the selection inside
//! the lock immediately before playing, so a stale fetch can never grab the
//! speakers from a newer selection.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use tracing::{debug, warn};

use crate::{
    audio::{PreviewSource, PreviewTrack, SilentTrack},
    bindable::Bindable,
    model::MapsetId,
};

struct PreviewCacheInner {
    source: Arc<dyn PreviewSource>,
    /// The active selection, shared with the result set. Read (never
    /// written) to decide whether a finished fetch still matters.
    selected: Bindable<Option<MapsetId>>,
    tracks: Mutex<HashMap<MapsetId, Arc<dyn PreviewTrack>>>,
    current: Mutex<Arc<dyn PreviewTrack>>,
    closed: AtomicBool,
}

/// Keyed store of lazily fetched preview handles.
///
/// Clones are handles to the same cache. Entries are created once per mapset
/// and reused for the lifetime of the screen; the silent placeholder holds
/// the current slot whenever nothing is (or can be) playing.
#[derive(Clone)]
pub struct PreviewCache {
    inner: Arc<PreviewCacheInner>,
}

impl PreviewCache {
    /// Creates the cache around a fetch source and the selection it follows.
    pub fn new(source: Arc<dyn PreviewSource>, selected: Bindable<Option<MapsetId>>) -> Self {
        Self {
            inner: Arc::new(PreviewCacheInner {
                source,
                selected,
                tracks: Mutex::new(HashMap::new()),
                current: Mutex::new(Arc::new(SilentTrack::new())),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Reacts to a selection change.
    ///
    /// Stops current playback immediately, then, if a mapset is selected,
    /// hands the rest of the work (cache lookup or fetch, then play) to a
    /// worker thread. Returns without waiting for the worker.
    pub fn activate(&self, id: Option<MapsetId>) {
        if self.inner.closed.load(Ordering::SeqCst) {
            return;
        }

        // Silence first, before the worker queues behind any in-flight
        // fetch. Stopping an already-stopped track is a no-op.
        self.inner.current.lock().unwrap().stop();

        let Some(id) = id else {
            return;
        };

        let inner = Arc::clone(&self.inner);
        thread::spawn(move || inner.activate_blocking(id));
    }

    /// Number of cached preview handles.
    pub fn len(&self) -> usize {
        self.inner.tracks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases every cached handle and the current handle exactly once
    /// each, then refuses further activations.
    ///
    /// Waits for any in-flight fetch to finish (there is no way to abort
    /// it), so the late handle is closed here rather than leaked.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut tracks = self.inner.tracks.lock().unwrap();
        let mut current = self.inner.current.lock().unwrap();

        current.stop();
        for track in tracks.values() {
            track.stop();
            track.close();
        }

        // The current handle usually aliases a cache entry; only close it
        // separately when it does not (e.g. the silent placeholder).
        let current_is_cached = tracks.values().any(|track| Arc::ptr_eq(track, &current));
        if !current_is_cached {
            current.close();
        }

        tracks.clear();
        *current = Arc::new(SilentTrack::new());
    }
}

impl PreviewCacheInner {
    /// The serialized body of one activation. Runs on a worker thread with
    /// the cache lock held throughout.
    fn activate_blocking(&self, id: MapsetId) {
        let mut tracks = self.tracks.lock().unwrap();

        // Closed while this worker was waiting for the lock.
        if self.closed.load(Ordering::SeqCst) {
            return;
        }

        if let Some(track) = tracks.get(&id).map(Arc::clone) {
            if self.still_selected(id) {
                track.seek_to_start();
                track.play();
                *self.current.lock().unwrap() = track;
            }
            return;
        }

        match self.source.fetch(id) {
            Ok(track) => {
                tracks.insert(id, Arc::clone(&track));

                if self.still_selected(id) {
                    track.play();
                    *self.current.lock().unwrap() = track;
                } else {
                    debug!(mapset = %id, "selection moved on during preview fetch");
                }
            }
            Err(e) => warn!(mapset = %id, error = %e, "failed to fetch audio preview"),
        }
    }

    fn still_selected(&self, id: MapsetId) -> bool {
        self.selected.get() == Some(id)
    }
}
