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

//! Remote catalog interface.
//!
//! The catalog itself (request construction, transport, and response
//! parsing) lives outside this crate. Implementations of [`CatalogClient`]
//! are injected by the embedding application; this module only defines the
//! boundary: the immutable [`SearchRequest`] snapshot handed to a search
//! attempt, the [`CancelToken`] the transport is expected to poll, and the
//! error taxonomy the coordinator logs and swallows.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use thiserror::Error;

use crate::model::{ModeFilter, SearchPage, StatusFilter, filters::FilterState};

/// Number of mapsets in a full result page. A shorter page signals the last
/// page of the query.
pub const PAGE_SIZE: usize = 50;

/// An immutable snapshot of every filter criterion plus the page number,
/// taken at the moment a search attempt is launched.
///
/// Snapshotting decouples the in-flight request from further filter edits:
/// a search never observes a torn update, no matter how quickly the user
/// keeps typing.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub game_mode: ModeFilter,
    pub ranked_status: StatusFilter,
    pub min_difficulty: f32,
    pub max_difficulty: f32,
    pub min_bpm: f32,
    pub max_bpm: f32,
    pub min_length_secs: u32,
    pub max_length_secs: u32,
    pub min_long_note_percent: u32,
    pub max_long_note_percent: u32,
    pub min_play_count: u32,
    pub max_play_count: u32,
    pub min_upload_date: String,
    pub max_upload_date: String,
    pub display_owned: bool,
    pub page: u32,
}

/// Cooperative cancellation flag shared between the coordinator and one
/// in-flight search attempt.
///
/// The transport should poll [`CancelToken::is_cancelled`] at natural
/// suspension points and bail out with [`CatalogError::Cancelled`] as soon
/// as practical. Cancellation makes no guarantee about how much partial work
/// completes; it only guarantees the result is never applied.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Failures surfaced by a catalog search.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request failed or timed out in transit. Treated as transient:
    /// logged, swallowed, retried only by the next user-driven trigger.
    #[error("catalog request failed: {0}")]
    Network(Box<dyn std::error::Error + Send + Sync>),

    /// The attempt observed its cancel token and stopped early.
    #[error("search cancelled before completion")]
    Cancelled,
}

/// The remote mapset search, as consumed by the coordinator.
///
/// `search` is a blocking call and is only ever invoked from a search worker
/// thread, never from the interactive thread.
pub trait CatalogClient: Send + Sync {
    fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancelToken,
    ) -> Result<SearchPage, CatalogError>;
}

impl SearchRequest {
    /// Atomically snapshots `filters`. Field reads observe committed values
    /// only, because filter assignment completes before its notifications
    /// run.
    pub(crate) fn snapshot(filters: &FilterState) -> Self {
        Self {
            query: filters.query().get(),
            game_mode: filters.game_mode().get(),
            ranked_status: filters.ranked_status().get(),
            min_difficulty: filters.min_difficulty().get(),
            max_difficulty: filters.max_difficulty().get(),
            min_bpm: filters.min_bpm().get(),
            max_bpm: filters.max_bpm().get(),
            min_length_secs: filters.min_length_secs().get(),
            max_length_secs: filters.max_length_secs().get(),
            min_long_note_percent: filters.min_long_note_percent().get(),
            max_long_note_percent: filters.max_long_note_percent().get(),
            min_play_count: filters.min_play_count().get(),
            max_play_count: filters.max_play_count().get(),
            min_upload_date: filters.min_upload_date().get(),
            max_upload_date: filters.max_upload_date().get(),
            display_owned: filters.display_owned().get(),
            page: filters.page().get(),
        }
    }
}
