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

//! Domain models and core data structures.
//!
//! This module defines the central entities of the crate: mapsets as returned
//! by the remote catalog, the filter enumerations that narrow a search, and
//! the observable filter and result state built on top of them.

pub mod filters;
pub mod results;

use std::fmt;

/// Identifier of a mapset in the remote catalog.
///
/// Also addresses the mapset's audio preview and the local ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapsetId(pub i32);

impl fmt::Display for MapsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A playable game mode a map can be charted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Keys4,
    Keys7,
}

/// Game-mode filter criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeFilter {
    #[default]
    All,
    Only(GameMode),
}

/// Ranked-status filter criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    All,
    #[default]
    Ranked,
    Unranked,
}

/// Ranked status of a mapset as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankedStatus {
    NotSubmitted,
    Unranked,
    Ranked,
}

/// A downloadable bundle of maps, the unit returned by a catalog search.
///
/// The numeric fields mirror the filter dimensions so the surrounding UI can
/// display them next to the criteria that matched.
#[derive(Debug, Clone)]
pub struct DownloadableMapset {
    pub id: MapsetId,
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub ranked_status: RankedStatus,
    pub game_modes: Vec<GameMode>,
    pub min_difficulty: f32,
    pub max_difficulty: f32,
    pub bpm: f32,
    pub max_length_secs: u32,
    pub max_long_note_percent: u32,
    pub play_count: u32,
    pub date_submitted: String,
}

/// One page of search results from the remote catalog.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub mapsets: Vec<DownloadableMapset>,
    /// Set when the server considers this client too old to download from it.
    pub requires_update: bool,
}
