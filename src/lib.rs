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

//! # Mapset catalog browsing core.
//!
//! A library for browsing a remote catalog of downloadable mapsets: filtered
//! search with live-updating criteria, cancel-and-restart scheduling,
//! paginated result accumulation, and cached audio previews.
//!
//! This crate coordinates the state behind a download screen; rendering,
//! input handling, and navigation belong to the embedding application.
//!
//! ## Architecture
//!
//! The crate follows an observable-state architecture where:
//!
//! * The **Interactive Thread** edits filter criteria and reads results.
//! * **Search Workers** run the blocking catalog call, one per attempt, with
//!   the newest attempt cancelling and superseding the rest.
//! * **Preview Workers** fetch audio samples on demand, serialized by the
//!   preview cache.
//!
//! State flows through [`bindable::Bindable`] values and explicit
//! subscriptions rather than channels: edits commit first, then notify, and
//! every subscription is severed at teardown.
//!
//! ## Usage
//!
//! Construct a [`CatalogBrowser`] around the three external collaborators
//! (the catalog transport, the local ownership check, and the preview audio
//! source), then drive its filter state and observe its result set:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use downbeat::{
//!     CatalogBrowser,
//!     audio::mpv::MpvPreviewSource,
//!     catalog::CatalogClient,
//!     config,
//!     library::SqliteLibrary,
//! };
//!
//! fn open(client: Arc<dyn CatalogClient>) -> anyhow::Result<CatalogBrowser> {
//!     let config = config::load_config();
//!     let library = Arc::new(SqliteLibrary::open(&config.library_db)?);
//!     let previews = Arc::new(MpvPreviewSource::new(&config));
//!
//!     let browser = CatalogBrowser::new(client, library, previews);
//!     browser.filters().query().set("funk".to_string());
//!     Ok(browser)
//! }
//! ```

pub mod audio;
pub mod bindable;
pub mod catalog;
pub mod config;
pub mod library;
pub mod model;
pub mod preview;
pub mod search;

mod screen;

pub use screen::CatalogBrowser;
