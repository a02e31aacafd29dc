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

//! Cancel-and-restart search scheduling.
//!
//! [`SearchCoordinator`] owns the single outstanding catalog search. Every
//! trigger (any filter edit, or an explicit page advance) cancels whatever is
//! in flight, snapshots the filter state, and launches a fresh worker
//! thread, so the catalog call never blocks the interactive thread and
//! rapid edits behave as a single search for the latest criteria.
//!
//! Each attempt is tagged with a monotonically increasing generation.
//! Cancellation is cooperative, so a superseded worker may still complete;
//! its completion re-checks the generation (and its cancel token) inside the
//! result set's critical section and is discarded if anything newer was
//! launched. Only the most recent attempt's results are ever applied, and
//! they are applied exactly once.
//!
//! # Pagination
//!
//! A full page (50 items) leaves the gate open; a shorter raw page means the
//! server has nothing further, and page-advance triggers are ignored until a
//! criterion edit resets to page 0 and clears the gate.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread,
};

use tracing::{debug, warn};

use crate::{
    bindable::Bindable,
    catalog::{CancelToken, CatalogClient, CatalogError, PAGE_SIZE, SearchRequest},
    library::LocalLibrary,
    model::{DownloadableMapset, filters::FilterState, results::ResultSet},
};

struct CoordinatorInner {
    client: Arc<dyn CatalogClient>,
    library: Arc<dyn LocalLibrary>,
    results: ResultSet,
    /// Identifies the authoritative attempt; completions from older
    /// generations are discarded.
    generation: AtomicU64,
    /// Token of the in-flight attempt, cancelled and replaced on trigger.
    active: Mutex<Option<CancelToken>>,
    update_required: Bindable<bool>,
    shutdown: AtomicBool,
}

/// Drives catalog searches and populates the result set.
///
/// Clones are handles to the same coordinator.
#[derive(Clone)]
pub struct SearchCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl SearchCoordinator {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        library: Arc<dyn LocalLibrary>,
        results: ResultSet,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                client,
                library,
                results,
                generation: AtomicU64::new(0),
                active: Mutex::new(None),
                update_required: Bindable::new(false),
                shutdown: AtomicBool::new(false),
            }),
        }
    }

    /// Restarts the search for the current filter state.
    ///
    /// For page 0 the previous-page buffer is cleared, re-opening the
    /// pagination gate. For later pages the trigger is honored only when
    /// the last raw server page was full; otherwise the server has nothing
    /// further for this query and the trigger is dropped without a network
    /// call.
    pub fn trigger(&self, filters: &FilterState) {
        let inner = &self.inner;

        if inner.shutdown.load(Ordering::SeqCst) {
            return;
        }

        let page = filters.page().get();
        if page == 0 {
            inner.results.begin_fresh_query();
        } else if inner.results.previous_page_len() < PAGE_SIZE {
            debug!(page, "last page reached, ignoring page advance");
            return;
        }

        let request = SearchRequest::snapshot(filters);
        let cancel = CancelToken::new();

        let generation = {
            let mut active = inner.active.lock().unwrap();
            if let Some(previous) = active.take() {
                previous.cancel();
            }
            *active = Some(cancel.clone());
            inner.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let inner = Arc::clone(&self.inner);
        thread::spawn(move || inner.run_search(request, generation, cancel));
    }

    /// Set when the server reported that this client is too old to use the
    /// catalog.
    pub fn update_required(&self) -> &Bindable<bool> {
        &self.inner.update_required
    }

    /// Cancels any in-flight attempt and refuses further triggers.
    ///
    /// A still-running worker observes its token (or fails its generation
    /// check) and exits without touching the result set.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);

        if let Some(active) = self.inner.active.lock().unwrap().take() {
            active.cancel();
        }

        self.inner.update_required.close();
    }
}

impl CoordinatorInner {
    /// One search attempt, run on its own worker thread.
    fn run_search(&self, request: SearchRequest, generation: u64, cancel: CancelToken) {
        let page_number = request.page;
        let include_owned = request.display_owned;

        match self.client.search(&request, &cancel) {
            Ok(page) => {
                let requires_update = page.requires_update;

                let library = Arc::clone(&self.library);
                let keep = move |mapset: &DownloadableMapset| {
                    include_owned || !library.is_owned(mapset.id)
                };

                // Generation and token are re-checked under the result-set
                // lock: a completion that lost the race to a newer trigger
                // must never be applied, even partially.
                let applied = self.results.apply_page(page_number, page.mapsets, keep, || {
                    !cancel.is_cancelled()
                        && self.generation.load(Ordering::SeqCst) == generation
                });

                if applied {
                    if requires_update {
                        self.update_required.set(true);
                    }
                } else {
                    debug!(generation, "discarding superseded search completion");
                }
            }
            Err(CatalogError::Cancelled) => debug!(generation, "search attempt cancelled"),
            Err(e) => warn!(generation, error = %e, "mapset search failed"),
        }
    }
}
