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

//! The catalog browsing screen core.
//!
//! [`CatalogBrowser`] is the composition root for one browsing session: it
//! owns the filter state, result set, search coordinator, and preview cache,
//! and wires them together: page changes restart the search, selection
//! changes re-target the preview. The rendering layer sits on top of the
//! exposed observables and never drives the coordinator directly.

use std::sync::Arc;

use crate::{
    audio::PreviewSource,
    bindable::{Bindable, Subscription},
    catalog::CatalogClient,
    library::LocalLibrary,
    model::{filters::FilterState, results::ResultSet},
    preview::PreviewCache,
    search::SearchCoordinator,
};

/// One browsing session over the remote catalog.
///
/// Construction fires the initial page-0 search immediately, so the screen
/// has content as soon as the catalog answers. Dropping the browser (or
/// calling [`CatalogBrowser::close`]) cancels any in-flight work, severs all
/// subscriptions, and releases every cached preview.
pub struct CatalogBrowser {
    filters: FilterState,
    results: ResultSet,
    coordinator: SearchCoordinator,
    previews: PreviewCache,
    subscriptions: Vec<Subscription>,
    closed: bool,
}

impl CatalogBrowser {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        library: Arc<dyn LocalLibrary>,
        source: Arc<dyn PreviewSource>,
    ) -> Self {
        let filters = FilterState::new();
        let results = ResultSet::new();
        let coordinator = SearchCoordinator::new(client, library, results.clone());
        let previews = PreviewCache::new(source, results.selected().clone());

        let mut subscriptions = Vec::new();

        // Every filter edit funnels into a page assignment, so subscribing
        // to the page alone hears each edit exactly once.
        {
            let coordinator = coordinator.clone();
            let filters = filters.clone();
            subscriptions.push(
                filters
                    .page()
                    .clone()
                    .subscribe(move |_| coordinator.trigger(&filters)),
            );
        }

        {
            let previews = previews.clone();
            subscriptions.push(results.selected().subscribe(move |id| previews.activate(*id)));
        }

        let browser = Self {
            filters,
            results,
            coordinator,
            previews,
            subscriptions,
            closed: false,
        };

        browser.coordinator.trigger(&browser.filters);

        browser
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn previews(&self) -> &PreviewCache {
        &self.previews
    }

    /// Set when the server reported this client as too old for the catalog.
    pub fn update_required(&self) -> &Bindable<bool> {
        self.coordinator.update_required()
    }

    /// Requests the next result page, typically when the user scrolls to the
    /// bottom of the current results.
    ///
    /// The advance is dropped by the coordinator when the previous page was
    /// short, meaning the query is exhausted.
    pub fn request_next_page(&self) {
        let page = self.filters.page().get();
        self.filters.page().set(page + 1);
    }

    /// Tears the session down: severs all wiring, cancels any in-flight
    /// search, and releases every preview handle. Idempotent; also runs on
    /// drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.subscriptions.clear();
        self.coordinator.shutdown();
        self.previews.close();
        self.filters.close();
        self.results.close();
    }
}

impl Drop for CatalogBrowser {
    fn drop(&mut self) {
        self.close();
    }
}
