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

//! Search result state.
//!
//! [`ResultSet`] holds the ordered list of mapsets currently shown, the raw
//! previous-page buffer that gates pagination, and the active selection. The
//! visible list and the buffer share one mutation lock: the search worker
//! writes them together in a single critical section and the interactive
//! thread snapshots them between completions, so a reader never observes a
//! half-applied page.

use std::sync::{Arc, Mutex};

use crate::{
    bindable::{Bindable, SubscriberList, Subscription},
    model::{DownloadableMapset, MapsetId},
};

/// How the visible list last changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultChange {
    /// Page 0 arrived and the whole list was swapped out.
    Replaced,
    /// A follow-up page was appended after the current content.
    Appended,
}

struct ResultPages {
    visible: Vec<DownloadableMapset>,
    /// Unfiltered server response for the last page fetched. Consulted only
    /// to decide whether another page is worth requesting.
    previous_page: Vec<DownloadableMapset>,
}

struct ResultSetInner {
    pages: Mutex<ResultPages>,
    changes: Arc<SubscriberList<ResultChange>>,
    selected: Bindable<Option<MapsetId>>,
}

/// The ordered, observable list of mapsets produced by the search.
///
/// Clones are handles to the same underlying state. Mutation happens only
/// through [`ResultSet::apply_page`], which the search coordinator calls on
/// completion; everything else is read access.
#[derive(Clone)]
pub struct ResultSet {
    inner: Arc<ResultSetInner>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ResultSetInner {
                pages: Mutex::new(ResultPages {
                    visible: vec![],
                    previous_page: vec![],
                }),
                changes: Arc::new(SubscriberList::new()),
                selected: Bindable::new(None),
            }),
        }
    }

    /// Returns a clone of the currently visible mapsets.
    pub fn snapshot(&self) -> Vec<DownloadableMapset> {
        self.inner.pages.lock().unwrap().visible.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.pages.lock().unwrap().visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks `id` as the active selection, notifying selection subscribers.
    ///
    /// Passing `None` clears the selection.
    pub fn select(&self, id: Option<MapsetId>) {
        self.inner.selected.set(id);
    }

    /// The active selection as an observable value.
    pub fn selected(&self) -> &Bindable<Option<MapsetId>> {
        &self.inner.selected
    }

    /// Registers a callback for replace/append notifications.
    ///
    /// Callbacks run on whichever thread applied the page, after the
    /// mutation lock has been released.
    pub fn subscribe_changes(
        &self,
        callback: impl Fn(&ResultChange) + Send + Sync + 'static,
    ) -> Subscription {
        SubscriberList::subscribe(&self.inner.changes, callback)
    }

    /// Number of raw items in the previous page buffer.
    pub(crate) fn previous_page_len(&self) -> usize {
        self.inner.pages.lock().unwrap().previous_page.len()
    }

    /// Clears the previous-page buffer ahead of a fresh page-0 query, which
    /// re-opens the pagination gate.
    pub(crate) fn begin_fresh_query(&self) {
        self.inner.pages.lock().unwrap().previous_page.clear();
    }

    /// Applies one completed search page in a single critical section.
    ///
    /// `still_current` is evaluated after the mutation lock is acquired;
    /// when it reports false the completion is stale and nothing changes.
    /// Otherwise the display set is computed through `keep`, the raw page is
    /// stored as the new previous-page buffer, and the visible list is
    /// replaced (page 0) or appended (page > 0). Returns whether the page
    /// was applied.
    pub(crate) fn apply_page(
        &self,
        page: u32,
        raw: Vec<DownloadableMapset>,
        keep: impl Fn(&DownloadableMapset) -> bool,
        still_current: impl FnOnce() -> bool,
    ) -> bool {
        let change = {
            let mut pages = self.inner.pages.lock().unwrap();

            if !still_current() {
                return false;
            }

            let display: Vec<DownloadableMapset> =
                raw.iter().filter(|&mapset| keep(mapset)).cloned().collect();
            pages.previous_page = raw;

            if page == 0 {
                pages.visible = display;
                ResultChange::Replaced
            } else {
                pages.visible.extend(display);
                ResultChange::Appended
            }
        };

        self.inner.changes.emit(&change);
        true
    }

    /// Severs change and selection subscribers at teardown.
    pub fn close(&self) {
        self.inner.changes.clear();
        self.inner.selected.close();
    }
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new()
    }
}
