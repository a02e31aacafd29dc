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

//! Search filter criteria.
//!
//! [`FilterState`] holds every user-adjustable constraint as an independently
//! observable [`Bindable`] field and is the single source of truth for what
//! should be searched for. Assigning any criterion resets the page to zero,
//! and the page assignment is what downstream listeners key off to restart
//! the search.
//!
//! Range bounds are deliberately unvalidated against each other. A minimum
//! above its maximum is passed through to the catalog as-is and simply yields
//! an empty result, matching the permissive server API.

use std::sync::{Arc, Mutex};

use crate::{
    bindable::{Bindable, Subscription},
    model::{ModeFilter, StatusFilter},
};

/// Inclusive lower bound accepted for the upload-date criterion.
pub const EARLIEST_UPLOAD_DATE: &str = "01-01-1970";

/// Inclusive upper bound accepted for the upload-date criterion.
pub const LATEST_UPLOAD_DATE: &str = "12-31-9999";

struct FilterFields {
    query: Bindable<String>,
    game_mode: Bindable<ModeFilter>,
    ranked_status: Bindable<StatusFilter>,
    min_difficulty: Bindable<f32>,
    max_difficulty: Bindable<f32>,
    min_bpm: Bindable<f32>,
    max_bpm: Bindable<f32>,
    min_length_secs: Bindable<u32>,
    max_length_secs: Bindable<u32>,
    min_long_note_percent: Bindable<u32>,
    max_long_note_percent: Bindable<u32>,
    min_play_count: Bindable<u32>,
    max_play_count: Bindable<u32>,
    min_upload_date: Bindable<String>,
    max_upload_date: Bindable<String>,
    display_owned: Bindable<bool>,
    page: Bindable<u32>,
}

/// The full set of search criteria.
///
/// Clones are handles to the same underlying fields. Every non-page field is
/// internally wired so that assigning it resets [`FilterState::page`] to 0;
/// assigning the page directly does not reset anything. Subscribers of the
/// page field therefore hear about every edit exactly once.
#[derive(Clone)]
pub struct FilterState {
    fields: Arc<FilterFields>,
    wiring: Arc<Mutex<Vec<Subscription>>>,
}

impl FilterState {
    pub fn new() -> Self {
        let fields = Arc::new(FilterFields {
            query: Bindable::new(String::new()),
            game_mode: Bindable::new(ModeFilter::All),
            ranked_status: Bindable::new(StatusFilter::Ranked),
            min_difficulty: Bindable::new(0.0),
            max_difficulty: Bindable::new(9999.0),
            min_bpm: Bindable::new(0.0),
            max_bpm: Bindable::new(9999.0),
            min_length_secs: Bindable::new(0),
            max_length_secs: Bindable::new(u32::MAX),
            min_long_note_percent: Bindable::new(0),
            max_long_note_percent: Bindable::new(100),
            min_play_count: Bindable::new(0),
            max_play_count: Bindable::new(u32::MAX),
            min_upload_date: Bindable::new(EARLIEST_UPLOAD_DATE.to_string()),
            max_upload_date: Bindable::new(LATEST_UPLOAD_DATE.to_string()),
            display_owned: Bindable::new(false),
            page: Bindable::new(0),
        });

        let mut wiring = Vec::new();
        reset_page_on_change(&fields.query, &fields.page, &mut wiring);
        reset_page_on_change(&fields.game_mode, &fields.page, &mut wiring);
        reset_page_on_change(&fields.ranked_status, &fields.page, &mut wiring);
        reset_page_on_change(&fields.min_difficulty, &fields.page, &mut wiring);
        reset_page_on_change(&fields.max_difficulty, &fields.page, &mut wiring);
        reset_page_on_change(&fields.min_bpm, &fields.page, &mut wiring);
        reset_page_on_change(&fields.max_bpm, &fields.page, &mut wiring);
        reset_page_on_change(&fields.min_length_secs, &fields.page, &mut wiring);
        reset_page_on_change(&fields.max_length_secs, &fields.page, &mut wiring);
        reset_page_on_change(&fields.min_long_note_percent, &fields.page, &mut wiring);
        reset_page_on_change(&fields.max_long_note_percent, &fields.page, &mut wiring);
        reset_page_on_change(&fields.min_play_count, &fields.page, &mut wiring);
        reset_page_on_change(&fields.max_play_count, &fields.page, &mut wiring);
        reset_page_on_change(&fields.min_upload_date, &fields.page, &mut wiring);
        reset_page_on_change(&fields.max_upload_date, &fields.page, &mut wiring);
        reset_page_on_change(&fields.display_owned, &fields.page, &mut wiring);

        Self {
            fields,
            wiring: Arc::new(Mutex::new(wiring)),
        }
    }

    pub fn query(&self) -> &Bindable<String> {
        &self.fields.query
    }

    pub fn game_mode(&self) -> &Bindable<ModeFilter> {
        &self.fields.game_mode
    }

    pub fn ranked_status(&self) -> &Bindable<StatusFilter> {
        &self.fields.ranked_status
    }

    pub fn min_difficulty(&self) -> &Bindable<f32> {
        &self.fields.min_difficulty
    }

    pub fn max_difficulty(&self) -> &Bindable<f32> {
        &self.fields.max_difficulty
    }

    pub fn min_bpm(&self) -> &Bindable<f32> {
        &self.fields.min_bpm
    }

    pub fn max_bpm(&self) -> &Bindable<f32> {
        &self.fields.max_bpm
    }

    pub fn min_length_secs(&self) -> &Bindable<u32> {
        &self.fields.min_length_secs
    }

    pub fn max_length_secs(&self) -> &Bindable<u32> {
        &self.fields.max_length_secs
    }

    pub fn min_long_note_percent(&self) -> &Bindable<u32> {
        &self.fields.min_long_note_percent
    }

    pub fn max_long_note_percent(&self) -> &Bindable<u32> {
        &self.fields.max_long_note_percent
    }

    pub fn min_play_count(&self) -> &Bindable<u32> {
        &self.fields.min_play_count
    }

    pub fn max_play_count(&self) -> &Bindable<u32> {
        &self.fields.max_play_count
    }

    pub fn min_upload_date(&self) -> &Bindable<String> {
        &self.fields.min_upload_date
    }

    pub fn max_upload_date(&self) -> &Bindable<String> {
        &self.fields.max_upload_date
    }

    /// Whether results the player already owns locally are shown.
    pub fn display_owned(&self) -> &Bindable<bool> {
        &self.fields.display_owned
    }

    /// The zero-indexed result page. Assigning it re-fires the search
    /// without resetting any other criterion.
    pub fn page(&self) -> &Bindable<u32> {
        &self.fields.page
    }

    /// Severs the internal page-reset wiring and every external subscriber.
    pub fn close(&self) {
        self.wiring.lock().unwrap().clear();

        self.fields.query.close();
        self.fields.game_mode.close();
        self.fields.ranked_status.close();
        self.fields.min_difficulty.close();
        self.fields.max_difficulty.close();
        self.fields.min_bpm.close();
        self.fields.max_bpm.close();
        self.fields.min_length_secs.close();
        self.fields.max_length_secs.close();
        self.fields.min_long_note_percent.close();
        self.fields.max_long_note_percent.close();
        self.fields.min_play_count.close();
        self.fields.max_play_count.close();
        self.fields.min_upload_date.close();
        self.fields.max_upload_date.close();
        self.fields.display_owned.close();
        self.fields.page.close();
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

/// Wires one criterion so that assigning it snaps the page back to zero.
fn reset_page_on_change<T: Clone + Send + Sync + 'static>(
    field: &Bindable<T>,
    page: &Bindable<u32>,
    wiring: &mut Vec<Subscription>,
) {
    let page = page.clone();
    wiring.push(field.subscribe(move |_| page.set(0)));
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::FilterState;
    use crate::model::{GameMode, ModeFilter, StatusFilter};

    #[test]
    fn any_criterion_edit_resets_page_to_zero() {
        let filters = FilterState::new();

        filters.page().set(4);
        filters.query().set("camellia".to_string());
        assert_eq!(filters.page().get(), 0);

        filters.page().set(2);
        filters.game_mode().set(ModeFilter::Only(GameMode::Keys7));
        assert_eq!(filters.page().get(), 0);

        filters.page().set(9);
        filters.min_bpm().set(180.0);
        assert_eq!(filters.page().get(), 0);

        filters.page().set(1);
        filters.display_owned().set(true);
        assert_eq!(filters.page().get(), 0);

        filters.page().set(3);
        filters.max_upload_date().set("06-01-2024".to_string());
        assert_eq!(filters.page().get(), 0);
    }

    #[test]
    fn page_edit_does_not_reset_itself() {
        let filters = FilterState::new();

        filters.page().set(5);
        assert_eq!(filters.page().get(), 5);
    }

    #[test]
    fn page_subscribers_hear_every_criterion_edit() {
        let filters = FilterState::new();
        let triggers = Arc::new(AtomicUsize::new(0));

        let triggers_inner = Arc::clone(&triggers);
        let _sub = filters.page().subscribe(move |_| {
            triggers_inner.fetch_add(1, Ordering::SeqCst);
        });

        filters.query().set("id".to_string());
        filters.ranked_status().set(StatusFilter::All);
        filters.page().set(1);

        assert_eq!(triggers.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn close_severs_page_reset_wiring() {
        let filters = FilterState::new();
        filters.close();

        filters.page().set(6);
        filters.query().set("after close".to_string());

        // The wiring is gone, so the edit no longer snaps the page back.
        assert_eq!(filters.page().get(), 6);
    }

    #[test]
    fn defaults_match_a_fresh_screen() {
        let filters = FilterState::new();

        assert_eq!(filters.query().get(), "");
        assert_eq!(filters.game_mode().get(), ModeFilter::All);
        assert_eq!(filters.ranked_status().get(), StatusFilter::Ranked);
        assert_eq!(filters.min_long_note_percent().get(), 0);
        assert_eq!(filters.max_long_note_percent().get(), 100);
        assert!(!filters.display_owned().get());
        assert_eq!(filters.page().get(), 0);
    }
}
