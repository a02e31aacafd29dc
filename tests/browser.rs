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

//! End-to-end tests for the browsing session: filter edits driving the
//! search coordinator, pagination, owned-content exclusion, preview wiring,
//! and teardown. External collaborators are replaced with scripted fakes
//! whose timing the tests control through channels.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
        mpsc::{Receiver, SyncSender, sync_channel},
    },
    thread,
    time::{Duration, Instant},
};

use downbeat::{
    CatalogBrowser,
    audio::{PreviewError, PreviewSource, PreviewTrack},
    catalog::{CancelToken, CatalogClient, CatalogError, SearchRequest},
    library::LocalLibrary,
    model::{DownloadableMapset, MapsetId, RankedStatus, SearchPage},
};

fn mapset(id: i32) -> DownloadableMapset {
    DownloadableMapset {
        id: MapsetId(id),
        title: format!("title {id}"),
        artist: "artist".to_string(),
        creator: "creator".to_string(),
        ranked_status: RankedStatus::Ranked,
        game_modes: vec![],
        min_difficulty: 1.0,
        max_difficulty: 5.0,
        bpm: 150.0,
        max_length_secs: 120,
        max_long_note_percent: 10,
        play_count: 1000,
        date_submitted: "01-01-2024".to_string(),
    }
}

fn mapsets(ids: std::ops::Range<i32>) -> Vec<DownloadableMapset> {
    ids.map(mapset).collect()
}

fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

struct Planned {
    page: SearchPage,
    /// When present, the search blocks here until the test releases it.
    /// Taken out of the plan before blocking so other calls proceed.
    hold: Option<Receiver<()>>,
}

/// Scripted catalog: responses are keyed by (query, page); anything
/// unplanned resolves to an empty page.
#[derive(Default)]
struct FakeCatalog {
    calls: Mutex<Vec<SearchRequest>>,
    plan: Mutex<HashMap<(String, u32), Planned>>,
}

impl FakeCatalog {
    fn respond(&self, query: &str, page: u32, mapsets: Vec<DownloadableMapset>) {
        self.plan.lock().unwrap().insert(
            (query.to_string(), page),
            Planned {
                page: SearchPage {
                    mapsets,
                    requires_update: false,
                },
                hold: None,
            },
        );
    }

    fn respond_after_release(
        &self,
        query: &str,
        page: u32,
        mapsets: Vec<DownloadableMapset>,
    ) -> SyncSender<()> {
        let (release_tx, release_rx) = sync_channel(1);
        self.plan.lock().unwrap().insert(
            (query.to_string(), page),
            Planned {
                page: SearchPage {
                    mapsets,
                    requires_update: false,
                },
                hold: Some(release_rx),
            },
        );
        release_tx
    }

    fn respond_requires_update(&self, query: &str, page: u32) {
        self.plan.lock().unwrap().insert(
            (query.to_string(), page),
            Planned {
                page: SearchPage {
                    mapsets: vec![],
                    requires_update: true,
                },
                hold: None,
            },
        );
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn calls_for(&self, query: &str, page: u32) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.query == query && r.page == page)
            .count()
    }
}

impl CatalogClient for FakeCatalog {
    fn search(
        &self,
        request: &SearchRequest,
        _cancel: &CancelToken,
    ) -> Result<SearchPage, CatalogError> {
        self.calls.lock().unwrap().push(request.clone());

        let key = (request.query.clone(), request.page);
        let (response, hold) = {
            let mut plan = self.plan.lock().unwrap();
            match plan.get_mut(&key) {
                None => return Ok(SearchPage::default()),
                Some(planned) => (planned.page.clone(), planned.hold.take()),
            }
        };

        if let Some(gate) = hold {
            gate.recv().ok();
        }

        Ok(response)
    }
}

#[derive(Default)]
struct FakeLibrary {
    owned: Mutex<Vec<MapsetId>>,
}

impl FakeLibrary {
    fn with_owned(ids: Vec<MapsetId>) -> Self {
        Self {
            owned: Mutex::new(ids),
        }
    }
}

impl LocalLibrary for FakeLibrary {
    fn is_owned(&self, id: MapsetId) -> bool {
        self.owned.lock().unwrap().contains(&id)
    }
}

#[derive(Default)]
struct FakeTrack {
    plays: AtomicUsize,
    closes: AtomicUsize,
}

impl PreviewTrack for FakeTrack {
    fn play(&self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {}

    fn seek_to_start(&self) {}

    fn is_playing(&self) -> bool {
        false
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct FakeSource {
    tracks: Mutex<HashMap<MapsetId, Arc<FakeTrack>>>,
}

impl FakeSource {
    fn stock(&self, id: MapsetId) -> Arc<FakeTrack> {
        let track = Arc::new(FakeTrack::default());
        self.tracks.lock().unwrap().insert(id, Arc::clone(&track));
        track
    }
}

impl PreviewSource for FakeSource {
    fn fetch(&self, id: MapsetId) -> Result<Arc<dyn PreviewTrack>, PreviewError> {
        let track = self
            .tracks
            .lock()
            .unwrap()
            .get(&id)
            .map(Arc::clone)
            .ok_or_else(|| PreviewError::Fetch("unknown mapset".to_string()))?;
        Ok(track)
    }
}

struct Harness {
    catalog: Arc<FakeCatalog>,
    library: Arc<FakeLibrary>,
    source: Arc<FakeSource>,
}

impl Harness {
    fn new() -> Self {
        Self {
            catalog: Arc::new(FakeCatalog::default()),
            library: Arc::new(FakeLibrary::default()),
            source: Arc::new(FakeSource::default()),
        }
    }

    fn browser(&self) -> CatalogBrowser {
        CatalogBrowser::new(
            self.catalog.clone(),
            self.library.clone(),
            self.source.clone(),
        )
    }
}

fn visible_ids(browser: &CatalogBrowser) -> Vec<i32> {
    browser.results().snapshot().iter().map(|m| m.id.0).collect()
}

#[test]
fn construction_searches_page_zero_immediately() {
    let harness = Harness::new();
    harness.catalog.respond("", 0, mapsets(1..4));

    let browser = harness.browser();

    wait_until("initial results", || browser.results().len() == 3);
    assert_eq!(harness.catalog.calls_for("", 0), 1);
    assert_eq!(visible_ids(&browser), vec![1, 2, 3]);
}

#[test]
fn only_the_latest_of_two_rapid_searches_is_applied() {
    let harness = Harness::new();
    harness.catalog.respond("", 0, vec![]);

    let browser = harness.browser();
    wait_until("initial search", || harness.catalog.calls_for("", 0) == 1);

    // T1: a search that stalls in the transport.
    let release = harness
        .catalog
        .respond_after_release("slow", 0, vec![mapset(9)]);
    browser.filters().query().set("slow".to_string());
    wait_until("T1 in flight", || harness.catalog.calls_for("slow", 0) == 1);

    // T2: supersedes T1 and completes normally.
    harness.catalog.respond("fast", 0, mapsets(1..3));
    browser.filters().query().set("fast".to_string());
    wait_until("T2 applied", || visible_ids(&browser) == vec![1, 2]);

    // T1 now completes late; its result must be discarded.
    release.send(()).unwrap();
    thread::sleep(Duration::from_millis(50));

    assert_eq!(visible_ids(&browser), vec![1, 2]);
}

#[test]
fn short_page_closes_the_pagination_gate() {
    let harness = Harness::new();
    harness.catalog.respond("", 0, mapsets(0..50));
    harness.catalog.respond("", 1, mapsets(100..110));

    let browser = harness.browser();
    wait_until("full first page", || browser.results().len() == 50);

    // First page was full, so the advance is honored and appended.
    browser.request_next_page();
    wait_until("second page appended", || browser.results().len() == 60);
    assert_eq!(browser.results().snapshot()[50].id, MapsetId(100));

    // Second page was short: the query is exhausted and further advances
    // must not reach the catalog.
    let calls_before = harness.catalog.call_count();
    browser.request_next_page();
    browser.request_next_page();
    thread::sleep(Duration::from_millis(50));

    assert_eq!(harness.catalog.call_count(), calls_before);
    assert_eq!(browser.results().len(), 60);
}

#[test]
fn criterion_edit_reopens_the_pagination_gate() {
    let harness = Harness::new();
    harness.catalog.respond("", 0, mapsets(0..10));
    harness.catalog.respond("more", 0, mapsets(0..50));
    harness.catalog.respond("more", 1, mapsets(50..60));

    let browser = harness.browser();
    wait_until("short first page", || browser.results().len() == 10);

    // Gate is closed by the short page...
    browser.request_next_page();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(harness.catalog.calls_for("", 1), 0);

    // ...until the query changes, which resets to page 0 and re-opens it.
    browser.filters().query().set("more".to_string());
    wait_until("fresh full page", || browser.results().len() == 50);

    browser.request_next_page();
    wait_until("next page honored", || browser.results().len() == 60);
}

#[test]
fn owned_mapsets_are_excluded_until_requested() {
    let harness = Harness {
        library: Arc::new(FakeLibrary::with_owned(vec![MapsetId(2)])),
        ..Harness::new()
    };
    harness.catalog.respond("", 0, mapsets(1..4));

    let browser = harness.browser();

    // B (id 2) is owned locally and filtered out, order preserved.
    wait_until("filtered results", || visible_ids(&browser) == vec![1, 3]);

    // Asking to display owned content re-searches and keeps everything.
    browser.filters().display_owned().set(true);
    wait_until("unfiltered results", || visible_ids(&browser) == vec![1, 2, 3]);
}

#[test]
fn selection_drives_the_preview_cache() {
    let harness = Harness::new();
    harness.catalog.respond("", 0, mapsets(1..3));
    let track = harness.source.stock(MapsetId(1));

    let browser = harness.browser();
    wait_until("results", || browser.results().len() == 2);

    browser.results().select(Some(MapsetId(1)));
    wait_until("preview playing", || track.plays.load(Ordering::SeqCst) == 1);
    assert_eq!(browser.previews().len(), 1);
}

#[test]
fn server_update_flag_is_surfaced() {
    let harness = Harness::new();
    harness.catalog.respond_requires_update("", 0);

    let browser = harness.browser();

    wait_until("update flag", || browser.update_required().get());
    assert!(browser.results().is_empty());
}

#[test]
fn close_severs_every_trigger_path() {
    let harness = Harness::new();
    harness.catalog.respond("", 0, mapsets(1..3));
    let track = harness.source.stock(MapsetId(1));

    let mut browser = harness.browser();
    wait_until("results", || browser.results().len() == 2);

    browser.results().select(Some(MapsetId(1)));
    wait_until("preview cached", || browser.previews().len() == 1);

    browser.close();
    let calls_before = harness.catalog.call_count();

    // Filter edits, page advances, and selections are all inert now.
    browser.filters().query().set("after close".to_string());
    browser.request_next_page();
    browser.results().select(Some(MapsetId(2)));
    thread::sleep(Duration::from_millis(50));

    assert_eq!(harness.catalog.call_count(), calls_before);
    assert_eq!(track.closes.load(Ordering::SeqCst), 1);
    assert!(browser.previews().is_empty());

    // Closing twice is fine.
    browser.close();
    assert_eq!(track.closes.load(Ordering::SeqCst), 1);
}
