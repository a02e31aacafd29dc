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

//! MPV-backed preview playback.
//!
//! Each fetched preview owns a dedicated `libmpv` context on its own worker
//! thread, bridged through a command channel so the handle stays cheap to
//! share and safe to drive from any thread. MPV streams the preview URL
//! directly; the track is primed paused so fetching never makes sound on its
//! own.
//!
//! # Architecture
//!
//! [`MpvPreviewTrack`] is a command proxy in the same shape as the rest of
//! the crate's workers: callers send [`TrackCommand`]s, the worker applies
//! them to the MPV context, and a shared flag mirrors the pause/idle
//! properties back out for `is_playing`.

use anyhow::{Context, Result};
use mpv::Format;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Receiver, Sender, TryRecvError},
};
use std::thread;
use tracing::debug;

use crate::{
    audio::{PreviewError, PreviewSource, PreviewTrack},
    config::AppConfig,
    model::MapsetId,
};

#[derive(Debug)]
enum TrackCommand {
    Play,
    Stop,
    SeekToStart,
    Close,
}

/// Fetches previews by handing the CDN URL for a mapset to a fresh MPV
/// context.
pub struct MpvPreviewSource {
    preview_url_base: String,
}

impl MpvPreviewSource {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            preview_url_base: config.preview_url_base.clone(),
        }
    }

    fn preview_url(&self, id: MapsetId) -> String {
        format!("{}/{}.mp3", self.preview_url_base.trim_end_matches('/'), id)
    }
}

impl PreviewSource for MpvPreviewSource {
    fn fetch(&self, id: MapsetId) -> Result<Arc<dyn PreviewTrack>, PreviewError> {
        let track = MpvPreviewTrack::open(&self.preview_url(id))
            .map_err(|e| PreviewError::Backend(format!("{e:#}")))?;

        Ok(Arc::new(track))
    }
}

/// A handle to one streamed preview.
///
/// This struct acts as a command proxy; it does not touch MPV itself but
/// sends instructions to the worker thread that owns the context.
pub struct MpvPreviewTrack {
    command_tx: Sender<TrackCommand>,
    playing: Arc<AtomicBool>,
}

impl MpvPreviewTrack {
    /// Spawns the worker thread, primes `url` paused, and returns the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the MPV context cannot be built or the URL cannot
    /// be loaded. Initialization happens on the worker thread; the error is
    /// relayed back before this function returns.
    pub fn open(url: &str) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let playing = Arc::new(AtomicBool::new(false));
        let playing_worker = Arc::clone(&playing);
        let url = url.to_string();

        thread::spawn(move || {
            let handler = match build_handler(&url) {
                Ok(handler) => {
                    let _ = ready_tx.send(Ok(()));
                    handler
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            track_worker(handler, command_rx, playing_worker);
        });

        ready_rx
            .recv()
            .context("MPV worker exited before signalling readiness")??;

        Ok(Self {
            command_tx,
            playing,
        })
    }

    fn send(&self, command: TrackCommand) {
        // A dead worker means the track was already closed; nothing to do.
        if self.command_tx.send(command).is_err() {
            debug!("preview track command sent after close");
        }
    }
}

impl PreviewTrack for MpvPreviewTrack {
    fn play(&self) {
        self.send(TrackCommand::Play);
    }

    fn stop(&self) {
        self.send(TrackCommand::Stop);
    }

    fn seek_to_start(&self) {
        self.send(TrackCommand::SeekToStart);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    fn close(&self) {
        self.send(TrackCommand::Close);
    }
}

impl Drop for MpvPreviewTrack {
    fn drop(&mut self) {
        // Harmless if close was already sent; the channel is simply gone.
        let _ = self.command_tx.send(TrackCommand::Close);
    }
}

/// Builds an audio-only MPV context with `url` loaded and paused.
fn build_handler(url: &str) -> Result<mpv::MpvHandler> {
    let mut handler = (|| {
        let mut builder = mpv::MpvHandlerBuilder::new().context("Failed to create MPV builder")?;
        builder
            .set_option("vo", "null")
            .context("Failed to set no video output")?;
        builder.build().context("Failed to build MPV handler")
    })()?;

    handler
        .observe_property::<bool>("pause", 0)
        .context("Failed to observe pause")?;
    handler
        .observe_property::<bool>("idle-active", 0)
        .context("Failed to observe idle-active")?;

    handler
        .command(&["loadfile", url, "replace"])
        .context(format!("Failed to load preview: {url}"))?;
    handler
        .set_property("pause", true)
        .context("Failed to prime preview paused")?;

    Ok(handler)
}

/// The execution loop owning one MPV context.
///
/// Drains pending commands, then polls MPV for property changes to keep the
/// shared playing flag current. Returns (dropping the context) on `Close` or
/// when every handle to the command channel is gone.
fn track_worker(
    mut handler: mpv::MpvHandler,
    command_rx: Receiver<TrackCommand>,
    playing: Arc<AtomicBool>,
) {
    let mut is_paused = true;
    let mut is_idle = false;

    loop {
        loop {
            match command_rx.try_recv() {
                Ok(TrackCommand::Play) => {
                    if let Err(e) = handler.set_property("pause", false) {
                        debug!(error = ?e, "failed to resume preview");
                    }
                }
                Ok(TrackCommand::Stop) => {
                    if let Err(e) = handler.set_property("pause", true) {
                        debug!(error = ?e, "failed to pause preview");
                    }
                }
                Ok(TrackCommand::SeekToStart) => {
                    if let Err(e) = handler.command(&["seek", "0", "absolute"]) {
                        debug!(error = ?e, "failed to rewind preview");
                    }
                }
                Ok(TrackCommand::Close) | Err(TryRecvError::Disconnected) => return,
                Err(TryRecvError::Empty) => break,
            }
        }

        if let Some(event) = handler.wait_event(0.05) {
            match event {
                mpv::Event::PropertyChange { name, change, .. } => match (name, change) {
                    ("pause", Format::Flag(paused)) => is_paused = paused,
                    ("idle-active", Format::Flag(idle)) => is_idle = idle,
                    _ => {}
                },
                mpv::Event::EndFile(_) => is_idle = true,
                _ => {}
            }
        }

        playing.store(!is_paused && !is_idle, Ordering::Relaxed);
    }
}
