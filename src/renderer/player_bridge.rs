use std::path::Path;

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_pbutils as gst_pbutils;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to build playback pipeline: {0}")]
    Pipeline(String),
    #[error("pipeline refused state change: {0}")]
    StateChange(String),
    #[error("media source not found: {0}")]
    SourceNotFound(String),
    #[error("failed to grab frame: {0}")]
    Snapshot(String),
}

/// Time and volume control surface of the media backend. The interface
/// talks exclusively to this trait, which keeps the controllers testable
/// against a hand-rolled mock and the backend swappable.
pub trait Player {
    fn play(&mut self);
    fn pause(&mut self);
    /// Current position in seconds; 0 until the pipeline reports one.
    fn position(&self) -> f64;
    fn seek(&mut self, time: f64);
    /// Known duration in seconds; 0 while still unknown.
    fn duration(&self) -> f64;
    /// Linear gain, 0 to 3.
    fn set_volume(&mut self, volume: f64);
    fn set_muted(&mut self, muted: bool);
    /// Drain out-of-band backend notifications; called once per frame.
    fn poll_events(&mut self) -> Vec<PlayerEvent> {
        Vec::new()
    }
}

/// Out-of-band pipeline notifications, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    DurationChanged,
    EndOfStream,
    Buffering(i32),
    Error(String),
}

/// GStreamer playbin behind the `Player` trait. Video goes to the default
/// sink; this side only drives time, state and volume.
pub struct GstPlayer {
    playbin: gst::Element,
    uri: String,
}

impl GstPlayer {
    pub fn open_uri(uri: &str) -> Result<Self, PlayerError> {
        let playbin = gst::ElementFactory::make("playbin")
            .property("uri", uri)
            .build()
            .map_err(|e| PlayerError::Pipeline(e.to_string()))?;

        playbin
            .set_state(gst::State::Paused)
            .map_err(|e| PlayerError::StateChange(e.to_string()))?;

        info!(uri, "opened playback pipeline");
        Ok(GstPlayer {
            playbin,
            uri: uri.to_string(),
        })
    }

    pub fn shutdown(&mut self) {
        info!(uri = %self.uri, "shutting down playback pipeline");
        let _ = self.playbin.set_state(gst::State::Null);
    }
}

impl Drop for GstPlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Player for GstPlayer {
    fn play(&mut self) {
        if let Err(e) = self.playbin.set_state(gst::State::Playing) {
            warn!(error = %e, "failed to start playback");
        }
    }

    fn pause(&mut self) {
        if let Err(e) = self.playbin.set_state(gst::State::Paused) {
            warn!(error = %e, "failed to pause playback");
        }
    }

    fn position(&self) -> f64 {
        self.playbin
            .query_position::<gst::ClockTime>()
            .map(clocktime_to_secs)
            .unwrap_or(0.0)
    }

    fn seek(&mut self, time: f64) {
        let target = gst::ClockTime::from_nseconds((time.max(0.0) * 1_000_000_000.0) as u64);
        if let Err(e) = self
            .playbin
            .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT, target)
        {
            warn!(time, error = %e, "seek rejected");
        }
    }

    fn duration(&self) -> f64 {
        self.playbin
            .query_duration::<gst::ClockTime>()
            .map(clocktime_to_secs)
            .unwrap_or(0.0)
    }

    fn set_volume(&mut self, volume: f64) {
        self.playbin.set_property("volume", volume);
    }

    fn set_muted(&mut self, muted: bool) {
        self.playbin.set_property("mute", muted);
    }

    /// Drain pending bus messages into interface-level events.
    fn poll_events(&mut self) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        let Some(bus) = self.playbin.bus() else {
            return events;
        };
        while let Some(msg) = bus.pop() {
            match msg.view() {
                gst::MessageView::DurationChanged(_) => {
                    events.push(PlayerEvent::DurationChanged);
                }
                gst::MessageView::Eos(_) => {
                    events.push(PlayerEvent::EndOfStream);
                }
                gst::MessageView::Buffering(b) => {
                    events.push(PlayerEvent::Buffering(b.percent()));
                }
                gst::MessageView::Error(err) => {
                    events.push(PlayerEvent::Error(err.error().to_string()));
                }
                _ => {}
            }
        }
        events
    }
}

fn clocktime_to_secs(time: gst::ClockTime) -> f64 {
    time.nseconds() as f64 / 1_000_000_000.0
}

/// Absolute file URI for a local path.
pub fn path_to_uri(path: &Path) -> Result<String, PlayerError> {
    let abs = std::fs::canonicalize(path)
        .map_err(|_| PlayerError::SourceNotFound(path.display().to_string()))?;
    Ok(format!("file://{}", abs.to_string_lossy()))
}

/// Probe a source's duration up front with the discoverer; pipelines only
/// report duration once preroll finishes, which is too late for the first
/// layout pass.
pub fn probe_duration(uri: &str) -> Option<f64> {
    let discoverer = gst_pbutils::Discoverer::new(gst::ClockTime::from_seconds(5)).ok()?;
    let probe_info = discoverer.discover_uri(uri).ok()?;
    probe_info.duration().map(clocktime_to_secs)
}
