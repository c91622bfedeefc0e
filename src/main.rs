mod ops;
mod renderer;
mod types;
mod ui;

use std::path::Path;
use std::time::Instant;

use anyhow::anyhow;
use gstreamer as gst;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::renderer::player_bridge::{Player, PlayerEvent};
use crate::types::segment::{DownloadStatus, FragmentSource, Segment};
use crate::ui::app::PlayerApp;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swiftplay=info")),
        )
        .init();
    gst::init()?;

    let mut app = PlayerApp::new(eframe::storage_dir("swiftplay"));

    match std::env::args().nth(1) {
        Some(arg) if arg == "--demo" => {
            info!("starting in demo mode");
            app.attach(
                Box::new(ClockPlayer::new(120.0)),
                Some(Box::new(SimulatedDownload::new(120.0, 4.0))),
                "Demo stream",
            );
        }
        Some(path) => {
            app.open_path(Path::new(&path))?;
        }
        None => {}
    }

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "Swiftplay",
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("{e}"))?;
    Ok(())
}

/// Wall-clock player for demo mode: no media behind it, just a position
/// that advances while playing.
struct ClockPlayer {
    duration: f64,
    position: f64,
    playing: bool,
    last_tick: Instant,
}

impl ClockPlayer {
    fn new(duration: f64) -> Self {
        ClockPlayer {
            duration,
            position: 0.0,
            playing: false,
            last_tick: Instant::now(),
        }
    }
}

impl Player for ClockPlayer {
    fn play(&mut self) {
        self.playing = true;
        self.last_tick = Instant::now();
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn seek(&mut self, time: f64) {
        self.position = time.clamp(0.0, self.duration);
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn set_volume(&mut self, _volume: f64) {}

    fn set_muted(&mut self, _muted: bool) {}

    fn poll_events(&mut self) -> Vec<PlayerEvent> {
        let now = Instant::now();
        if self.playing {
            self.position += now.duration_since(self.last_tick).as_secs_f64();
            if self.position >= self.duration {
                self.position = self.duration;
                self.playing = false;
                self.last_tick = now;
                return vec![PlayerEvent::EndOfStream];
            }
        }
        self.last_tick = now;
        Vec::new()
    }
}

/// Stand-in for the download pipeline: segments march from waiting through
/// initiated to complete on a wall-clock schedule, with the occasional
/// failure so every band class shows up.
struct SimulatedDownload {
    started: Instant,
    duration: f64,
    segment_duration: f64,
}

impl SimulatedDownload {
    fn new(duration: f64, segment_duration: f64) -> Self {
        SimulatedDownload {
            started: Instant::now(),
            duration,
            segment_duration,
        }
    }

    fn track(&self, secs_per_segment: f64, fail_every: usize) -> Vec<Segment> {
        let count = (self.duration / self.segment_duration).ceil() as usize;
        let elapsed = self.started.elapsed().as_secs_f64();
        let done = (elapsed / secs_per_segment) as usize;
        (0..count)
            .map(|i| {
                let status = if i < done {
                    if fail_every > 0 && i % fail_every == fail_every - 1 {
                        DownloadStatus::Failed
                    } else {
                        DownloadStatus::Complete
                    }
                } else if i < done + 2 {
                    DownloadStatus::Initiated
                } else {
                    DownloadStatus::Waiting
                };
                Segment::new(self.segment_duration, status)
            })
            .collect()
    }
}

impl FragmentSource for SimulatedDownload {
    fn fragments(&self, level: usize) -> Option<Vec<Segment>> {
        match level {
            0 => Some(self.track(0.8, 9)),
            1 => Some(self.track(0.3, 0)),
            _ => None,
        }
    }

    fn speed(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        2_500_000.0 * (1.0 + 0.3 * (elapsed / 3.0).sin())
    }

    fn connections(&self) -> usize {
        4
    }

    fn current_level(&self) -> usize {
        0
    }

    fn current_audio_level(&self) -> usize {
        1
    }
}
