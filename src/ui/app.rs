use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use eframe::egui;
use tracing::{error, info, warn};

use crate::renderer::band_strip::RetainedSurface;
use crate::renderer::player_bridge::{path_to_uri, probe_duration, GstPlayer, Player, PlayerEvent};
use crate::renderer::progress_presenter::ProgressPresenter;
use crate::renderer::thumbnailer::{grab_frame, Thumbnailer};
use crate::types::playback_state::PlaybackState;
use crate::types::segment::FragmentSource;
use crate::types::session::ResumeStore;
use crate::types::settings::PlayerSettings;
use crate::types::status::{Keep, StatusLine};
use crate::ui::seek_bar::{format_time, ScrubController, SeekBar};
use crate::ui::seek_preview::SeekPreview;
use crate::ui::volume_bar::{VolumeBar, VolumeDragController};

const WELCOME: &str = concat!("Welcome to Swiftplay v", env!("CARGO_PKG_VERSION"), "!");

/// Media below this duration keeps the progress poll running every frame;
/// longer media refreshes on events only.
const POLL_DURATION_LIMIT: f64 = 5.0 * 60.0;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);
const POSITION_SAVE_INTERVAL: Duration = Duration::from_secs(5);

pub struct PlayerApp {
    playback: PlaybackState,
    player: Option<Box<dyn Player>>,
    fragments: Option<Box<dyn FragmentSource>>,
    presenter: ProgressPresenter,
    surface: RetainedSurface,
    scrub: ScrubController,
    volume_drag: VolumeDragController,
    preview: SeekPreview,
    status: StatusLine,
    resume: ResumeStore,
    settings: PlayerSettings,
    settings_path: PathBuf,
    thumbs: Option<Thumbnailer>,
    source_uri: Option<String>,
    media_name: Option<String>,
    poll_progress: bool,
    welcome_until: Option<Instant>,
    last_progress_pass: Instant,
    last_position_save: Instant,
}

impl PlayerApp {
    pub fn new(storage_dir: Option<PathBuf>) -> Self {
        let dir = storage_dir.unwrap_or_else(std::env::temp_dir);
        let _ = std::fs::create_dir_all(&dir);
        let settings_path = dir.join("settings.json");
        let settings = PlayerSettings::load_from_file(&settings_path).unwrap_or_default();

        let mut playback = PlaybackState::new();
        playback.volume = settings.volume;
        playback.muted = settings.muted;
        if settings.volume > 0.0 {
            playback.latest_volume = settings.volume;
        }

        let mut status = StatusLine::new();
        status.set(WELCOME, Keep::None);

        PlayerApp {
            playback,
            player: None,
            fragments: None,
            presenter: ProgressPresenter::new(),
            surface: RetainedSurface::new(),
            scrub: ScrubController::new(),
            volume_drag: VolumeDragController::new(),
            preview: SeekPreview::new(),
            status,
            resume: ResumeStore::new(dir.join("resume.json")),
            settings,
            settings_path,
            thumbs: None,
            source_uri: None,
            media_name: None,
            poll_progress: false,
            welcome_until: Some(Instant::now() + Duration::from_secs(3)),
            last_progress_pass: Instant::now(),
            last_position_save: Instant::now(),
        }
    }

    /// Wire in a backend and fragment source directly; used by the demo
    /// mode, which has no file behind it.
    pub fn attach(
        &mut self,
        player: Box<dyn Player>,
        fragments: Option<Box<dyn FragmentSource>>,
        name: &str,
    ) {
        self.reset();
        self.playback.duration = player.duration();
        self.player = Some(player);
        self.fragments = fragments;
        self.media_name = Some(name.to_string());
        self.apply_stored_volume();
        self.duration_changed();
    }

    /// Open a local media file through the GStreamer backend.
    pub fn open_path(&mut self, path: &Path) -> anyhow::Result<()> {
        self.reset();
        let uri = path_to_uri(path)?;
        let player = GstPlayer::open_uri(&uri)?;

        self.playback.duration = probe_duration(&uri).unwrap_or(0.0);
        self.player = Some(Box::new(player));
        self.media_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        self.thumbs = Some(Thumbnailer::spawn(uri.clone(), 160, 90));

        if let Some(position) = self.resume.load_position(&uri) {
            info!(position, "resuming from saved position");
            if let Some(player) = self.player.as_deref_mut() {
                player.seek(position);
            }
            self.playback.current_time = position;
        }
        self.source_uri = Some(uri);

        self.apply_stored_volume();
        self.duration_changed();
        Ok(())
    }

    /// Tear down the current source: strips, caches, status, poll loop, and
    /// any in-flight drag session.
    fn reset(&mut self) {
        self.scrub.cancel(&mut self.resume);
        self.volume_drag.cancel();
        self.presenter.reset(&mut self.surface);
        self.preview.reset();
        self.status.reset();
        self.player = None;
        self.fragments = None;
        self.thumbs = None;
        self.source_uri = None;
        self.media_name = None;
        self.poll_progress = false;
        self.welcome_until = None;

        let volume = self.playback.volume;
        let muted = self.playback.muted;
        let latest = self.playback.latest_volume;
        self.playback = PlaybackState::new();
        self.playback.volume = volume;
        self.playback.muted = muted;
        self.playback.latest_volume = latest;
    }

    fn apply_stored_volume(&mut self) {
        if let Some(player) = self.player.as_deref_mut() {
            player.set_volume(self.playback.volume);
            player.set_muted(self.playback.muted);
        }
    }

    /// Duration became known or changed: short media keeps the progress
    /// poll hot, long media falls back to event-driven refreshes.
    fn duration_changed(&mut self) {
        if let Some(player) = self.player.as_deref() {
            let reported = player.duration();
            if reported > 0.0 {
                self.playback.duration = reported;
            }
        }
        self.poll_progress = self.playback.duration < POLL_DURATION_LIMIT;
        info!(
            duration = self.playback.duration,
            poll = self.poll_progress,
            "duration changed"
        );
        self.refresh_progress();
    }

    /// One aggregation+reconcile pass over both tracks.
    fn refresh_progress(&mut self) {
        self.presenter.update(
            &mut self.surface,
            self.fragments.as_deref(),
            self.playback.duration,
            &mut self.status,
        );
        self.last_progress_pass = Instant::now();
    }

    fn handle_player_events(&mut self) {
        let events = match self.player.as_deref_mut() {
            Some(player) => player.poll_events(),
            None => return,
        };
        for event in events {
            match event {
                PlayerEvent::DurationChanged => self.duration_changed(),
                PlayerEvent::EndOfStream => {
                    info!("end of stream");
                    self.playback.is_playing = false;
                }
                PlayerEvent::Buffering(percent) => {
                    self.playback.buffering = percent < 100;
                }
                PlayerEvent::Error(message) => {
                    error!(message, "pipeline error");
                    self.status.fail(format!("Playback failed: {message}"));
                    self.playback.is_playing = false;
                }
            }
        }
    }

    /// Grab the frame at the current position and save it as a PNG. Walks
    /// the held-status choreography so the transient messages are not
    /// clobbered by the per-tick download summary.
    fn take_screenshot(&mut self) {
        let Some(uri) = self.source_uri.clone() else {
            rfd::MessageDialog::new()
                .set_title("Swiftplay")
                .set_description("No media loaded!")
                .show();
            return;
        };

        let suggested = format!(
            "{}-{}.png",
            self.media_name
                .as_deref()
                .unwrap_or("frame")
                .replace(' ', "_"),
            format_time(self.playback.current_time).replace(':', ".")
        );
        let Some(target) = rfd::FileDialog::new().set_file_name(suggested).save_file() else {
            return;
        };

        self.status.set("Taking screenshot...", Keep::Forever);
        self.presenter.set_export_in_progress(true);

        let result = save_frame_png(&uri, self.playback.current_time, &target);

        self.presenter.set_export_in_progress(false);
        self.status.set("", Keep::Override);
        match result {
            Ok(()) => {
                info!(path = %target.display(), "screenshot saved");
                self.status
                    .set("Screenshot Saved!", Keep::For(Duration::from_secs(1)));
            }
            Err(e) => {
                error!(error = %e, "screenshot failed");
                self.status
                    .set("Screenshot failed", Keep::For(Duration::from_secs(2)));
            }
        }
    }

    fn open_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter(
                "Media",
                &["mp4", "mov", "mkv", "webm", "mp3", "wav", "ogg", "flac"],
            )
            .pick_file();
        if let Some(path) = picked {
            if let Err(e) = self.open_path(&path) {
                error!(error = %e, path = %path.display(), "failed to open media");
                self.status.fail(format!("Failed to load: {e}"));
            }
        }
    }

    fn controls_row(&mut self, ui: &mut egui::Ui) {
        if ui
            .button(if self.playback.is_playing {
                "Pause"
            } else {
                "Play"
            })
            .clicked()
        {
            if let Some(player) = self.player.as_deref_mut() {
                if self.playback.is_playing {
                    player.pause();
                    self.playback.is_playing = false;
                } else {
                    player.play();
                    self.playback.is_playing = true;
                }
            }
        }

        ui.label(format!(
            "{} / {}",
            format_time(self.playback.current_time),
            format_time(self.playback.duration)
        ));

        let mute_label = if self.playback.muted { "🔇" } else { "🔊" };
        if ui.button(mute_label).clicked() {
            let volume = self.playback.toggle_mute();
            if let Some(player) = self.player.as_deref_mut() {
                player.set_volume(volume);
                player.set_muted(self.playback.muted);
            }
        }
        if let Some(player) = self.player.as_deref_mut() {
            VolumeBar::new(&mut self.volume_drag, &mut self.playback, player).show(ui);
        }
        ui.label(format!("{}%", (self.playback.volume * 100.0).round()));

        if self.playback.buffering {
            ui.add(egui::Spinner::new().size(14.0));
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Open…").clicked() {
                self.open_dialog();
            }
            if ui.button("Screenshot").clicked() {
                self.take_screenshot();
            }
            ui.label(
                egui::RichText::new(self.status.text())
                    .size(12.0)
                    .color(egui::Color32::GRAY),
            );
        });
    }
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_player_events();

        let duration_arrived = self.playback.duration <= 0.0
            && self
                .player
                .as_deref()
                .is_some_and(|player| player.duration() > 0.0);
        if duration_arrived {
            self.duration_changed();
        }
        // Position feedback stays off while a scrub is in flight so the
        // user-driven and backend-driven updates cannot fight.
        if !self.scrub.is_dragging() && (self.poll_progress || self.playback.is_playing) {
            if let Some(player) = self.player.as_deref() {
                self.playback.current_time = player.position();
            }
        }

        if self.last_progress_pass.elapsed() >= PROGRESS_INTERVAL {
            self.refresh_progress();
        }

        if self.playback.is_playing
            && self.resume.seek_save()
            && self.last_position_save.elapsed() >= POSITION_SAVE_INTERVAL
        {
            if let Some(uri) = &self.source_uri {
                if let Err(e) = self.resume.save_position(uri, self.playback.current_time) {
                    warn!(error = %e, "failed to persist position");
                }
            }
            self.last_position_save = Instant::now();
        }

        if let Some(deadline) = self.welcome_until {
            if Instant::now() >= deadline {
                self.status.clear_if(WELCOME);
                self.welcome_until = None;
            }
        }

        egui::TopBottomPanel::bottom("player_controls").show(ctx, |ui| {
            ui.add_space(6.0);
            if let Some(player) = self.player.as_deref_mut() {
                SeekBar::new(
                    &mut self.scrub,
                    &mut self.playback,
                    player,
                    &mut self.resume,
                    &self.surface,
                    &mut self.preview,
                )
                .source_uri(self.source_uri.as_deref())
                .thumbnails(self.thumbs.as_mut())
                .show(ui);
            } else {
                let width = ui.available_width();
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(width, 16.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(rect, 2.0, egui::Color32::from_gray(45));
            }
            ui.add_space(4.0);
            ui.horizontal(|ui| self.controls_row(ui));
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.4);
                match &self.media_name {
                    Some(name) => {
                        ui.heading(name);
                    }
                    None => {
                        ui.heading("No media");
                        ui.label("Open a file, or start with --demo");
                    }
                }
            });
        });

        if self.playback.is_playing || self.poll_progress || self.scrub.is_dragging() {
            ctx.request_repaint_after(Duration::from_millis(33));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.volume = self.playback.volume;
        self.settings.muted = self.playback.muted;
        if let Err(e) = self.settings.save_to_file(&self.settings_path) {
            warn!(error = %e, "failed to persist settings");
        }
        if let (Some(uri), Some(player)) = (&self.source_uri, self.player.as_deref()) {
            let _ = self.resume.save_position(uri, player.position());
        }
    }
}

fn save_frame_png(uri: &str, time: f64, target: &Path) -> anyhow::Result<()> {
    let thumb = grab_frame(uri, time, None)?;
    let img = image::RgbaImage::from_raw(thumb.width, thumb.height, thumb.rgba)
        .context("frame buffer did not match its reported size")?;
    img.save(target)?;
    Ok(())
}
