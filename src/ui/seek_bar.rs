use eframe::egui;

use crate::ops::scrub_ops::{clamp_offset, offset_to_time};
use crate::renderer::band_strip::RetainedSurface;
use crate::renderer::player_bridge::Player;
use crate::renderer::thumbnailer::Thumbnailer;
use crate::types::playback_state::PlaybackState;
use crate::types::segment::{StatusClass, TrackTag};
use crate::types::session::ResumeStore;
use crate::ui::seek_preview::SeekPreview;

/// One pointer-down-to-pointer-up scrub interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrubSession {
    /// Playback resumes after release only if this was set at press time.
    pub was_playing: bool,
    /// Press-time offset, kept for platforms that report no coordinates on
    /// release. NaN once a real move has fired: a later coordinate-less
    /// release must not fall back to stale pre-drag data.
    pub initial_x: f32,
}

/// Drag state machine for the timeline bar: Idle -> Dragging -> Idle.
/// Owns the session record so transitions are explicit and testable.
#[derive(Debug, Default)]
pub struct ScrubController {
    session: Option<ScrubSession>,
}

impl ScrubController {
    pub fn new() -> Self {
        ScrubController::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&ScrubSession> {
        self.session.as_ref()
    }

    /// Pointer-down on the bar. Captures the playing flag, pauses playback,
    /// suspends position persistence, and immediately applies the press
    /// position so a tap without movement still seeks.
    pub fn begin(
        &mut self,
        x: f32,
        bar_width: f32,
        player: &mut dyn Player,
        state: &mut PlaybackState,
        resume: &mut ResumeStore,
        uri: Option<&str>,
    ) {
        if self.session.is_some() {
            return;
        }
        let was_playing = state.is_playing;
        if was_playing {
            player.pause();
            state.is_playing = false;
        }
        if let Some(uri) = uri {
            let _ = resume.save_position(uri, state.current_time);
        }
        resume.set_seek_save(false);

        let initial_x = clamp_offset(x, bar_width);
        self.session = Some(ScrubSession {
            was_playing,
            initial_x,
        });
        shift_time(initial_x, bar_width, player, state);
    }

    /// Pointer-move while dragging: from here on the press-time position is
    /// dead, and every move maps straight onto the timeline.
    pub fn update(
        &mut self,
        x: f32,
        bar_width: f32,
        player: &mut dyn Player,
        state: &mut PlaybackState,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.initial_x = f32::NAN;
        shift_time(clamp_offset(x, bar_width), bar_width, player, state);
    }

    /// Pointer-up. `x` is None when the platform reports no coordinates on
    /// release; the press position covers that case, but only if no move
    /// happened in between.
    pub fn finish(
        &mut self,
        x: Option<f32>,
        bar_width: f32,
        player: &mut dyn Player,
        state: &mut PlaybackState,
        resume: &mut ResumeStore,
    ) {
        let Some(session) = self.session.take() else {
            return;
        };

        let final_x = match x {
            Some(x) => Some(clamp_offset(x, bar_width)),
            None if !session.initial_x.is_nan() => Some(session.initial_x),
            None => None,
        };
        if let Some(x) = final_x {
            shift_time(x, bar_width, player, state);
        }

        resume.set_seek_save(true);
        if session.was_playing {
            player.play();
            state.is_playing = true;
        }
    }

    /// Force-clear an in-flight session on teardown. Leaves playback paused
    /// but never leaves persistence suspended.
    pub fn cancel(&mut self, resume: &mut ResumeStore) {
        if self.session.take().is_some() {
            resume.set_seek_save(true);
        }
    }
}

fn shift_time(x: f32, bar_width: f32, player: &mut dyn Player, state: &mut PlaybackState) {
    if let Some(time) = offset_to_time(x, bar_width, state.duration) {
        player.seek(time);
        state.current_time = time;
    }
}

/// The seek bar: band strip underlay, played fill, playhead, hover preview,
/// and the scrub interaction.
pub struct SeekBar<'a> {
    controller: &'a mut ScrubController,
    playback: &'a mut PlaybackState,
    player: &'a mut dyn Player,
    resume: &'a mut ResumeStore,
    surface: &'a RetainedSurface,
    preview: &'a mut SeekPreview,
    uri: Option<&'a str>,
    thumbs: Option<&'a mut Thumbnailer>,
}

const BAR_HEIGHT: f32 = 16.0;

impl<'a> SeekBar<'a> {
    pub fn new(
        controller: &'a mut ScrubController,
        playback: &'a mut PlaybackState,
        player: &'a mut dyn Player,
        resume: &'a mut ResumeStore,
        surface: &'a RetainedSurface,
        preview: &'a mut SeekPreview,
    ) -> Self {
        SeekBar {
            controller,
            playback,
            player,
            resume,
            surface,
            preview,
            uri: None,
            thumbs: None,
        }
    }

    pub fn source_uri(mut self, uri: Option<&'a str>) -> Self {
        self.uri = uri;
        self
    }

    pub fn thumbnails(mut self, thumbs: Option<&'a mut Thumbnailer>) -> Self {
        self.thumbs = thumbs;
        self
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let width = ui.available_width();
        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(width, BAR_HEIGHT), egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect.expand2(egui::vec2(0.0, 120.0)));
        let bar_width = rect.width();

        // Background.
        painter.rect_filled(rect, 2.0, egui::Color32::from_gray(45));

        // Download bands, scaled out of percent space into the bar rect.
        for band in self.surface.rects() {
            let left = rect.left() + band.left_pct / 100.0 * bar_width;
            let w = band.width_pct / 100.0 * bar_width;
            let (top, height) = match band.tag {
                None => (rect.top(), rect.height()),
                Some(TrackTag::Video) => (rect.top(), rect.height() * 0.6),
                Some(TrackTag::Audio) => {
                    (rect.top() + rect.height() * 0.6, rect.height() * 0.4)
                }
            };
            painter.rect_filled(
                egui::Rect::from_min_size(egui::pos2(left, top), egui::vec2(w, height)),
                0.0,
                class_color(band.class),
            );
        }

        // Played fill and playhead.
        if self.playback.duration > 0.0 {
            let frac = (self.playback.current_time / self.playback.duration).clamp(0.0, 1.0);
            let played = egui::Rect::from_min_size(
                rect.min,
                egui::vec2(bar_width * frac as f32, rect.height()),
            );
            painter.rect_filled(played, 2.0, egui::Color32::from_white_alpha(40));
            let head_x = rect.left() + bar_width * frac as f32;
            painter.line_segment(
                [
                    egui::pos2(head_x, rect.top()),
                    egui::pos2(head_x, rect.bottom()),
                ],
                egui::Stroke::new(2.0, egui::Color32::from_rgb(230, 60, 60)),
            );
        }

        // Scrub interaction. Raw pointer state rather than click/drag
        // classification: the press must apply immediately.
        let pointer_down = ui.input(|i| i.pointer.primary_down());
        let pointer_moved = ui.input(|i| i.pointer.delta()) != egui::Vec2::ZERO;
        let latest_pos = ui.input(|i| i.pointer.latest_pos());

        if !self.controller.is_dragging() {
            if response.is_pointer_button_down_on() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.controller.begin(
                        pos.x - rect.left(),
                        bar_width,
                        self.player,
                        self.playback,
                        self.resume,
                        self.uri,
                    );
                }
            }
        } else if pointer_down {
            if pointer_moved {
                if let Some(pos) = latest_pos {
                    self.controller
                        .update(pos.x - rect.left(), bar_width, self.player, self.playback);
                }
            }
        } else {
            self.controller.finish(
                latest_pos.map(|pos| pos.x - rect.left()),
                bar_width,
                self.player,
                self.playback,
                self.resume,
            );
        }

        // Hover preview, also pinned while a drag is in flight.
        let hover_x = if self.controller.is_dragging() {
            latest_pos.map(|pos| pos.x - rect.left())
        } else {
            response.hover_pos().map(|pos| pos.x - rect.left())
        };
        if let Some(x) = hover_x {
            let x = clamp_offset(x, bar_width);
            if let Some(time) = offset_to_time(x, bar_width, self.playback.duration) {
                self.preview.show(
                    &painter,
                    ui.ctx(),
                    rect,
                    x,
                    format_time(time),
                    time,
                    self.thumbs.as_deref_mut(),
                );
            }
        }
    }
}

fn class_color(class: StatusClass) -> egui::Color32 {
    match class {
        StatusClass::Uninitiated => egui::Color32::from_gray(90),
        StatusClass::Initiated => egui::Color32::from_rgb(235, 185, 60),
        StatusClass::Complete => egui::Color32::from_rgb(70, 140, 235),
        StatusClass::Failed => egui::Color32::from_rgb(220, 70, 70),
    }
}

/// Format seconds as M:SS or H:MM:SS.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
