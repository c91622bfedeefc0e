use eframe::egui;

use crate::ops::scrub_ops::{snap_volume, MAX_GAIN};
use crate::renderer::player_bridge::Player;
use crate::types::playback_state::PlaybackState;

/// Drag state machine for the volume bar: same shape as the timeline scrub
/// but one-dimensional, with the snap zones applied on every shift.
#[derive(Debug, Default)]
pub struct VolumeDragController {
    dragging: bool,
}

impl VolumeDragController {
    pub fn new() -> Self {
        VolumeDragController::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn begin(
        &mut self,
        x: f32,
        bar_width: f32,
        player: &mut dyn Player,
        state: &mut PlaybackState,
    ) {
        if self.dragging {
            return;
        }
        self.dragging = true;
        shift_volume(x, bar_width, player, state);
    }

    pub fn update(
        &mut self,
        x: f32,
        bar_width: f32,
        player: &mut dyn Player,
        state: &mut PlaybackState,
    ) {
        if self.dragging {
            shift_volume(x, bar_width, player, state);
        }
    }

    /// Pointer-up; a coordinate-less release keeps the last applied volume.
    pub fn finish(
        &mut self,
        x: Option<f32>,
        bar_width: f32,
        player: &mut dyn Player,
        state: &mut PlaybackState,
    ) {
        if !self.dragging {
            return;
        }
        self.dragging = false;
        if let Some(x) = x {
            shift_volume(x, bar_width, player, state);
        }
    }

    pub fn cancel(&mut self) {
        self.dragging = false;
    }
}

/// Map a bar offset to a snapped gain and push it to the player. Applying
/// any volume above zero while muted unmutes; the mute zone mutes.
fn shift_volume(x: f32, bar_width: f32, player: &mut dyn Player, state: &mut PlaybackState) {
    if bar_width <= 0.0 {
        return;
    }
    let raw = f64::from(x / bar_width) * MAX_GAIN;
    let (volume, _mute) = snap_volume(raw);
    state.apply_volume(volume);
    player.set_volume(volume);
    player.set_muted(state.muted);
}

/// Horizontal volume control with fill, unity-gain notch, and readout.
pub struct VolumeBar<'a> {
    controller: &'a mut VolumeDragController,
    playback: &'a mut PlaybackState,
    player: &'a mut dyn Player,
}

const BAR_SIZE: egui::Vec2 = egui::vec2(90.0, 10.0);

impl<'a> VolumeBar<'a> {
    pub fn new(
        controller: &'a mut VolumeDragController,
        playback: &'a mut PlaybackState,
        player: &'a mut dyn Player,
    ) -> Self {
        VolumeBar {
            controller,
            playback,
            player,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let (rect, response) = ui.allocate_exact_size(BAR_SIZE, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect.expand(2.0));
        let bar_width = rect.width();

        painter.rect_filled(rect, 2.0, egui::Color32::from_gray(45));

        let frac = (self.playback.volume / MAX_GAIN).clamp(0.0, 1.0) as f32;
        let fill = egui::Rect::from_min_size(rect.min, egui::vec2(bar_width * frac, rect.height()));
        let fill_color = if self.playback.muted {
            egui::Color32::from_gray(110)
        } else {
            egui::Color32::from_rgb(120, 190, 90)
        };
        painter.rect_filled(fill, 2.0, fill_color);

        // Unity-gain notch at a third of the bar.
        let notch_x = rect.left() + bar_width / MAX_GAIN as f32;
        painter.line_segment(
            [
                egui::pos2(notch_x, rect.top() - 2.0),
                egui::pos2(notch_x, rect.bottom() + 2.0),
            ],
            egui::Stroke::new(1.0, egui::Color32::from_gray(140)),
        );

        let pointer_down = ui.input(|i| i.pointer.primary_down());
        let latest_pos = ui.input(|i| i.pointer.latest_pos());

        if !self.controller.is_dragging() {
            if response.is_pointer_button_down_on() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.controller.begin(
                        pos.x - rect.left(),
                        bar_width,
                        self.player,
                        self.playback,
                    );
                }
            }
        } else if pointer_down {
            if let Some(pos) = latest_pos {
                self.controller
                    .update(pos.x - rect.left(), bar_width, self.player, self.playback);
            }
        } else {
            self.controller.finish(
                latest_pos.map(|pos| pos.x - rect.left()),
                bar_width,
                self.player,
                self.playback,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct MockPlayer {
        volume: f64,
        muted: bool,
    }

    impl Player for MockPlayer {
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn position(&self) -> f64 {
            0.0
        }
        fn seek(&mut self, _time: f64) {}
        fn duration(&self) -> f64 {
            0.0
        }
        fn set_volume(&mut self, volume: f64) {
            self.volume = volume;
        }
        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }
    }

    #[test]
    fn test_drag_maps_offset_to_gain() {
        let mut controller = VolumeDragController::new();
        let mut player = MockPlayer::default();
        let mut state = PlaybackState::new();

        // Bar of 90px; halfway is a raw gain of 1.5.
        controller.begin(45.0, 90.0, &mut player, &mut state);
        assert!(controller.is_dragging());
        assert_eq!(player.volume, 1.5);
        controller.finish(Some(45.0), 90.0, &mut player, &mut state);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_low_zone_snaps_to_muted_zero() {
        let mut controller = VolumeDragController::new();
        let mut player = MockPlayer::default();
        let mut state = PlaybackState::new();

        controller.begin(1.0, 90.0, &mut player, &mut state);
        assert_eq!(player.volume, 0.0);
        assert!(player.muted);
        assert!(state.muted);
        controller.finish(None, 90.0, &mut player, &mut state);
        assert_eq!(state.volume, 0.0);
    }

    #[test]
    fn test_high_zone_clamps_to_max_gain() {
        let mut controller = VolumeDragController::new();
        let mut player = MockPlayer::default();
        let mut state = PlaybackState::new();

        controller.begin(89.5, 90.0, &mut player, &mut state);
        assert_eq!(player.volume, 3.0);
        assert!(!player.muted);
    }

    #[test]
    fn test_unity_detent_snaps_to_one() {
        let mut controller = VolumeDragController::new();
        let mut player = MockPlayer::default();
        let mut state = PlaybackState::new();

        // A third of the bar is unity; land slightly off and snap.
        controller.begin(31.0, 90.0, &mut player, &mut state);
        assert_eq!(player.volume, 1.0);
    }

    #[test]
    fn test_dragging_out_of_mute_unmutes() {
        let mut controller = VolumeDragController::new();
        let mut player = MockPlayer::default();
        let mut state = PlaybackState::new();

        controller.begin(1.0, 90.0, &mut player, &mut state);
        assert!(state.muted);
        controller.update(45.0, 90.0, &mut player, &mut state);
        assert!(!state.muted);
        assert_eq!(player.volume, 1.5);
        assert!(!player.muted);
        controller.finish(None, 90.0, &mut player, &mut state);
    }

    #[test]
    fn test_zero_width_bar_is_a_no_op() {
        let mut controller = VolumeDragController::new();
        let mut player = MockPlayer::default();
        let mut state = PlaybackState::new();

        controller.begin(10.0, 0.0, &mut player, &mut state);
        assert_eq!(player.volume, 0.0);
        assert_eq!(state.volume, 1.0);
        controller.finish(None, 0.0, &mut player, &mut state);
    }

    #[test]
    fn test_updates_ignored_when_not_dragging() {
        let mut controller = VolumeDragController::new();
        let mut player = MockPlayer::default();
        let mut state = PlaybackState::new();

        controller.update(45.0, 90.0, &mut player, &mut state);
        assert_eq!(state.volume, 1.0);
        assert_eq!(player.volume, 0.0);
    }
}
