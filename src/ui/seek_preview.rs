use eframe::egui;

use crate::ops::scrub_ops::preview_nudge;
use crate::renderer::thumbnailer::Thumbnailer;

/// Resolved placement for the floating preview: where the box anchors, where
/// the tip marks the true pointer position, and whether the two came apart
/// because the box was nudged off the pointer near an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewPlacement {
    pub anchor_x: f32,
    pub tip_x: f32,
    pub detached: bool,
}

/// Center the preview box on the pointer, nudged inward so it never clips
/// past either end of the bar.
pub fn place_preview(x: f32, preview_width: f32, bar_width: f32) -> PreviewPlacement {
    let nudge = preview_nudge(x, preview_width, bar_width);
    PreviewPlacement {
        anchor_x: x + nudge,
        tip_x: x,
        detached: nudge != 0.0,
    }
}

const THUMB_SIZE: egui::Vec2 = egui::vec2(160.0, 90.0);
const LABEL_HEIGHT: f32 = 18.0;

/// Floating time label and thumbnail above the seek bar. Retains the
/// current thumbnail texture so it survives until the frame is painted.
#[derive(Default)]
pub struct SeekPreview {
    texture: Option<egui::TextureHandle>,
    texture_time: Option<f64>,
}

impl SeekPreview {
    pub fn new() -> Self {
        SeekPreview::default()
    }

    /// Drop the retained texture, e.g. when the source changes.
    pub fn reset(&mut self) {
        self.texture = None;
        self.texture_time = None;
    }

    #[allow(clippy::too_many_arguments)]
    pub fn show(
        &mut self,
        painter: &egui::Painter,
        ctx: &egui::Context,
        bar_rect: egui::Rect,
        x: f32,
        label: String,
        time: f64,
        thumbs: Option<&mut Thumbnailer>,
    ) {
        let has_thumbs = thumbs.is_some();
        if let Some(thumbs) = thumbs {
            thumbs.request(time);
            if let Some(thumb) = thumbs.get(time) {
                if self.texture_time != Some(thumb.time) {
                    let img = egui::ColorImage::from_rgba_unmultiplied(
                        [thumb.width as usize, thumb.height as usize],
                        &thumb.rgba,
                    );
                    self.texture = Some(ctx.load_texture(
                        "seek_preview_thumb",
                        img,
                        egui::TextureOptions::default(),
                    ));
                    self.texture_time = Some(thumb.time);
                }
            }
        }

        let box_width = if has_thumbs {
            THUMB_SIZE.x
        } else {
            60.0
        };
        let box_height = if has_thumbs {
            THUMB_SIZE.y + LABEL_HEIGHT
        } else {
            LABEL_HEIGHT
        };

        let placement = place_preview(x, box_width, bar_rect.width());
        let anchor = egui::pos2(
            bar_rect.left() + placement.anchor_x,
            bar_rect.top() - 6.0,
        );
        let preview_rect = egui::Rect::from_min_size(
            egui::pos2(anchor.x - box_width / 2.0, anchor.y - box_height),
            egui::vec2(box_width, box_height),
        );

        painter.rect_filled(preview_rect, 3.0, egui::Color32::from_black_alpha(200));

        if has_thumbs {
            if let Some(texture) = &self.texture {
                let thumb_rect = egui::Rect::from_min_size(preview_rect.min, THUMB_SIZE);
                painter.image(
                    texture.id(),
                    thumb_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
        }

        painter.text(
            egui::pos2(preview_rect.center().x, preview_rect.bottom() - LABEL_HEIGHT / 2.0),
            egui::Align2::CENTER_CENTER,
            label,
            egui::FontId::proportional(12.0),
            egui::Color32::WHITE,
        );

        // Tip marks the true pointer position even when the box is nudged.
        let tip_x = bar_rect.left() + placement.tip_x;
        let tip_color = if placement.detached {
            egui::Color32::from_gray(160)
        } else {
            egui::Color32::WHITE
        };
        painter.line_segment(
            [
                egui::pos2(tip_x, bar_rect.top() - 6.0),
                egui::pos2(tip_x, bar_rect.top()),
            ],
            egui::Stroke::new(2.0, tip_color),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_pointer_keeps_box_attached() {
        let placement = place_preview(200.0, 60.0, 400.0);
        assert_eq!(placement.anchor_x, 200.0);
        assert_eq!(placement.tip_x, 200.0);
        assert!(!placement.detached);
    }

    #[test]
    fn test_left_edge_nudges_box_right() {
        let placement = place_preview(10.0, 60.0, 400.0);
        assert_eq!(placement.anchor_x, 30.0);
        assert_eq!(placement.tip_x, 10.0);
        assert!(placement.detached);
    }

    #[test]
    fn test_right_edge_nudges_box_left() {
        let placement = place_preview(395.0, 60.0, 400.0);
        assert_eq!(placement.anchor_x, 370.0);
        assert_eq!(placement.tip_x, 395.0);
        assert!(placement.detached);
    }
}
