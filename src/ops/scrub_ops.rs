/// Pointer math shared by the seek and volume bars. All pure; the widgets
/// feed in measured pixel geometry and apply the results to the player.

/// Maximum linear gain of the volume control (300%).
pub const MAX_GAIN: f64 = 3.0;

/// Map a pointer offset within the bar to a media time.
/// Returns None when the bar has no measured width yet.
pub fn offset_to_time(offset_px: f32, bar_width_px: f32, duration: f64) -> Option<f64> {
    if bar_width_px <= 0.0 {
        return None;
    }
    let x = offset_px.clamp(0.0, bar_width_px);
    Some(duration * f64::from(x / bar_width_px))
}

pub fn clamp_offset(offset_px: f32, bar_width_px: f32) -> f32 {
    offset_px.clamp(0.0, bar_width_px.max(0.0))
}

/// Snap a raw gain ratio into the control's detents.
/// Returns the snapped volume and whether the value landed in the mute zone.
pub fn snap_volume(raw: f64) -> (f64, bool) {
    let mut volume = raw;
    let mut mute = false;
    if volume < 0.05 {
        volume = 0.0;
        mute = true;
    } else if volume > 2.95 {
        volume = MAX_GAIN;
    }
    // Unity-gain detent.
    if volume > 0.92 && volume < 1.08 {
        volume = 1.0;
    }
    (volume, mute)
}

/// Horizontal nudge that keeps a preview box of the given width from
/// clipping past either end of the bar. Positive pushes right, negative
/// pushes left, zero means the box is centered on the pointer.
pub fn preview_nudge(offset_px: f32, preview_width_px: f32, bar_width_px: f32) -> f32 {
    let half = preview_width_px / 2.0;
    if offset_px < half {
        half - offset_px
    } else if offset_px > bar_width_px - half {
        bar_width_px - half - offset_px
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_maps_proportionally() {
        // Half a 200px bar over a 100s timeline lands at 25s from x=50.
        assert_eq!(offset_to_time(50.0, 200.0, 100.0), Some(25.0));
        assert_eq!(offset_to_time(0.0, 200.0, 100.0), Some(0.0));
        assert_eq!(offset_to_time(200.0, 200.0, 100.0), Some(100.0));
    }

    #[test]
    fn test_offset_clamps_outside_bar() {
        assert_eq!(offset_to_time(-30.0, 200.0, 100.0), Some(0.0));
        assert_eq!(offset_to_time(500.0, 200.0, 100.0), Some(100.0));
        assert_eq!(clamp_offset(-1.0, 200.0), 0.0);
        assert_eq!(clamp_offset(250.0, 200.0), 200.0);
    }

    #[test]
    fn test_zero_width_bar_is_a_no_op() {
        assert_eq!(offset_to_time(50.0, 0.0, 100.0), None);
        assert_eq!(offset_to_time(50.0, -1.0, 100.0), None);
    }

    #[test]
    fn test_zero_duration_scrub_has_no_effect() {
        assert_eq!(offset_to_time(50.0, 200.0, 0.0), Some(0.0));
    }

    #[test]
    fn test_volume_mute_zone() {
        assert_eq!(snap_volume(0.0), (0.0, true));
        assert_eq!(snap_volume(0.049), (0.0, true));
        assert_eq!(snap_volume(-0.3), (0.0, true));
        assert_eq!(snap_volume(0.05), (0.05, false));
    }

    #[test]
    fn test_volume_max_clamp() {
        assert_eq!(snap_volume(2.951), (3.0, false));
        assert_eq!(snap_volume(3.0), (3.0, false));
        assert_eq!(snap_volume(2.95), (2.95, false));
    }

    #[test]
    fn test_volume_unity_detent() {
        assert_eq!(snap_volume(0.921), (1.0, false));
        assert_eq!(snap_volume(1.0), (1.0, false));
        assert_eq!(snap_volume(1.079), (1.0, false));
        assert_eq!(snap_volume(0.92), (0.92, false));
        assert_eq!(snap_volume(1.08), (1.08, false));
    }

    #[test]
    fn test_preview_nudges_inward_at_edges() {
        // Pointer near the left edge pushes the box right.
        assert_eq!(preview_nudge(10.0, 60.0, 400.0), 20.0);
        // Near the right edge it pushes left.
        assert_eq!(preview_nudge(390.0, 60.0, 400.0), -20.0);
        // Centered pointer needs no nudge.
        assert_eq!(preview_nudge(200.0, 60.0, 400.0), 0.0);
    }
}
