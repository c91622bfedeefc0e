use tracing::trace;

use crate::ops::band_ops::Band;
use crate::types::segment::{StatusClass, TrackTag};

/// Handle to one visual element owned by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(pub usize);

/// Drawing surface a band strip reconciles against. The strip only calls
/// these when a value actually changed, so an implementation can treat every
/// call as a real mutation. Geometry arrives as percent of total duration,
/// already clamped to [0, 100].
pub trait BandSurface {
    fn create(&mut self) -> SlotId;
    fn remove(&mut self, slot: SlotId);
    fn set_left(&mut self, slot: SlotId, percent: f32);
    fn set_width(&mut self, slot: SlotId, percent: f32);
    fn set_class(&mut self, slot: SlotId, class: StatusClass, tag: Option<TrackTag>);
}

/// Cached values for one rendered band, used to skip unchanged writes.
/// Bands are rebuilt wholesale every pass, so comparison is by value.
#[derive(Debug, Clone)]
struct VisualSlot {
    start: f64,
    width: f64,
    style: Option<(StatusClass, Option<TrackTag>)>,
    id: SlotId,
}

/// Reconciles an ordered band list onto a persistent pool of surface slots,
/// creating, destroying, and updating only what changed between passes.
#[derive(Debug, Default)]
pub struct BandStrip {
    slots: Vec<VisualSlot>,
}

impl BandStrip {
    pub fn new() -> Self {
        BandStrip::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Bring the pool in line with `bands`. After this call the pool holds
    /// exactly `bands.len()` slots, slot i mirroring band i; surface writes
    /// are issued only for values that differ from the cached ones.
    pub fn sync(
        &mut self,
        surface: &mut dyn BandSurface,
        bands: &[Band],
        duration: f64,
        tag: Option<TrackTag>,
    ) {
        for _ in self.slots.len()..bands.len() {
            self.slots.push(VisualSlot {
                start: -1.0,
                width: -1.0,
                style: None,
                id: surface.create(),
            });
        }
        while self.slots.len() > bands.len() {
            if let Some(slot) = self.slots.pop() {
                surface.remove(slot.id);
            }
        }

        for (slot, band) in self.slots.iter_mut().zip(bands) {
            if slot.start != band.start {
                slot.start = band.start;
                surface.set_left(slot.id, percent_of(band.start, duration));
            }
            if slot.width != band.width {
                slot.width = band.width;
                surface.set_width(slot.id, percent_of(band.width, duration));
            }
            let style = (band.class, tag);
            if slot.style != Some(style) {
                slot.style = Some(style);
                trace!(
                    slot = slot.id.0,
                    class = band.class.as_str(),
                    tag = tag.map(TrackTag::as_str),
                    "band restyled"
                );
                surface.set_class(slot.id, band.class, tag);
            }
        }
    }

    /// Release every slot, leaving the pool empty.
    pub fn clear(&mut self, surface: &mut dyn BandSurface) {
        self.sync(surface, &[], 0.0, None);
    }
}

/// Percent of total duration, clamped to tolerate rounding and late
/// duration updates.
fn percent_of(value: f64, duration: f64) -> f32 {
    if duration > 0.0 {
        ((value / duration * 100.0) as f32).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// A retained rectangle per live slot. The egui widget paints these each
/// frame; geometry is kept in percent so the widget scales them into
/// whatever rect the bar currently occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct BandRect {
    pub left_pct: f32,
    pub width_pct: f32,
    pub class: StatusClass,
    pub tag: Option<TrackTag>,
}

/// Slab-backed `BandSurface` holding the retained rectangles.
#[derive(Debug, Default)]
pub struct RetainedSurface {
    rects: Vec<Option<BandRect>>,
}

impl RetainedSurface {
    pub fn new() -> Self {
        RetainedSurface::default()
    }

    pub fn rects(&self) -> impl Iterator<Item = &BandRect> {
        self.rects.iter().flatten()
    }
}

impl BandSurface for RetainedSurface {
    fn create(&mut self) -> SlotId {
        if let Some(free) = self.rects.iter().position(Option::is_none) {
            self.rects[free] = Some(BandRect {
                left_pct: 0.0,
                width_pct: 0.0,
                class: StatusClass::Uninitiated,
                tag: None,
            });
            SlotId(free)
        } else {
            self.rects.push(Some(BandRect {
                left_pct: 0.0,
                width_pct: 0.0,
                class: StatusClass::Uninitiated,
                tag: None,
            }));
            SlotId(self.rects.len() - 1)
        }
    }

    fn remove(&mut self, slot: SlotId) {
        self.rects[slot.0] = None;
    }

    fn set_left(&mut self, slot: SlotId, percent: f32) {
        if let Some(rect) = self.rects[slot.0].as_mut() {
            rect.left_pct = percent;
        }
    }

    fn set_width(&mut self, slot: SlotId, percent: f32) {
        if let Some(rect) = self.rects[slot.0].as_mut() {
            rect.width_pct = percent;
        }
    }

    fn set_class(&mut self, slot: SlotId, class: StatusClass, tag: Option<TrackTag>) {
        if let Some(rect) = self.rects[slot.0].as_mut() {
            rect.class = class;
            rect.tag = tag;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::band_ops::collect_bands;
    use crate::types::segment::{DownloadStatus, Segment};

    /// Counts every surface write so minimality can be asserted.
    #[derive(Debug, Default)]
    struct CountingSurface {
        inner: RetainedSurface,
        creates: usize,
        removes: usize,
        writes: usize,
    }

    impl BandSurface for CountingSurface {
        fn create(&mut self) -> SlotId {
            self.creates += 1;
            self.inner.create()
        }
        fn remove(&mut self, slot: SlotId) {
            self.removes += 1;
            self.inner.remove(slot);
        }
        fn set_left(&mut self, slot: SlotId, percent: f32) {
            self.writes += 1;
            self.inner.set_left(slot, percent);
        }
        fn set_width(&mut self, slot: SlotId, percent: f32) {
            self.writes += 1;
            self.inner.set_width(slot, percent);
        }
        fn set_class(&mut self, slot: SlotId, class: StatusClass, tag: Option<TrackTag>) {
            self.writes += 1;
            self.inner.set_class(slot, class, tag);
        }
    }

    fn bands_for(statuses: &[DownloadStatus]) -> Vec<Band> {
        let segments: Vec<Segment> =
            statuses.iter().map(|s| Segment::new(10.0, *s)).collect();
        collect_bands(&segments).bands
    }

    #[test]
    fn test_pool_matches_band_count() {
        use DownloadStatus::*;
        let mut strip = BandStrip::new();
        let mut surface = CountingSurface::default();

        let bands = bands_for(&[Complete, Failed, Complete]);
        strip.sync(&mut surface, &bands, 100.0, None);
        assert_eq!(strip.len(), 3);

        let fewer = bands_for(&[Complete]);
        strip.sync(&mut surface, &fewer, 100.0, None);
        assert_eq!(strip.len(), 1);
        assert_eq!(surface.removes, 2);

        strip.sync(&mut surface, &[], 100.0, None);
        assert_eq!(strip.len(), 0);
        assert_eq!(surface.inner.rects().count(), 0);
    }

    #[test]
    fn test_identical_pass_issues_no_writes() {
        use DownloadStatus::*;
        let mut strip = BandStrip::new();
        let mut surface = CountingSurface::default();

        let bands = bands_for(&[Complete, Initiated, Failed]);
        strip.sync(&mut surface, &bands, 100.0, Some(TrackTag::Video));
        let after_first = surface.writes;
        assert!(after_first > 0);

        // Bands are rebuilt every pass; identical values must be detected
        // by value and produce zero surface mutations.
        let rebuilt = bands_for(&[Complete, Initiated, Failed]);
        strip.sync(&mut surface, &rebuilt, 100.0, Some(TrackTag::Video));
        assert_eq!(surface.writes, after_first);
        assert_eq!(surface.creates, 3);
        assert_eq!(surface.removes, 0);
    }

    #[test]
    fn test_only_changed_band_writes() {
        use DownloadStatus::*;
        let mut strip = BandStrip::new();
        let mut surface = CountingSurface::default();

        strip.sync(
            &mut surface,
            &bands_for(&[Initiated, Initiated, Failed]),
            100.0,
            None,
        );
        let before = surface.writes;

        // Same geometry, only the first band's class flips.
        strip.sync(
            &mut surface,
            &bands_for(&[Complete, Complete, Failed]),
            100.0,
            None,
        );
        assert_eq!(surface.writes, before + 1);
    }

    #[test]
    fn test_geometry_written_as_clamped_percent() {
        use DownloadStatus::*;
        let mut strip = BandStrip::new();
        let mut surface = RetainedSurface::new();

        // 4 segments of 10s over a duration of only 20s: the trailing band
        // overshoots and must clamp at 100%.
        let bands = bands_for(&[Complete, Complete, Failed, Failed]);
        strip.sync(&mut surface, &bands, 20.0, None);

        let rects: Vec<&BandRect> = surface.rects().collect();
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].left_pct, 0.0);
        assert_eq!(rects[0].width_pct, 100.0);
        assert_eq!(rects[1].left_pct, 100.0);
        assert_eq!(rects[1].width_pct, 100.0);
    }

    #[test]
    fn test_slot_reuse_after_clear() {
        use DownloadStatus::*;
        let mut strip = BandStrip::new();
        let mut surface = RetainedSurface::new();

        strip.sync(&mut surface, &bands_for(&[Complete, Failed]), 100.0, None);
        strip.clear(&mut surface);
        assert_eq!(surface.rects().count(), 0);

        strip.sync(&mut surface, &bands_for(&[Initiated]), 100.0, None);
        assert_eq!(surface.rects().count(), 1);
    }
}
