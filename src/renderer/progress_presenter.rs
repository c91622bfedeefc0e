use tracing::debug;

use crate::ops::band_ops::collect_bands;
use crate::renderer::band_strip::{BandStrip, BandSurface};
use crate::types::segment::{FragmentSource, TrackTag};
use crate::types::status::{Keep, StatusLine};

/// Drives aggregation and strip reconciliation for the primary and
/// auxiliary tracks, merges their totals into the download summary shown on
/// the status line, and smooths the throughput sample for display.
#[derive(Debug, Default)]
pub struct ProgressPresenter {
    video_strip: BandStrip,
    audio_strip: BandStrip,
    smoothed_speed: f64,
    /// While a manual save/export runs, automatic status updates stand down.
    export_in_progress: bool,
}

impl ProgressPresenter {
    pub fn new() -> Self {
        ProgressPresenter::default()
    }

    pub fn set_export_in_progress(&mut self, in_progress: bool) {
        self.export_in_progress = in_progress;
    }

    pub fn export_in_progress(&self) -> bool {
        self.export_in_progress
    }

    /// One full pass: fetch fragments per track, rebuild bands, reconcile
    /// both strips, then refresh the status line. Band computation always
    /// completes before any surface mutation.
    pub fn update(
        &mut self,
        surface: &mut dyn BandSurface,
        source: Option<&dyn FragmentSource>,
        duration: f64,
        status: &mut StatusLine,
    ) {
        let Some(source) = source else {
            self.clear(surface);
            return;
        };
        if duration <= 0.0 {
            self.clear(surface);
            return;
        }

        let video = source.fragments(source.current_level());
        let audio = source.fragments(source.current_audio_level());

        let video_summary = video.as_deref().map(collect_bands);
        let audio_summary = audio.as_deref().map(collect_bands);

        let video_tag = audio_summary.is_some().then_some(TrackTag::Video);
        let audio_tag = video_summary.is_some().then_some(TrackTag::Audio);

        let mut total = 0;
        let mut loaded = 0;
        if let Some(summary) = &video_summary {
            self.video_strip
                .sync(surface, &summary.bands, duration, video_tag);
            total += summary.total;
            loaded += summary.loaded;
        } else {
            self.video_strip.clear(surface);
        }
        if let Some(summary) = &audio_summary {
            self.audio_strip
                .sync(surface, &summary.bands, duration, audio_tag);
            total += summary.total;
            loaded += summary.loaded;
        } else {
            self.audio_strip.clear(surface);
        }

        if total == 0 {
            // Nothing attempted yet; leave whatever the line already says.
            return;
        }

        let percent = (loaded as f64 / total as f64 * 1000.0).round() / 10.0;

        let sample = source.speed();
        let sample = if sample.is_finite() { sample } else { 0.0 };
        self.smoothed_speed = sample * 0.1 + self.smoothed_speed * 0.9;
        let speed_mbs = (self.smoothed_speed / 1_000_000.0 * 10.0).round() / 10.0;

        debug!(
            total,
            loaded,
            percent,
            speed_mbs,
            video_slots = self.video_strip.len(),
            audio_slots = self.audio_strip.len(),
            "progress pass"
        );

        if self.export_in_progress {
            return;
        }
        if percent < 100.0 {
            status.set(
                format!(
                    "{}C \u{2193}{}MB/s {}%",
                    source.connections(),
                    speed_mbs,
                    percent
                ),
                Keep::None,
            );
        } else if status.text() != "Save complete" {
            status.set("100% Downloaded", Keep::None);
        }
    }

    /// Tear down both strips and forget the smoothed throughput. Used when
    /// the source goes away or the view resets.
    pub fn reset(&mut self, surface: &mut dyn BandSurface) {
        self.clear(surface);
        self.smoothed_speed = 0.0;
        self.export_in_progress = false;
    }

    fn clear(&mut self, surface: &mut dyn BandSurface) {
        self.video_strip.clear(surface);
        self.audio_strip.clear(surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::band_strip::RetainedSurface;
    use crate::types::segment::{DownloadStatus, Segment};

    struct FakeSource {
        video: Option<Vec<Segment>>,
        audio: Option<Vec<Segment>>,
        speed: f64,
        connections: usize,
    }

    impl FakeSource {
        fn new(video: Option<Vec<Segment>>, audio: Option<Vec<Segment>>) -> Self {
            FakeSource {
                video,
                audio,
                speed: 0.0,
                connections: 4,
            }
        }
    }

    impl FragmentSource for FakeSource {
        fn fragments(&self, level: usize) -> Option<Vec<Segment>> {
            match level {
                0 => self.video.clone(),
                1 => self.audio.clone(),
                _ => None,
            }
        }
        fn speed(&self) -> f64 {
            self.speed
        }
        fn connections(&self) -> usize {
            self.connections
        }
        fn current_level(&self) -> usize {
            0
        }
        fn current_audio_level(&self) -> usize {
            1
        }
    }

    fn segs(statuses: &[DownloadStatus]) -> Vec<Segment> {
        statuses.iter().map(|s| Segment::new(10.0, *s)).collect()
    }

    #[test]
    fn test_unknown_duration_renders_empty() {
        use DownloadStatus::*;
        let mut presenter = ProgressPresenter::new();
        let mut surface = RetainedSurface::new();
        let mut status = StatusLine::new();
        let source = FakeSource::new(Some(segs(&[Complete])), None);

        presenter.update(&mut surface, Some(&source), 0.0, &mut status);
        assert_eq!(surface.rects().count(), 0);
        assert_eq!(status.text(), "");
    }

    #[test]
    fn test_detached_player_renders_empty() {
        use DownloadStatus::*;
        let mut presenter = ProgressPresenter::new();
        let mut surface = RetainedSurface::new();
        let mut status = StatusLine::new();
        let source = FakeSource::new(Some(segs(&[Complete])), None);

        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        assert!(surface.rects().count() > 0);

        presenter.update(&mut surface, None, 100.0, &mut status);
        assert_eq!(surface.rects().count(), 0);
    }

    #[test]
    fn test_totals_merge_across_tracks() {
        use DownloadStatus::*;
        let mut presenter = ProgressPresenter::new();
        let mut surface = RetainedSurface::new();
        let mut status = StatusLine::new();
        let source = FakeSource::new(
            Some(segs(&[Complete, Complete, Initiated, Initiated])),
            Some(segs(&[Complete, Initiated])),
        );

        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        // 3 of 6 → 50%.
        assert_eq!(status.text(), "4C \u{2193}0MB/s 50%");
    }

    #[test]
    fn test_both_tracks_present_get_distinguishing_tags() {
        use DownloadStatus::*;
        let mut presenter = ProgressPresenter::new();
        let mut surface = RetainedSurface::new();
        let mut status = StatusLine::new();
        let source = FakeSource::new(Some(segs(&[Complete])), Some(segs(&[Initiated])));

        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        let tags: Vec<Option<TrackTag>> = surface.rects().map(|r| r.tag).collect();
        assert!(tags.contains(&Some(TrackTag::Video)));
        assert!(tags.contains(&Some(TrackTag::Audio)));
    }

    #[test]
    fn test_single_track_carries_no_tag() {
        use DownloadStatus::*;
        let mut presenter = ProgressPresenter::new();
        let mut surface = RetainedSurface::new();
        let mut status = StatusLine::new();
        let source = FakeSource::new(Some(segs(&[Complete])), None);

        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        assert!(surface.rects().all(|r| r.tag.is_none()));
    }

    #[test]
    fn test_zero_total_leaves_status_untouched() {
        use DownloadStatus::*;
        let mut presenter = ProgressPresenter::new();
        let mut surface = RetainedSurface::new();
        let mut status = StatusLine::new();
        status.set("Welcome!", Keep::None);

        let source = FakeSource::new(Some(segs(&[Waiting, Waiting])), None);
        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        assert_eq!(status.text(), "Welcome!");
    }

    #[test]
    fn test_speed_smoothing_seeds_from_zero() {
        use DownloadStatus::*;
        let mut presenter = ProgressPresenter::new();
        let mut surface = RetainedSurface::new();
        let mut status = StatusLine::new();
        let mut source = FakeSource::new(Some(segs(&[Complete, Initiated])), None);
        source.speed = 10_000_000.0; // 10 MB/s raw

        // First tick only blends in a tenth of the raw sample.
        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        assert_eq!(status.text(), "4C \u{2193}1MB/s 50%");

        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        assert_eq!(status.text(), "4C \u{2193}1.9MB/s 50%");
    }

    #[test]
    fn test_complete_download_announces_once_unless_saved() {
        use DownloadStatus::*;
        let mut presenter = ProgressPresenter::new();
        let mut surface = RetainedSurface::new();
        let mut status = StatusLine::new();
        let source = FakeSource::new(Some(segs(&[Complete, Complete])), None);

        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        assert_eq!(status.text(), "100% Downloaded");

        // A finished save message is more specific and must not be clobbered.
        status.set("Save complete", Keep::None);
        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        assert_eq!(status.text(), "Save complete");
    }

    #[test]
    fn test_export_suppresses_auto_status() {
        use DownloadStatus::*;
        let mut presenter = ProgressPresenter::new();
        let mut surface = RetainedSurface::new();
        let mut status = StatusLine::new();
        let source = FakeSource::new(Some(segs(&[Complete, Initiated])), None);

        presenter.set_export_in_progress(true);
        status.set("Saving 50%", Keep::None);
        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        assert_eq!(status.text(), "Saving 50%");

        presenter.set_export_in_progress(false);
        presenter.update(&mut surface, Some(&source), 100.0, &mut status);
        assert!(status.text().ends_with("50%"));
    }
}
