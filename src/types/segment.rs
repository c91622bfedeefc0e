use serde::{Deserialize, Serialize};

/// Download state of one fixed-duration chunk of a track's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
    /// Not yet scheduled; occupies timeline space but counts as no work.
    Waiting,
    Initiated,
    Complete,
    Failed,
}

/// One fragment of a media track. Owned and mutated by the download
/// pipeline; the interface only ever reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub duration: f64,
    pub status: DownloadStatus,
    /// Declared timeline start. Only the first segment's value is consulted,
    /// to seed the running cursor when a track does not begin at zero.
    pub start: Option<f64>,
}

impl Segment {
    pub fn new(duration: f64, status: DownloadStatus) -> Self {
        Segment {
            duration,
            status,
            start: None,
        }
    }
}

/// Visual class of a rendered band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Uninitiated,
    Initiated,
    Complete,
    Failed,
}

impl StatusClass {
    pub fn from_status(status: DownloadStatus) -> Self {
        match status {
            DownloadStatus::Initiated => StatusClass::Initiated,
            DownloadStatus::Complete => StatusClass::Complete,
            DownloadStatus::Failed => StatusClass::Failed,
            DownloadStatus::Waiting => StatusClass::Uninitiated,
        }
    }

    /// Stable identifier, used for surface tags and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            StatusClass::Uninitiated => "download-uninitiated",
            StatusClass::Initiated => "download-initiated",
            StatusClass::Complete => "download-complete",
            StatusClass::Failed => "download-failed",
        }
    }
}

/// Distinguishes the two band strips when both tracks are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackTag {
    Video,
    Audio,
}

impl TrackTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackTag::Video => "download-video",
            TrackTag::Audio => "download-audio",
        }
    }
}

/// Read-only view of the download pipeline's fragment bookkeeping.
/// The pipeline itself is a black box; the interface only asks for the
/// current fragment list per quality level and a throughput sample.
pub trait FragmentSource {
    /// Fragment list for a quality level, or None if the level has no track.
    fn fragments(&self, level: usize) -> Option<Vec<Segment>>;
    /// Rolling throughput sample in bytes per second.
    fn speed(&self) -> f64;
    /// Number of active downloader connections.
    fn connections(&self) -> usize;
    fn current_level(&self) -> usize;
    fn current_audio_level(&self) -> usize;
}
