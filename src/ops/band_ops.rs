use crate::types::segment::{DownloadStatus, Segment, StatusClass};

/// A merged run of consecutive same-status segments, the unit actually
/// rendered on the progress strip.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub start: f64,
    pub end: f64,
    pub width: f64,
    pub class: StatusClass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandSummary {
    pub bands: Vec<Band>,
    /// Non-waiting segments seen, merged runs counting every member.
    pub total: usize,
    /// Members with Complete status.
    pub loaded: usize,
}

impl BandSummary {
    pub fn empty() -> Self {
        BandSummary {
            bands: Vec::new(),
            total: 0,
            loaded: 0,
        }
    }
}

/// Compresses a segment sequence into ordered, non-overlapping bands.
///
/// The running cursor starts from the first segment's declared start (clamped
/// to zero) and advances by every segment's duration. Waiting segments leave
/// a gap: they advance the cursor but emit no band and are excluded from the
/// totals. Runs of identical status merge into a single band, which is what
/// keeps the slot pool small when segment counts reach the thousands.
pub fn collect_bands(segments: &[Segment]) -> BandSummary {
    let mut bands = Vec::new();
    let mut total = 0;
    let mut loaded = 0;

    let mut cursor = match segments.first() {
        Some(first) => first.start.map(|s| s.max(0.0)).unwrap_or(0.0),
        None => return BandSummary::empty(),
    };

    let mut i = 0;
    while i < segments.len() {
        let seg = &segments[i];
        let start = cursor;
        let mut end = cursor + seg.duration;
        cursor = end;

        if seg.status == DownloadStatus::Waiting {
            i += 1;
            continue;
        }

        let status = seg.status;
        total += 1;
        if status == DownloadStatus::Complete {
            loaded += 1;
        }
        i += 1;

        // Greedily absorb the rest of the run.
        while i < segments.len() && segments[i].status == status {
            end = cursor + segments[i].duration;
            cursor = end;
            total += 1;
            if status == DownloadStatus::Complete {
                loaded += 1;
            }
            i += 1;
        }

        bands.push(Band {
            start,
            end,
            width: end - start,
            class: StatusClass::from_status(status),
        });
    }

    BandSummary {
        bands,
        total,
        loaded,
    }
}
