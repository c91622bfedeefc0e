use std::num::NonZeroUsize;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use lru::LruCache;
use tracing::{debug, warn};

use crate::renderer::player_bridge::PlayerError;

/// RGBA frame grabbed from the media source.
#[derive(Debug, Clone)]
pub struct Thumb {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub time: f64,
}

/// Preview thumbnails are keyed on half-second buckets; hover positions
/// inside the same bucket share a frame.
fn bucket(time: f64) -> u64 {
    (time.max(0.0) * 2.0) as u64
}

/// Grabs seek-preview frames on a worker thread so hover never stalls the
/// interface, and keeps the most recent grabs in an LRU cache. One
/// thumbnailer exists per opened source.
pub struct Thumbnailer {
    tx: mpsc::Sender<f64>,
    rx: mpsc::Receiver<Thumb>,
    cache: LruCache<u64, Arc<Thumb>>,
    last_requested: Option<u64>,
}

impl Thumbnailer {
    pub fn spawn(uri: String, width: u32, height: u32) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<f64>();
        let (thumb_tx, thumb_rx) = mpsc::channel::<Thumb>();

        thread::spawn(move || {
            while let Ok(mut time) = req_rx.recv() {
                // Only the latest hover position matters; drain the backlog.
                while let Ok(newer) = req_rx.try_recv() {
                    time = newer;
                }
                match grab_frame(&uri, time, Some((width, height))) {
                    Ok(thumb) => {
                        if thumb_tx.send(thumb).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(time, error = %e, "preview grab failed"),
                }
            }
        });

        Thumbnailer {
            tx: req_tx,
            rx: thumb_rx,
            cache: LruCache::new(NonZeroUsize::new(64).expect("nonzero cache size")),
            last_requested: None,
        }
    }

    /// Ask for the frame near `time` unless it is already cached or was the
    /// last thing asked for.
    pub fn request(&mut self, time: f64) {
        let key = bucket(time);
        if self.cache.contains(&key) || self.last_requested == Some(key) {
            return;
        }
        self.last_requested = Some(key);
        let _ = self.tx.send(time);
    }

    /// Best thumbnail currently available for `time`, draining any finished
    /// grabs into the cache first.
    pub fn get(&mut self, time: f64) -> Option<Arc<Thumb>> {
        while let Ok(thumb) = self.rx.try_recv() {
            debug!(time = thumb.time, "preview frame ready");
            self.cache.put(bucket(thumb.time), Arc::new(thumb));
        }
        self.cache.get(&bucket(time)).cloned()
    }
}

/// Decode a single frame from the source at the given timestamp.
/// With `size` the frame is scaled to fit; without, it keeps the source
/// resolution (used for screenshots).
pub fn grab_frame(uri: &str, time: f64, size: Option<(u32, u32)>) -> Result<Thumb, PlayerError> {
    let caps = match size {
        Some((w, h)) => format!("video/x-raw,format=RGBA,width={},height={}", w, h),
        None => "video/x-raw,format=RGBA".to_string(),
    };
    let pipeline_str = format!(
        "uridecodebin uri=\"{}\" ! videoconvert ! videoscale ! {} ! appsink name=sink sync=false",
        uri, caps
    );

    let pipeline = gst::parse::launch(&pipeline_str)
        .map_err(|e| PlayerError::Pipeline(e.to_string()))?
        .downcast::<gst::Pipeline>()
        .map_err(|_| PlayerError::Pipeline("not a pipeline".into()))?;

    let grabbed = grab_from_pipeline(&pipeline, time);
    let _ = pipeline.set_state(gst::State::Null);
    grabbed
}

fn grab_from_pipeline(pipeline: &gst::Pipeline, time: f64) -> Result<Thumb, PlayerError> {
    let sink = pipeline
        .by_name("sink")
        .and_then(|e| e.downcast::<gst_app::AppSink>().ok())
        .ok_or_else(|| PlayerError::Pipeline("appsink missing".into()))?;

    pipeline
        .set_state(gst::State::Paused)
        .map_err(|e| PlayerError::StateChange(e.to_string()))?;

    // Wait for preroll before seeking; an unprerolled pipeline drops the seek.
    let (result, state, _pending) = pipeline.state(Some(gst::ClockTime::from_seconds(5)));
    match (result, state) {
        (Ok(_), gst::State::Paused) => {}
        (result, state) => {
            return Err(PlayerError::StateChange(format!(
                "preroll failed: {:?} in {:?}",
                result, state
            )));
        }
    }

    let target = gst::ClockTime::from_nseconds((time.max(0.0) * 1_000_000_000.0) as u64);
    pipeline
        .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE, target)
        .map_err(|e| PlayerError::Snapshot(e.to_string()))?;

    let sample = sink
        .pull_preroll()
        .map_err(|e| PlayerError::Snapshot(e.to_string()))?;

    let sample_caps = sample
        .caps()
        .ok_or_else(|| PlayerError::Snapshot("sample without caps".into()))?;
    let video_info = gst_video::VideoInfo::from_caps(sample_caps)
        .map_err(|e| PlayerError::Snapshot(e.to_string()))?;

    let buffer = sample
        .buffer()
        .ok_or_else(|| PlayerError::Snapshot("sample without buffer".into()))?;
    let map = buffer
        .map_readable()
        .map_err(|e| PlayerError::Snapshot(e.to_string()))?;

    Ok(Thumb {
        width: video_info.width(),
        height: video_info.height(),
        rgba: map.as_slice().to_vec(),
        time,
    })
}
