use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resume position for one media source, persisted as JSON so a reopened
/// source picks up where it left off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSession {
    pub uri: String,
    pub position: f64,
}

/// Owns the resume file and the seek-save gate. A scrub drag disables
/// seek-save so the intermediate positions the drag sweeps through are
/// never persisted; only the settled position after release is.
#[derive(Debug)]
pub struct ResumeStore {
    path: PathBuf,
    seek_save: bool,
}

impl ResumeStore {
    pub fn new(path: PathBuf) -> Self {
        ResumeStore {
            path,
            seek_save: true,
        }
    }

    pub fn seek_save(&self) -> bool {
        self.seek_save
    }

    pub fn set_seek_save(&mut self, enabled: bool) {
        self.seek_save = enabled;
    }

    /// Persist the position unless seek-save is suspended.
    pub fn save_position(&self, uri: &str, position: f64) -> std::io::Result<()> {
        if !self.seek_save {
            debug!(uri, position, "seek-save suspended, skipping persist");
            return Ok(());
        }
        let session = ResumeSession {
            uri: uri.to_string(),
            position,
        };
        let json = serde_json::to_string_pretty(&session).expect("session serializes");
        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())
    }

    /// Saved position for this source, if one exists.
    pub fn load_position(&self, uri: &str) -> Option<f64> {
        let mut file = File::open(&self.path).ok()?;
        let mut json = String::new();
        file.read_to_string(&mut json).ok()?;
        let session: ResumeSession = serde_json::from_str(&json).ok()?;
        (session.uri == uri).then_some(session.position)
    }
}
