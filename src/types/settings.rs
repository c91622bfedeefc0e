use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// User-facing player settings, persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    pub volume: f64,
    pub muted: bool,
}

impl PlayerSettings {
    /// Save the settings to a JSON file at the given path.
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).unwrap();
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())
    }

    /// Load settings from a JSON file at the given path.
    pub fn load_from_file(path: &Path) -> std::io::Result<PlayerSettings> {
        let mut file = File::open(path)?;
        let mut json = String::new();
        file.read_to_string(&mut json)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        PlayerSettings {
            volume: 1.0,
            muted: false,
        }
    }
}
