pub mod band_strip;
pub mod player_bridge;
pub mod progress_presenter;
pub mod thumbnailer;
