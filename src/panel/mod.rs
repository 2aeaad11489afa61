//! The transient "now playing" panel and its auto-hide timer.

mod controller;
mod view;

pub use controller::{PanelConfig, PanelController, PanelError, DEFAULT_HIDE_DELAY_MS};
pub use view::{
    LinkKind, NowPlaying, PanelLink, PanelState, PanelView, PlaybackSource, TONE_DURATION_MS,
    TONE_FREQUENCY_HZ,
};
