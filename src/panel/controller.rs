use super::view::{NowPlaying, PanelLink, PanelState, PanelView, PlaybackSource};
use crate::board::{locate_sound, Section};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::task::AbortHandle;
use tracing::debug;

pub const DEFAULT_HIDE_DELAY_MS: u64 = 2000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    #[error("Sound {0} not found")]
    SoundNotFound(String),
}

#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub hide_delay: Duration,
    pub default_show_url: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            hide_delay: Duration::from_millis(DEFAULT_HIDE_DELAY_MS),
            default_show_url: None,
        }
    }
}

struct PanelInner {
    state: PanelState,
    now_playing: Option<NowPlaying>,
    playback_ended: bool,
    /// Bumped whenever the timer is cancelled or re-armed; a firing timer
    /// only hides the panel if its generation is still current.
    generation: u64,
    hide_timer: Option<AbortHandle>,
}

impl PanelInner {
    fn cancel_timer(&mut self) {
        self.generation += 1;
        if let Some(timer) = self.hide_timer.take() {
            timer.abort();
        }
    }

    fn hide(&mut self) {
        self.state = PanelState::Hidden;
        self.now_playing = None;
        self.playback_ended = false;
    }
}

/// Now-playing panel of one visitor.
///
/// Holds at most one hide timer. Every transition cancels the current timer
/// before possibly arming a new one.
#[derive(Clone)]
pub struct PanelController {
    inner: Arc<Mutex<PanelInner>>,
    config: Arc<PanelConfig>,
}

impl PanelController {
    pub fn new(config: PanelConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PanelInner {
                state: PanelState::Hidden,
                now_playing: None,
                playback_ended: false,
                generation: 0,
                hide_timer: None,
            })),
            config: Arc::new(config),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PanelState {
        self.lock().state
    }

    pub fn view(&self) -> PanelView {
        let inner = self.lock();
        PanelView {
            state: inner.state,
            visible: inner.state != PanelState::Hidden,
            now_playing: inner.now_playing.clone(),
        }
    }

    /// Shows the panel for `sound_id` and tells the caller what to play.
    pub fn play(
        &self,
        sections: &[Section],
        sound_id: &str,
    ) -> Result<PlaybackSource, PanelError> {
        let (section, sound) = locate_sound(sections, sound_id)
            .ok_or_else(|| PanelError::SoundNotFound(sound_id.to_string()))?;
        let source = PlaybackSource::for_sound(sound);
        let meta = sound.meta.clone().unwrap_or_default();

        let mut inner = self.lock();
        inner.cancel_timer();
        inner.now_playing = Some(NowPlaying {
            section_id: section.id.clone(),
            section_title: section.title.clone(),
            sound_id: sound.id.clone(),
            sound_label: sound.label.clone(),
            season_episode: meta.season_episode.clone(),
            country: meta.country,
            actors: meta.actors.clone().unwrap_or_default(),
            link: PanelLink::for_sound(sound, self.config.default_show_url.as_deref()),
        });
        inner.state = PanelState::Playing;
        inner.playback_ended = false;

        // The tone is fire-and-forget, so it counts as ended right away.
        if matches!(source, PlaybackSource::Tone { .. }) {
            inner.playback_ended = true;
            inner.state = PanelState::Ended;
            self.arm_timer(&mut inner);
        }
        debug!("Panel playing {} ({:?})", sound_id, inner.state);
        Ok(source)
    }

    /// Returns false when `sound_id` is not the sound on the panel.
    pub fn playback_ended(&self, sound_id: &str) -> bool {
        let mut inner = self.lock();
        let is_active = inner
            .now_playing
            .as_ref()
            .map(|np| np.sound_id == sound_id)
            .unwrap_or(false);
        if !is_active {
            return false;
        }

        inner.playback_ended = true;
        if inner.state == PanelState::Playing {
            inner.state = PanelState::Ended;
            self.arm_timer(&mut inner);
        }
        true
    }

    pub fn hover_enter(&self) {
        let mut inner = self.lock();
        if inner.state == PanelState::Hidden {
            return;
        }
        inner.cancel_timer();
        inner.state = PanelState::Hovered;
    }

    pub fn click(&self) {
        self.hover_enter();
    }

    pub fn hover_leave(&self) {
        let mut inner = self.lock();
        if inner.state != PanelState::Hovered {
            return;
        }
        inner.cancel_timer();
        if inner.playback_ended {
            inner.state = PanelState::Ended;
            self.arm_timer(&mut inner);
        } else {
            inner.state = PanelState::Playing;
        }
    }

    pub fn close(&self) {
        let mut inner = self.lock();
        inner.cancel_timer();
        inner.hide();
    }

    fn arm_timer(&self, inner: &mut PanelInner) {
        inner.cancel_timer();
        let generation = inner.generation;
        let delay = self.config.hide_delay;
        let weak: Weak<Mutex<PanelInner>> = Arc::downgrade(&self.inner);

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.generation == generation && inner.state == PanelState::Ended {
                inner.hide_timer = None;
                inner.hide();
                debug!("Panel hidden after {:?}", delay);
            }
        });
        inner.hide_timer = Some(timer.abort_handle());
    }
}
