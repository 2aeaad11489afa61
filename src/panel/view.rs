use crate::board::{Actor, Country, Sound};
use serde::Serialize;
use std::collections::BTreeSet;

pub const TONE_FREQUENCY_HZ: u32 = 440;
pub const TONE_DURATION_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelState {
    Hidden,
    /// Audio is playing; no hide timer.
    Playing,
    /// Playback finished; the hide timer is armed.
    Ended,
    /// The pointer is over the panel; the hide timer is cancelled.
    Hovered,
}

/// What the client should play for a sound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlaybackSource {
    Audio {
        url: String,
    },
    #[serde(rename_all = "camelCase")]
    Tone { frequency_hz: u32, duration_ms: u64 },
}

impl PlaybackSource {
    pub fn for_sound(sound: &Sound) -> Self {
        match &sound.audio_url {
            Some(url) if !url.is_empty() => PlaybackSource::Audio { url: url.clone() },
            _ => PlaybackSource::Tone {
                frequency_hz: TONE_FREQUENCY_HZ,
                duration_ms: TONE_DURATION_MS,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Episode,
    Show,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelLink {
    pub kind: LinkKind,
    pub url: String,
}

impl PanelLink {
    /// Episode link first, then the sound's show, then the board-wide show.
    pub fn for_sound(sound: &Sound, default_show_url: Option<&str>) -> Option<Self> {
        let meta = sound.meta.as_ref();
        if let Some(url) = meta.and_then(|m| m.episode_url.clone()) {
            return Some(PanelLink {
                kind: LinkKind::Episode,
                url,
            });
        }
        meta.and_then(|m| m.show_url.clone())
            .or_else(|| default_show_url.map(str::to_string))
            .map(|url| PanelLink {
                kind: LinkKind::Show,
                url,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    pub section_id: String,
    pub section_title: String,
    pub sound_id: String,
    pub sound_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_episode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub actors: BTreeSet<Actor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<PanelLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub state: PanelState,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now_playing: Option<NowPlaying>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SoundMeta;

    fn sound(meta: Option<SoundMeta>, audio_url: Option<&str>) -> Sound {
        Sound {
            id: "s".to_string(),
            label: "S".to_string(),
            audio_url: audio_url.map(str::to_string),
            meta,
        }
    }

    #[test]
    fn sounds_without_audio_play_a_tone() {
        assert_eq!(
            PlaybackSource::for_sound(&sound(None, None)),
            PlaybackSource::Tone {
                frequency_hz: 440,
                duration_ms: 500
            }
        );
        assert_eq!(
            PlaybackSource::for_sound(&sound(None, Some("/sounds/a.mp3"))),
            PlaybackSource::Audio {
                url: "/sounds/a.mp3".to_string()
            }
        );
    }

    #[test]
    fn tone_serializes_with_kind_tag() {
        let json = serde_json::to_value(PlaybackSource::for_sound(&sound(None, None))).unwrap();
        assert_eq!(json["kind"], "tone");
        assert_eq!(json["frequencyHz"], 440);
        assert_eq!(json["durationMs"], 500);
    }

    #[test]
    fn link_prefers_episode_then_show_then_default() {
        let both = SoundMeta {
            episode_url: Some("https://e".to_string()),
            show_url: Some("https://s".to_string()),
            ..Default::default()
        };
        let link = PanelLink::for_sound(&sound(Some(both), None), Some("https://d")).unwrap();
        assert_eq!(link.kind, LinkKind::Episode);
        assert_eq!(link.url, "https://e");

        let show_only = SoundMeta {
            show_url: Some("https://s".to_string()),
            ..Default::default()
        };
        let link = PanelLink::for_sound(&sound(Some(show_only), None), Some("https://d")).unwrap();
        assert_eq!((link.kind, link.url.as_str()), (LinkKind::Show, "https://s"));

        let link = PanelLink::for_sound(&sound(None, None), Some("https://d")).unwrap();
        assert_eq!((link.kind, link.url.as_str()), (LinkKind::Show, "https://d"));

        assert!(PanelLink::for_sound(&sound(None, None), None).is_none());
    }
}
