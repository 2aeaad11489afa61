use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Accent color of a section, in the order new sections pick them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionColor {
    Cyan,
    Orange,
    Green,
    Purple,
}

impl SectionColor {
    pub const ALL: [SectionColor; 4] = [
        SectionColor::Cyan,
        SectionColor::Orange,
        SectionColor::Green,
        SectionColor::Purple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionColor::Cyan => "cyan",
            SectionColor::Orange => "orange",
            SectionColor::Green => "green",
            SectionColor::Purple => "purple",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cyan" => Some(SectionColor::Cyan),
            "orange" => Some(SectionColor::Orange),
            "green" => Some(SectionColor::Green),
            "purple" => Some(SectionColor::Purple),
            _ => None,
        }
    }

    /// First color not used by any existing section, else cycles by count.
    pub fn pick_for_new_section(sections: &[Section]) -> SectionColor {
        Self::ALL
            .iter()
            .copied()
            .find(|color| !sections.iter().any(|s| s.color == *color))
            .unwrap_or(Self::ALL[sections.len() % Self::ALL.len()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    US,
    UK,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Actor {
    Ellyn,
    Daisy,
    Nick,
    Vanessa,
    Cast,
}

impl Actor {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ellyn" => Some(Actor::Ellyn),
            "daisy" => Some(Actor::Daisy),
            "nick" => Some(Actor::Nick),
            "vanessa" => Some(Actor::Vanessa),
            "cast" => Some(Actor::Cast),
            _ => None,
        }
    }
}

/// Optional descriptive metadata attached to a sound.
///
/// Every field is optional. Partial updates use the same type: fields that
/// are `Some` replace the current value, `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_episode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actors: Option<BTreeSet<Actor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
}

impl SoundMeta {
    /// Shallow merge: present fields of `patch` overwrite ours.
    pub fn merge(&mut self, patch: SoundMeta) {
        if patch.country.is_some() {
            self.country = patch.country;
        }
        if patch.show_url.is_some() {
            self.show_url = patch.show_url;
        }
        if patch.episode_url.is_some() {
            self.episode_url = patch.episode_url;
        }
        if patch.season_episode.is_some() {
            self.season_episode = patch.season_episode;
        }
        if patch.actors.is_some() {
            self.actors = patch.actors;
        }
        if patch.nsfw.is_some() {
            self.nsfw = patch.nsfw;
        }
    }

    pub fn is_nsfw(&self) -> bool {
        self.nsfw == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sound {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SoundMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub color: SectionColor,
    pub sounds: Vec<Sound>,
}

impl Section {
    pub fn find_sound(&self, sound_id: &str) -> Option<&Sound> {
        self.sounds.iter().find(|s| s.id == sound_id)
    }
}

/// Finds a sound anywhere on the board, along with its section.
pub fn locate_sound<'a>(sections: &'a [Section], sound_id: &str) -> Option<(&'a Section, &'a Sound)> {
    sections
        .iter()
        .find_map(|section| section.find_sound(sound_id).map(|sound| (section, sound)))
}

/// Prefix of ids assigned to entities that only exist in memory because the
/// remote insert failed.
pub const LOCAL_ID_PREFIX: &str = "local-";

pub fn local_id(kind: &str) -> String {
    format!("{}{}-{}", LOCAL_ID_PREFIX, kind, uuid::Uuid::new_v4())
}

pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, color: SectionColor) -> Section {
        Section {
            id: id.to_string(),
            title: id.to_string(),
            color,
            sounds: vec![],
        }
    }

    #[test]
    fn picks_first_unused_color() {
        assert_eq!(SectionColor::pick_for_new_section(&[]), SectionColor::Cyan);

        let sections = vec![
            section("a", SectionColor::Cyan),
            section("b", SectionColor::Green),
        ];
        assert_eq!(
            SectionColor::pick_for_new_section(&sections),
            SectionColor::Orange
        );
    }

    #[test]
    fn cycles_colors_when_all_are_used() {
        let mut sections: Vec<Section> = SectionColor::ALL
            .iter()
            .enumerate()
            .map(|(i, c)| section(&i.to_string(), *c))
            .collect();
        assert_eq!(
            SectionColor::pick_for_new_section(&sections),
            SectionColor::Cyan
        );

        sections.push(section("5", SectionColor::Cyan));
        assert_eq!(
            SectionColor::pick_for_new_section(&sections),
            SectionColor::Orange
        );
    }

    #[test]
    fn merge_keeps_absent_fields() {
        let mut meta = SoundMeta {
            country: Some(Country::UK),
            season_episode: Some("S01 EP02".to_string()),
            nsfw: Some(true),
            ..Default::default()
        };

        meta.merge(SoundMeta {
            nsfw: Some(false),
            actors: Some([Actor::Daisy].into_iter().collect()),
            ..Default::default()
        });

        assert_eq!(meta.country, Some(Country::UK));
        assert_eq!(meta.season_episode.as_deref(), Some("S01 EP02"));
        assert_eq!(meta.nsfw, Some(false));
        assert!(meta.actors.unwrap().contains(&Actor::Daisy));
    }

    #[test]
    fn sound_json_uses_camel_case() {
        let sound = Sound {
            id: "x".to_string(),
            label: "Applause".to_string(),
            audio_url: Some("/sounds/applause.mp3".to_string()),
            meta: Some(SoundMeta {
                episode_url: Some("https://example.org/ep1".to_string()),
                country: Some(Country::US),
                ..Default::default()
            }),
        };

        let json = serde_json::to_value(&sound).unwrap();
        assert_eq!(json["audioUrl"], "/sounds/applause.mp3");
        assert_eq!(json["meta"]["episodeUrl"], "https://example.org/ep1");
        assert_eq!(json["meta"]["country"], "US");
        assert!(json["meta"].get("nsfw").is_none());
    }

    #[test]
    fn parses_actor_names_loosely() {
        assert_eq!(Actor::parse(" daisy "), Some(Actor::Daisy));
        assert_eq!(Actor::parse("CAST"), Some(Actor::Cast));
        assert_eq!(Actor::parse("nobody"), None);
    }
}
