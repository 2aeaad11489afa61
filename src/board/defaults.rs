//! Built-in board used to seed an empty store, and as the whole-board
//! fallback when the store cannot be reached.

use super::models::{Section, SectionColor, Sound};

struct DefaultSection {
    id: &'static str,
    title: &'static str,
    color: SectionColor,
    sounds: &'static [(&'static str, &'static str)],
}

const DEFAULT_SECTIONS: &[DefaultSection] = &[
    DefaultSection {
        id: "function",
        title: "Function",
        color: SectionColor::Cyan,
        sounds: &[
            ("keynote", "Keynote"),
            ("social-shake", "Social Shake"),
            ("good-brother", "Good Brother"),
            ("bayonet", "Bayonet"),
        ],
    },
    DefaultSection {
        id: "special-effects",
        title: "Special Effects",
        color: SectionColor::Orange,
        sounds: &[
            ("applause", "Applause"),
            ("laughter", "Laughter"),
            ("kiss", "Kiss"),
            ("thanks", "Thanks"),
            ("welcome", "Welcome"),
            ("hit-him", "Hit Him"),
            ("ouch", "Ouch"),
            ("too-hard", "Too Hard"),
            ("follow", "Follow"),
        ],
    },
    DefaultSection {
        id: "music-controls",
        title: "Music Controls",
        color: SectionColor::Green,
        sounds: &[
            ("play-pause", "Play/Pause"),
            ("next-track", "Next Track"),
            ("previous", "Previous"),
            ("volume-up", "Volume Up"),
        ],
    },
];

pub fn default_board() -> Vec<Section> {
    DEFAULT_SECTIONS
        .iter()
        .map(|section| Section {
            id: section.id.to_string(),
            title: section.title.to_string(),
            color: section.color,
            sounds: section
                .sounds
                .iter()
                .map(|(id, label)| Sound {
                    id: id.to_string(),
                    label: label.to_string(),
                    audio_url: None,
                    meta: None,
                })
                .collect(),
        })
        .collect()
}
