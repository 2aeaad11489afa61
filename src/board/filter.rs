//! Derives the displayed view of the board from the country, actor and
//! SFW predicates. Pure and order preserving.

use super::models::{Actor, Country, Section, Sound};
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountryFilter {
    #[default]
    All,
    Only(Country),
}

impl FromStr for CountryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" | "" => Ok(CountryFilter::All),
            "US" => Ok(CountryFilter::Only(Country::US)),
            "UK" => Ok(CountryFilter::Only(Country::UK)),
            other => Err(format!("Unknown country filter {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilter {
    pub country: CountryFilter,
    pub actors: BTreeSet<Actor>,
    pub sfw_only: bool,
}

impl BoardFilter {
    pub fn is_noop(&self) -> bool {
        self.country == CountryFilter::All && self.actors.is_empty() && !self.sfw_only
    }

    pub fn matches(&self, sound: &Sound) -> bool {
        let meta = sound.meta.as_ref();

        let country_ok = match self.country {
            CountryFilter::All => true,
            CountryFilter::Only(wanted) => match meta.and_then(|m| m.country) {
                None => true,
                Some(country) => country == wanted,
            },
        };

        let sfw_ok = !(self.sfw_only && meta.map(|m| m.is_nsfw()).unwrap_or(false));

        let actors_ok = self.actors.is_empty()
            || meta
                .and_then(|m| m.actors.as_ref())
                .map(|actors| !actors.is_disjoint(&self.actors))
                .unwrap_or(false);

        country_ok && sfw_ok && actors_ok
    }
}

/// Sections are always kept, even when every sound is filtered out.
pub fn filter_sections(sections: &[Section], filter: &BoardFilter) -> Vec<Section> {
    sections
        .iter()
        .map(|section| Section {
            id: section.id.clone(),
            title: section.title.clone(),
            color: section.color,
            sounds: section
                .sounds
                .iter()
                .filter(|sound| filter.matches(sound))
                .cloned()
                .collect(),
        })
        .collect()
}
