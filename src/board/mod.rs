mod defaults;
pub mod filter;
mod labels;
mod models;
mod state;

pub use defaults::default_board;
pub use filter::{filter_sections, BoardFilter, CountryFilter};
pub use labels::label_from_filename;
pub use models::*;
pub use state::{
    BoardError, BoardState, LoadOutcome, NEW_SECTION_TITLE, NEW_SOUND_LABEL, NEW_SOUND_POSITION,
};
