//! Shared constants for end-to-end tests
//!
//! When the seeded board or the fixture media change, update only this file.

// ============================================================================
// Edit Mode
// ============================================================================

/// Password unlocking edit mode on test servers
pub const EDIT_PASSWORD: &str = "test-edit-pass";

// ============================================================================
// Default Board
// ============================================================================

/// Titles of the built-in sections, in board order
pub const DEFAULT_SECTION_TITLES: [&str; 3] = ["Function", "Special Effects", "Music Controls"];

/// Number of sounds in each built-in section
pub const DEFAULT_SECTION_SOUND_COUNTS: [usize; 3] = [4, 9, 4];

// ============================================================================
// Fixture Media
// ============================================================================

/// Audio files placed in the media directory of every test server
pub const FIXTURE_AUDIO_FILES: [&str; 2] = ["applause.mp3", "rim-shot.wav"];

/// A non-audio file that listings must skip
pub const FIXTURE_OTHER_FILE: &str = "notes.txt";

/// Bytes of every fixture audio file
pub const FIXTURE_AUDIO_BYTES: &[u8] = b"ID3-fake-audio";

// ============================================================================
// Timeouts
// ============================================================================

/// Per-request timeout of the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Time allowed for a test server to start answering
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness probes
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Hide delay of the now-playing panel on test servers
pub const TEST_HIDE_DELAY_MS: u64 = 200;
