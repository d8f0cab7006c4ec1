// scplay library - search a remote catalog and play tracks while they download
// The interesting part is playback: progressive staging + player process supervision

pub mod catalog;   // track records + search client
pub mod config;    // settings and credentials
pub mod error;     // one error type for the whole crate
pub mod playback;  // cache slot, downloader, readiness, supervisor, orchestration
pub mod ui;        // line-oriented terminal interface

// Export the stuff other modules actually use
pub use catalog::{DurationRange, SearchClient, Track};
pub use config::{Config, Credentials};
pub use error::{Error, Result};
pub use playback::{PlayOutcome, Player};
