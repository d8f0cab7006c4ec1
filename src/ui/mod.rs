// Terminal output - the face of scplay
// Plain line-oriented printing, styled with crossterm

mod app;        // interactive command loop
pub mod commands; // parses what the user types

pub use app::{App, Flow};
pub use commands::Command;

use crate::catalog::Track;
use crossterm::style::Stylize;
use std::time::Duration;

const HALF_HOUR_MS: u64 = 30 * 60 * 1000;

/// One line per result, ready to print
pub fn render_results(tracks: &[Track]) -> Vec<String> {
    if tracks.is_empty() {
        return vec!["No results - try another search".to_string()];
    }

    let widest = tracks
        .iter()
        .map(|t| half_hours(t.duration))
        .max()
        .unwrap_or(0);

    tracks
        .iter()
        .enumerate()
        .map(|(rank, track)| render_line(rank, track, widest))
        .collect()
}

fn render_line(rank: usize, track: &Track, widest: u64) -> String {
    let rank_text = format!("{:>2}", rank);
    let rank_text = if track.downloadable {
        rank_text.bold().to_string()
    } else {
        rank_text
    };

    let info = if track.has_description() {
        format!(" {}", "[i]".yellow())
    } else {
        "    ".to_string()
    };

    let details = format!(
        "{} {} {}",
        format_duration(track.duration()),
        track.author(),
        track.created_at.format("%Y %b %d")
    );

    format!(
        "{} {} {} {} {}",
        rank_text,
        length_indicator(track.duration, widest),
        info,
        track.title,
        details.cyan()
    )
}

/// Number of started half hours
pub fn half_hours(duration_ms: u64) -> u64 {
    duration_ms.div_ceil(HALF_HOUR_MS)
}

/// One dash per started half hour, left aligned to the widest track
pub fn length_indicator(duration_ms: u64, widest: u64) -> String {
    let dashes = "-".repeat(half_hours(duration_ms) as usize);
    format!("{:<width$}", dashes, width = widest as usize)
}

/// `H:MM:SS`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
