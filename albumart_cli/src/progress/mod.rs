//! Progress reporting module for the CLI
//!
//! A channel-backed provider hands core progress updates to a renderer task
//! that owns the terminal.

pub mod provider;
pub mod renderer;

pub use provider::{ChannelProvider, create_progress_infrastructure};
pub use renderer::{ProgressRenderer, render_progress};

/// Format a duration in seconds as `1h 2m`, `3m 4s` or `5s`
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    match (hours, minutes, secs) {
        (0, 0, s) => format!("{s}s"),
        (0, m, 0) => format!("{m}m"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, 0, _) => format!("{h}h"),
        (h, m, _) => format!("{h}h {m}m"),
    }
}
