//! Terminal detection and capability utilities

use is_terminal::IsTerminal;
use std::env;
use std::io::{stderr, stdout};

/// Check if stdout is connected to an interactive terminal
pub fn is_interactive() -> bool {
    if !stdout().is_terminal() {
        return false;
    }

    // CI runners can allocate a TTY without anyone watching it
    if is_ci_environment() {
        return false;
    }

    env::var("DEBIAN_FRONTEND").unwrap_or_default() != "noninteractive"
}

/// Check if the terminal supports ANSI escape codes for colors and progress bars
pub fn supports_ansi() -> bool {
    if !is_interactive() {
        return false;
    }

    let term = env::var("TERM").unwrap_or_default();
    if term == "dumb" {
        return false;
    }

    #[cfg(windows)]
    {
        true
    }

    #[cfg(not(windows))]
    {
        !term.is_empty()
    }
}

/// Check if stderr is connected to a terminal (for progress display)
pub fn stderr_is_terminal() -> bool {
    stderr().is_terminal()
}

fn is_ci_environment() -> bool {
    let ci_vars = [
        "CI",
        "CONTINUOUS_INTEGRATION",
        "JENKINS_URL",
        "GITHUB_ACTIONS",
        "GITLAB_CI",
        "TRAVIS",
        "CIRCLECI",
        "BUILDKITE",
        "DRONE",
        "TEAMCITY_VERSION",
        "TF_BUILD",
    ];

    ci_vars.iter().any(|var| env::var(var).is_ok())
}

/// Determine if the progress bar should be shown by default
pub fn should_show_progress_by_default() -> bool {
    is_interactive() && stderr_is_terminal() && supports_ansi()
}

/// Decide whether colored output should be used
///
/// `NO_COLOR` always wins; otherwise color follows configuration and
/// terminal support.
pub fn should_use_color(color_enabled: bool) -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    color_enabled && supports_ansi()
}
