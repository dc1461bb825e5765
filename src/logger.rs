//! Colored terminal output for the `boc` binary.
//!
//! The build pipeline reports progress one line at a time, each prefixed
//! with the `[module]` that produced it, and surfaces the catalog's warning
//! list without interrupting the build. Output goes straight to stdout and
//! stderr; a process-wide flag gates debug lines.

use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enables debug output process-wide. Set once from the CLI's `--verbose`
/// flag before any work starts.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::SeqCst);
}

/// Reports whether debug output is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Prints a progress line with a colored `[module]` prefix.
pub fn log(module: &str, message: &str) {
    println!("{} {}", format!("[{}]", module).green().bold(), message);
}

/// Prints a warning line. Warnings go to stderr so that piping a command's
/// stdout (`boc routes`, say) stays clean.
pub fn warn(module: &str, message: &str) {
    eprintln!(
        "{} {} {}",
        format!("[{}]", module).yellow().bold(),
        "warning:".yellow(),
        message
    );
}

/// Logs a progress line: `log!("build"; "rendered {} posts", count)`.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {
        $crate::logger::log($module, &format!($($arg)*))
    };
}

/// Logs a warning line.
#[macro_export]
macro_rules! warn {
    ($module:expr; $($arg:tt)*) => {
        $crate::logger::warn($module, &format!($($arg)*))
    };
}

/// Logs a debug line, shown only when `--verbose` is set.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*));
        }
    };
}
