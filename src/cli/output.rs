//! Colored terminal output for the CLI
//!
//! `colored` honors NO_COLOR, CLICOLOR and CLICOLOR_FORCE.

use std::fmt::Display;

use colored::Colorize;

/// Red bold "error:" line on stderr
pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Yellow "warning:" line on stderr, used for failed tries after the first
pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "warning".yellow(), msg);
}

pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// `label: value` with a green label
pub fn action(label: &str, msg: &(impl Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

pub fn header(msg: &(impl Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Indented, uncolored
pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg);
}
