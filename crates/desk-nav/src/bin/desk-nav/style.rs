//! Terminal colouring for CLI output; plain text when stdout is not a TTY.

use std::io::IsTerminal;

use owo_colors::{AnsiColors, OwoColorize};

fn should_color() -> bool {
    std::io::stdout().is_terminal()
}

fn paint(text: impl AsRef<str>, color: AnsiColors) -> String {
    let text = text.as_ref();
    if should_color() {
        text.color(color).to_string()
    } else {
        text.to_string()
    }
}

pub fn success(text: impl AsRef<str>) -> String {
    paint(text, AnsiColors::Green)
}

pub fn error(text: impl AsRef<str>) -> String {
    paint(text, AnsiColors::Red)
}

pub fn accent(text: impl AsRef<str>) -> String {
    paint(text, AnsiColors::Cyan)
}

pub fn dim(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    if should_color() {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}
