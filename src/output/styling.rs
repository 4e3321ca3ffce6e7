use std::fmt::Display;

use console::{style, StyledObject};

/// Terminal styling for the dashboard text outside the tables.
pub fn bright_yellow(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

/// Section titles.
pub fn bright(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn magenta_bold(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}
