use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::dashboard::display::{badge_text, StatusClass};

/// Table and cell creation helpers
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|label| Cell::new(*label).fg(TableColor::Cyan)),
        );
    table
}

fn status_color(class: StatusClass) -> Option<TableColor> {
    match class {
        StatusClass::Failed => Some(TableColor::Red),
        StatusClass::Succeeded => Some(TableColor::Green),
        StatusClass::Cancelled => Some(TableColor::DarkGrey),
        StatusClass::Other => None,
    }
}

/// Status badge with its icon, followed by the elapsed time on a second line.
pub fn status_cell(status: Option<&str>, elapsed: &str) -> Cell {
    let badge = match status.map(StatusClass::classify).and_then(StatusClass::icon) {
        Some(icon) => format!("{icon} {}", badge_text(status)),
        None => badge_text(status),
    };

    let text = if elapsed.is_empty() {
        badge
    } else {
        format!("{badge}\n{elapsed}")
    };

    match status.map(StatusClass::classify).and_then(status_color) {
        Some(color) => Cell::new(text).fg(color),
        None => Cell::new(text),
    }
}

pub fn starred_cell(starred: bool) -> Cell {
    if starred {
        Cell::new("★").fg(TableColor::DarkYellow)
    } else {
        Cell::new("☆").fg(TableColor::Grey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_cell_content() {
        assert_eq!(
            status_cell(Some("SUCCEEDED"), "after 2h").content(),
            "✓ succeeded\nafter 2h"
        );
        assert_eq!(status_cell(Some("FAILED"), "").content(), "✗ failed");
        assert_eq!(status_cell(Some("running"), "after <1m").content(), "running\nafter <1m");
        assert_eq!(status_cell(None, "").content(), "—");
    }

    #[test]
    fn test_starred_cell() {
        assert_eq!(starred_cell(true).content(), "★");
        assert_eq!(starred_cell(false).content(), "☆");
    }
}
