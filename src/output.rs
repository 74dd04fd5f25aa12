// src/output.rs

//! Terminal rendering: styled text, tables and column layouts
//!
//! Styling is global and decided once at startup by [`init_styling`]. When
//! disabled (not a terminal, or `NO_COLOR` set) every helper returns plain text.

use crossterm::style::{Stylize, style};
use std::fmt::Display;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use unicode_width::UnicodeWidthStr;

static STYLING: AtomicBool = AtomicBool::new(false);

/// Width used when the terminal size cannot be determined
pub const FALLBACK_WIDTH: usize = 80;

/// Spaces between columns in [`render_columns`]
const COLUMN_GAP: usize = 2;

/// Enable styling when stdout is a terminal and `NO_COLOR` is unset
pub fn init_styling() {
    let enabled = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    set_styling(enabled);
}

pub fn set_styling(enabled: bool) {
    STYLING.store(enabled, Ordering::Relaxed);
}

fn styling() -> bool {
    STYLING.load(Ordering::Relaxed)
}

pub fn red<D: Display>(text: D) -> String {
    if styling() {
        style(text).red().to_string()
    } else {
        text.to_string()
    }
}

pub fn bold<D: Display>(text: D) -> String {
    if styling() {
        style(text).bold().to_string()
    } else {
        text.to_string()
    }
}

pub fn italic<D: Display>(text: D) -> String {
    if styling() {
        style(text).italic().to_string()
    } else {
        text.to_string()
    }
}

/// Current terminal width in columns
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| usize::from(cols))
        .ok()
        .filter(|&cols| cols > 0)
        .unwrap_or(FALLBACK_WIDTH)
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Render a box-drawn table with a heavy header
///
/// Cells may contain newlines; a row is as tall as its tallest cell. Rows
/// shorter than the header are padded with empty cells.
pub fn render_table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.as_ref().width()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(columns).enumerate() {
            let widest = cell.lines().map(UnicodeWidthStr::width).max().unwrap_or(0);
            widths[i] = widths[i].max(widest);
        }
    }

    let rule = |left: &str, fill: &str, join: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| fill.repeat(w + 2)).collect();
        format!("{}{}{}\n", left, segments.join(join), right)
    };

    let mut out = String::new();
    out.push_str(&rule("┏", "━", "┳", "┓"));
    let header_cells: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!(" {} ", pad(h.as_ref(), *w)))
        .collect();
    out.push_str(&format!("┃{}┃\n", header_cells.join("┃")));
    out.push_str(&rule("┡", "━", "╇", "┩"));

    for row in rows {
        let cell_lines: Vec<Vec<&str>> = (0..columns)
            .map(|i| row.get(i).map(|c| c.lines().collect()).unwrap_or_default())
            .collect();
        let height = cell_lines.iter().map(Vec::len).max().unwrap_or(0).max(1);
        for line in 0..height {
            let cells: Vec<String> = cell_lines
                .iter()
                .zip(&widths)
                .map(|(lines, w)| format!(" {} ", pad(lines.get(line).copied().unwrap_or(""), *w)))
                .collect();
            out.push_str(&format!("│{}│\n", cells.join("│")));
        }
    }

    out.push_str(&rule("└", "─", "┴", "┘"));
    out
}

/// Lay items out row by row in equal-width columns that fit `width`
pub fn render_columns<S: AsRef<str>>(items: &[S], width: usize) -> String {
    if items.is_empty() {
        return String::new();
    }

    let cell = items.iter().map(|i| i.as_ref().width()).max().unwrap_or(0);
    let per_row = ((width + COLUMN_GAP) / (cell + COLUMN_GAP)).max(1);

    let mut out = String::new();
    for chunk in items.chunks(per_row) {
        let line: Vec<String> = chunk.iter().map(|i| pad(i.as_ref(), cell)).collect();
        out.push_str(line.join(&" ".repeat(COLUMN_GAP)).trim_end());
        out.push('\n');
    }
    out
}
