// Dynamic table renderer.
//
// Renders rows of JSON objects as an aligned text grid that fits a target
// width. Plain columns size to their content (optionally capped); wrapping
// columns share whatever width is left and word-wrap into several lines.
// Anything that still does not fit is cut with an ellipsis.

use crate::config::DEFAULT_TERMINAL_WIDTH;
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Printed instead of a table when there are no rows.
pub const NO_DATA: &str = "No data found.";

const ELLIPSIS: &str = "...";
const CONTINUATION_INDENT: &str = "  ";

/// Column layout plus rendering options. Build with [`Table::new`] and the
/// chained setters, then call [`Table::write_to`] or [`Table::render`].
#[derive(Debug, Clone)]
pub struct Table<'a> {
    columns: Vec<&'a str>,
    headers: Option<Vec<&'a str>>,
    wrap: HashSet<&'a str>,
    max_widths: HashMap<&'a str, usize>,
    total_width: Option<usize>,
    indent_wrapped: bool,
    max_row_lines: Option<usize>,
    preserve_blank_lines: bool,
}

impl<'a> Table<'a> {
    /// Table over the given row keys, in display order.
    pub fn new(columns: &[&'a str]) -> Self {
        Table {
            columns: columns.to_vec(),
            headers: None,
            wrap: HashSet::new(),
            max_widths: HashMap::new(),
            total_width: None,
            indent_wrapped: false,
            max_row_lines: None,
            preserve_blank_lines: true,
        }
    }

    /// Header labels; defaults to the column keys.
    pub fn headers(mut self, headers: &[&'a str]) -> Self {
        self.headers = Some(headers.to_vec());
        self
    }

    /// Columns whose text is word-wrapped instead of kept on one line.
    pub fn wrap(mut self, columns: &[&'a str]) -> Self {
        self.wrap.extend(columns.iter().copied());
        self
    }

    pub fn max_width(mut self, column: &'a str, width: usize) -> Self {
        self.max_widths.insert(column, width);
        self
    }

    /// Overall width budget; defaults to the terminal width.
    pub fn total_width(mut self, width: usize) -> Self {
        self.total_width = Some(width);
        self
    }

    pub fn indent_wrapped(mut self, indent: bool) -> Self {
        self.indent_wrapped = indent;
        self
    }

    pub fn max_row_lines(mut self, lines: usize) -> Self {
        self.max_row_lines = Some(lines.max(1));
        self
    }

    pub fn preserve_blank_lines(mut self, preserve: bool) -> Self {
        self.preserve_blank_lines = preserve;
        self
    }

    pub fn write_to<W: Write + ?Sized>(&self, rows: &[Value], out: &mut W) -> Result<()> {
        out.write_all(self.render(rows)?.as_bytes())?;
        Ok(())
    }

    /// Render to a string, one `\n`-terminated line per output line.
    pub fn render(&self, rows: &[Value]) -> Result<String> {
        let headers = self.resolved_headers()?;
        if rows.is_empty() {
            return Ok(format!("{}\n", NO_DATA));
        }

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|key| cell_text(row.get(*key)))
                    .collect()
            })
            .collect();
        let widths = self.column_widths(&headers, &cells);

        let mut lines = Vec::new();
        lines.push(join_cells(
            headers
                .iter()
                .zip(&widths)
                .map(|(h, w)| pad(&truncate(h, *w), *w)),
        ));
        lines.push(join_cells(widths.iter().map(|w| "-".repeat(*w))));
        for row in &cells {
            self.render_row(row, &widths, &mut lines);
        }

        let mut text = lines.join("\n");
        text.push('\n');
        Ok(text)
    }

    fn resolved_headers(&self) -> Result<Vec<&'a str>> {
        match &self.headers {
            Some(h) if h.len() != self.columns.len() => Err(Error::Config(format!(
                "table has {} columns but {} headers",
                self.columns.len(),
                h.len()
            ))),
            Some(h) => Ok(h.clone()),
            None => Ok(self.columns.clone()),
        }
    }

    fn is_wrapped(&self, column: &str) -> bool {
        self.wrap.contains(column)
    }

    fn column_widths(&self, headers: &[&str], cells: &[Vec<String>]) -> Vec<usize> {
        let budget = self.total_width.unwrap_or_else(terminal_width);
        let mut widths = vec![0; self.columns.len()];
        let mut fixed = self.columns.len().saturating_sub(1);
        let mut wrapped = 0;

        for (i, key) in self.columns.iter().enumerate() {
            if self.is_wrapped(key) {
                wrapped += 1;
                continue;
            }
            let content = cells
                .iter()
                .map(|row| single_line(&row[i]).width())
                .max()
                .unwrap_or(0);
            let mut w = headers[i].width().max(content);
            if let Some(cap) = self.max_widths.get(key) {
                w = w.min(*cap);
            }
            widths[i] = w;
            fixed += w;
        }

        if wrapped > 0 {
            let share = budget.saturating_sub(fixed) / wrapped;
            for (i, key) in self.columns.iter().enumerate() {
                if self.is_wrapped(key) {
                    widths[i] = share.max(headers[i].width()).max(1);
                }
            }
        }
        widths
    }

    fn render_row(&self, row: &[String], widths: &[usize], lines: &mut Vec<String>) {
        let mut columns: Vec<Vec<String>> = row
            .iter()
            .zip(&self.columns)
            .zip(widths)
            .map(|((text, key), &w)| {
                if self.is_wrapped(key) {
                    let wrapped = wrap_cell(
                        text,
                        w,
                        self.indent_wrapped && w > CONTINUATION_INDENT.len(),
                        self.preserve_blank_lines,
                    );
                    if wrapped.is_empty() {
                        vec![String::new()]
                    } else {
                        wrapped
                    }
                } else {
                    vec![single_line(text)]
                }
            })
            .collect();

        let tallest = columns.iter().map(Vec::len).max().unwrap_or(1);
        let height = match self.max_row_lines {
            Some(limit) => tallest.min(limit),
            None => tallest,
        };

        for (col, &w) in columns.iter_mut().zip(widths) {
            if col.len() > height {
                col.truncate(height);
                if let Some(last) = col.last_mut() {
                    *last = mark_continued(last, w);
                }
            }
            for line in col.iter_mut() {
                *line = truncate(line, w);
            }
        }

        for i in 0..height {
            lines.push(join_cells(columns.iter().zip(widths).map(|(col, &w)| {
                pad(col.get(i).map(String::as_str).unwrap_or(""), w)
            })));
        }
    }
}

/// Current terminal width in columns, or 120 when it cannot be detected.
pub fn terminal_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => cols as usize,
        _ => DEFAULT_TERMINAL_WIDTH,
    }
}

/// String form of a JSON cell. Missing and null render empty; arrays are
/// comma-joined.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| cell_text(Some(v)))
            .collect::<Vec<_>>()
            .join(","),
        Some(other) => other.to_string(),
    }
}

/// Cut `text` to exactly `width` columns, ending in `...` (or as many dots
/// as fit below 3). Text that already fits is returned unchanged.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width < ELLIPSIS.len() {
        return ".".repeat(width);
    }
    let (head, _) = split_at_width(text, width - ELLIPSIS.len(), false);
    let mut out = pad(head, width - ELLIPSIS.len());
    out.push_str(ELLIPSIS);
    out
}

/// Flag a line as the last visible one of a longer cell.
fn mark_continued(line: &str, width: usize) -> String {
    if line.width() + ELLIPSIS.len() <= width {
        format!("{}{}", line, ELLIPSIS)
    } else {
        let mut forced = line.to_string();
        forced.push_str(ELLIPSIS);
        truncate(&forced, width)
    }
}

/// Wrap one cell: explicit newlines are hard breaks, each segment is then
/// word-wrapped to `width`.
pub fn wrap_cell(text: &str, width: usize, indent: bool, preserve_blank_lines: bool) -> Vec<String> {
    let width = width.max(1);
    let narrow = if indent {
        width.saturating_sub(CONTINUATION_INDENT.len()).max(1)
    } else {
        width
    };
    let mut out: Vec<String> = Vec::new();

    for raw in text.split('\n') {
        let segment = raw.strip_suffix('\r').unwrap_or(raw);
        if segment.is_empty() {
            if preserve_blank_lines {
                out.push(String::new());
            }
            continue;
        }
        let first = if out.is_empty() { width } else { narrow };
        for line in wrap_segment(segment, first, narrow) {
            if indent && !out.is_empty() {
                out.push(format!("{}{}", CONTINUATION_INDENT, line));
            } else {
                out.push(line);
            }
        }
    }
    out
}

/// Greedy word wrap of a single line. Whitespace is kept as-is, words
/// break after hyphens, and words longer than a line are split.
pub fn wrap_segment(text: &str, first_width: usize, rest_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    let mut width = first_width.max(1);
    let mut pending: Vec<&str> = split_chunks(text);
    pending.reverse();

    while let Some(chunk) = pending.pop() {
        let w = chunk.width();
        if used + w <= width {
            current.push_str(chunk);
            used += w;
            continue;
        }
        if w > width {
            let (head, tail) = split_at_width(chunk, width - used, current.is_empty());
            current.push_str(head);
            if !tail.is_empty() {
                pending.push(tail);
            }
        } else {
            pending.push(chunk);
        }
        lines.push(std::mem::take(&mut current));
        used = 0;
        width = rest_width.max(1);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split into alternating whitespace runs and words, with hyphenated words
/// split after each inner hyphen.
fn split_chunks(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut before_prev: Option<char> = None;

    for (idx, c) in text.char_indices() {
        if let Some(p) = prev {
            let hyphen_break = p == '-'
                && c.is_alphanumeric()
                && before_prev.is_some_and(|b| b.is_alphanumeric());
            if p.is_whitespace() != c.is_whitespace() || hyphen_break {
                chunks.push(&text[start..idx]);
                start = idx;
            }
        }
        before_prev = prev;
        prev = Some(c);
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Longest prefix of at most `width` columns. With `force`, at least one
/// character is taken so wrapping always makes progress.
fn split_at_width(text: &str, width: usize, force: bool) -> (&str, &str) {
    let mut used = 0;
    for (idx, c) in text.char_indices() {
        let cw = c.width().unwrap_or(0);
        if used + cw > width {
            if idx == 0 && force {
                let end = c.len_utf8();
                return (&text[..end], &text[end..]);
            }
            return (&text[..idx], &text[idx..]);
        }
        used += cw;
    }
    (text, "")
}

fn single_line(text: &str) -> String {
    if text.contains(['\n', '\r']) {
        text.replace("\r\n", " ").replace(['\n', '\r'], " ")
    } else {
        text.to_string()
    }
}

fn pad(text: &str, width: usize) -> String {
    let w = text.width();
    if w >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - w))
    }
}

fn join_cells(cells: impl Iterator<Item = String>) -> String {
    let line = cells.collect::<Vec<_>>().join(" ");
    line.trim_end().to_string()
}
