// Output module: picks between the human table view and JSON / JSONL, and
// renders list and detail views of resource records. All writing goes
// through a `Printer` so handlers never choose a format themselves.

use crate::error::{Error, Result};
use crate::table::{cell_text, Table};
use crate::views::{Column, DetailStyle, DetailView, ListView};
use serde_json::{json, Value};
use std::io::Write;

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    /// Indented JSON document.
    Json,
    /// One compact JSON object per line.
    Jsonl,
}

impl OutputFormat {
    /// `--jsonl` wins over `--json`, so the `-jl` short cluster means JSONL.
    pub fn from_flags(json: bool, jsonl: bool) -> Self {
        if jsonl {
            OutputFormat::Jsonl
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }

    pub fn is_structured(self) -> bool {
        self != OutputFormat::Table
    }
}

const SECTION_RULE: usize = 30;

/// Writes results in the selected format.
pub struct Printer<'w> {
    format: OutputFormat,
    out: &'w mut dyn Write,
    width: Option<usize>,
}

impl<'w> Printer<'w> {
    pub fn new(format: OutputFormat, out: &'w mut dyn Write) -> Self {
        Printer {
            format,
            out,
            width: None,
        }
    }

    /// Fix the table width instead of asking the terminal.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Plain message line.
    pub fn line(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.out, "{}", text.as_ref())?;
        Ok(())
    }

    /// A value that has no table form: indented JSON, or compact lines in
    /// JSONL mode.
    pub fn json(&mut self, value: &Value) -> Result<()> {
        match self.format {
            OutputFormat::Jsonl => self.jsonl(value),
            _ => {
                let text = serde_json::to_string_pretty(value).map_err(encode_error)?;
                writeln!(self.out, "{}", text)?;
                Ok(())
            }
        }
    }

    /// Arrays become one line per element.
    fn jsonl(&mut self, value: &Value) -> Result<()> {
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for item in items {
            let text = serde_json::to_string(item).map_err(encode_error)?;
            writeln!(self.out, "{}", text)?;
        }
        Ok(())
    }

    /// Structured output of an arbitrary result; returns false in table
    /// mode so the caller can print its human form.
    pub fn structured(&mut self, value: &Value) -> Result<bool> {
        if self.format.is_structured() {
            self.json(value)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// List of records through a list view.
    pub fn list(&mut self, view: &ListView, records: &Value) -> Result<()> {
        let projected: Vec<Value> = match records {
            Value::Array(items) => items.iter().map(view.project).collect(),
            other => return self.json(other),
        };
        if self.format.is_structured() {
            let value = if view.structured_projection {
                Value::Array(projected)
            } else {
                records.clone()
            };
            return self.json(&value);
        }

        if projected.is_empty() {
            if let Some(empty) = view.empty {
                return self.line(empty);
            }
        }
        if let Some(title) = view.title {
            self.line(title)?;
            self.line("-".repeat(view.rule))?;
        }
        self.table(view.columns, &projected, view)?;
        if let Some(noun) = view.noun {
            if !projected.is_empty() {
                self.line("-".repeat(view.rule))?;
                self.line(format!("Total: {} {}(s)", projected.len(), noun))?;
            }
        }
        Ok(())
    }

    fn table(&mut self, columns: &[Column], rows: &[Value], view: &ListView) -> Result<()> {
        let keys: Vec<&str> = columns.iter().map(|c| c.key).collect();
        let headers: Vec<&str> = columns.iter().map(|c| c.header).collect();
        let wrapped: Vec<&str> = columns.iter().filter(|c| c.wrap).map(|c| c.key).collect();
        let mut table = Table::new(&keys)
            .headers(&headers)
            .wrap(&wrapped)
            .indent_wrapped(view.indent_wrapped)
            .preserve_blank_lines(view.preserve_blank_lines);
        for c in columns {
            if let Some(w) = c.max_width {
                table = table.max_width(c.key, w);
            }
        }
        if let Some(lines) = view.max_row_lines {
            table = table.max_row_lines(lines);
        }
        if let Some(w) = self.width {
            table = table.total_width(w);
        }
        table.write_to(rows, &mut *self.out)
    }

    /// One record through a detail view.
    pub fn detail(&mut self, view: &DetailView, record: &Value) -> Result<()> {
        if self.structured(record)? {
            return Ok(());
        }
        match view.style {
            DetailStyle::Lines => {
                for section in view.sections {
                    for (key, label) in section.fields {
                        self.line(format!("{}: {}", label, field_text(record, key)))?;
                    }
                }
            }
            DetailStyle::Sections => {
                for (i, section) in view.sections.iter().enumerate() {
                    if i > 0 {
                        self.line("")?;
                    }
                    if let Some(title) = section.title {
                        self.line(title)?;
                        self.line("-".repeat(SECTION_RULE))?;
                    }
                    let rows: Vec<Value> = section
                        .fields
                        .iter()
                        .map(|(key, label)| json!({"field": label, "value": field_text(record, key)}))
                        .collect();
                    let mut table = Table::new(&["field", "value"])
                        .headers(&["Field", "Value"])
                        .wrap(&["value"]);
                    if let Some(w) = self.width {
                        table = table.total_width(w);
                    }
                    table.write_to(&rows, &mut *self.out)?;
                }
            }
        }
        (view.extras)(record, &mut *self.out)?;
        Ok(())
    }
}

/// Field value for detail views; missing fields show as `N/A`.
pub fn field_text(record: &Value, key: &str) -> String {
    match record.get(key) {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Array(_) | Value::Object(_))) => v.to_string(),
        Some(v) => cell_text(Some(v)),
    }
}

fn encode_error(e: serde_json::Error) -> Error {
    Error::Decode(e.to_string())
}
