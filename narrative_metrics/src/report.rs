//! Tabular and JSON output.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, AnalysisResult};

/// A rectangular table of display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: None,
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a row. Short rows are padded and long rows truncated to the
    /// header width.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a pipe table, preceded by `# title` when titled.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        if let Some(title) = &self.title {
            out.push_str(&format!("# {title}\n\n"));
        }
        out.push_str(&markdown_row(&self.headers));
        out.push_str(&markdown_row(
            &self.headers.iter().map(|_| "---".to_string()).collect::<Vec<_>>(),
        ));
        for row in &self.rows {
            out.push_str(&markdown_row(row));
        }
        out
    }

    /// Render as RFC 4180 CSV with a header line.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in std::iter::once(&self.headers).chain(self.rows.iter()) {
            let line: Vec<String> = row.iter().map(|cell| csv_field(cell)).collect();
            out.push_str(&line.join(","));
            out.push_str("\r\n");
        }
        out
    }

    /// Write `<stem>.md` and `<stem>.csv` under `dir`.
    pub fn write(&self, dir: &Path, stem: &str) -> AnalysisResult<Vec<PathBuf>> {
        let markdown = dir.join(format!("{stem}.md"));
        let csv = dir.join(format!("{stem}.csv"));
        write_text(&markdown, &self.to_markdown())?;
        write_text(&csv, &self.to_csv())?;
        Ok(vec![markdown, csv])
    }
}

fn markdown_row(cells: &[String]) -> String {
    let escaped: Vec<String> = cells
        .iter()
        .map(|c| c.replace('|', "\\|").replace('\n', "<br>"))
        .collect();
    format!("| {} |\n", escaped.join(" | "))
}

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Write a file, creating parent directories.
pub fn write_text(path: &Path, contents: &str) -> AnalysisResult<()> {
    let write_err = |source| AnalysisError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}

/// Write a metrics document as pretty-printed JSON.
pub fn write_metrics<T: Serialize>(path: &Path, metrics: &T) -> AnalysisResult<()> {
    let text = serde_json::to_string_pretty(metrics)?;
    write_text(path, &text)
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Capitalise the first letter of each word and lowercase the rest.
/// Underscores become spaces and any non-letter starts a new word, so
/// `heroic_act` becomes `Heroic Act`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Percentage of `part` in `whole`, 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
