//! Parsers for the console's tabular `--list` reports and free-text output.
//!
//! Two layouts are handled:
//! - fixed columns, sliced at the character offsets of the header words
//!   (scenario reports);
//! - columns separated by runs of two or more spaces, matched to header
//!   words by index (package reports).
//!
//! Both are pure functions over text.
use crate::error::PipelineError;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub const SCENARIO_REPORT: &str = "scenario";
pub const PACKAGE_REPORT: &str = "package";

const SCENARIO_COLUMNS: [&str; 2] = ["Id", "IsResult"];
const PACKAGE_COLUMNS: [&str; 2] = ["Name", "Version"];

/// One row of a `--list --packages` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRow {
    pub name: String,
    pub version: String,
}

/// One row of a `--list --scenarios` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScenarioRow {
    pub id: u64,
    pub is_result: bool,
}

/// Slice `rows` at the header-relative offsets of `columns`.
///
/// Each column spans from the start of its header word to the start of the
/// next header word (or end of line). Every header word bounds a column, so
/// unrequested columns never leak into a requested one. Short rows yield
/// empty fields. Returns one record per non-blank row, fields in the order of
/// `columns`.
pub fn slice_columns(
    header: &str,
    rows: &[&str],
    columns: &[&str],
) -> Result<Vec<Vec<String>>, String> {
    let words = header_words(header);
    let mut spans = Vec::with_capacity(columns.len());
    for column in columns {
        let idx = words
            .iter()
            .position(|(_, word)| word == column)
            .ok_or_else(|| (*column).to_string())?;
        let start = words[idx].0;
        let end = words.get(idx + 1).map(|(offset, _)| *offset);
        spans.push((start, end));
    }

    Ok(rows
        .iter()
        .filter(|row| !row.trim().is_empty())
        .map(|row| {
            let chars: Vec<char> = row.chars().collect();
            spans
                .iter()
                .map(|&(start, end)| {
                    let end = end.unwrap_or(chars.len()).min(chars.len());
                    let start = start.min(end);
                    chars[start..end].iter().collect::<String>().trim().to_string()
                })
                .collect()
        })
        .collect())
}

/// Header words with their character offsets, in line order.
fn header_words(header: &str) -> Vec<(usize, String)> {
    let mut words = Vec::new();
    let mut current: Option<(usize, String)> = None;
    for (offset, ch) in header.chars().enumerate() {
        if ch.is_whitespace() {
            if let Some(word) = current.take() {
                words.push(word);
            }
        } else {
            current
                .get_or_insert_with(|| (offset, String::new()))
                .1
                .push(ch);
        }
    }
    words.extend(current);
    words
}

fn has_words(line: &str, required: &[&str]) -> bool {
    let words = header_words(line);
    required
        .iter()
        .all(|req| words.iter().any(|(_, word)| word == req))
}

/// Parse a scenario report. Rows whose `Id` is not numeric are skipped and
/// `IsResult` is read case-insensitively as `yes`/`no`. Empty output is an
/// empty report; non-empty output without the header is malformed.
pub fn parse_scenario_report(text: &str) -> Result<Vec<ScenarioRow>, PipelineError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let lines: Vec<&str> = text.lines().collect();
    let header_idx = lines
        .iter()
        .position(|line| has_words(line, &SCENARIO_COLUMNS))
        .ok_or_else(|| malformed(SCENARIO_REPORT, missing_of(&lines, &SCENARIO_COLUMNS)))?;

    let records = slice_columns(lines[header_idx], &lines[header_idx + 1..], &SCENARIO_COLUMNS)
        .map_err(|column| malformed(SCENARIO_REPORT, column))?;

    let mut seen = std::collections::BTreeSet::new();
    let mut rows = Vec::new();
    for record in records {
        let Ok(id) = record[0].parse::<u64>() else {
            continue;
        };
        let is_result = match record[1].to_ascii_lowercase().as_str() {
            "yes" => true,
            "no" => false,
            other => {
                tracing::debug!(id, value = other, "skipping scenario row with unknown IsResult");
                continue;
            }
        };
        if !seen.insert(id) {
            tracing::warn!(id, "duplicate scenario id in report");
            continue;
        }
        rows.push(ScenarioRow { id, is_result });
    }
    Ok(rows)
}

/// Split a row on runs of two or more whitespace characters.
pub fn split_spaced(line: &str) -> Vec<String> {
    static SEP: OnceLock<Regex> = OnceLock::new();
    let sep = SEP.get_or_init(|| Regex::new(r"\s{2,}").expect("valid separator regex"));
    sep.split(line.trim())
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a package report. The header is the first line whose spaced fields
/// include `Name` and `Version`; a missing version field reads as empty.
pub fn parse_package_report(text: &str) -> Result<Vec<PackageRow>, PipelineError> {
    let lines: Vec<&str> = text.lines().collect();
    let (header_idx, name_col, version_col) = lines
        .iter()
        .enumerate()
        .find_map(|(idx, line)| {
            let fields = split_spaced(line);
            let name = fields.iter().position(|f| f == "Name")?;
            let version = fields.iter().position(|f| f == "Version")?;
            Some((idx, name, version))
        })
        .ok_or_else(|| malformed(PACKAGE_REPORT, missing_of(&lines, &PACKAGE_COLUMNS)))?;

    Ok(lines[header_idx + 1..]
        .iter()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let fields = split_spaced(line);
            let name = fields.get(name_col)?.clone();
            let version = fields.get(version_col).cloned().unwrap_or_default();
            Some(PackageRow { name, version })
        })
        .collect())
}

/// Record ids announced by `--update`, in order of appearance.
pub fn parse_update_ids(text: &str) -> Vec<u64> {
    static ID: OnceLock<Regex> = OnceLock::new();
    let re = ID.get_or_init(|| Regex::new(r"\bID: (\d+)").expect("valid id regex"));
    re.captures_iter(text)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

fn malformed(report: &'static str, column: String) -> PipelineError {
    PipelineError::MalformedReport { report, column }
}

// Names the first required column that no line carries, for the error message.
fn missing_of(lines: &[&str], required: &[&str]) -> String {
    required
        .iter()
        .find(|req| !lines.iter().any(|line| line.contains(*req)))
        .unwrap_or(&required[0])
        .to_string()
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
