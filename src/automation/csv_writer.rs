//! CSV output of frame results.
//!
//! Results are collected for the whole run and written once, sorted by
//! recording time. Each row contains: name, time, temperature, profile,
//! power, fan and mode.

use anyhow::{anyhow, Context, Result};
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::ocr::FrameResult;

/// CSV header row.
pub const CSV_HEADER: &str = "name,time,temperature,profile,power,fan,mode";

/// Quotes a field if it holds a separator, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Splits one row, honouring quoted fields.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Formats one result as a CSV row.
pub fn format_row(result: &FrameResult) -> String {
    format!(
        "{},{},{},{},{},{},{}",
        escape_field(&result.name),
        result.time,
        result.temperature,
        escape_field(&result.profile),
        result.power,
        result.fan,
        escape_field(&result.mode),
    )
}

/// Writes all results, replacing any previous file.
///
/// Nothing is written when `results` is empty. Returns whether a file was written.
pub fn write_results(path: &Path, results: &[FrameResult]) -> Result<bool> {
    if results.is_empty() {
        return Ok(false);
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    for result in results {
        writeln!(writer, "{}", format_row(result)).context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV file")?;
    Ok(true)
}

fn parse_row(line: &str) -> Result<FrameResult> {
    let fields = split_row(line);
    if fields.len() != 7 {
        return Err(anyhow!("expected 7 fields, got {}", fields.len()));
    }

    Ok(FrameResult {
        name: fields[0].clone(),
        time: fields[1].trim().parse().context("bad time")?,
        temperature: fields[2].trim().parse().context("bad temperature")?,
        profile: fields[3].clone(),
        power: fields[4].trim().parse().context("bad power")?,
        fan: fields[5].trim().parse().context("bad fan")?,
        mode: fields[6].clone(),
    })
}

/// Reads a results file written by [`write_results`].
///
/// Malformed rows are skipped with a warning.
pub fn read_results(path: &Path) -> Result<Vec<FrameResult>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut results = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read CSV line")?;
        if line_no == 0 {
            if line.trim() != CSV_HEADER {
                return Err(anyhow!("unexpected CSV header: {}", line));
            }
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        match parse_row(&line) {
            Ok(result) => results.push(result),
            Err(e) => warn!("Skipping CSV line {}: {:#}", line_no + 1, e),
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn result(name: &str, time: u32) -> FrameResult {
        FrameResult {
            name: name.to_string(),
            temperature: 208,
            profile: "2".to_string(),
            power: 5,
            fan: 6,
            time,
            mode: "ROAST".to_string(),
        }
    }

    #[test]
    fn test_write_results() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");

        let written = write_results(&csv_path, &[result("frame_0", 0), result("frame_30", 330)]).unwrap();
        assert!(written);

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3); // header + 2 data rows
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[2], "frame_30,330,208,2,5,6,ROAST");
    }

    #[test]
    fn test_no_file_without_results() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");

        assert!(!write_results(&csv_path, &[]).unwrap());
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_write_replaces_previous_file() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");
        std::fs::write(&csv_path, "old,data\n").unwrap();

        write_results(&csv_path, &[result("frame_0", 0)]).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with(CSV_HEADER));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_read_back() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");
        let mut odd = result("frame_60", 90);
        odd.profile = "a,\"b\"".to_string();
        let results = vec![result("frame_0", 0), odd];

        write_results(&csv_path, &results).unwrap();

        assert_eq!(read_results(&csv_path).unwrap(), results);
    }

    #[test]
    fn test_read_skips_malformed_rows() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("results.csv");
        let content = format!(
            "{}\nframe_0,0,200,1,5,6,ROAST\nframe_30,xx,200,1,5,6,ROAST\nshort,row\n",
            CSV_HEADER
        );
        std::fs::write(&csv_path, content).unwrap();

        let results = read_results(&csv_path).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "frame_0");
    }

    #[test]
    fn test_read_rejects_foreign_file() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("other.csv");
        std::fs::write(&csv_path, "iteration,timestamp\n1,2\n").unwrap();

        assert!(read_results(&csv_path).is_err());
    }
}
