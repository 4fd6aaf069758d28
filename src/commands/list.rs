use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::config::RunConfig;
use crate::fits::FitsFile;
use crate::header::HeaderRecord;
use crate::report::ReportFormat;
use crate::store::RecordContainer;
use crate::utils::{escape_csv, is_fits_file, truncate_string};

#[derive(Serialize)]
struct ListedHeader {
    file: PathBuf,
    records: Vec<IndexedRecord>,
}

#[derive(Serialize)]
struct IndexedRecord {
    index: usize,
    #[serde(flatten)]
    record: HeaderRecord,
}

/// Print the primary headers of files and directories. Returns the exit
/// status: 1 when any file could not be read.
pub fn list_headers(paths: &[PathBuf], keywords: &[String], config: &RunConfig) -> Result<u8> {
    let mut fits_files = Vec::new();
    for path in paths {
        if path.is_dir() {
            find_fits_files(path, &mut fits_files)?;
        } else {
            fits_files.push(path.clone());
        }
    }

    let mut headers = Vec::new();
    let mut error_count = 0;
    for file in &fits_files {
        match FitsFile::open(file) {
            Ok(fits) => headers.push(ListedHeader {
                file: file.clone(),
                records: select(&fits, keywords),
            }),
            Err(e) => {
                warn!(file = %file.display(), "cannot read header: {e}");
                error_count += 1;
            }
        }
    }

    let mut out = config.open_output().context("Failed to open output")?;
    match config.format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &headers)?;
            writeln!(out)?;
        }
        ReportFormat::Csv => output_csv(&mut out, &headers)?,
        ReportFormat::Table => output_table(&mut out, &headers, fits_files.len(), error_count)?,
    }
    out.flush()?;

    Ok(if error_count > 0 { 1 } else { 0 })
}

fn select(fits: &FitsFile, keywords: &[String]) -> Vec<IndexedRecord> {
    fits.records()
        .iter()
        .enumerate()
        .filter(|(_, r)| keywords.is_empty() || keywords.iter().any(|k| k == r.keyword()))
        .map(|(index, record)| IndexedRecord {
            index,
            record: record.clone(),
        })
        .collect()
}

fn find_fits_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            find_fits_files(&path, files)?;
        } else if is_fits_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn value_text(record: &HeaderRecord) -> String {
    record.value().map(|v| v.to_text()).unwrap_or_default()
}

fn output_csv(out: &mut dyn Write, headers: &[ListedHeader]) -> Result<()> {
    writeln!(out, "file,index,keyword,value,comment")?;
    for header in headers {
        let file = header.file.display().to_string();
        for r in &header.records {
            writeln!(
                out,
                "{},{},{},{},{}",
                escape_csv(&file),
                r.index,
                escape_csv(r.record.keyword()),
                escape_csv(&value_text(&r.record)),
                escape_csv(r.record.comment().unwrap_or(""))
            )?;
        }
    }
    Ok(())
}

fn output_table(out: &mut dyn Write, headers: &[ListedHeader], found: usize, errors: usize) -> Result<()> {
    for (i, header) in headers.iter().enumerate() {
        writeln!(out, "File: {}\n", header.file.display())?;
        writeln!(out, "{:<6} {:<8} {:<30} {:<40}", "Index", "Keyword", "Value", "Comment")?;
        writeln!(out, "{:-<90}", "")?;
        for r in &header.records {
            writeln!(
                out,
                "{:<6} {:<8} {:<30} {:<40}",
                r.index,
                r.record.keyword(),
                truncate_string(&value_text(&r.record), 30),
                r.record.comment().unwrap_or("")
            )?;
        }
        if i + 1 < headers.len() {
            writeln!(out, "{:-<60}", "")?;
        }
    }

    writeln!(out, "\nSummary:")?;
    writeln!(out, "  Files: {found}")?;
    writeln!(out, "  Successfully read: {}", headers.len())?;
    if errors > 0 {
        writeln!(out, "  Errors: {errors}")?;
    }
    Ok(())
}
