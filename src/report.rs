//! Output sinks for batch results.

use std::io::{self, Write};

use serde::Serialize;

use crate::batch::{BatchReport, FileOutcome, Summary};
use crate::operations::OperationType;
use crate::utils::{escape_csv, truncate_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Receives per-file outcomes in input order, then one summary.
pub trait ReportSink {
    fn report(&mut self, entry: &FileOutcome) -> io::Result<()>;

    fn summary(&mut self, summary: &Summary) -> io::Result<()>;
}

/// Feed a whole batch report through a sink.
pub fn emit(sink: &mut dyn ReportSink, report: &BatchReport) -> io::Result<()> {
    for entry in &report.files {
        sink.report(entry)?;
    }
    sink.summary(&report.summary())
}

/// Writes reports as a table, JSON or CSV to any writer.
pub struct WriterSink<W: Write> {
    out: W,
    format: ReportFormat,
    operation: OperationType,
    rows: usize,
    // JSON needs the whole list before anything is written.
    pending: Vec<FileOutcome>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    operation: OperationType,
    files: &'a [FileOutcome],
    summary: &'a Summary,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W, format: ReportFormat, operation: OperationType) -> Self {
        Self {
            out,
            format,
            operation,
            rows: 0,
            pending: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn table_header(&mut self) -> io::Result<()> {
        writeln!(self.out, "Operation: {}\n", self.operation)?;
        writeln!(self.out, "{:<40} {:<10} {:<20} {:<50}", "File", "Status", "Kind", "Detail")?;
        writeln!(self.out, "{:-<120}", "")
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn report(&mut self, entry: &FileOutcome) -> io::Result<()> {
        let first = self.rows == 0;
        self.rows += 1;
        let file = entry.file.display().to_string();
        let kind = match &entry.outcome {
            crate::batch::Outcome::Failed { kind, .. } => kind.as_str(),
            _ => "",
        };

        match self.format {
            ReportFormat::Json => {
                self.pending.push(entry.clone());
                Ok(())
            }
            ReportFormat::Csv => {
                if first {
                    writeln!(self.out, "file,status,kind,detail")?;
                }
                writeln!(
                    self.out,
                    "{},{},{},{}",
                    escape_csv(&file),
                    entry.outcome.label(),
                    kind,
                    escape_csv(entry.outcome.detail())
                )
            }
            ReportFormat::Table => {
                if first {
                    self.table_header()?;
                }
                writeln!(
                    self.out,
                    "{:<40} {:<10} {:<20} {:<50}",
                    truncate_string(&file, 40),
                    entry.outcome.label(),
                    kind,
                    entry.outcome.detail()
                )
            }
        }
    }

    fn summary(&mut self, summary: &Summary) -> io::Result<()> {
        match self.format {
            ReportFormat::Json => {
                let report = JsonReport {
                    operation: self.operation,
                    files: &self.pending,
                    summary,
                };
                serde_json::to_writer_pretty(&mut self.out, &report)?;
                writeln!(self.out)?;
            }
            ReportFormat::Csv => {
                if self.rows == 0 {
                    writeln!(self.out, "file,status,kind,detail")?;
                }
            }
            ReportFormat::Table => {
                if self.rows == 0 {
                    self.table_header()?;
                }
                writeln!(self.out, "\nSummary:")?;
                writeln!(self.out, "  Files: {}", summary.total)?;
                writeln!(self.out, "  Succeeded: {}", summary.succeeded)?;
                if summary.skipped > 0 {
                    writeln!(self.out, "  Skipped: {}", summary.skipped)?;
                }
                if summary.failed > 0 {
                    writeln!(self.out, "  Failed: {}", summary.failed)?;
                }
            }
        }
        self.out.flush()
    }
}
