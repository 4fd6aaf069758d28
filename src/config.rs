//! Run-wide settings resolved once from the command line.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::thread;

use crate::batch::Schedule;
use crate::error::{EditError, Result};
use crate::operations::OperationType;
use crate::report::{ReportFormat, WriterSink};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Report destination; stdout when unset.
    pub output: Option<PathBuf>,
    pub format: ReportFormat,
    pub schedule: Schedule,
    pub verbosity: u8,
}

impl RunConfig {
    /// `jobs` of `None` or 1 runs files one after another, 0 uses one
    /// worker per available CPU.
    pub fn new(output: Option<PathBuf>, format: ReportFormat, jobs: Option<usize>, verbosity: u8) -> Self {
        let schedule = match jobs {
            None | Some(1) => Schedule::Sequential,
            Some(0) => Schedule::Parallel {
                jobs: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            },
            Some(jobs) => Schedule::Parallel { jobs },
        };
        Self {
            output,
            format,
            schedule,
            verbosity,
        }
    }

    /// The report destination, buffered when it is a file.
    pub fn open_output(&self) -> Result<Box<dyn Write>> {
        let out: Box<dyn Write> = match &self.output {
            Some(path) => {
                let file = File::create(path).map_err(|e| EditError::io(path, e))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout().lock()),
        };
        Ok(out)
    }

    pub fn open_sink(&self, operation: OperationType) -> Result<WriterSink<Box<dyn Write>>> {
        Ok(WriterSink::new(self.open_output()?, self.format, operation))
    }
}
