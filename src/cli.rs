use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::RunConfig;
use crate::header::ValueKind;
use crate::report::ReportFormat;

#[derive(Parser)]
#[command(name = "fits-header-edit")]
#[command(about = "Batch editing of FITS primary headers", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub output: OutputOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct OutputOptions {
    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Table, global = true)]
    pub format: ReportFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Edit files in parallel with this many workers (0 = one per CPU)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,
}

impl OutputOptions {
    pub fn to_run_config(&self, verbosity: u8) -> RunConfig {
        RunConfig::new(self.output.clone(), self.format, self.jobs, verbosity)
    }
}

/// Keyword, value and comment of a record to add.
#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    /// Keyword of the new record
    #[arg(short, long)]
    pub keyword: String,

    /// Value; omit for COMMENT/HISTORY records
    #[arg(long, allow_hyphen_values = true)]
    pub value: Option<String>,

    /// How to interpret the value
    #[arg(long, value_enum, default_value_t = ValueKind::Text)]
    pub kind: ValueKind,

    /// Comment (or text of a COMMENT/HISTORY record)
    #[arg(short, long)]
    pub comment: Option<String>,
}

/// Where the observation time comes from.
#[derive(Args, Debug, Clone)]
pub struct TimeArgs {
    /// Keyword holding the observation time
    #[arg(long, default_value = "DATE-OBS")]
    pub time_keyword: String,

    /// Explicit observation time (YYYY-MM-DDTHH:MM:SS[.f]), overrides --time-keyword
    #[arg(long)]
    pub time: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Keyword to write the result to
    #[arg(short, long)]
    pub keyword: String,

    /// Comment of the written record
    #[arg(short, long)]
    pub comment: Option<String>,

    /// Overwrite the keyword when it already exists
    #[arg(long)]
    pub update: bool,

    /// Skip files where a source keyword is missing instead of failing them
    #[arg(long)]
    pub skip_missing: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Append a record to the end of the header
    Add {
        #[command(flatten)]
        record: RecordArgs,

        /// Change the value when the keyword already exists
        #[arg(long)]
        update: bool,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Insert a record at a 0-based position
    Insert {
        /// Position of the new record
        #[arg(long)]
        index: usize,

        #[command(flatten)]
        record: RecordArgs,

        /// Change the value when the keyword already exists
        #[arg(long)]
        update: bool,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Remove the first record with a keyword
    Remove {
        #[arg(short, long)]
        keyword: String,

        /// Skip files without the keyword instead of failing them
        #[arg(long)]
        skip_missing: bool,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Remove the record at a 0-based position
    RemoveAt {
        #[arg(long)]
        index: usize,

        /// Skip files shorter than the index instead of failing them
        #[arg(long)]
        skip_missing: bool,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Rename a keyword, keeping value and comment
    Rename {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long)]
        skip_missing: bool,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Change the value of an existing keyword
    Change {
        #[arg(short, long)]
        keyword: String,

        #[arg(long, allow_hyphen_values = true)]
        value: String,

        #[arg(long, value_enum, default_value_t = ValueKind::Text)]
        kind: ValueKind,

        /// New comment; the current one is kept when omitted
        #[arg(short, long)]
        comment: Option<String>,

        #[arg(long)]
        skip_missing: bool,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Concatenate constants and keyword values into one text record
    Chain {
        #[command(flatten)]
        target: TargetArgs,

        /// Part of the value, in order. `@KEY` inserts the value of KEY,
        /// `@@` starts a literal `@`.
        #[arg(long = "part", required = true, allow_hyphen_values = true)]
        parts: Vec<String>,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Shift a date, datetime or time-of-day value
    ShiftTime {
        #[arg(short, long)]
        keyword: String,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        days: i64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        hours: i64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        minutes: i64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        seconds: i64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        nanoseconds: i64,

        #[arg(long)]
        skip_missing: bool,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Write the Julian Date of the observation
    Jd {
        #[command(flatten)]
        time: TimeArgs,

        #[command(flatten)]
        target: TargetArgs,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Write the Heliocentric Julian Date of the observation
    Hjd {
        #[command(flatten)]
        time: TimeArgs,

        /// Keyword holding the right ascension (degrees, or HH:MM:SS text)
        #[arg(long, default_value = "OBJCTRA")]
        ra_keyword: String,

        /// Explicit right ascension as HH:MM:SS, overrides --ra-keyword
        #[arg(long)]
        ra: Option<String>,

        /// Keyword holding the declination (degrees, or DD:MM:SS text)
        #[arg(long, default_value = "OBJCTDEC")]
        dec_keyword: String,

        /// Explicit declination as DD:MM:SS, overrides --dec-keyword
        #[arg(long, allow_hyphen_values = true)]
        dec: Option<String>,

        #[command(flatten)]
        target: TargetArgs,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Print the primary header of FITS files or directories
    List {
        /// Only show these keywords
        #[arg(short, long)]
        keyword: Vec<String>,

        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_shift_with_negative_amount() {
        let cli = Cli::try_parse_from([
            "fits-header-edit",
            "shift-time",
            "-k",
            "DATE-OBS",
            "--hours",
            "-3",
            "a.fits",
        ])
        .unwrap();
        match cli.command {
            Commands::ShiftTime { hours, files, .. } => {
                assert_eq!(hours, -3);
                assert_eq!(files, vec![PathBuf::from("a.fits")]);
            }
            _ => panic!("expected shift-time"),
        }
    }

    #[test]
    fn test_global_output_options() {
        let cli = Cli::try_parse_from([
            "fits-header-edit",
            "remove",
            "-k",
            "OBJECT",
            "a.fits",
            "--format",
            "json",
            "-j",
            "4",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.output.format, ReportFormat::Json);
        assert_eq!(cli.output.jobs, Some(4));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_files_are_required() {
        assert!(Cli::try_parse_from(["fits-header-edit", "remove", "-k", "OBJECT"]).is_err());
    }
}
