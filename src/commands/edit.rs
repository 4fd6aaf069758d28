use anyhow::{Context, Result};

use crate::batch::{self, exit_code};
use crate::cli::{Commands, RecordArgs, TimeArgs};
use crate::config::RunConfig;
use crate::engine::{parse_datetime, Engine};
use crate::error::EditError;
use crate::fits::FitsStore;
use crate::header::HeaderRecord;
use crate::operations::{
    ChainValue, DecSource, Operation, OperationDescriptor, RaSource, TimeShift, TimeSource,
};
use crate::report;
use crate::sexagesimal::{parse_components, DegreesObject, TimeObject};

/// Run an editing subcommand against files on disk and report the outcome.
/// Returns the process exit status.
pub fn run_edit(command: Commands, config: &RunConfig) -> Result<u8> {
    let descriptor = match build_descriptor(command) {
        Ok(descriptor) => descriptor,
        Err(e) => return Ok(reject(&e)),
    };

    let engine = Engine::new(FitsStore);
    let result = batch::run(&engine, &descriptor, config.schedule);
    let code = exit_code(&result);

    match result {
        Ok(report) => {
            let mut sink = config
                .open_sink(report.operation)
                .context("Failed to open report output")?;
            report::emit(&mut sink, &report).context("Failed to write report")?;
        }
        Err(e) => {
            reject(&e);
        }
    }
    Ok(code)
}

/// Report a rejected invocation once, on stderr, and give its exit status.
fn reject(e: &EditError) -> u8 {
    eprintln!("Error: {e}");
    2
}

/// Turn a parsed subcommand into an operation descriptor. Malformed
/// arguments are `IllegalInputData`.
pub fn build_descriptor(command: Commands) -> crate::error::Result<OperationDescriptor> {
    let (files, operation) = match command {
        Commands::Add {
            record,
            update,
            files,
        } => (
            files,
            Operation::AddToEnd {
                record: record_from(record)?,
                update_if_exists: update,
            },
        ),
        Commands::Insert {
            index,
            record,
            update,
            files,
        } => (
            files,
            Operation::AddAtIndex {
                record: record_from(record)?,
                index,
                update_if_exists: update,
            },
        ),
        Commands::Remove {
            keyword,
            skip_missing,
            files,
        } => (
            files,
            Operation::RemoveByKeyword {
                keyword,
                skip_if_missing: skip_missing,
            },
        ),
        Commands::RemoveAt {
            index,
            skip_missing,
            files,
        } => (
            files,
            Operation::RemoveAtIndex {
                index,
                skip_if_missing: skip_missing,
            },
        ),
        Commands::Rename {
            from,
            to,
            skip_missing,
            files,
        } => (
            files,
            Operation::ChangeKeyword {
                from,
                to,
                skip_if_missing: skip_missing,
            },
        ),
        Commands::Change {
            keyword,
            value,
            kind,
            comment,
            skip_missing,
            files,
        } => (
            files,
            Operation::ChangeValueByKeyword {
                keyword,
                value: kind.parse(&value)?,
                comment,
                skip_if_missing: skip_missing,
            },
        ),
        Commands::Chain {
            target,
            parts,
            files,
        } => (
            files,
            Operation::ChainRecords {
                keyword: target.keyword,
                parts: parts.iter().map(String::as_str).map(parse_part).collect(),
                comment: target.comment,
                update_if_exists: target.update,
                skip_if_missing: target.skip_missing,
            },
        ),
        Commands::ShiftTime {
            keyword,
            days,
            hours,
            minutes,
            seconds,
            nanoseconds,
            skip_missing,
            files,
        } => (
            files,
            Operation::ShiftTime {
                keyword,
                shift: TimeShift {
                    days,
                    hours,
                    minutes,
                    seconds,
                    nanoseconds,
                },
                skip_if_missing: skip_missing,
            },
        ),
        Commands::Jd {
            time,
            target,
            files,
        } => (
            files,
            Operation::ComputeJd {
                source: time_source(time)?,
                keyword: target.keyword,
                comment: target.comment,
                update_if_exists: target.update,
                skip_if_missing: target.skip_missing,
            },
        ),
        Commands::Hjd {
            time,
            ra_keyword,
            ra,
            dec_keyword,
            dec,
            target,
            files,
        } => {
            let ra = match ra {
                Some(text) => {
                    let (h, m, s) = parse_components(&text).map_err(illegal)?;
                    RaSource::Explicit(TimeObject::new(h, m, s))
                }
                None => RaSource::Keyword(ra_keyword),
            };
            let dec = match dec {
                Some(text) => {
                    let (d, m, s) = parse_components(&text).map_err(illegal)?;
                    DecSource::Explicit(DegreesObject::new(d, m, s))
                }
                None => DecSource::Keyword(dec_keyword),
            };
            (
                files,
                Operation::ComputeHjd {
                    source: time_source(time)?,
                    ra,
                    dec,
                    keyword: target.keyword,
                    comment: target.comment,
                    update_if_exists: target.update,
                    skip_if_missing: target.skip_missing,
                },
            )
        }
        Commands::List { .. } => {
            return Err(EditError::IllegalInputData(
                "list does not edit headers".to_string(),
            ))
        }
    };
    Ok(OperationDescriptor::new(files, operation))
}

fn illegal(e: EditError) -> EditError {
    match e {
        EditError::IllegalInputData(_) => e,
        other => EditError::IllegalInputData(other.to_string()),
    }
}

fn record_from(args: RecordArgs) -> crate::error::Result<HeaderRecord> {
    let value = args.value.map(|v| args.kind.parse(&v)).transpose()?;
    Ok(HeaderRecord::new(args.keyword, value, args.comment))
}

fn time_source(args: TimeArgs) -> crate::error::Result<TimeSource> {
    match args.time {
        Some(text) => parse_datetime(&text).map(TimeSource::Explicit).map_err(illegal),
        None => Ok(TimeSource::Keyword(args.time_keyword)),
    }
}

/// `@KEY` references a keyword, `@@text` is the literal `@text`.
fn parse_part(part: &str) -> ChainValue {
    if let Some(rest) = part.strip_prefix("@@") {
        ChainValue::Constant(format!("@{rest}"))
    } else if let Some(keyword) = part.strip_prefix('@') {
        ChainValue::KeywordRef(keyword.to_string())
    } else {
        ChainValue::Constant(part.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::fits::tests::sample_fits;
    use crate::fits::FitsFile;
    use crate::header::HeaderValue;
    use crate::report::ReportFormat;
    use crate::store::RecordContainer;
    use clap::Parser;
    use tempfile::TempDir;

    fn descriptor(args: &[&str]) -> crate::error::Result<OperationDescriptor> {
        let mut argv = vec!["fits-header-edit"];
        argv.extend_from_slice(args);
        build_descriptor(Cli::try_parse_from(argv).unwrap().command)
    }

    #[test]
    fn test_chain_parts() {
        assert_eq!(parse_part("@OBJECT"), ChainValue::KeywordRef("OBJECT".into()));
        assert_eq!(parse_part("@@home"), ChainValue::Constant("@home".into()));
        assert_eq!(parse_part(" - "), ChainValue::Constant(" - ".into()));
    }

    #[test]
    fn test_add_builds_typed_record() {
        let d = descriptor(&[
            "add", "-k", "EXPTIME", "--value", "300", "--kind", "integer", "-c", "seconds", "a.fits",
        ])
        .unwrap();
        match d.operation {
            Operation::AddToEnd { record, .. } => {
                assert_eq!(record.value(), Some(&HeaderValue::Integer(300)));
                assert_eq!(record.comment(), Some("seconds"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_value_is_illegal_input() {
        assert!(matches!(
            descriptor(&["change", "-k", "GAIN", "--value", "high", "--kind", "real", "a.fits"]),
            Err(EditError::IllegalInputData(_))
        ));
        assert!(matches!(
            descriptor(&["jd", "-k", "JD", "--time", "noon", "a.fits"]),
            Err(EditError::IllegalInputData(_))
        ));
    }

    #[test]
    fn test_hjd_explicit_coordinates() {
        let d = descriptor(&[
            "hjd", "-k", "HJD", "--ra", "05:35:17.3", "--dec", "-05:23:28", "a.fits",
        ])
        .unwrap();
        match d.operation {
            Operation::ComputeHjd { ra, dec, source, .. } => {
                assert_eq!(ra, RaSource::Explicit(TimeObject::new(5.0, 35.0, 17.3)));
                assert_eq!(dec, DecSource::Explicit(DegreesObject::new(-5.0, 23.0, 28.0)));
                assert_eq!(source, TimeSource::Keyword("DATE-OBS".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_run_edit_on_disk() {
        let dir = TempDir::new().unwrap();
        let a = sample_fits(dir.path(), "a.fits", &["OBJECT  = 'M 42    '"]);
        let b = sample_fits(dir.path(), "b.fits", &[]);
        let report_path = dir.path().join("report.csv");
        let config = RunConfig::new(Some(report_path.clone()), ReportFormat::Csv, None, 0);

        let cli = Cli::try_parse_from([
            "fits-header-edit",
            "rename",
            "--from",
            "OBJECT",
            "--to",
            "TARGET",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(run_edit(cli.command, &config).unwrap(), 1);

        let renamed = FitsFile::open(&a).unwrap();
        assert_eq!(
            renamed.record("TARGET").and_then(|r| r.value()),
            Some(&HeaderValue::Text("M 42".into()))
        );
        let csv = std::fs::read_to_string(&report_path).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.lines().nth(2).unwrap().contains("keyword_not_found"));
    }

    #[test]
    fn test_rejected_invocation_exits_2() {
        let config = RunConfig::default();
        let cli = Cli::try_parse_from([
            "fits-header-edit",
            "shift-time",
            "-k",
            "DATE-OBS",
            "a.fits",
        ])
        .unwrap();
        assert_eq!(run_edit(cli.command, &config).unwrap(), 2);
    }
}
