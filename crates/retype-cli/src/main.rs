//! retype CLI - review and change inferred column types

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use retype::prelude::*;
use retype::{map_physical_type, parse_utc_offset};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retype")]
#[command(author, version, about = "Infer, review and change column types of a table")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Display locale (en-US, en-GB, de-DE, fr-FR)
    #[arg(long, global = true, default_value = "en-US")]
    locale: String,

    /// Offset dates are shown in, e.g. +02:00
    #[arg(long, global = true, default_value = "+00:00")]
    utc_offset: String,

    /// Field delimiter of the input (default: comma)
    #[arg(short, long, global = true, default_value = ",")]
    delimiter: char,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and print the grid with inferred types
    Show {
        /// Input CSV file
        input: PathBuf,
    },

    /// Upload a file, change column types and print the reconverted grid
    Apply {
        /// Input CSV file
        input: PathBuf,

        /// Column type change, e.g. Score=date (repeatable)
        #[arg(short, long = "set", value_name = "FIELD=TYPE", required = true)]
        set: Vec<String>,
    },

    /// Print the logical type for physical type names
    Classify {
        /// Physical type names, e.g. int64 or datetime64[ns, UTC]
        #[arg(required = true)]
        dtypes: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Show { input } => {
            let (_, session) = upload(&cli, input)?;
            print_grid(&session)
        }
        Commands::Apply { input, set } => apply(&cli, input, set),
        Commands::Classify { dtypes } => {
            for dtype in dtypes {
                println!("{}\t{}", dtype, map_physical_type(dtype));
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn format_options(cli: &Cli) -> Result<FormatOptions> {
    let locale = DisplayLocale::from_tag(&cli.locale)?;
    let utc_offset = parse_utc_offset(&cli.utc_offset)
        .with_context(|| format!("Invalid UTC offset '{}'", cli.utc_offset))?;
    Ok(FormatOptions {
        locale,
        utc_offset,
        ..FormatOptions::default()
    })
}

fn upload(cli: &Cli, input: &Path) -> Result<(LocalBackend, Session)> {
    if !cli.delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character");
    }
    let read_options = CsvReadOptions::default().with_delimiter(cli.delimiter as u8);
    let mut backend = LocalBackend::new().with_read_options(read_options);
    let mut session = Session::new(&format_options(cli)?);

    let file = UploadFile::from_path(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))?;
    session.select_file(file);
    session.upload_with(&mut backend)?;
    check_notice(&session)?;
    Ok((backend, session))
}

fn apply(cli: &Cli, input: &Path, set: &[String]) -> Result<()> {
    let (mut backend, mut session) = upload(cli, input)?;

    for edit in set {
        let (field, name) = edit
            .split_once('=')
            .with_context(|| format!("Expected FIELD=TYPE, got '{}'", edit))?;
        let logical_type: LogicalType = name.parse()?;
        tracing::debug!(field, logical_type = logical_type.label(), "column type edit");
        session
            .on_column_type_change(field, logical_type)
            .with_context(|| format!("Cannot change column '{}'", field))?;
    }

    if !session.has_pending_changes() {
        tracing::info!("no column types changed, nothing to apply");
        eprintln!("No column types changed");
        return print_grid(&session);
    }

    let changes = serde_json::to_string_pretty(&session.change_set())?;
    println!("{}", changes);
    session.apply_with(&mut backend)?;
    check_notice(&session)?;
    print_grid(&session)
}

fn check_notice(session: &Session) -> Result<()> {
    match session.notice() {
        Some(Notice::Error(message)) => {
            tracing::warn!(%message, "request failed");
            bail!("Error: {}", message)
        }
        Some(Notice::Diagnostic(body)) => {
            tracing::warn!(bytes = body.len(), "backend returned an unstructured error");
            bail!("Backend failure:\n{}", body)
        }
        _ => Ok(()),
    }
}

fn print_grid(session: &Session) -> Result<()> {
    let columns = session.columns();
    let headers: Vec<String> = columns
        .iter()
        .map(|c| format!("{} [{}]", c.display_name, c.logical_type.label()))
        .collect();
    let cells: Vec<Vec<String>> = (0..session.rows().len())
        .map(|row| {
            columns
                .iter()
                .map(|c| session.render_cell(row, &c.field).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain([header.chars().count()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = io::stdout().lock();
    write_row(&mut out, &headers, &widths)?;
    for row in &cells {
        write_row(&mut out, row, &widths)?;
    }
    out.flush().context("Failed to write to stdout")?;
    Ok(())
}

fn write_row(out: &mut impl Write, cells: &[String], widths: &[usize]) -> Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end()).context("Failed to write to stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_after(file: UploadFile) -> Session {
        let mut backend = LocalBackend::new();
        let mut session = Session::default();
        session.select_file(file);
        session.upload_with(&mut backend).unwrap();
        session
    }

    #[test]
    fn test_check_notice_fails_on_backend_error() {
        let session = session_after(UploadFile::new("empty.csv", ""));
        let err = check_notice(&session).unwrap_err();
        assert_eq!(err.to_string(), "Error: No file uploaded");
    }

    #[test]
    fn test_check_notice_passes_after_upload() {
        let session = session_after(UploadFile::new("scores.csv", "Score\n75\n"));
        assert!(check_notice(&session).is_ok());
    }
}
