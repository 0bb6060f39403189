use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use exif_setter_rs::date_setter::DateSetter;
use exif_setter_rs::error::InputError;
use exif_setter_rs::exif::ExifProcessor;
use exif_setter_rs::file_ops::{
    find_image_files, progress_bar, ExportOptions, Exporter, TransferMode, EXPORT_DIR_NAME,
};
use exif_setter_rs::report::RunReport;

#[derive(Parser)]
#[command(name = "exif-setter-rs")]
#[command(version)]
#[command(about = "Set JPEG EXIF dates from folder/file names, or flatten a photo tree into an EXPORT folder")]
#[command(long_about = "Sets the EXIF capture date of JPEG files from dates found in their path, or copies
them into a single export folder with path-derived names.

Recognised path dates (at the start of a folder or file name, followed by a space or '_'):
- YYYY-MM-DD
- YYYY-MM     (day 1)
- YYYY        (January 1)

Files sharing a date get midnight, +1s, +2s, ... in folder/file name order.
Run without a subcommand for the interactive menu.")]
struct Cli {
    /// Increase verbosity (-v=INFO, -vv=DEBUG, -vvv=TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set EXIF dates from folder/file names
    SetDates {
        /// Directory to scan recursively
        directory: PathBuf,
    },
    /// Copy (or move) files into an export folder with flattened names
    Export {
        /// Directory to scan recursively
        directory: PathBuf,
        /// Export folder (default: <DIRECTORY>/EXPORT)
        #[arg(long)]
        export_dir: Option<PathBuf>,
        /// File operation mode
        #[arg(short, long, value_enum, default_value = "copy")]
        mode: TransferMode,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose)?;

    info!("Starting exif-setter-rs");

    let command = match cli.command {
        Some(command) => command,
        None => prompt_for_command()?,
    };

    match command {
        Commands::SetDates { directory } => set_dates(&directory),
        Commands::Export { directory, export_dir, mode } => export(&directory, export_dir, mode),
    }
}

fn setup_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    Ok(())
}

/// Interactive menu: pick a feature, then a directory.
fn prompt_for_command() -> Result<Commands> {
    println!("EXIF Date Setter & File Manager");
    println!("=================================");
    println!();
    println!("Select feature:");
    println!("1. Set EXIF dates from folder/file names");
    println!("2. Copy and rename files to EXPORT folder");

    let choice = prompt("Enter choice (1 or 2): ")?;
    if choice != "1" && choice != "2" {
        return Err(InputError::InvalidChoice(choice).into());
    }
    println!();

    let directory = PathBuf::from(prompt("Please enter the directory path: ")?);

    Ok(match choice.as_str() {
        "1" => Commands::SetDates { directory },
        _ => Commands::Export {
            directory,
            export_dir: None,
            mode: TransferMode::Copy,
        },
    })
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn validate_directory(directory: &Path) -> Result<PathBuf> {
    if directory.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(InputError::EmptyPath.into());
    }
    if !directory.is_dir() {
        return Err(InputError::MissingDirectory(directory.to_path_buf()).into());
    }
    directory
        .canonicalize()
        .with_context(|| format!("Failed to resolve directory: {}", directory.display()))
}

fn set_dates(directory: &Path) -> Result<()> {
    let directory = validate_directory(directory)?;
    println!("\nScanning directory: {}\n", directory.display());

    let files = find_image_files(&directory)?;
    println!("Found {} JPG files.\n", files.len());

    let pb = progress_bar(files.len())?;
    let mut setter = DateSetter::new(ExifProcessor::new());
    let report = setter.run(files, &pb);

    print_summary(&report);
    Ok(())
}

fn export(directory: &Path, export_dir: Option<PathBuf>, mode: TransferMode) -> Result<()> {
    let directory = validate_directory(directory)?;
    println!("\nScanning directory: {}\n", directory.display());

    let export_dir = export_dir.unwrap_or_else(|| directory.join(EXPORT_DIR_NAME));
    let mut exporter = Exporter::new(directory.clone(), ExportOptions { export_dir, mode });
    exporter.prepare()?;
    println!("Export folder: {}\n", exporter.export_dir().display());

    let files = find_image_files(&directory)?;
    println!("Found {} JPG files.\n", files.len());

    let pb = progress_bar(files.len())?;
    let report = exporter.run(files, &pb)?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    print!("{}", report.render());
    println!("\nProcessing complete!");
}
