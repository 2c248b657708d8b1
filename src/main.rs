//! CLI for cite-rekey - Migrate LaTeX citation keys between BibTeX bibliographies.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cite_rekey::{
    load_bibliography, rewrite_directory, BatchOptions, FileReport, LookupError, Rekeyer,
    RunSummary,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Rewrite \cite keys from an old bibliography to the keys of a new one,
/// matching entries by title and year
#[derive(Parser)]
#[command(name = "cite-rekey")]
#[command(version)]
#[command(after_help = "\
Examples:
  cite-rekey file paper.tex --oldbib paper.bib --newbib complete.bib -o out.tex
  cite-rekey dir --path thesis/ --oldbib paper.bib --newbib complete.bib --dry
  cat paper.tex | cite-rekey file - --oldbib paper.bib --newbib complete.bib -o -")]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the final summary as JSON on stdout (diagnostics move to stderr)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a single LaTeX file into an output file
    File {
        /// Input LaTeX file (use '-' for stdin)
        input: PathBuf,

        /// Old (paper) bibliography file
        #[arg(long)]
        oldbib: PathBuf,

        /// New (complete) bibliography file
        #[arg(long)]
        newbib: PathBuf,

        /// Output file (use '-' for stdout)
        #[arg(short, long, default_value = "out.tex")]
        output: PathBuf,
    },

    /// Rewrite every LaTeX file under a directory in place
    Dir {
        /// LaTeX input folder, searched recursively
        #[arg(long)]
        path: PathBuf,

        /// Old (paper) bibliography file
        #[arg(long)]
        oldbib: PathBuf,

        /// New (complete) bibliography file
        #[arg(long)]
        newbib: PathBuf,

        /// Do not save output
        #[arg(long)]
        dry: bool,

        /// Extension of the files to rewrite
        #[arg(long, default_value = "tex")]
        ext: String,
    },
}

// ---------------------------------------------------------------------------
// AppError — semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10 — input file or directory not found / unreadable
    InputFile(String),
    /// Exit 11 — bibliography file not found / invalid
    BibFile(String),
    /// Exit 12 — bibliography entries cannot be matched unambiguously
    Lookup(String),
    /// Exit 13 — cannot write output
    OutputFile(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::InputFile(_) => 10,
            AppError::BibFile(_) => 11,
            AppError::Lookup(_) => 12,
            AppError::OutputFile(_) => 13,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InputFile(msg) => {
                write!(f, "{}\n  hint: verify the path is correct", msg)
            }
            AppError::BibFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: the file must be a self-contained BibTeX database: every @string abbreviation it uses (e.g. journal names) must be defined in the same file, and entry keys must be unique",
                    msg
                )
            }
            AppError::Lookup(msg) => {
                write!(
                    f,
                    "{}\n  hint: every entry needs a title, and no two entries of one bibliography may share title and year",
                    msg
                )
            }
            AppError::OutputFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the output directory exists and is writable",
                    msg
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::File {
            input,
            oldbib,
            newbib,
            output,
        } => {
            let rekeyer = load_rekeyer(&oldbib, &newbib)?;
            file_command(&rekeyer, &input, &output, cli.json)?;
        }
        Commands::Dir {
            path,
            oldbib,
            newbib,
            dry,
            ext,
        } => {
            if !path.is_dir() {
                return Err(AppError::InputFile(format!(
                    "'{}' is not a directory",
                    path.display()
                )));
            }
            let rekeyer = load_rekeyer(&oldbib, &newbib)?;
            let options = BatchOptions {
                extension: ext,
                dry_run: dry,
            };
            dir_command(&rekeyer, &path, &options, cli.json)?;
        }
    }

    Ok(())
}

/// Loads both bibliographies and builds their lookup tables.
fn load_rekeyer(oldbib: &Path, newbib: &Path) -> Result<Rekeyer, AppError> {
    let old_entries = load_bibliography(oldbib)
        .map_err(|e| AppError::BibFile(format!("'{}': {}", oldbib.display(), e)))?;
    let new_entries = load_bibliography(newbib)
        .map_err(|e| AppError::BibFile(format!("'{}': {}", newbib.display(), e)))?;

    Rekeyer::new(&old_entries, &new_entries).map_err(map_lookup_error)
}

fn map_lookup_error(e: LookupError) -> AppError {
    AppError::Lookup(e.to_string())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Rewrite one LaTeX file into `output`.
fn file_command(
    rekeyer: &Rekeyer,
    input: &Path,
    output: &Path,
    json: bool,
) -> Result<(), AppError> {
    let to_stdout = output == Path::new("-");

    // 1. Read the LaTeX file (support '-' for stdin)
    let text = if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AppError::InputFile(format!("failed to read from stdin: {}", e)))?;
        buf
    } else {
        fs::read_to_string(input)
            .map_err(|e| AppError::InputFile(format!("'{}': {}", input.display(), e)))?
    };

    // 2. Rewrite, keeping stdout clean when the document or JSON goes there
    let rewrite = if to_stdout || json {
        rekeyer.rewrite_reporting(&text, &mut io::stderr(), &mut io::stderr())
    } else {
        rekeyer.rewrite_reporting(&text, &mut io::stdout(), &mut io::stderr())
    }
    .map_err(|e| AppError::OutputFile(format!("diagnostics: {}", e)))?;

    // 3. Write to file or stdout
    if to_stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{}", rewrite.text)
            .map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))?;
    } else {
        fs::write(output, &rewrite.text)
            .map_err(|e| AppError::OutputFile(format!("'{}': {}", output.display(), e)))?;
    }

    // 4. Report
    let mut summary = RunSummary::default();
    summary.record(FileReport {
        path: input.to_path_buf(),
        replacements: rewrite.replacements(),
        failed_keys: rewrite.failed_keys(),
        written: true,
    });
    let line = if json {
        summary
            .to_json()
            .map_err(|e| AppError::OutputFile(format!("summary: {}", e)))?
    } else {
        format!("Finished with {} errors", summary.failed_keys.len())
    };
    if to_stdout {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }

    Ok(())
}

/// Rewrite every matching file under `root` in place.
fn dir_command(
    rekeyer: &Rekeyer,
    root: &Path,
    options: &BatchOptions,
    json: bool,
) -> Result<(), AppError> {
    let summary = if json {
        rewrite_directory(rekeyer, root, options, &mut io::stderr(), &mut io::stderr())
    } else {
        rewrite_directory(rekeyer, root, options, &mut io::stdout(), &mut io::stderr())
    }
    .map_err(|e| AppError::OutputFile(format!("diagnostics: {}", e)))?;

    if json {
        print_json(&summary)?;
    } else {
        println!("Failed keys: {}", summary.failed_keys_line());
    }

    Ok(())
}

fn print_json(summary: &RunSummary) -> Result<(), AppError> {
    let json = summary
        .to_json()
        .map_err(|e| AppError::OutputFile(format!("summary: {}", e)))?;
    println!("{}", json);
    Ok(())
}
