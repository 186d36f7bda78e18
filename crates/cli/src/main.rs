use anyhow::Context;
use clap::{Parser, Subcommand};
use oss_core::{BlobStore, CoreConfig, PutOutcome};
use oss_files::identifier;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "oss")]
#[command(about = "OSS content-addressed file store CLI")]
struct Cli {
    /// Storage directory (overrides UPLOAD_DIR)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file and print its stored filename
    Put {
        /// File to store
        path: PathBuf,
        /// Filename to take the extension from (defaults to the path's file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Print a stored file, or write it to --out
    Get {
        /// Stored filename
        name: String,
        /// Destination file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the content identifier of a file without storing it
    Hash {
        /// File to hash
        path: PathBuf,
    },
    /// List stored files
    List,
    /// Rehash every stored file and report mismatches
    Verify,
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("No command given. Run `oss --help` for usage.");
        return Ok(ExitCode::SUCCESS);
    };

    run(command, cli.root)
}

/// Runs one command. Only commands that touch stored files open the store.
fn run(command: Commands, root: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Hash { path } => {
            println!("{}", identifier(&read_input(&path)?));
        }
        Commands::Put { path, name } => {
            let store = open_store(root)?;
            let outcome = put_file(&store, &path, name.as_deref())?;
            if outcome.created {
                println!("{}", outcome.stored_filename);
            } else {
                println!("{} (already stored)", outcome.stored_filename);
            }
        }
        Commands::Get { name, out } => {
            let bytes = open_store(root)?.get(&name)?;
            match out {
                Some(out) => std::fs::write(&out, &bytes)
                    .with_context(|| format!("Failed to write {}", out.display()))?,
                None => std::io::stdout().write_all(&bytes)?,
            }
        }
        Commands::List => {
            let blobs = open_store(root)?.list()?;
            if blobs.is_empty() {
                println!("No files stored.");
            }
            for blob in blobs {
                println!(
                    "{}  {:>10}  {}",
                    blob.modified.to_rfc3339(),
                    blob.size_bytes,
                    blob.name
                );
            }
        }
        Commands::Verify => {
            let report = open_store(root)?.verify()?;
            for name in &report.corrupt {
                eprintln!("corrupt: {}", name);
            }
            println!(
                "Checked {} files, {} corrupt.",
                report.checked,
                report.corrupt.len()
            );
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Opens the store named by `--root`, falling back to the environment configuration.
fn open_store(root: Option<PathBuf>) -> anyhow::Result<BlobStore> {
    let cfg = CoreConfig::from_env()?;
    let cfg = match root {
        Some(root) => cfg.with_upload_dir(root)?,
        None => cfg,
    };
    Ok(cfg.open_store()?)
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Stores the file at `path`, labelled with `name` or the path's own file name.
fn put_file(store: &BlobStore, path: &Path, name: Option<&str>) -> anyhow::Result<PutOutcome> {
    let bytes = read_input(path)?;
    let label = match name {
        Some(name) => name.to_owned(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    Ok(store.put(&bytes, &label)?)
}
