use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sicdb::{Cracker, Database, Dictionary, Storage};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

mod auth;

#[derive(Debug, Parser)]
#[command(name = "sicdb")]
#[command(
    version,
    about = "Open, re-key and recover passwords of SafeInCloud databases."
)]
struct Cli {
    /// Path to the SafeInCloud database file
    #[arg(long, global = true, value_name = "PATH", env = "SICDB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Checks the password without decrypting the data
    Verify,

    /// Decrypts the database and writes the plaintext
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Creates or replaces the database from a plaintext file
    #[command(arg_required_else_help = true)]
    Import { input: PathBuf },

    /// Changes the database password
    Changepw,

    /// Searches a dictionary for the database password
    #[command(arg_required_else_help = true)]
    Crack {
        /// Candidate passwords, one per line
        #[arg(short, long, value_name = "FILE")]
        dictionary: PathBuf,

        /// Worker threads (default: one per CPU)
        #[arg(short, long)]
        threads: Option<usize>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_database(path: Option<PathBuf>) -> Result<Database> {
    match path {
        Some(p) => Ok(Database::new(p)),
        None => bail!("no database given; use --db or SICDB_PATH"),
    }
}

fn existing_database(path: Option<PathBuf>) -> Result<Database> {
    let db = resolve_database(path)?;
    if !db.exists() {
        bail!("Database file {} doesn't exist", db.path().display());
    }
    Ok(db)
}

fn crack(db: &Database, dictionary: PathBuf, threads: Option<usize>) -> Result<()> {
    if !dictionary.exists() {
        bail!("Dictionary file {} doesn't exist", dictionary.display());
    }

    let header = db.read_header()?;
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let mut cracker = Cracker::new(header, *db.config()).cancel_flag(cancel);
    if let Some(threads) = threads {
        cracker = cracker.threads(threads);
    }

    let words = Dictionary::open(&dictionary)?.map_while(|line| {
        line.inspect_err(|e| warn!(error = %e, "dictionary read failed, stopping scan"))
            .ok()
    });

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} [{pos}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let report = cracker.run(words, |_, candidate| {
        pb.inc(1);
        pb.set_message(String::from_utf8_lossy(candidate).into_owned());
    })?;
    pb.finish_and_clear();

    match report.found() {
        Some(found) => {
            println!(
                "FOUND: {} (candidate #{})",
                String::from_utf8_lossy(found.password()),
                found.position()
            );
            Ok(())
        }
        None if report.cancelled() => {
            bail!("scan cancelled after {} candidates", report.attempts())
        }
        None => bail!("password not found ({} candidates tried)", report.attempts()),
    }
}

fn main() -> Result<()> {
    init_logging();
    let args = Cli::parse();

    match args.command {
        Commands::Verify => {
            let db = existing_database(args.db)?;
            let password = auth::read_password()?;
            if db.verify_password(password.as_bytes())? {
                println!("password is correct");
            } else {
                bail!("wrong password");
            }
        }
        Commands::Export { output } => {
            let db = existing_database(args.db)?;
            let password = auth::read_password()?;
            let payload = db.load(password.as_bytes())?;
            drop(password);

            match output {
                Some(path) => Storage::new(path).save(&payload)?,
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&payload)?;
                    stdout.flush()?;
                }
            }
        }
        Commands::Import { input } => {
            let db = resolve_database(args.db)?;
            let payload = Zeroizing::new(
                std::fs::read(&input)
                    .with_context(|| format!("failed to read {}", input.display()))?,
            );
            let password = match std::env::var(auth::PASSWORD_ENV) {
                Ok(pw) if !pw.is_empty() => Zeroizing::new(pw),
                _ => auth::read_new_password_with_confirmation()?,
            };
            db.save(password.as_bytes(), &payload)?;
            println!("database written to {}", db.path().display());
        }
        Commands::Changepw => {
            let db = existing_database(args.db)?;
            let password = auth::read_password()?;
            let payload = db.load(password.as_bytes())?;
            drop(password);

            let new_password = auth::read_new_password_with_confirmation()?;
            db.save(new_password.as_bytes(), &payload)?;
            println!("Password has been changed!");
        }
        Commands::Crack {
            dictionary,
            threads,
        } => {
            let db = existing_database(args.db)?;
            crack(&db, dictionary, threads)?;
        }
    }

    Ok(())
}
