use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use hashwatch_core::paths::settings_path;
use hashwatch_core::{
    compute_digest, verify, HashAlgorithm, MonitorConfig, MonitorEvent, MonitorSession, Settings,
};
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hashwatch", author, version, about = "File integrity checker and monitor", long_about = None)]
struct Cli {
    /// Settings file (default: platform config dir, or $HASHWATCH_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the digest of a file
    Hash {
        file: PathBuf,
        /// sha256, sha1, sha512 or md5
        #[arg(short, long)]
        algorithm: Option<HashAlgorithm>,
        #[arg(long)]
        json: bool,
    },

    /// Check a file against a known digest
    Verify {
        file: PathBuf,
        /// Known digest (hex, any case)
        reference: String,
        #[arg(short, long)]
        algorithm: Option<HashAlgorithm>,
        #[arg(long)]
        json: bool,
        /// Keep monitoring the file after a passing check
        #[arg(long)]
        watch: bool,
    },

    /// Monitor a file for changes until Ctrl-C
    Watch {
        file: PathBuf,
        #[arg(short, long)]
        algorithm: Option<HashAlgorithm>,
        /// Poll instead of using OS notifications
        #[arg(long)]
        poll: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings_file = match cli.config {
        Some(path) => path,
        None => settings_path()?,
    };
    let settings = Settings::load(&settings_file)?;

    match cli.command {
        Commands::Hash {
            file,
            algorithm,
            json,
        } => hash_command(&file, algorithm.unwrap_or(settings.default_algorithm), json),
        Commands::Verify {
            file,
            reference,
            algorithm,
            json,
            watch,
        } => {
            let algorithm = algorithm.unwrap_or(settings.default_algorithm);
            verify_command(&file, &reference, algorithm, json)?;
            if watch {
                watch_command(&file, algorithm, &settings.monitor).await?;
            }
            Ok(())
        }
        Commands::Watch {
            file,
            algorithm,
            poll,
        } => {
            let mut config = settings.monitor.clone();
            config.use_polling |= poll;
            watch_command(&file, algorithm.unwrap_or(settings.default_algorithm), &config).await
        }
    }
}

fn hash_command(file: &Path, algorithm: HashAlgorithm, json: bool) -> Result<()> {
    let digest = compute_digest(file, algorithm)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&digest)?);
    } else {
        println!("{}  {}", digest, file.display());
    }
    Ok(())
}

fn verify_command(file: &Path, reference: &str, algorithm: HashAlgorithm, json: bool) -> Result<()> {
    algorithm.validate_reference(reference)?;
    let result = verify(file, reference, algorithm);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.message());
    }
    if !result.passed {
        match &result.detail {
            Some(detail) => bail!("{}: {}", result.message(), detail),
            None => bail!("{}", result.message()),
        }
    }
    Ok(())
}

async fn watch_command(file: &Path, algorithm: HashAlgorithm, config: &MonitorConfig) -> Result<()> {
    let (session, mut events) = MonitorSession::start_channel(file, algorithm, config)?;
    println!("Monitoring file: {} ({})", session.path().display(), algorithm);

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => print_event(&event),
                None => {
                    info!("monitor session ended");
                    break;
                }
            },
            res = &mut ctrl_c => {
                res?;
                break;
            }
        }
    }

    session.stop();
    Ok(())
}

fn print_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::Changed {
            path,
            previous,
            current,
        } => println!(
            "File {} has been modified ({} -> {})",
            path.display(),
            previous,
            current
        ),
        MonitorEvent::Unchanged { path, .. } => println!("File {} has not changed.", path.display()),
        MonitorEvent::Error { path, detail, .. } => {
            println!("File {} could not be checked: {}", path.display(), detail)
        }
    }
}
