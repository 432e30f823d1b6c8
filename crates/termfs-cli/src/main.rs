mod storage;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use termfs_core::{
    AutocompleteResult, FileSystemEngine, Manifest, Shell, ShellConfig, StorageError,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use storage::DirectoryStorage;

#[derive(Parser)]
#[command(name = "termfs", about = "Shell over an in-memory virtual file system", version)]
struct Cli {
    /// Run one line and exit with its status
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    command: Option<String>,

    /// Print tab completions for INPUT and exit
    #[arg(long, value_name = "INPUT", conflicts_with = "command")]
    complete: Option<String>,

    /// Persist the file system in this directory
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Session settings (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initial tree layout (JSON)
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    hostname: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "FILTER", default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("state directory: {0}")]
    Storage(#[from] StorageError),
    #[error("terminal: {0}")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(%err, "termfs failed");
            eprintln!("termfs: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let config = load_config(&cli)?;
    let manifest = match &cli.manifest {
        Some(path) => read_json::<Manifest>(path)?,
        None => Manifest::default_layout(&config.user, &config.hostname),
    };
    let mut shell = match &cli.state_dir {
        Some(dir) => {
            let storage = DirectoryStorage::open(dir)?;
            let fs = FileSystemEngine::load(Box::new(storage), &manifest, &config.home_dir())?;
            Shell::with_fs(&config, fs)
        }
        None => Shell::with_manifest(&config, &manifest),
    };

    if let Some(input) = &cli.complete {
        print_completion(&shell.complete(input));
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(line) = &cli.command {
        let result = shell.execute(line);
        if !result.output.is_empty() {
            println!("{}", result.output);
        }
        return Ok(match result.exit {
            Some(code) => exit_code(code),
            None if result.success => ExitCode::SUCCESS,
            None => ExitCode::FAILURE,
        });
    }
    repl(&mut shell)
}

fn load_config(cli: &Cli) -> Result<ShellConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => read_json::<ShellConfig>(path)?,
        None => ShellConfig::default(),
    };
    if let Some(user) = &cli.user {
        config.user = user.clone();
    }
    if let Some(hostname) = &cli.hostname {
        config.hostname = hostname.clone();
    }
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn print_completion(result: &AutocompleteResult) {
    match result {
        AutocompleteResult::Single(line) => println!("{}", line),
        AutocompleteResult::Multiple(common, names) => {
            println!("{}", common);
            println!("{}", names.join("  "));
        }
        AutocompleteResult::None => {}
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code & 0xff).unwrap_or(1))
}

/// Line-oriented loop: prompt, read, execute, print.
fn repl(shell: &mut Shell) -> Result<ExitCode, CliError> {
    let interactive = io::stdin().is_terminal();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        if interactive {
            write!(stdout, "{}", shell.prompt())?;
            stdout.flush()?;
        }
        let Some(line) = lines.next().transpose()? else {
            break;
        };

        let result = shell.execute(&line);
        if result.cleared && interactive {
            write!(stdout, "\x1b[2J\x1b[H")?;
        }
        if !result.output.is_empty() {
            writeln!(stdout, "{}", result.output)?;
        }
        if let Some(code) = result.exit {
            return Ok(exit_code(code));
        }
    }
    Ok(if shell.last_status() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
