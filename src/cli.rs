//! Command-line interface implementation

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::config::{find_config, load_from_args, project_root, ConfigError, Configuration};
use crate::content::ContentMatcher;
use crate::watch::{watch_and_resolve, WatchOptions, DEFAULT_DEBOUNCE_MS};

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// Styleconf - resolve design-token declarations and content globs
#[derive(Parser)]
#[command(name = "styleconf")]
#[command(about = "Resolve design-token declarations and content globs for utility-class CSS builds")]
#[command(version)]
pub struct Cli {
    /// Verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resolved configuration as JSON
    Resolve {
        /// Declaration file(s), merged in order. Discovered if omitted.
        #[arg(short, long = "config")]
        configs: Vec<PathBuf>,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Validate declaration(s) and print a summary
    Check {
        /// Declaration file(s), merged in order. Discovered if omitted.
        #[arg(short, long = "config")]
        configs: Vec<PathBuf>,
    },

    /// List the files selected by the content globs
    Scan {
        /// Declaration file(s), merged in order. Discovered if omitted.
        #[arg(short, long = "config")]
        configs: Vec<PathBuf>,

        /// Project root the globs are relative to (default: the declaration's directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Re-resolve the declaration whenever it changes
    Watch {
        /// Declaration file. Discovered if omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Debounce delay in milliseconds
        #[arg(long, default_value_t = DEFAULT_DEBOUNCE_MS)]
        debounce_ms: u64,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, matches!(cli.command, Commands::Watch { .. }));

    match cli.command {
        Commands::Resolve { configs, compact } => run_resolve(&configs, compact),
        Commands::Check { configs } => run_check(&configs),
        Commands::Scan { configs, root } => run_scan(&configs, root.as_deref()),
        Commands::Watch { config, debounce_ms } => run_watch(config, debounce_ms),
    }
}

fn init_logging(verbose: bool, watching: bool) {
    let default_level = match (verbose, watching) {
        (true, _) => "styleconf=debug",
        (false, true) => "styleconf=info",
        (false, false) => "styleconf=warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Map a config error to an exit code, printing it.
fn config_failure(err: &ConfigError) -> ExitCode {
    eprintln!("Error: {}", err);
    match err {
        ConfigError::Io { .. } | ConfigError::UnsupportedFormat(_) | ConfigError::NotFound => {
            ExitCode::from(EXIT_INVALID_ARGS)
        }
        _ => ExitCode::from(EXIT_ERROR),
    }
}

/// Load the configuration and the directory its globs are relative to.
fn load_with_root(configs: &[PathBuf]) -> Result<(Configuration, PathBuf), ConfigError> {
    let paths = match configs {
        [] => vec![find_config()?.ok_or(ConfigError::NotFound)?],
        explicit => explicit.to_vec(),
    };
    let config = load_from_args(&paths)?;
    let root = project_root(&paths[0]).to_path_buf();
    Ok((config, root))
}

fn run_resolve(configs: &[PathBuf], compact: bool) -> ExitCode {
    let config = match load_from_args(configs) {
        Ok(config) => config,
        Err(e) => return config_failure(&e),
    };

    let declaration = config.to_declaration();
    let rendered = if compact {
        serde_json::to_string(&declaration)
    } else {
        serde_json::to_string_pretty(&declaration)
    };

    match rendered {
        Ok(json) => {
            println!("{}", json);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: Cannot serialize configuration: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run_check(configs: &[PathBuf]) -> ExitCode {
    let config = match load_from_args(configs) {
        Ok(config) => config,
        Err(e) => return config_failure(&e),
    };

    let theme = config.theme_extension();
    println!(
        "ok: {} content pattern(s), {} theme categor{} ({} token(s)), {} plugin(s)",
        config.content_patterns().len(),
        theme.categories().count(),
        if theme.categories().count() == 1 { "y" } else { "ies" },
        theme.token_count(),
        config.plugins().len()
    );
    ExitCode::from(EXIT_SUCCESS)
}

fn run_scan(configs: &[PathBuf], root_override: Option<&Path>) -> ExitCode {
    let (config, config_root) = match load_with_root(configs) {
        Ok(loaded) => loaded,
        Err(e) => return config_failure(&e),
    };
    let root = root_override.map(Path::to_path_buf).unwrap_or(config_root);

    let files = ContentMatcher::from_config(&config).and_then(|matcher| matcher.scan(&root));
    match files {
        Ok(files) => {
            for file in files {
                let shown = file.strip_prefix(&root).unwrap_or(&file);
                println!("{}", shown.display());
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run_watch(config: Option<PathBuf>, debounce_ms: u64) -> ExitCode {
    let config_path = match config {
        Some(path) => path,
        None => match find_config().and_then(|found| found.ok_or(ConfigError::NotFound)) {
            Ok(path) => path,
            Err(e) => return config_failure(&e),
        },
    };

    let options = WatchOptions { config_path, debounce_ms };
    let result = watch_and_resolve(options, |outcome| {
        if let Ok(config) = &outcome.result {
            match serde_json::to_string(&config.to_declaration()) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: Cannot serialize configuration: {}", e),
            }
        }
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
