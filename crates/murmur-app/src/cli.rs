//! CLI argument definitions for the Murmur binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use murmur_core::config::{EnhancementProviderKind, LogFormat, MurmurConfig};

/// Config file looked up in the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "murmur.toml";

/// Murmur: cluster survey feedback into themed, sentiment-labeled insights.
#[derive(Parser, Debug)]
#[command(name = "murmur", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one request document and print the report as JSON.
    Analyze(AnalyzeArgs),
    /// Inspect configuration.
    Config {
        /// Print the built-in default configuration as TOML.
        #[arg(long = "print-default")]
        print_default: bool,
    },
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Request JSON file, or `-` for stdin.
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Pretty-print the JSON report.
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long = "log-format", value_enum)]
    pub log_format: Option<LogFormatArg>,

    /// Skip the labeling overlay even if one is configured.
    #[arg(long = "no-enhance")]
    pub no_enhance: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named by `--config` or `MURMUR_CONFIG`; it must load.
    Explicit(PathBuf),
    /// `./murmur.toml` exists.
    WorkingDir(PathBuf),
    Defaults,
}

/// Pick the config source.
///
/// Priority: --config flag > MURMUR_CONFIG env var > ./murmur.toml > defaults.
pub fn pick_config_source(
    flag: Option<&Path>,
    env: Option<String>,
    working_dir_file: &Path,
) -> ConfigSource {
    if let Some(p) = flag {
        return ConfigSource::Explicit(p.to_path_buf());
    }
    if let Some(p) = env.filter(|p| !p.trim().is_empty()) {
        return ConfigSource::Explicit(PathBuf::from(p));
    }
    if working_dir_file.is_file() {
        return ConfigSource::WorkingDir(working_dir_file.to_path_buf());
    }
    ConfigSource::Defaults
}

impl ConfigSource {
    /// Load the configuration this source names.
    ///
    /// A file that exists but does not parse is an error for both file
    /// sources; only `Defaults` skips the filesystem.
    pub fn load(&self) -> murmur_core::Result<MurmurConfig> {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::WorkingDir(path) => {
                MurmurConfig::load(path)
            }
            ConfigSource::Defaults => Ok(MurmurConfig::default()),
        }
    }
}

impl AnalyzeArgs {
    pub fn config_source(&self) -> ConfigSource {
        pick_config_source(
            self.config.as_deref(),
            std::env::var("MURMUR_CONFIG").ok(),
            Path::new(DEFAULT_CONFIG_FILE),
        )
    }

    /// Whether the request is read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value. `RUST_LOG` is
    /// honored separately by the subscriber.
    pub fn resolve_log_level(&self, config: &MurmurConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }

    pub fn resolve_log_format(&self, config: &MurmurConfig) -> LogFormat {
        self.log_format
            .map(LogFormat::from)
            .unwrap_or(config.general.log_format)
    }

    /// Apply flag and environment overrides to a loaded configuration.
    pub fn apply_overrides(
        &self,
        config: &mut MurmurConfig,
        embedding_key: Option<String>,
        llm_key: Option<String>,
    ) {
        if let Some(key) = embedding_key.filter(|k| !k.is_empty()) {
            config.embedding.http.api_key = key;
        }
        if let Some(key) = llm_key.filter(|k| !k.is_empty()) {
            config.enhancement.api_key = key;
        }
        if self.no_enhance {
            config.enhancement.provider = EnhancementProviderKind::None;
        }
    }
}
