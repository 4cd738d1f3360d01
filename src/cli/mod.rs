//! Command-line interface for scrollex
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Merging CLI arguments over the configuration file
//!
//! The boundary flags keep the spelling the export format has always used
//! (`--pageSize`, `--articleBodySelector`), so existing invocations keep
//! working verbatim.

pub mod completion;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, LogLevel};
use crate::error::{ConfigError, Result};

/// Export crawled HTML documents from an Elasticsearch index to disk
#[derive(Parser, Debug)]
#[command(
    name = "scrollex",
    version,
    about = "Elasticsearch crawl export tool written in Rust",
    long_about = "Pages through an Elasticsearch index with a scroll cursor and writes one
HTML file per document, extracting the article body with a CSS selector."
)]
pub struct CliArgs {
    /// Hostname and port for Elasticsearch
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// The Elasticsearch index to page through
    #[arg(short = 'i', long, value_name = "INDEX")]
    pub index: Option<String>,

    /// The number of results to return for each page of requests
    #[arg(short = 'p', long = "pageSize", value_name = "N")]
    pub page_size: Option<u32>,

    /// The number of files to process concurrently
    #[arg(short = 'c', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// The DOM selector to extract the article body content
    #[arg(short = 'a', long = "articleBodySelector", value_name = "SELECTOR")]
    pub article_body_selector: Option<String>,

    /// Root directory for exported files
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip documents whose output file already exists instead of
    /// overwriting it
    #[arg(long = "no-clobber")]
    pub no_clobber: bool,

    /// Configuration file path
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Quiet mode (no progress bar, minimal output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for scrollex
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration with CLI overrides applied
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        let config = Self::load_config(&args)?;

        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, args);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI arguments to configuration
    ///
    /// # Arguments
    /// * `config` - Configuration to modify
    /// * `args` - Parsed arguments taking precedence
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(ref host) = args.host {
            config.connection.host = host.clone();
        }
        if let Some(page_size) = args.page_size {
            config.export.page_size = page_size;
        }
        if let Some(concurrency) = args.concurrency {
            config.export.concurrency = concurrency;
        }
        if let Some(ref selector) = args.article_body_selector {
            config.export.article_body_selector = selector.clone();
        }
        if let Some(ref dir) = args.output_dir {
            config.output.directory = dir.clone();
        }
        if args.no_clobber {
            config.output.overwrite = false;
        }

        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// The index to export, required for a run
    ///
    /// # Returns
    /// * `Result<&str>` - Index name, or a configuration error
    pub fn index(&self) -> Result<&str> {
        self.args
            .index
            .as_deref()
            .ok_or_else(|| ConfigError::MissingValue("--index".to_string()).into())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Handle subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if a subcommand was handled, false to continue
    pub async fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Some(Commands::Version) => {
                self.show_version();
                Ok(true)
            }
            Some(Commands::Completion { shell }) => {
                completion::generate_completion(shell)?;
                Ok(true)
            }
            Some(Commands::Config { show, validate }) => {
                self.handle_config_command(*show, *validate)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Show version information
    fn show_version(&self) {
        println!("scrollex version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    /// Handle config subcommand
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file()?;
        }

        if show {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("❌ Configuration file does not exist");
            return Ok(());
        }

        match Config::load_from_file(self.args.config_file.as_deref()) {
            Ok(config) => match config.validate() {
                Ok(_) => println!("✅ Configuration is valid"),
                Err(e) => println!("❌ Configuration validation failed: {}", e),
            },
            Err(e) => println!("❌ Failed to load configuration: {}", e),
        }

        Ok(())
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Configuration file: {}", path.display());
        println!();
        println!("=== Effective Configuration ===");
        println!();
        println!("{}", self.config.to_toml()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .as_ref()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Config::default_config_path)
    }

    /// Print banner with version and target info
    pub fn print_banner(&self) {
        if !self.args.quiet {
            if let Some(ref index) = self.args.index {
                println!(
                    "Exporting index \"{}\" from {}",
                    index, self.config.connection.host
                );
            }
            println!("Using scrollex: {}", env!("CARGO_PKG_VERSION"));
            println!(
                "Article body selector: {}",
                self.config.export.article_body_selector
            );
        }
    }
}
