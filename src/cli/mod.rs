//! Command-line interface for dataexport
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and argument overrides
//! - Driving a [`DataExplorer`] for the `objects`, `fields`, `browse` and
//!   `export` subcommands

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, LogLevel};
use crate::error::{ConfigError, ExplorerError, Result};
use crate::explorer::{DataExplorer, FilterOutcome, PageOutcome, SessionView};
use crate::export::ExportFormat;
use crate::gateway::InMemoryGateway;
use crate::model::Operator;
use crate::notify::{Notification, NotificationSink};

pub mod completion;
pub mod progress;
pub mod table;

use progress::LoadSpinner;
use table::{TableRenderer, field_list};

/// Browse and export rows of backend objects
#[derive(Parser, Debug)]
#[command(
    name = "dataexport",
    version,
    about = "Browse backend objects and export selected rows",
    long_about = "Pick an object and its fields, load rows page by page, filter them with a
single LIKE-style predicate and export the selected rows as a spreadsheet or CSV file."
)]
pub struct CliArgs {
    /// JSON fixture holding the object tables
    #[arg(long = "data", value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Export format (xls, csv)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Directory exported files are written to
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Quiet mode (minimal output)
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

/// Object, fields, pages and filter of one explorer view
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Object to browse
    #[arg(value_name = "OBJECT")]
    pub object: String,

    /// Fields to display, comma-separated
    #[arg(short = 'f', long, value_delimiter = ',', required = true)]
    pub fields: Vec<String>,

    /// Number of pages to load
    #[arg(long, default_value_t = 1, value_name = "N")]
    pub pages: usize,

    /// Field the filter applies to
    #[arg(long, value_name = "FIELD")]
    pub filter_on: Option<String>,

    /// Filter operator (starts-with, ends-with, contains, first-letter)
    #[arg(long, value_name = "OPERATOR", requires = "filter_on")]
    pub operator: Option<Operator>,

    /// Filter expression
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub expression: String,
}

/// Subcommands for dataexport
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the objects offered by the data source
    Objects {
        /// One name per line, without a table
        #[arg(long)]
        plain: bool,
    },

    /// List the fields of an object
    Fields {
        #[arg(value_name = "OBJECT")]
        object: String,
    },

    /// Load rows of an object and print them as a table
    Browse(ViewArgs),

    /// Load rows, select some and export them
    Export {
        #[command(flatten)]
        view: ViewArgs,

        /// Table positions to export, comma-separated
        #[arg(long, value_delimiter = ',', value_name = "POSITIONS")]
        rows: Vec<usize>,

        /// Export every loaded row
        #[arg(long, conflicts_with = "rows")]
        all: bool,

        /// Print the document instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

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

/// Prints explorer notifications to stderr
#[derive(Debug, Clone, Copy)]
struct ConsoleSink {
    quiet: bool,
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, notification: Notification) {
        if !self.quiet {
            eprintln!("{}", notification);
        }
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Parse the process arguments and load configuration
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Build from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        Self::apply_args_to_config(&mut config, args);
        Ok(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Override configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(path) = &args.data_file {
            config.data.fixture = Some(path.clone());
        }

        if let Some(format) = &args.format {
            match format.parse::<ExportFormat>() {
                Ok(format) => config.export.format = format,
                Err(e) => eprintln!("Warning: {}; using {}", e, config.export.format),
            }
        }

        if let Some(dir) = &args.output {
            config.export.output_dir = dir.clone();
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

    /// Handle subcommands that need no data source
    ///
    /// # Returns
    /// * `Result<bool>` - True if the subcommand was handled
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
            Some(_) => Ok(false),
            None => {
                CliArgs::command().print_help()?;
                Ok(true)
            }
        }
    }

    /// Run an explorer subcommand and print its output
    pub async fn run(&self) -> Result<()> {
        let output = match &self.args.command {
            Some(Commands::Objects { plain }) => self.list_objects(*plain).await?,
            Some(Commands::Fields { object }) => self.list_fields(object).await?,
            Some(Commands::Browse(view)) => self.browse(view).await?,
            Some(Commands::Export {
                view,
                rows,
                all,
                stdout,
            }) => self.export(view, rows, *all, *stdout).await?,
            _ => return Ok(()),
        };
        println!("{}", output);
        Ok(())
    }

    fn show_version(&self) {
        println!("dataexport version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if show {
            self.show_config();
        }

        Ok(())
    }

    fn validate_config_file(&self) {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("Configuration file does not exist");
            return;
        }

        match Config::load_from_file(Some(&path)) {
            Ok(config) => match config.validate() {
                Ok(_) => println!("Configuration is valid"),
                Err(e) => println!("Configuration validation failed: {}", e),
            },
            Err(e) => println!("Failed to load configuration: {}", e),
        }
    }

    fn show_config(&self) {
        let path = self.get_config_path();
        println!("Configuration file: {}", path.display());
        println!();
        println!("=== Effective Configuration ===");
        println!();

        match self.config.to_toml() {
            Ok(toml_str) => println!("{}", toml_str),
            Err(e) => {
                eprintln!("Error formatting configuration: {}", e);
                println!("{:#?}", self.config);
            }
        }
    }

    /// Configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }

    /// Load the configured fixture and wrap it in an explorer
    async fn open_explorer(&self) -> Result<DataExplorer> {
        let Some(path) = &self.config.data.fixture else {
            return Err(ConfigError::Generic(
                "No data source configured. Pass --data <FILE> or set data.fixture in the config file"
                    .to_string(),
            )
            .into());
        };

        let gateway = InMemoryGateway::load(path).await?;
        let sink = Arc::new(ConsoleSink {
            quiet: self.args.quiet,
        });
        Ok(DataExplorer::from_gateway(gateway, sink).with_export_format(self.config.export.format))
    }

    fn spinner(&self, message: impl Into<String>) -> LoadSpinner {
        LoadSpinner::start(message, !self.args.quiet)
    }

    async fn list_objects(&self, plain: bool) -> Result<String> {
        let explorer = self.open_explorer().await?;
        let objects = explorer.load_objects().await?;
        if plain {
            return Ok(objects
                .iter()
                .map(|o| o.as_str())
                .collect::<Vec<_>>()
                .join("\n"));
        }
        Ok(TableRenderer::new().render_names("Object", &objects))
    }

    async fn list_fields(&self, object: &str) -> Result<String> {
        let explorer = self.open_explorer().await?;
        let fields = explorer.select_object(object).await?;
        Ok(TableRenderer::new().render_names("Field", &fields))
    }

    async fn browse(&self, view: &ViewArgs) -> Result<String> {
        let explorer = self.open_explorer().await?;
        self.load_view(&explorer, view).await?;
        Ok(render_view(&explorer.view().await))
    }

    async fn export(
        &self,
        view: &ViewArgs,
        rows: &[usize],
        all: bool,
        stdout: bool,
    ) -> Result<String> {
        let explorer = self.open_explorer().await?;
        self.load_view(&explorer, view).await?;

        let positions: Vec<usize> = if all {
            (0..explorer.dataset().await.len()).collect()
        } else {
            rows.to_vec()
        };
        explorer.select_rows(&positions).await;

        let document = explorer.export().await?;
        if stdout {
            return Ok(document.content);
        }
        let path = document.write_to(&self.config.export.output_dir).await?;
        Ok(format!(
            "Exported {} row(s) to {}",
            document.row_count,
            path.display()
        ))
    }

    /// Select, load the requested pages and apply the filter, if any.
    async fn load_view(&self, explorer: &DataExplorer, view: &ViewArgs) -> Result<()> {
        let spinner = self.spinner(format!("Loading fields of {}...", view.object));
        explorer.select_object(view.object.as_str()).await?;
        explorer
            .choose_fields(view.fields.iter().map(String::as_str))
            .await;

        spinner.finish();
        let spinner = self.spinner(format!("Loading {}...", view.object));
        let mut outcome = explorer.fetch().await?;
        for _ in 1..view.pages {
            if !matches!(outcome, PageOutcome::Loaded { .. }) {
                break;
            }
            outcome = explorer.load_more().await?;
        }
        spinner.finish();

        let Some(field) = &view.filter_on else {
            return Ok(());
        };
        let Some(operator) = view.operator else {
            return Err(ExplorerError::Generic(
                "--filter-on requires --operator".to_string(),
            ));
        };
        if !explorer.choose_filter_field(field.as_str()).await {
            return Err(ExplorerError::Generic(format!(
                "Cannot filter on '{}': it is not one of the selected fields",
                field
            )));
        }
        explorer.choose_operator(operator).await;
        explorer.set_filter_expression(view.expression.as_str()).await;

        let spinner = self.spinner("Filtering...");
        let outcome = explorer.apply_filter().await?;
        spinner.finish();
        if outcome == FilterOutcome::Skipped {
            return Err(ExplorerError::Generic("Filter was not applied".to_string()));
        }
        Ok(())
    }
}

/// Table plus a one-line status summary
fn render_view(view: &SessionView) -> String {
    let mut output = TableRenderer::new().render(&view.columns, &view.dataset);

    let object = view
        .object
        .as_ref()
        .map(|o| o.as_str())
        .unwrap_or_default();
    let mut status = format!(
        "{} row(s) of {} [{}] at offset {}",
        view.dataset.len(),
        object,
        field_list(view.fields.as_slice()),
        view.offset
    );
    if let Some(total) = view.total_count {
        status.push_str(&format!(" of {}", total));
    }
    if let Some(filter) = &view.active_filter {
        status.push_str(&format!(", filtered by {}", filter));
    }
    let label = view.load_status.label();
    if !label.is_empty() {
        status.push_str(&format!(" ({})", label));
    }

    output.push('\n');
    output.push_str(&status);
    output
}
