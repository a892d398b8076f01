use clap::{Args, Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::Path;
use tabload::cli;
use tabload::config::{RunConfig, RunId, Settings};

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// tabload: load a delimited file into an existing database table
#[derive(Parser)]
#[command(name = "tabload", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source settings and credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Where the run configuration comes from
#[derive(Args)]
struct RunConfigArgs {
    /// Source file name inside the staging directory
    #[arg(short, long, conflicts_with = "conf")]
    filename: Option<String>,

    /// Existing table to load into
    #[arg(short, long, conflicts_with = "conf")]
    table: Option<String>,

    /// Run configuration as JSON, e.g. '{"filename": "sales.csv", "table": "sales"}'
    #[arg(long)]
    conf: Option<String>,
}

impl RunConfigArgs {
    fn into_config(self) -> tabload::error::Result<RunConfig> {
        match self.conf {
            Some(conf) => RunConfig::from_json(&conf),
            None => Ok(RunConfig {
                filename: self.filename,
                target_table: self.table,
            }),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, transform and load a file in one go
    Run {
        #[command(flatten)]
        config: RunConfigArgs,

        /// Run identifier; generated when omitted
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Read the source file into the run's intermediate store
    Extract {
        #[command(flatten)]
        config: RunConfigArgs,

        /// Run identifier shared by the three stages
        #[arg(long)]
        run_id: String,
    },

    /// Normalize column names and missing values of an extracted run
    Transform {
        /// Run identifier shared by the three stages
        #[arg(long)]
        run_id: String,
    },

    /// Insert a transformed run into its target table
    Load {
        /// Run identifier shared by the three stages
        #[arg(long)]
        run_id: String,

        /// Keep the run's intermediate state after loading
        #[arg(long)]
        keep: bool,
    },

    /// Remove a run's intermediate state
    Discard {
        /// Run identifier shared by the three stages
        #[arg(long)]
        run_id: String,
    },

    /// Test the connection to the destination database
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_loaded = Path::new(&cli.env).exists();
    if env_loaded {
        dotenvy::from_filename(&cli.env)?;
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if !env_loaded {
        log::debug!("No dotenv file at {}, using process environment", cli.env);
    }

    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Run { config, run_id } => {
            let run = match run_id {
                Some(id) => RunId::parse(id)?,
                None => RunId::generate(),
            };
            let config = config.into_config()?;
            log::info!("Starting run {}", run.as_str().cyan());

            let count = cli::run(&settings, &run, &config).await?;
            log::info!(
                "Loaded {} rows into {}",
                count.green(),
                config.target_table()?.bright_black()
            );
        }
        Commands::Extract { config, run_id } => {
            let run = RunId::parse(run_id)?;
            let count = cli::extract(&settings, &run, &config.into_config()?).await?;
            log::info!("Extracted {} rows for run {}", count.green(), run.as_str().cyan());
        }
        Commands::Transform { run_id } => {
            let run = RunId::parse(run_id)?;
            let count = cli::transform(&settings, &run).await?;
            log::info!("Transformed {} rows for run {}", count.green(), run.as_str().cyan());
        }
        Commands::Load { run_id, keep } => {
            let run = RunId::parse(run_id)?;
            let result = cli::load(&settings, &run).await;
            if !keep {
                // The dataset is never re-stored once the load stage has consumed it
                if let Err(e) = cli::discard(&settings, &run) {
                    log::warn!("Could not discard run {}: {}", run, e);
                }
            }
            let count = result?;
            log::info!("Loaded {} rows for run {}", count.green(), run.as_str().cyan());
        }
        Commands::Discard { run_id } => {
            let run = RunId::parse(run_id)?;
            cli::discard(&settings, &run)?;
            log::info!("Discarded run {}", run.as_str().cyan());
        }
        Commands::Check => {
            let url = cli::check_database(&settings).await?;
            log::info!("Connected to {}", url.bright_black());
        }
    }

    Ok(())
}
