use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use unitconv::core::log::init_logging;
use unitconv::core::{ConversionDirection, ConversionMode};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for unitconv::AppCommand {
    fn from(cmd: Commands) -> unitconv::AppCommand {
        let convert = |mode, direction, value| unitconv::AppCommand::Convert {
            mode,
            direction,
            value,
        };
        match cmd {
            Commands::C2f { value } => convert(
                ConversionMode::Temperature,
                ConversionDirection::Forward,
                value,
            ),
            Commands::F2c { value } => convert(
                ConversionMode::Temperature,
                ConversionDirection::Reverse,
                value,
            ),
            Commands::Brl2usd { value } => convert(
                ConversionMode::Currency,
                ConversionDirection::Forward,
                value,
            ),
            Commands::Usd2brl { value } => convert(
                ConversionMode::Currency,
                ConversionDirection::Reverse,
                value,
            ),
            Commands::Rate => unitconv::AppCommand::Rate,
            Commands::Shell => unitconv::AppCommand::Shell,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert Celsius to Fahrenheit
    C2f {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Convert Fahrenheit to Celsius
    F2c {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Convert Brazilian Real to US Dollar at the live rate
    Brl2usd {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Convert US Dollar to Brazilian Real at the live rate
    Usd2brl {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Fetch and display the current USD/BRL exchange rate
    Rate,
    /// Start an interactive conversion session
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => unitconv::cli::setup::setup(),
        Some(cmd) => unitconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
