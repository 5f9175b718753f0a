pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{ConversionDirection, ConversionMode, Converter, RateProvider};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        mode: ConversionMode,
        direction: ConversionDirection,
        value: String,
    },
    Rate,
    Shell,
}

/// Builds the rate provider described by `config`.
pub fn build_rate_provider(config: &AppConfig) -> Result<RateProvider> {
    let source = providers::FrankfurterProvider::new(&config.provider.base_url)
        .with_api_key(config.provider.resolved_api_key());
    let rates = RateProvider::new(Arc::new(source));

    Ok(match config.max_rate_age()? {
        Some(max_age) => rates.with_max_age(max_age),
        None => rates,
    })
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("unitconv starting...");

    let config = AppConfig::load_or_default(config_path)?;
    debug!("Loaded config: {config:#?}");

    let converter = Converter::new(build_rate_provider(&config)?);

    match command {
        AppCommand::Convert {
            mode,
            direction,
            value,
        } => {
            cli::convert::run(&converter, mode, direction, &value).await?;
        }
        AppCommand::Rate => {
            cli::rate::show_rate(converter.rates()).await?;
        }
        AppCommand::Shell => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            cli::shell::Shell::new(&converter)
                .run(stdin, &mut stdout)
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rate_provider_rejects_huge_max_age() {
        let config: AppConfig =
            serde_yaml::from_str("refresh_after_secs: 10000000000000000").unwrap();
        let err = build_rate_provider(&config).err().expect("should fail");
        assert_eq!(err.to_string(), "Invalid refresh_after_secs");
    }

    #[test]
    fn test_build_rate_provider_with_max_age() {
        let config: AppConfig = serde_yaml::from_str("refresh_after_secs: 60").unwrap();
        let rates = build_rate_provider(&config).unwrap();
        assert!(rates.current_rate().is_none());
        assert!(!rates.is_stale());
    }
}
