use super::ui;
use crate::core::{ExchangeRate, RateProvider};
use anyhow::{Context, Result};

/// Fetches the USD/BRL rate and prints it as a table.
pub async fn show_rate(rates: &RateProvider) -> Result<ExchangeRate> {
    let spinner = ui::new_spinner("Fetching exchange rate...");
    let result = rates.refresh().await;
    spinner.finish_and_clear();

    let rate = result.context("Failed to fetch the USD/BRL exchange rate")?;

    println!("{}", ui::style_text("Exchange rate", ui::StyleType::Title));
    println!("{}", ui::rate_table(&rate));
    Ok(rate)
}
