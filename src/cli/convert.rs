use super::ui;
use crate::core::{Conversion, ConversionDirection, ConversionMode, Converter};
use anyhow::{Context, Result};

/// Runs a single conversion, fetching the exchange rate first when needed.
pub async fn run(
    converter: &Converter,
    mode: ConversionMode,
    direction: ConversionDirection,
    input: &str,
) -> Result<Conversion> {
    let spinner = (mode == ConversionMode::Currency && converter.rates().current_rate().is_none())
        .then(|| ui::new_spinner("Fetching exchange rate..."));

    let result = converter.convert_with_refresh(mode, direction, input).await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let conversion = result.with_context(|| format!("Could not convert {input} ({mode})"))?;

    println!("{}", ui::style_text(&conversion.to_string(), ui::StyleType::Result));
    if mode == ConversionMode::Currency {
        if let Some(rate) = converter.rates().current_rate() {
            println!(
                "{}",
                ui::style_text(&ui::format_rate(&rate), ui::StyleType::Subtle)
            );
        }
    }

    Ok(conversion)
}
