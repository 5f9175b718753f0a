use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::core::ExchangeRate;
use crate::core::convert::Unit;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Result,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Result => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// "1 USD = R$ 5.43"
pub fn format_rate(rate: &ExchangeRate) -> String {
    format!("1 USD = {}", Unit::Brl.format(rate.value))
}

/// Renders the current rate as a table.
pub fn rate_table(rate: &ExchangeRate) -> Table {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Pair"),
        header_cell("Rate"),
        header_cell("Fetched at"),
    ]);
    table.add_row(vec![
        Cell::new("USD/BRL"),
        Cell::new(format!("{:.4}", rate.value)).fg(Color::Green),
        Cell::new(rate.fetched_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    ]);
    table
}

/// Creates a spinner shown while waiting on the quote service.
pub fn new_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
