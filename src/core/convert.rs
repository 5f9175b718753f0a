//! Temperature and currency conversion

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, instrument};

use super::error::ConvertError;
use super::rate::RateProvider;

/// Decimal places used when displaying any conversion result.
pub const DISPLAY_PRECISION: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionMode {
    Temperature,
    Currency,
}

impl Display for ConversionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ConversionMode::Temperature => "temperature",
                ConversionMode::Currency => "currency",
            }
        )
    }
}

impl FromStr for ConversionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "temperature" | "temp" | "t" => Ok(ConversionMode::Temperature),
            "currency" | "cur" | "c" => Ok(ConversionMode::Currency),
            _ => Err(format!("Unknown conversion mode: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionDirection {
    /// Celsius to Fahrenheit, or BRL to USD
    Forward,
    /// Fahrenheit to Celsius, or USD to BRL
    Reverse,
}

impl FromStr for ConversionDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" | "a" => Ok(ConversionDirection::Forward),
            "reverse" | "b" => Ok(ConversionDirection::Reverse),
            _ => Err(format!("Unknown conversion direction: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Celsius,
    Fahrenheit,
    Brl,
    Usd,
}

impl Unit {
    /// Renders `value` with this unit at display precision.
    pub fn format(&self, value: f64) -> String {
        match self {
            Unit::Celsius => format!("{value:.2}°C"),
            Unit::Fahrenheit => format!("{value:.2}°F"),
            Unit::Brl => format!("R$ {value:.2}"),
            Unit::Usd => format!("US$ {value:.2}"),
        }
    }
}

impl ConversionMode {
    /// Source and target unit for the given direction.
    pub fn units(self, direction: ConversionDirection) -> (Unit, Unit) {
        match (self, direction) {
            (ConversionMode::Temperature, ConversionDirection::Forward) => {
                (Unit::Celsius, Unit::Fahrenheit)
            }
            (ConversionMode::Temperature, ConversionDirection::Reverse) => {
                (Unit::Fahrenheit, Unit::Celsius)
            }
            (ConversionMode::Currency, ConversionDirection::Forward) => (Unit::Brl, Unit::Usd),
            (ConversionMode::Currency, ConversionDirection::Reverse) => (Unit::Usd, Unit::Brl),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub mode: ConversionMode,
    pub direction: ConversionDirection,
    pub input: f64,
    pub output: f64,
    pub from: Unit,
    pub to: Unit,
}

impl Conversion {
    pub fn rounded(&self) -> f64 {
        round_to_display(self.output)
    }
}

impl Display for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {}",
            self.from.format(self.input),
            self.to.format(self.output)
        )
    }
}

pub fn round_to_display(value: f64) -> f64 {
    let factor = 10f64.powi(DISPLAY_PRECISION);
    (value * factor).round() / factor
}

/// Parses user input as a finite number. A lone comma is read as the decimal separator.
pub fn parse_input(input: &str) -> Result<f64, ConvertError> {
    let trimmed = input.trim();
    let normalized = if trimmed.contains('.') {
        trimmed.to_string()
    } else {
        trimmed.replacen(',', ".", 1)
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConvertError::Validation {
            input: input.to_string(),
        })
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// `rate` is BRL per USD.
pub fn brl_to_usd(amount: f64, rate: f64) -> f64 {
    amount / rate
}

pub fn usd_to_brl(amount: f64, rate: f64) -> f64 {
    amount * rate
}

pub struct Converter {
    rates: RateProvider,
}

impl Converter {
    pub fn new(rates: RateProvider) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateProvider {
        &self.rates
    }

    /// Converts without waiting on the network. Currency conversions with no
    /// rate loaded request a background refresh and fail with `RateUnavailable`.
    #[instrument(name = "Convert", skip(self))]
    pub fn convert(
        &self,
        mode: ConversionMode,
        direction: ConversionDirection,
        input: &str,
    ) -> Result<Conversion, ConvertError> {
        let value = parse_input(input)?;

        let output = match mode {
            ConversionMode::Temperature => match direction {
                ConversionDirection::Forward => celsius_to_fahrenheit(value),
                ConversionDirection::Reverse => fahrenheit_to_celsius(value),
            },
            ConversionMode::Currency => {
                let Some(rate) = self.rates.current_rate() else {
                    debug!("No exchange rate loaded, requesting refresh");
                    self.rates.request_refresh();
                    return Err(ConvertError::RateUnavailable);
                };
                if self.rates.is_stale() {
                    debug!(age = %rate.age(), "Exchange rate is stale, requesting refresh");
                    self.rates.request_refresh();
                }
                match direction {
                    ConversionDirection::Forward => brl_to_usd(value, rate.value),
                    ConversionDirection::Reverse => usd_to_brl(value, rate.value),
                }
            }
        };

        let (from, to) = mode.units(direction);
        Ok(Conversion {
            mode,
            direction,
            input: value,
            output,
            from,
            to,
        })
    }

    /// Like `convert`, but awaits a fetch first when the rate is unset or stale.
    pub async fn convert_with_refresh(
        &self,
        mode: ConversionMode,
        direction: ConversionDirection,
        input: &str,
    ) -> Result<Conversion, ConvertError> {
        parse_input(input)?;

        if mode == ConversionMode::Currency
            && (self.rates.current_rate().is_none() || self.rates.is_stale())
        {
            self.rates.refresh().await?;
        }

        self.convert(mode, direction, input)
    }
}
