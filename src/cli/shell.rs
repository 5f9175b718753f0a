//! Interactive conversion session.
//!
//! The session keeps a current mode and reads one command per line. The
//! exchange rate is fetched in the background on start, and again whenever a
//! currency conversion finds it missing; completed fetches are announced.

use super::ui;
use crate::core::{
    ConversionDirection, ConversionMode, ConvertError, Converter, RateStatus,
};
use anyhow::Result;
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const HELP: &str = "\
Commands:
  mode <temperature|currency>  switch conversion mode
  a <value>                    convert °C → °F, or R$ → US$
  b <value>                    convert °F → °C, or US$ → R$
  rate                         show the current exchange rate
  refresh                      fetch the exchange rate again
  help                         show this message
  quit                         leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Mode(ConversionMode),
    Convert(ConversionDirection, String),
    Rate,
    Refresh,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let argument = parts.next().map(str::trim).unwrap_or_default();

        match command.to_lowercase().as_str() {
            "mode" | "m" => argument.parse().map(ShellCommand::Mode),
            "rate" => Ok(ShellCommand::Rate),
            "refresh" => Ok(ShellCommand::Refresh),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
            other => other
                .parse::<ConversionDirection>()
                .map(|direction| ShellCommand::Convert(direction, argument.to_string()))
                .map_err(|_| format!("Unknown command: {command}. Type 'help' for commands")),
        }
    }
}

/// Human-readable summary of the rate state.
pub fn describe_status(status: &RateStatus) -> String {
    if status.loading {
        return "Fetching exchange rate...".to_string();
    }
    match (&status.rate, &status.last_error) {
        (Some(rate), _) => ui::format_rate(rate),
        (None, Some(e)) => format!("Failed to fetch exchange rate: {e}"),
        (None, None) => "Exchange rate not available".to_string(),
    }
}

fn describe_mode(mode: ConversionMode) -> &'static str {
    match mode {
        ConversionMode::Temperature => "a: °C → °F, b: °F → °C",
        ConversionMode::Currency => "a: R$ → US$, b: US$ → R$",
    }
}

pub struct Shell<'a> {
    converter: &'a Converter,
    mode: ConversionMode,
}

impl<'a> Shell<'a> {
    pub fn new(converter: &'a Converter) -> Self {
        Self {
            converter,
            mode: ConversionMode::Temperature,
        }
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    /// Executes one command. Returns `false` once the session should end.
    pub fn execute<W: Write>(&mut self, command: ShellCommand, out: &mut W) -> Result<bool> {
        debug!(?command, mode = %self.mode, "Executing shell command");
        let rates = self.converter.rates();

        match command {
            ShellCommand::Mode(mode) => {
                self.mode = mode;
                writeln!(out, "Mode: {mode} ({})", describe_mode(mode))?;
                if mode == ConversionMode::Currency {
                    if rates.current_rate().is_none() {
                        rates.request_refresh();
                    }
                    writeln!(
                        out,
                        "{}",
                        ui::style_text(&describe_status(&rates.status()), ui::StyleType::Subtle)
                    )?;
                }
            }
            ShellCommand::Convert(direction, input) => {
                match self.converter.convert(self.mode, direction, &input) {
                    Ok(conversion) => writeln!(
                        out,
                        "{}",
                        ui::style_text(&conversion.to_string(), ui::StyleType::Result)
                    )?,
                    Err(ConvertError::RateUnavailable) => writeln!(
                        out,
                        "{}",
                        ui::style_text(
                            "Exchange rate not available yet, fetching it. Try again shortly.",
                            ui::StyleType::Error
                        )
                    )?,
                    Err(e) => writeln!(out, "{}", ui::style_text(&e.to_string(), ui::StyleType::Error))?,
                }
            }
            ShellCommand::Rate => writeln!(out, "{}", describe_status(&rates.status()))?,
            ShellCommand::Refresh => {
                if rates.request_refresh().is_some() {
                    writeln!(out, "Fetching exchange rate...")?;
                } else {
                    writeln!(out, "A refresh is already in progress")?;
                }
            }
            ShellCommand::Help => writeln!(out, "{HELP}")?,
            ShellCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Reads commands from `input` until end of input or `quit`.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        let mut status_rx = self.converter.rates().subscribe();
        self.converter.rates().request_refresh();

        writeln!(out, "{}", ui::style_text("unitconv", ui::StyleType::Title))?;
        writeln!(out, "Mode: {} ({})", self.mode, describe_mode(self.mode))?;
        writeln!(
            out,
            "{}",
            ui::style_text("Type 'help' for commands", ui::StyleType::Subtle)
        )?;

        loop {
            write!(out, "> ")?;
            out.flush()?;

            tokio::select! {
                biased;
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<ShellCommand>() {
                        Ok(command) => {
                            if !self.execute(command, out)? {
                                break;
                            }
                        }
                        Err(message) => {
                            writeln!(out, "{}", ui::style_text(&message, ui::StyleType::Error))?
                        }
                    }
                }
                Ok(()) = status_rx.changed() => {
                    let status = status_rx.borrow_and_update().clone();
                    if !status.loading {
                        writeln!(out, "\n{}", describe_status(&status))?;
                    }
                }
            }
        }

        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::tests::MockQuoteSource;
    use crate::core::{FetchError, RateProvider};

    #[test]
    fn test_command_parsing() {
        assert_eq!(
            "mode currency".parse::<ShellCommand>(),
            Ok(ShellCommand::Mode(ConversionMode::Currency))
        );
        assert_eq!(
            "a 10".parse::<ShellCommand>(),
            Ok(ShellCommand::Convert(
                ConversionDirection::Forward,
                "10".to_string()
            ))
        );
        assert_eq!(
            "  reverse   -40 ".parse::<ShellCommand>(),
            Ok(ShellCommand::Convert(
                ConversionDirection::Reverse,
                "-40".to_string()
            ))
        );
        assert_eq!("QUIT".parse::<ShellCommand>(), Ok(ShellCommand::Quit));
        assert!("mode length".parse::<ShellCommand>().is_err());
        assert!(
            "convert 10"
                .parse::<ShellCommand>()
                .unwrap_err()
                .contains("Unknown command: convert")
        );
    }

    #[test]
    fn test_describe_status() {
        assert_eq!(
            describe_status(&RateStatus::default()),
            "Exchange rate not available"
        );
        let failed = RateStatus {
            last_error: Some(FetchError::Status("502 Bad Gateway".to_string())),
            ..Default::default()
        };
        assert_eq!(
            describe_status(&failed),
            "Failed to fetch exchange rate: HTTP error: 502 Bad Gateway"
        );
        let loading = RateStatus {
            loading: true,
            ..Default::default()
        };
        assert_eq!(describe_status(&loading), "Fetching exchange rate...");
    }

    #[tokio::test]
    async fn test_session_transcript() {
        let converter = Converter::new(RateProvider::new(MockQuoteSource::new(vec![Ok(5.0)])));
        converter.rates().refresh().await.unwrap();

        let input: &[u8] =
            b"a 100\nb abc\nfoo\nmode currency\nb 10\na 50,00\nrate\nquit\na 1\n";
        let mut out = Vec::new();
        let mut shell = Shell::new(&converter);
        shell.run(input, &mut out).await.unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("100.00°C = 212.00°F"));
        assert!(transcript.contains("'abc' is not a valid number"));
        assert!(transcript.contains("Unknown command: foo"));
        assert!(transcript.contains("US$ 10.00 = R$ 50.00"));
        assert!(transcript.contains("R$ 50.00 = US$ 10.00"));
        assert!(transcript.contains("1 USD = R$ 5.00"));
        assert!(!transcript.contains("R$ 1.00"));
        assert_eq!(shell.mode(), ConversionMode::Currency);
    }

    #[tokio::test]
    async fn test_currency_mode_fetches_missing_rate() {
        let source = MockQuoteSource::new(vec![Ok(5.0)]);
        let converter = Converter::new(RateProvider::new(source.clone()));
        let mut rx = converter.rates().subscribe();
        let mut shell = Shell::new(&converter);
        let mut out = Vec::new();

        shell
            .execute(ShellCommand::Mode(ConversionMode::Currency), &mut out)
            .unwrap();
        shell
            .execute(
                ShellCommand::Convert(ConversionDirection::Reverse, "10".to_string()),
                &mut out,
            )
            .unwrap();

        rx.wait_for(|s| s.rate.is_some()).await.unwrap();
        shell
            .execute(
                ShellCommand::Convert(ConversionDirection::Reverse, "10".to_string()),
                &mut out,
            )
            .unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Try again shortly"));
        assert!(transcript.contains("US$ 10.00 = R$ 50.00"));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_temperature_works_when_fetch_fails() {
        let converter = Converter::new(RateProvider::new(MockQuoteSource::new(vec![Err(
            FetchError::Transport("offline".to_string()),
        )])));
        let mut shell = Shell::new(&converter);
        let mut out = Vec::new();

        assert!(shell.execute(ShellCommand::Rate, &mut out).unwrap());
        shell
            .execute(
                ShellCommand::Convert(ConversionDirection::Forward, "0".to_string()),
                &mut out,
            )
            .unwrap();
        assert!(!shell.execute(ShellCommand::Quit, &mut out).unwrap());

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Exchange rate not available"));
        assert!(transcript.contains("0.00°C = 32.00°F"));
    }
}
