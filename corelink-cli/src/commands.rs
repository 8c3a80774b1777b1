use std::{fmt::Display, time::Duration};

use anyhow::{Context, bail};

/// Runtime commands of the networking core, one per input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetReportingInterval(Duration),
    DemoMode(bool),
    BoardUserLed(bool),
}

impl Command {
    pub fn try_from_str(line: &str) -> anyhow::Result<Command> {
        let line = line.trim();
        let (name, argument) = match line.split_once(' ') {
            Some((name, argument)) => (name, Some(argument.trim())),
            None => (line, None),
        };

        match name {
            "set-reporting-interval" => {
                let argument = argument.context("Command requires an argument")?;
                let ms: u64 = argument.parse().context("Argument parsing error")?;
                if ms == 0 {
                    bail!("Reporting interval must be positive");
                }
                Ok(Command::SetReportingInterval(Duration::from_millis(ms)))
            }
            "demo-mode" => Ok(Command::DemoMode(parse_on_off(argument)?)),
            "board-user-led" => Ok(Command::BoardUserLed(parse_on_off(argument)?)),
            "" => bail!("Parsing error"),
            _ => bail!("Unknown command \"{name}\""),
        }
    }
}

fn parse_on_off(argument: Option<&str>) -> anyhow::Result<bool> {
    match argument {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        Some(other) => bail!("Expected \"on\" or \"off\", got \"{other}\""),
        None => bail!("Command requires an argument"),
    }
}

/// Outcome reported back for every command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAck {
    pub success: bool,
    pub message: String,
}

impl Display for CommandAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "Command status is {status}. Message: {}", self.message)
    }
}

/// Settings of the networking application that commands may change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub reporting_interval: Duration,
    pub demo_mode: bool,
    pub user_led: bool,
    /// Fixed message limit from the command line, overrides the mode dependent one
    pub max_messages_override: Option<u32>,
}

impl AppSettings {
    pub const MAX_MESSAGES: u32 = 300;
    pub const MAX_MESSAGES_DEMO: u32 = 6000;

    pub fn max_messages(&self) -> u32 {
        match self.max_messages_override {
            Some(max) => max,
            None if self.demo_mode => Self::MAX_MESSAGES_DEMO,
            None => Self::MAX_MESSAGES,
        }
    }

    pub fn apply(&mut self, command: Command) -> String {
        match command {
            Command::SetReportingInterval(interval) => {
                self.reporting_interval = interval;
                format!("Reporting interval set to {} ms", interval.as_millis())
            }
            Command::DemoMode(on) => {
                self.demo_mode = on;
                format!("Demo mode is now {}", on_off(on))
            }
            Command::BoardUserLed(on) => {
                self.user_led = on;
                format!("User LED is now {}", on_off(on))
            }
        }
    }

    /// Parses and applies one input line
    pub fn handle_line(&mut self, line: &str) -> CommandAck {
        match Command::try_from_str(line) {
            Ok(command) => CommandAck {
                success: true,
                message: self.apply(command),
            },
            Err(e) => CommandAck {
                success: false,
                message: format!("{e:#}"),
            },
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AppSettings {
        AppSettings {
            reporting_interval: Duration::from_millis(2000),
            demo_mode: false,
            user_led: false,
            max_messages_override: None,
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::try_from_str("set-reporting-interval 500").unwrap(),
            Command::SetReportingInterval(Duration::from_millis(500))
        );
        assert_eq!(
            Command::try_from_str("demo-mode on\n").unwrap(),
            Command::DemoMode(true)
        );
        assert_eq!(
            Command::try_from_str("board-user-led off").unwrap(),
            Command::BoardUserLed(false)
        );
    }

    #[test]
    fn test_rejects_bad_commands() {
        for line in [
            "set-reporting-interval",
            "set-reporting-interval 0",
            "set-reporting-interval soon",
            "demo-mode",
            "demo-mode maybe",
            "reboot",
            "",
        ] {
            assert!(Command::try_from_str(line).is_err(), "line {line:?} must fail");
        }
    }

    #[test]
    fn test_handle_line_acks() {
        let mut settings = settings();

        let ack = settings.handle_line("set-reporting-interval 250");
        assert!(ack.success);
        assert_eq!(settings.reporting_interval, Duration::from_millis(250));

        let ack = settings.handle_line("board-user-led blink");
        assert!(!ack.success);
        assert!(ack.message.contains("blink"), "message: {}", ack.message);
        assert!(!settings.user_led);
    }

    #[test]
    fn test_demo_mode_raises_message_limit() {
        let mut settings = settings();
        assert_eq!(settings.max_messages(), 300);

        settings.handle_line("demo-mode on");
        assert_eq!(settings.max_messages(), 6000);

        settings.max_messages_override = Some(3);
        assert_eq!(settings.max_messages(), 3);
    }
}
