//! Console command parsing.

/// Text printed by `help`.
pub const HELP: &str = "\
Commands:
  start            open the devices and begin processing
  stop             stop processing and release the devices
  rate <hz>        set the target rate (10-48000 Hz); alias: set <hz>
  <hz>             same as rate <hz>
  status           show state, target rate and divisor
  help             show this message
  quit             stop and exit (also Ctrl+C or end of input)";

/// One console instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Begin processing.
    Start,
    /// Stop processing.
    Stop,
    /// Update the target rate. Range checking is left to the controller.
    SetRate(i64),
    /// Print the current state.
    Status,
    /// Print the command list.
    Help,
    /// Shut down and exit.
    Quit,
}

/// A console line that is not a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    /// First word is not a known command.
    #[error("unknown command '{0}', type 'help' for the list")]
    Unknown(String),

    /// `rate` without a value.
    #[error("missing rate, e.g. 'rate 8000'")]
    MissingRate,

    /// Rate value is not a whole number.
    #[error("'{0}' is not an integer rate")]
    NotAnInteger(String),

    /// Extra words after a complete command.
    #[error("unexpected '{0}' after command")]
    Trailing(String),
}

/// Parse one console line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ControlCommand>, ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "start" => ControlCommand::Start,
        "stop" => ControlCommand::Stop,
        "rate" | "set" => {
            let value = words.next().ok_or(ConsoleError::MissingRate)?;
            ControlCommand::SetRate(parse_rate(value)?)
        }
        "status" => ControlCommand::Status,
        "help" | "?" => ControlCommand::Help,
        "quit" | "exit" | "q" => ControlCommand::Quit,
        _ if looks_numeric(head) => ControlCommand::SetRate(parse_rate(head)?),
        _ => return Err(ConsoleError::Unknown(head.to_string())),
    };

    match words.next() {
        Some(extra) => Err(ConsoleError::Trailing(extra.to_string())),
        None => Ok(Some(command)),
    }
}

fn parse_rate(value: &str) -> Result<i64, ConsoleError> {
    value
        .parse()
        .map_err(|_| ConsoleError::NotAnInteger(value.to_string()))
}

fn looks_numeric(word: &str) -> bool {
    word.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
}
