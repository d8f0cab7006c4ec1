use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// blank line
    Empty,
    /// `x` - stop playback, keep the session
    Stop,
    /// `q` / `quit`
    Quit,
    /// `ll` - show the last results again
    List,
    /// `set range MIN MAX` in minutes
    SetRange { min_minutes: u64, max_minutes: u64 },
    /// `i N`
    Info(usize),
    /// a bare number
    Play(usize),
    Search(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError(String);

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CommandError {}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();

        match line {
            "" => return Ok(Command::Empty),
            "x" => return Ok(Command::Stop),
            "q" | "quit" => return Ok(Command::Quit),
            "ll" => return Ok(Command::List),
            _ => {}
        }

        if line.chars().all(|c| c.is_ascii_digit()) {
            return line
                .parse()
                .map(Command::Play)
                .map_err(|_| CommandError(format!("'{}' is not a track number", line)));
        }

        if let Some(rest) = line.strip_prefix("i ") {
            let index = rest
                .trim()
                .parse()
                .map_err(|_| CommandError("usage: i <track number>".to_string()))?;
            return Ok(Command::Info(index));
        }

        if let Some(rest) = line.strip_prefix("set ") {
            return parse_setting(rest);
        }

        Ok(Command::Search(line.to_string()))
    }
}

fn parse_setting(rest: &str) -> Result<Command, CommandError> {
    let usage = || CommandError("usage: set range <min minutes> <max minutes>".to_string());

    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        ["range", min, max] => {
            let min_minutes: u64 = min.parse().map_err(|_| usage())?;
            let max_minutes: u64 = max.parse().map_err(|_| usage())?;
            if min_minutes > max_minutes {
                return Err(CommandError(format!(
                    "range minimum {} is above maximum {}",
                    min_minutes, max_minutes
                )));
            }
            Ok(Command::SetRange {
                min_minutes,
                max_minutes,
            })
        }
        _ => Err(usage()),
    }
}

pub const HELP: &str = "\
  <text>            search
  <n>               play result n
  x                 stop playback
  q                 quit
  ll                list the last results again
  i <n>             show the description of result n
  set range A B     only find tracks between A and B minutes long";
