//! Operator console: one command per stdin line, standing in for the
//! keyboard and pointer of a browser overlay.

#[cfg(test)]
#[path = "console_test.rs"]
mod console_test;

use overlay::viewport::Point;

pub const HELP: &str = "\
commands:
  c                 toggle configuration mode
  reset             reset every widget layout
  viewport W H      resize the overlay surface
  down X Y          press at pixel (X, Y)
  move X Y          move the pointer
  up X Y            release the pointer
  status            show overlay and connection state
  help              this text
  quit              shut down";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    ToggleConfig,
    Reset,
    Viewport { width: f64, height: f64 },
    Down(Point),
    Move(Point),
    Up(Point),
    Status,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConsoleError {
    #[error("unknown command `{0}`; try `help`")]
    Unknown(String),
    #[error("`{command}` expects {expected} arguments")]
    Arity { command: &'static str, expected: usize },
    #[error("`{0}` is not a number")]
    NotANumber(String),
}

/// Parse one console line. Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args = words.collect::<Vec<_>>();
    let command = match head.to_ascii_lowercase().as_str() {
        "c" => no_args("c", &args, ConsoleCommand::ToggleConfig)?,
        "reset" => no_args("reset", &args, ConsoleCommand::Reset)?,
        "status" => no_args("status", &args, ConsoleCommand::Status)?,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        "viewport" => {
            let (width, height) = two_numbers("viewport", &args)?;
            ConsoleCommand::Viewport { width, height }
        }
        "down" => ConsoleCommand::Down(point("down", &args)?),
        "move" => ConsoleCommand::Move(point("move", &args)?),
        "up" => ConsoleCommand::Up(point("up", &args)?),
        _ => return Err(ConsoleError::Unknown(head.to_owned())),
    };
    Ok(Some(command))
}

fn no_args(command: &'static str, args: &[&str], parsed: ConsoleCommand) -> Result<ConsoleCommand, ConsoleError> {
    if args.is_empty() { Ok(parsed) } else { Err(ConsoleError::Arity { command, expected: 0 }) }
}

fn two_numbers(command: &'static str, args: &[&str]) -> Result<(f64, f64), ConsoleError> {
    let [a, b] = args else {
        return Err(ConsoleError::Arity { command, expected: 2 });
    };
    Ok((number(a)?, number(b)?))
}

fn point(command: &'static str, args: &[&str]) -> Result<Point, ConsoleError> {
    let (x, y) = two_numbers(command, args)?;
    Ok(Point::new(x, y))
}

fn number(text: &str) -> Result<f64, ConsoleError> {
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ConsoleError::NotANumber(text.to_owned()))
}
