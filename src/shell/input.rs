//! Line-based prompting
//!
//! Every read returns `Ok(None)` once the input is exhausted so the shell
//! can end the session instead of spinning on EOF.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use super::menu::{parse_choice, MenuChoice};
use crate::vehicle::VehicleId;

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print a label and read one line (without its line ending)
    pub fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }

    /// Re-prompt until `parse` accepts the line
    pub fn read_with<T, F>(&mut self, label: &str, parse: F) -> io::Result<Option<T>>
    where
        F: Fn(&str) -> Result<T, String>,
    {
        loop {
            let Some(line) = self.prompt(label)? else {
                return Ok(None);
            };
            match parse(&line) {
                Ok(value) => return Ok(Some(value)),
                Err(message) => writeln!(self.output, "{}", message)?,
            }
        }
    }

    /// Read a menu selection; invalid input is reported and re-prompted
    pub fn read_choice(&mut self) -> io::Result<Option<MenuChoice>> {
        self.read_with("Please enter your selection: ", |line| {
            parse_choice(line).map_err(|err| err.to_string())
        })
    }
}

// ============================================================================
// FIELD PARSERS
// ============================================================================

pub fn parse_year(input: &str) -> Result<i32, String> {
    input
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a whole-number year", input.trim()))
}

pub fn parse_price(input: &str) -> Result<f64, String> {
    let cleaned = input.trim().trim_start_matches('$').replace(',', "");
    cleaned
        .parse()
        .map_err(|_| format!("'{}' is not a price", input.trim()))
}

pub fn parse_id(input: &str) -> Result<VehicleId, String> {
    input
        .trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| format!("'{}' is not a vehicle id", input.trim()))
}

/// Free text, kept as typed apart from surrounding whitespace
pub fn parse_text(input: &str) -> Result<String, String> {
    Ok(input.trim().to_string())
}

/// `y` / `n`, blank for unknown
pub fn parse_transmission(input: &str) -> Result<Option<bool>, String> {
    match input.trim().to_lowercase().as_str() {
        "" => Ok(None),
        "y" | "yes" | "true" => Ok(Some(true)),
        "n" | "no" | "false" => Ok(Some(false)),
        other => Err(format!("'{}' is not y, n or blank", other)),
    }
}

/// Blank keeps the current value for any of the update parsers
pub fn keep_or<T>(
    parse: impl Fn(&str) -> Result<T, String>,
) -> impl Fn(&str) -> Result<Option<T>, String> {
    move |input: &str| {
        if input.trim().is_empty() {
            Ok(None)
        } else {
            parse(input).map(Some)
        }
    }
}

/// `y` / `n` / `-` to clear, blank keeps the current value
pub fn parse_transmission_change(input: &str) -> Result<Option<Option<bool>>, String> {
    match input.trim() {
        "" => Ok(None),
        "-" => Ok(Some(None)),
        other => match parse_transmission(other)? {
            Some(value) => Ok(Some(Some(value))),
            None => Ok(None),
        },
    }
}

/// Blank means the configured data file
pub fn parse_path(default: PathBuf) -> impl Fn(&str) -> Result<PathBuf, String> {
    move |input: &str| {
        let input = input.trim();
        if input.is_empty() {
            Ok(default.clone())
        } else {
            Ok(PathBuf::from(input))
        }
    }
}
