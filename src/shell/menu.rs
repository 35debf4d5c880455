//! Main menu - a closed set of actions selected by number

use std::fmt;
use std::io::{self, Write};

const MENU_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Exit,
    AddVehicle,
    ListVehicles,
    VehicleDetail,
    UpdateVehicle,
    RemoveVehicle,
    SaveToFile,
    LoadFromFile,
}

impl MenuChoice {
    /// Display order of the menu (exit last, as printed)
    pub const ALL: [MenuChoice; 8] = [
        MenuChoice::AddVehicle,
        MenuChoice::ListVehicles,
        MenuChoice::VehicleDetail,
        MenuChoice::UpdateVehicle,
        MenuChoice::RemoveVehicle,
        MenuChoice::SaveToFile,
        MenuChoice::LoadFromFile,
        MenuChoice::Exit,
    ];

    pub fn number(&self) -> i64 {
        match self {
            MenuChoice::Exit => 0,
            MenuChoice::AddVehicle => 1,
            MenuChoice::ListVehicles => 2,
            MenuChoice::VehicleDetail => 3,
            MenuChoice::UpdateVehicle => 4,
            MenuChoice::RemoveVehicle => 5,
            MenuChoice::SaveToFile => 6,
            MenuChoice::LoadFromFile => 7,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::Exit => "Exit",
            MenuChoice::AddVehicle => "Add vehicles",
            MenuChoice::ListVehicles => "List vehicles",
            MenuChoice::VehicleDetail => "Get vehicle details",
            MenuChoice::UpdateVehicle => "Update vehicles",
            MenuChoice::RemoveVehicle => "Remove vehicles",
            MenuChoice::SaveToFile => "Save vehicles to file",
            MenuChoice::LoadFromFile => "Load vehicles from file",
        }
    }
}

impl TryFrom<i64> for MenuChoice {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        MenuChoice::ALL
            .iter()
            .copied()
            .find(|choice| choice.number() == value)
            .ok_or(value)
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// Why a line of input is not a menu choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceError {
    Empty,
    NotANumber,
    OutOfRange(i64),
}

impl fmt::Display for ChoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceError::Empty => write!(f, "Input cannot be empty"),
            ChoiceError::NotANumber => write!(f, "Invalid input. Please enter a number"),
            ChoiceError::OutOfRange(n) => {
                write!(f, "Invalid input: {} is not on the menu. Please try again", n)
            }
        }
    }
}

pub fn parse_choice(input: &str) -> Result<MenuChoice, ChoiceError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ChoiceError::Empty);
    }

    let value: i64 = input.parse().map_err(|_| ChoiceError::NotANumber)?;
    MenuChoice::try_from(value).map_err(ChoiceError::OutOfRange)
}

pub fn write_menu<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "*".repeat(MENU_WIDTH))?;
    writeln!(out, "What do you want to do today?")?;
    writeln!(out, "{}", "-".repeat(MENU_WIDTH))?;
    for choice in MenuChoice::ALL {
        writeln!(out, "{} - {}", choice.number(), choice.label())?;
    }
    writeln!(out, "{}", "-".repeat(MENU_WIDTH))
}
