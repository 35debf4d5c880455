// 🖥️ Interactive Shell - numeric menu over the registry and the gateway
//
// One action runs to completion before the next menu. Errors from the
// registry or the gateway are printed and the menu comes back; only a
// failure of the terminal itself ends the session.

pub mod input;
pub mod menu;

use anyhow::Result;
use log::debug;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{InventoryConfig, LoadMode};
use crate::error::InventoryError;
use crate::persistence::{self, BadLinePolicy};
use crate::registry::VehicleRegistry;
use crate::vehicle::{NewVehicle, Vehicle, VehicleUpdate};

use input::{
    keep_or, parse_id, parse_path, parse_price, parse_text, parse_transmission,
    parse_transmission_change, parse_year, Prompter,
};
pub use menu::{parse_choice, ChoiceError, MenuChoice};

/// Whether the menu loop keeps going after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

/// Bail out of a handler when the input stream has ended
macro_rules! or_quit {
    ($read:expr) => {
        match $read? {
            Some(value) => value,
            None => return Ok(Step::Quit),
        }
    };
}

pub struct Shell<R, W> {
    registry: VehicleRegistry,
    config: InventoryConfig,
    io: Prompter<R, W>,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(config: InventoryConfig, input: R, output: W) -> Self {
        Shell {
            registry: VehicleRegistry::new(),
            config,
            io: Prompter::new(input, output),
        }
    }

    pub fn registry(&self) -> &VehicleRegistry {
        &self.registry
    }

    pub fn into_output(self) -> W {
        self.io.into_output()
    }

    /// Menu loop until exit is chosen or input ends
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.io.output(), "Welcome to the Vehicle Management System")?;

        if self.config.autoload {
            self.autoload()?;
        }

        loop {
            menu::write_menu(self.io.output())?;
            let Some(choice) = self.io.read_choice()? else {
                debug!("input closed, leaving shell");
                break;
            };

            if self.dispatch(choice)? == Step::Quit {
                break;
            }
        }

        Ok(())
    }

    pub fn dispatch(&mut self, choice: MenuChoice) -> Result<Step> {
        debug!("menu choice {:?}", choice);
        match choice {
            MenuChoice::Exit => {
                writeln!(self.io.output(), "Thank you for using the Vehicle Management System.")?;
                Ok(Step::Quit)
            }
            MenuChoice::AddVehicle => self.handle_add(),
            MenuChoice::ListVehicles => self.handle_list(),
            MenuChoice::VehicleDetail => self.handle_detail(),
            MenuChoice::UpdateVehicle => self.handle_update(),
            MenuChoice::RemoveVehicle => self.handle_remove(),
            MenuChoice::SaveToFile => self.handle_save(),
            MenuChoice::LoadFromFile => self.handle_load(),
        }
    }

    // ========================================================================
    // HANDLERS
    // ========================================================================

    fn handle_add(&mut self) -> Result<Step> {
        let year = or_quit!(self.io.read_with("Year: ", parse_year));
        let make = or_quit!(self.io.read_with("Make: ", parse_text));
        let model = or_quit!(self.io.read_with("Model: ", parse_text));
        let price = or_quit!(self.io.read_with("Price: ", parse_price));
        let is_automatic = or_quit!(self
            .io
            .read_with("Automatic? (y/n, blank if unknown): ", parse_transmission));

        let vehicle = NewVehicle::new(year, make, model, price, is_automatic);
        match self.registry.add(vehicle) {
            Ok(id) => writeln!(self.io.output(), "✓ Added vehicle #{}", id)?,
            Err(err) => self.report(&err)?,
        }
        Ok(Step::Continue)
    }

    fn handle_list(&mut self) -> Result<Step> {
        let vehicles = self.registry.list();
        let out = self.io.output();

        if vehicles.is_empty() {
            writeln!(out, "No vehicles in inventory.")?;
            return Ok(Step::Continue);
        }

        writeln!(
            out,
            "{:>5}  {:<4}  {:<16} {:<16} {:>12}  {}",
            "ID", "Year", "Make", "Model", "Price", "Transmission"
        )?;
        for vehicle in &vehicles {
            writeln!(
                out,
                "{:>5}  {:<4}  {:<16} {:<16} {:>12.2}  {}",
                vehicle.id,
                vehicle.year,
                vehicle.make,
                vehicle.model,
                vehicle.price,
                vehicle.transmission()
            )?;
        }
        writeln!(out, "{} vehicle(s)", vehicles.len())?;
        Ok(Step::Continue)
    }

    fn handle_detail(&mut self) -> Result<Step> {
        let id = or_quit!(self.io.read_with("Vehicle id: ", parse_id));
        match self.registry.get(id) {
            Ok(vehicle) => write_detail(self.io.output(), &vehicle)?,
            Err(err) => self.report(&err)?,
        }
        Ok(Step::Continue)
    }

    fn handle_update(&mut self) -> Result<Step> {
        let id = or_quit!(self.io.read_with("Vehicle id: ", parse_id));
        let current = match self.registry.get(id) {
            Ok(vehicle) => vehicle,
            Err(err) => {
                self.report(&err)?;
                return Ok(Step::Continue);
            }
        };

        write_detail(self.io.output(), &current)?;
        writeln!(self.io.output(), "Leave a field blank to keep it.")?;

        let update = VehicleUpdate {
            year: or_quit!(self.io.read_with("Year: ", keep_or(parse_year))),
            make: or_quit!(self.io.read_with("Make: ", keep_or(parse_text))),
            model: or_quit!(self.io.read_with("Model: ", keep_or(parse_text))),
            price: or_quit!(self.io.read_with("Price: ", keep_or(parse_price))),
            is_automatic: or_quit!(self
                .io
                .read_with("Automatic? (y/n, - for unknown): ", parse_transmission_change)),
        };

        if update.is_empty() {
            writeln!(self.io.output(), "Nothing to change.")?;
            return Ok(Step::Continue);
        }

        match self.registry.update(id, &update) {
            Ok(()) => writeln!(self.io.output(), "✓ Updated vehicle #{}", id)?,
            Err(err) => self.report(&err)?,
        }
        Ok(Step::Continue)
    }

    fn handle_remove(&mut self) -> Result<Step> {
        let id = or_quit!(self.io.read_with("Vehicle id: ", parse_id));
        match self.registry.remove(id) {
            Ok(()) => writeln!(self.io.output(), "✓ Removed vehicle #{}", id)?,
            Err(err) => self.report(&err)?,
        }
        Ok(Step::Continue)
    }

    fn handle_save(&mut self) -> Result<Step> {
        let path = or_quit!(self.read_path());
        let snapshot = self.registry.list();

        match persistence::save(&snapshot, &path) {
            Ok(()) => writeln!(
                self.io.output(),
                "✓ Saved {} vehicle(s) to {}",
                snapshot.len(),
                path.display()
            )?,
            Err(err) => self.report(&err)?,
        }
        Ok(Step::Continue)
    }

    fn handle_load(&mut self) -> Result<Step> {
        let path = or_quit!(self.read_path());
        self.load_from(&path)?;
        Ok(Step::Continue)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn read_path(&mut self) -> std::io::Result<Option<PathBuf>> {
        let label = format!("File path (blank for {}): ", self.config.data_file.display());
        self.io
            .read_with(&label, parse_path(self.config.data_file.clone()))
    }

    fn autoload(&mut self) -> Result<()> {
        let path = self.config.data_file.clone();
        if path.exists() {
            self.load_from(&path)?;
        } else {
            debug!("autoload skipped, {} does not exist", path.display());
        }
        Ok(())
    }

    /// Load a file and apply it per the configured mode and bad-line policy
    fn load_from(&mut self, path: &Path) -> Result<()> {
        let report = match persistence::load_with(path, self.config.bad_lines) {
            Ok(report) => report,
            Err(err) => {
                self.report(&err)?;
                if self.config.bad_lines == BadLinePolicy::Abort {
                    writeln!(self.io.output(), "Nothing was loaded.")?;
                }
                return Ok(());
            }
        };

        for skipped in &report.skipped {
            writeln!(self.io.output(), "⚠️  skipped {}", skipped)?;
        }

        let count = report.vehicles.len();
        let applied = match self.config.load_mode {
            LoadMode::Replace => self.registry.replace_all(report.vehicles),
            LoadMode::Append => self.registry.append_all(report.vehicles).map(|_| ()),
        };

        match applied {
            Ok(()) => writeln!(
                self.io.output(),
                "✓ Loaded {} vehicle(s) from {} ({})",
                count,
                path.display(),
                self.config.load_mode.as_str()
            )?,
            Err(err) => self.report(&err)?,
        }
        Ok(())
    }

    fn report(&mut self, err: &InventoryError) -> std::io::Result<()> {
        writeln!(self.io.output(), "❌ {}", err)
    }
}

fn write_detail<W: Write>(out: &mut W, vehicle: &Vehicle) -> std::io::Result<()> {
    writeln!(out, "Vehicle #{}", vehicle.id)?;
    writeln!(out, "  Year:         {}", vehicle.year)?;
    writeln!(out, "  Make:         {}", vehicle.make)?;
    writeln!(out, "  Model:        {}", vehicle.model)?;
    writeln!(out, "  Price:        ${:.2}", vehicle.price)?;
    writeln!(out, "  Transmission: {}", vehicle.transmission())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run_script(config: InventoryConfig, script: &str) -> (VehicleRegistry, String) {
        let mut shell = Shell::new(config, script.as_bytes(), Vec::new());
        shell.run().unwrap();
        let registry = shell.registry().clone();
        let output = String::from_utf8(shell.into_output()).unwrap();
        (registry, output)
    }

    fn config_in(dir: &Path) -> InventoryConfig {
        InventoryConfig {
            data_file: dir.join("vehicles.csv"),
            ..InventoryConfig::default()
        }
    }

    #[test]
    fn test_concrete_scenario_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let script = "1\n2020\nToyota\nCorolla\n25000.00\ny\n\
                      1\n1885\nFord\nModel T\n850.00\nn\n\
                      2\n\
                      6\n\n\
                      7\n\n\
                      0\n";
        let (registry, output) = run_script(config, script);

        assert!(output.contains("✓ Added vehicle #1"));
        assert!(output.contains("❌ invalid year"));
        assert!(output.contains("1 vehicle(s)"));
        assert!(output.contains("✓ Saved 1 vehicle(s)"));
        assert!(output.contains("✓ Loaded 1 vehicle(s)"));
        assert!(output.contains("Thank you"));

        let listed = registry.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 1);
        assert_eq!(listed[0].model, "Corolla");
        assert_eq!(listed[0].is_automatic, Some(true));
    }

    #[test]
    fn test_invalid_menu_input_never_exits() {
        let (_, output) = run_script(InventoryConfig::default(), "\nabc\n9\n-1\n2\n0\n");

        assert!(output.contains("Input cannot be empty"));
        assert!(output.contains("9 is not on the menu"));
        assert!(output.contains("No vehicles in inventory."));
        assert!(output.contains("Thank you"));
    }

    #[test]
    fn test_end_of_input_ends_session_quietly() {
        let (registry, output) = run_script(InventoryConfig::default(), "1\n2020\nToy");
        assert!(registry.is_empty());
        assert!(!output.contains("Thank you"));
    }

    #[test]
    fn test_bad_field_input_is_reprompted() {
        let script = "1\nnineteen\n1999\nAudi\nA4\nlots\n4000\nmaybe\n\n2\n0\n";
        let (registry, output) = run_script(InventoryConfig::default(), script);

        assert!(output.contains("'nineteen' is not a whole-number year"));
        assert!(output.contains("'lots' is not a price"));
        assert!(output.contains("'maybe' is not y, n or blank"));

        let vehicle = registry.get(1).unwrap();
        assert_eq!(vehicle.year, 1999);
        assert_eq!(vehicle.price, 4000.0);
        assert_eq!(vehicle.is_automatic, None);
    }

    #[test]
    fn test_detail_update_remove() {
        let script = "1\n2018\nHonda\nCivic\n17000\nn\n\
                      3\n1\n\
                      4\n1\n\n\nType R\n36000\n-\n\
                      3\n1\n\
                      5\n1\n\
                      3\n1\n\
                      5\n1\n\
                      0\n";
        let (registry, output) = run_script(InventoryConfig::default(), script);

        assert!(output.contains("  Model:        Civic"));
        assert!(output.contains("✓ Updated vehicle #1"));
        assert!(output.contains("  Model:        Type R"));
        assert!(output.contains("  Transmission: unknown"));
        assert!(output.contains("✓ Removed vehicle #1"));
        assert_eq!(output.matches("❌ no vehicle with id 1").count(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_update_is_reported_and_not_applied() {
        let script = "1\n2018\nHonda\nCivic\n17000\nn\n\
                      4\n1\n1700\n\n\n\n\n\
                      4\n1\n\n\n\n\n\n\
                      4\n42\n\
                      0\n";
        let (registry, output) = run_script(InventoryConfig::default(), script);

        assert!(output.contains("❌ invalid year"));
        assert!(output.contains("Nothing to change."));
        assert!(output.contains("❌ no vehicle with id 42"));
        assert_eq!(registry.get(1).unwrap().year, 2018);
    }

    #[test]
    fn test_load_abort_reports_line_and_keeps_registry() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(
            &config.data_file,
            "1,2020,Toyota,Corolla,1.0,\nnot,a,vehicle\n",
        )
        .unwrap();

        let script = "1\n2001\nSaab\n9-3\n3000\n\n7\n\n2\n0\n";
        let (registry, output) = run_script(config, script);

        assert!(output.contains("❌ line 2: expected 6 columns, found 3"));
        assert!(output.contains("Nothing was loaded."));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(1).unwrap().make, "Saab");
    }

    #[test]
    fn test_load_skip_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.bad_lines = BadLinePolicy::Skip;
        config.load_mode = LoadMode::Append;
        fs::write(
            &config.data_file,
            "1,2020,Toyota,Corolla,1.0,\nnot,a,vehicle\n7,2019,Mazda,3,2.0,true\n",
        )
        .unwrap();

        let script = "1\n2001\nSaab\n9-3\n3000\n\n7\n\n0\n";
        let (registry, output) = run_script(config, script);

        assert!(output.contains("⚠️  skipped line 2"));
        assert!(output.contains("✓ Loaded 2 vehicle(s)"));
        assert!(output.contains("(append)"));

        let ids: Vec<u64> = registry.list().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_load_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let script = format!("7\n{}\n0\n", dir.path().join("gone.csv").display());
        let (_, output) = run_script(config_in(dir.path()), &script);

        assert!(output.contains("❌ cannot access"));
        assert!(output.contains("Thank you"));
    }

    #[test]
    fn test_autoload_reads_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.autoload = true;
        fs::write(&config.data_file, "5,2020,Toyota,Corolla,1.0,true\n").unwrap();

        let (registry, _) = run_script(config, "1\n2021\nKia\nRio\n100\nn\n0\n");

        // Loaded id 5 moves the counter past it
        let ids: Vec<u64> = registry.list().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![5, 6]);
    }
}
