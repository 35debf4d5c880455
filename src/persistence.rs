// 💾 Persistence Gateway - registry snapshot <-> CSV file
//
// Format: no header, one record per line, columns
//   id,year,make,model,price,is_automatic
// Text is quoted when it holds a comma, quote or newline ("" is a literal
// quote). Unknown transmission is an empty field. Blank lines are skipped.
//
// Save builds the whole file in memory, writes it to a temp file next to
// the destination and renames it into place, so a failed save never leaves
// a half-written inventory behind. An existing file keeps its permissions.

use clap::ValueEnum;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{InventoryError, Result};
use crate::vehicle::{Vehicle, VehicleId};

/// Column order of the inventory file
pub const COLUMNS: [&str; 6] = ["id", "year", "make", "model", "price", "is_automatic"];

// ============================================================================
// BAD LINE POLICY
// ============================================================================

/// What a load does with a line that does not decode into a valid record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BadLinePolicy {
    /// Fail the whole load on the first bad line
    #[default]
    Abort,
    /// Leave bad lines out and report them
    Skip,
}

impl BadLinePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadLinePolicy::Abort => "abort",
            BadLinePolicy::Skip => "skip",
        }
    }
}

/// Result of a load that may have skipped lines
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Decoded records in file order
    pub vehicles: Vec<Vehicle>,
    /// One `InventoryError::Parse` per skipped line
    pub skipped: Vec<InventoryError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

// ============================================================================
// SAVE
// ============================================================================

/// Write a snapshot to `destination`, replacing any existing file
pub fn save(snapshot: &[Vehicle], destination: &Path) -> Result<()> {
    let buffer = encode(snapshot).map_err(|err| {
        InventoryError::io(destination, io::Error::new(io::ErrorKind::Other, err))
    })?;

    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| InventoryError::io(destination, err))?;
    if let Ok(existing) = fs::metadata(destination) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(|err| InventoryError::io(destination, err))?;
    }
    tmp.write_all(&buffer)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|err| InventoryError::io(destination, err))?;
    tmp.persist(destination)
        .map_err(|err| InventoryError::io(destination, err.error))?;

    info!(
        "saved {} vehicles to {}",
        snapshot.len(),
        destination.display()
    );
    Ok(())
}

/// Serialize a snapshot into the file format
pub fn encode(snapshot: &[Vehicle]) -> std::result::Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    for vehicle in snapshot {
        wtr.serialize(vehicle)?;
    }

    wtr.into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}

// ============================================================================
// LOAD
// ============================================================================

/// Read every record, failing on the first bad line
pub fn load(source: &Path) -> Result<Vec<Vehicle>> {
    load_with(source, BadLinePolicy::Abort).map(|report| report.vehicles)
}

/// Read every good record and report the bad lines
pub fn load_lenient(source: &Path) -> Result<LoadReport> {
    load_with(source, BadLinePolicy::Skip)
}

pub fn load_with(source: &Path, policy: BadLinePolicy) -> Result<LoadReport> {
    let file = File::open(source).map_err(|err| InventoryError::io(source, err))?;
    let report = decode(file, source, policy)?;

    info!(
        "loaded {} vehicles from {} ({} bad lines skipped)",
        report.vehicles.len(),
        source.display(),
        report.skipped.len()
    );
    Ok(report)
}

/// Decode file contents; `source` is only used to label I/O errors
pub fn decode<R: Read>(mut reader: R, source: &Path, policy: BadLinePolicy) -> Result<LoadReport> {
    let mut contents = Vec::new();
    reader
        .read_to_end(&mut contents)
        .map_err(|err| InventoryError::io(source, err))?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(contents.as_slice());

    let mut lines = LineCounter::new(&contents);
    let mut report = LoadReport::default();
    let mut seen: HashSet<VehicleId> = HashSet::new();
    let mut record = csv::StringRecord::new();

    loop {
        let outcome = match rdr.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let line = record.position().map(|pos| lines.line_at(pos.byte())).unwrap_or(0);
                decode_record(&record, line, &seen)
            }
            Err(err) => {
                let line = err.position().map(|pos| lines.line_at(pos.byte())).unwrap_or(0);
                let message = describe(&err);
                if let csv::ErrorKind::Io(io_err) = err.into_kind() {
                    return Err(InventoryError::io(source, io_err));
                }
                Err(InventoryError::parse(line, message))
            }
        };

        match outcome {
            Ok(vehicle) => {
                seen.insert(vehicle.id);
                report.vehicles.push(vehicle);
            }
            Err(err) => match policy {
                BadLinePolicy::Abort => return Err(err),
                BadLinePolicy::Skip => {
                    warn!("skipping bad line in {}: {}", source.display(), err);
                    report.skipped.push(err);
                }
            },
        }
    }

    Ok(report)
}

/// Physical line numbers for record offsets
///
/// The csv reader positions a record at the end of the previous one, before
/// any blank lines it skipped, and does not count those lines. Offsets must
/// be asked for in increasing order.
struct LineCounter<'a> {
    contents: &'a [u8],
    offset: usize,
    line: u64,
}

impl<'a> LineCounter<'a> {
    fn new(contents: &'a [u8]) -> Self {
        LineCounter {
            contents,
            offset: 0,
            line: 1,
        }
    }

    /// 1-based line of the first non-blank byte at or after `byte`
    fn line_at(&mut self, byte: u64) -> u64 {
        let len = self.contents.len();
        let mut target = usize::try_from(byte).unwrap_or(len).min(len).max(self.offset);
        while target < len && matches!(self.contents[target], b'\r' | b'\n') {
            target += 1;
        }

        let newlines = self.contents[self.offset..target]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.line += newlines as u64;
        self.offset = target;
        self.line
    }
}

fn decode_record(
    record: &csv::StringRecord,
    line: u64,
    seen: &HashSet<VehicleId>,
) -> Result<Vehicle> {
    if record.len() != COLUMNS.len() {
        return Err(InventoryError::parse(
            line,
            format!("expected {} columns, found {}", COLUMNS.len(), record.len()),
        ));
    }

    let vehicle: Vehicle = record
        .deserialize(None)
        .map_err(|err| InventoryError::parse(line, describe(&err)))?;

    vehicle
        .validate()
        .map_err(|err| InventoryError::parse(line, format!("invalid {}", err)))?;

    if seen.contains(&vehicle.id) {
        return Err(InventoryError::parse(
            line,
            format!("duplicate id {}", vehicle.id),
        ));
    }

    Ok(vehicle)
}

/// Name the column when the failure is about one field
fn describe(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Utf8 { err: utf8, .. } => format!(
            "column `{}`: invalid UTF-8",
            COLUMNS.get(utf8.field()).copied().unwrap_or("?")
        ),
        csv::ErrorKind::Deserialize { err: de, .. } => match de.field() {
            Some(index) => format!(
                "column `{}`: {}",
                COLUMNS.get(index as usize).copied().unwrap_or("?"),
                de.kind()
            ),
            None => de.kind().to_string(),
        },
        _ => err.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn vehicle(id: VehicleId, make: &str, model: &str, is_automatic: Option<bool>) -> Vehicle {
        Vehicle {
            id,
            year: 2020,
            make: make.to_string(),
            model: model.to_string(),
            price: 25000.0,
            is_automatic,
        }
    }

    fn decode_str(contents: &str, policy: BadLinePolicy) -> Result<LoadReport> {
        decode(contents.as_bytes(), Path::new("test.csv"), policy)
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");

        let snapshot = vec![
            vehicle(1, "Toyota", "Corolla", Some(true)),
            vehicle(3, "Rolls, Royce", "\"Phantom\"", None),
            vehicle(2, "Lada", "Niva\n4x4", Some(false)),
        ];
        save(&snapshot, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded[1].is_automatic, None);
    }

    #[test]
    fn test_fractional_price_round_trips_exactly() {
        let mut odd = vehicle(1, "Fiat", "Panda", None);
        odd.price = 0.1 + 0.2;

        let buffer = encode(&[odd.clone()]).unwrap();
        let report = decode(buffer.as_slice(), Path::new("mem"), BadLinePolicy::Abort).unwrap();
        assert_eq!(report.vehicles, vec![odd]);
    }

    #[test]
    fn test_file_format() {
        let buffer = encode(&[
            vehicle(1, "Toyota", "Corolla", Some(true)),
            vehicle(2, "Rolls, Royce", "\"Phantom\"", None),
        ])
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(
            text,
            "1,2020,Toyota,Corolla,25000.0,true\n2,2020,\"Rolls, Royce\",\"\"\"Phantom\"\"\",25000.0,\n"
        );
    }

    #[test]
    fn test_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        save(&[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        fs::write(&path, "stale contents that are not csv records at all\n").unwrap();

        save(&[vehicle(1, "Toyota", "Corolla", Some(true))], &path).unwrap();
        assert_eq!(load(&path).unwrap().len(), 1);

        // No temp files left beside the destination
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_to_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("vehicles.csv");

        let err = save(&[vehicle(1, "Toyota", "Corolla", None)], &path).unwrap_err();
        assert!(matches!(err, InventoryError::Io { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, InventoryError::Io { .. }));
    }

    #[test]
    fn test_malformed_line_names_line_number() {
        let contents = "1,2020,Toyota,Corolla,25000.0,true\n\
                        2,twenty,Ford,Focus,9000.0,\n\
                        3,2019,Mazda,3,12000.0,false\n";

        let err = decode_str(contents, BadLinePolicy::Abort).unwrap_err();
        match err {
            InventoryError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("year"), "message was: {}", message);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_lenient_load_skips_and_reports() {
        let contents = "1,2020,Toyota,Corolla,25000.0,true\n\
                        2,1850,Ford,Focus,9000.0,\n\
                        3,2019,Mazda,3,12000.0,false\n";

        let report = decode_str(contents, BadLinePolicy::Skip).unwrap();
        let ids: Vec<VehicleId> = report.vehicles.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0], InventoryError::Parse { line: 2, .. }));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_wrong_column_count() {
        let err = decode_str("1,2020,Toyota\n", BadLinePolicy::Abort).unwrap_err();
        assert_eq!(err.to_string(), "line 1: expected 6 columns, found 3");
    }

    #[test]
    fn test_bad_transmission_value() {
        let err = decode_str("1,2020,Toyota,Corolla,1.0,yes\n", BadLinePolicy::Abort).unwrap_err();
        match err {
            InventoryError::Parse { line: 1, message } => {
                assert!(message.contains("is_automatic"), "message was: {}", message)
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_invariants_checked_on_load() {
        for contents in [
            "1,2020,,Corolla,1.0,\n",
            "1,2020,Toyota,   ,1.0,\n",
            "1,2020,Toyota,Corolla,-3.5,\n",
        ] {
            let err = decode_str(contents, BadLinePolicy::Abort).unwrap_err();
            assert!(matches!(err, InventoryError::Parse { line: 1, .. }));
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let contents = "4,2020,Toyota,Corolla,1.0,\n4,2021,Honda,Jazz,2.0,\n";
        let err = decode_str(contents, BadLinePolicy::Abort).unwrap_err();
        assert_eq!(err.to_string(), "line 2: duplicate id 4");
    }

    #[test]
    fn test_blank_lines_ignored() {
        let contents = "1,2020,Toyota,Corolla,1.0,\n\n2,2021,Honda,Jazz,2.0,false\n";
        let report = decode_str(contents, BadLinePolicy::Abort).unwrap();
        assert_eq!(report.vehicles.len(), 2);
        assert!(report.is_clean());
    }

    #[test]
    fn test_line_numbers_count_blank_lines() {
        let contents = "1,2020,Toyota,Corolla,1.0,\n\n2,twenty,Ford,Focus,9.0,\n";
        let err = decode_str(contents, BadLinePolicy::Abort).unwrap_err();
        assert!(matches!(err, InventoryError::Parse { line: 3, .. }), "got {:?}", err);

        let contents = "\r\n1,2020,Toyota,Corolla,1.0,\r\n\r\n\r\n2,1700,Ford,Focus,9.0,\r\n";
        let err = decode_str(contents, BadLinePolicy::Abort).unwrap_err();
        assert!(matches!(err, InventoryError::Parse { line: 5, .. }), "got {:?}", err);
    }

    #[test]
    fn test_line_numbers_after_quoted_newline() {
        let contents = "1,2020,Lada,\"Niva\n4x4\",1.0,\n\n2,2021,,Jazz,2.0,\n3,2022,Kia,Rio,-1.0,\n";
        let report = decode_str(contents, BadLinePolicy::Skip).unwrap();
        assert_eq!(report.vehicles.len(), 1);

        let lines: Vec<u64> = report
            .skipped
            .iter()
            .map(|err| match err {
                InventoryError::Parse { line, .. } => *line,
                other => panic!("expected parse error, got {:?}", other),
            })
            .collect();
        assert_eq!(lines, vec![4, 5]);
    }

    #[test]
    fn test_invalid_utf8_names_column_once() {
        let contents: &[u8] = b"1,2020,Toyota,Corolla,1.0,\n2,2021,\xffonda,Jazz,2.0,\n";
        let err = decode(contents, Path::new("test.csv"), BadLinePolicy::Abort).unwrap_err();
        assert_eq!(err.to_string(), "line 2: column `make`: invalid UTF-8");
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        save(&[vehicle(1, "Toyota", "Corolla", Some(true))], &path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
