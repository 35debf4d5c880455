// Vehicle Inventory - Core Library
// Exposes the registry, the file gateway and the shell for the CLI and tests

pub mod config;
pub mod error;
pub mod persistence;
pub mod registry;
pub mod shell;
pub mod vehicle;

// Re-export commonly used types
pub use config::{ConfigOverrides, InventoryConfig, LoadMode, DEFAULT_DATA_FILE};
pub use error::{InventoryError, Result, ValidationError};
pub use persistence::{
    load, load_lenient, load_with, save,
    BadLinePolicy, LoadReport, COLUMNS,
};
pub use registry::{VehicleRegistry, FIRST_ID};
pub use shell::{MenuChoice, Shell, Step};
pub use vehicle::{
    NewVehicle, Vehicle, VehicleId, VehicleUpdate,
    FIRST_AUTOMOBILE_YEAR,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
