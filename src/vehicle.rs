// 🚗 Vehicle Record - the single entity of the inventory
//
// Identity: `id` assigned by the registry, never reused
// Values: year, make, model, price, transmission (can be updated)
//
// Validation lives here and only here. The registry calls it on add,
// update and reload; the gateway calls it for every decoded line.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Year of the first automobile - nothing older can be registered
pub const FIRST_AUTOMOBILE_YEAR: i32 = 1886;

pub type VehicleId = u64;

// ============================================================================
// VEHICLE
// ============================================================================

/// A stored vehicle
///
/// Field order is the column order of the inventory file:
/// `id,year,make,model,price,is_automatic`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub price: f64,
    /// None means the transmission is unknown
    pub is_automatic: Option<bool>,
}

impl Vehicle {
    /// Check every record invariant, reporting the first violated field
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(self.year, &self.make, &self.model, self.price)
    }

    /// Human readable transmission label
    pub fn transmission(&self) -> &'static str {
        transmission_label(self.is_automatic)
    }

    /// Merge a partial update into a copy of this record (not validated)
    pub fn merged(&self, update: &VehicleUpdate) -> Vehicle {
        let mut next = self.clone();
        if let Some(year) = update.year {
            next.year = year;
        }
        if let Some(make) = &update.make {
            next.make = make.clone();
        }
        if let Some(model) = &update.model {
            next.model = model.clone();
        }
        if let Some(price) = update.price {
            next.price = price;
        }
        if let Some(is_automatic) = update.is_automatic {
            next.is_automatic = is_automatic;
        }
        next
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} {} - ${:.2} ({})",
            self.id,
            self.year,
            self.make,
            self.model,
            self.price,
            self.transmission()
        )
    }
}

pub fn transmission_label(is_automatic: Option<bool>) -> &'static str {
    match is_automatic {
        Some(true) => "automatic",
        Some(false) => "manual",
        None => "unknown",
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Field values for a vehicle that has no id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehicle {
    pub year: i32,
    pub make: String,
    pub model: String,
    pub price: f64,
    pub is_automatic: Option<bool>,
}

impl NewVehicle {
    pub fn new(
        year: i32,
        make: impl Into<String>,
        model: impl Into<String>,
        price: f64,
        is_automatic: Option<bool>,
    ) -> Self {
        NewVehicle {
            year,
            make: make.into(),
            model: model.into(),
            price,
            is_automatic,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(self.year, &self.make, &self.model, self.price)
    }

    pub(crate) fn with_id(self, id: VehicleId) -> Vehicle {
        Vehicle {
            id,
            year: self.year,
            make: self.make,
            model: self.model,
            price: self.price,
            is_automatic: self.is_automatic,
        }
    }
}

impl From<Vehicle> for NewVehicle {
    fn from(vehicle: Vehicle) -> Self {
        NewVehicle {
            year: vehicle.year,
            make: vehicle.make,
            model: vehicle.model,
            price: vehicle.price,
            is_automatic: vehicle.is_automatic,
        }
    }
}

/// Partial field replacement - `None` keeps the current value
///
/// `is_automatic` is doubly optional: `Some(None)` clears it to unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleUpdate {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub price: Option<f64>,
    pub is_automatic: Option<Option<bool>>,
}

impl VehicleUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn make(mut self, make: impl Into<String>) -> Self {
        self.make = Some(make.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn is_automatic(mut self, is_automatic: Option<bool>) -> Self {
        self.is_automatic = Some(is_automatic);
        self
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.make.is_none()
            && self.model.is_none()
            && self.price.is_none()
            && self.is_automatic.is_none()
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Check fields in the order year, make, model, price
pub fn validate(year: i32, make: &str, model: &str, price: f64) -> Result<(), ValidationError> {
    if year < FIRST_AUTOMOBILE_YEAR {
        return Err(ValidationError::new(
            "year",
            format!("must be {} or later, got {}", FIRST_AUTOMOBILE_YEAR, year),
        ));
    }

    if make.trim().is_empty() {
        return Err(ValidationError::new("make", "must not be empty"));
    }

    if model.trim().is_empty() {
        return Err(ValidationError::new("model", "must not be empty"));
    }

    // NaN fails both comparisons, so check finiteness explicitly
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::new(
            "price",
            format!("must be a non-negative amount, got {}", price),
        ));
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
