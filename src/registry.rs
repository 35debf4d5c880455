// 📇 Vehicle Registry - in-memory owner of every live record
//
// Identity: ids come from a counter that only ever moves forward, so an id
// is never handed out twice in one process, even across remove and reload.
// Once the counter passes the largest id it stays exhausted and adds fail.
// Reads hand out clones; nothing outside the registry holds a record.

use log::debug;
use std::collections::{HashMap, HashSet};

use crate::error::{InventoryError, Result, ValidationError};
use crate::vehicle::{NewVehicle, Vehicle, VehicleId, VehicleUpdate};

/// First id handed out by an empty registry
pub const FIRST_ID: VehicleId = 1;

// ============================================================================
// VEHICLE REGISTRY
// ============================================================================

#[derive(Debug, Clone)]
pub struct VehicleRegistry {
    /// Live records by id
    records: HashMap<VehicleId, Vehicle>,

    /// Ids in insertion (or file) order
    order: Vec<VehicleId>,

    /// Next id to assign; `None` once every id has been used
    next_id: Option<VehicleId>,
}

impl VehicleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        VehicleRegistry {
            records: HashMap::new(),
            order: Vec::new(),
            next_id: Some(FIRST_ID),
        }
    }

    /// Validate and store a new vehicle, returning its id
    pub fn add(&mut self, vehicle: NewVehicle) -> Result<VehicleId> {
        vehicle.validate()?;

        let id = self.allocate_id()?;
        self.insert(vehicle.with_id(id));

        debug!("added vehicle {}", id);
        Ok(id)
    }

    /// All live records in insertion order
    pub fn list(&self) -> Vec<Vehicle> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .cloned()
            .collect()
    }

    /// Independent copy of one record
    pub fn get(&self, id: VehicleId) -> Result<Vehicle> {
        self.records
            .get(&id)
            .cloned()
            .ok_or(InventoryError::NotFound { id })
    }

    /// Apply a partial update - all or nothing
    pub fn update(&mut self, id: VehicleId, update: &VehicleUpdate) -> Result<()> {
        let current = self
            .records
            .get(&id)
            .ok_or(InventoryError::NotFound { id })?;

        let next = current.merged(update);
        next.validate()?;

        self.records.insert(id, next);
        debug!("updated vehicle {}", id);
        Ok(())
    }

    /// Delete a record; its id stays retired
    pub fn remove(&mut self, id: VehicleId) -> Result<()> {
        if self.records.remove(&id).is_none() {
            return Err(InventoryError::NotFound { id });
        }
        self.order.retain(|existing| *existing != id);

        debug!("removed vehicle {}", id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id the next `add` will assign
    pub fn next_id(&self) -> Option<VehicleId> {
        self.next_id
    }

    // ========================================================================
    // RELOAD
    // ========================================================================

    /// Replace every record with a loaded snapshot, keeping its ids and order
    ///
    /// The counter becomes `max(next_id, max loaded id + 1)` so ids retired
    /// earlier in this process are not handed out again.
    pub fn replace_all(&mut self, snapshot: Vec<Vehicle>) -> Result<()> {
        let mut seen = HashSet::new();
        for vehicle in &snapshot {
            vehicle.validate()?;
            if !seen.insert(vehicle.id) {
                return Err(ValidationError::new(
                    "id",
                    format!("duplicate id {} in snapshot", vehicle.id),
                )
                .into());
            }
        }

        let max_loaded = snapshot.iter().map(|v| v.id).max();

        self.records.clear();
        self.order.clear();
        for vehicle in snapshot {
            self.insert(vehicle);
        }

        if let Some(max_id) = max_loaded {
            self.next_id = match (self.next_id, max_id.checked_add(1)) {
                (Some(next), Some(after_max)) => Some(next.max(after_max)),
                _ => None,
            };
        }

        debug!(
            "registry replaced with {} vehicles, next id {:?}",
            self.records.len(),
            self.next_id
        );
        Ok(())
    }

    /// Merge a loaded snapshot by giving each record a fresh id
    pub fn append_all(&mut self, snapshot: Vec<Vehicle>) -> Result<Vec<VehicleId>> {
        for vehicle in &snapshot {
            vehicle.validate()?;
        }
        if let Some(last) = snapshot.len().checked_sub(1) {
            self.next_id
                .and_then(|next| next.checked_add(last as VehicleId))
                .ok_or_else(ids_exhausted)?;
        }

        let mut ids = Vec::with_capacity(snapshot.len());
        for vehicle in snapshot {
            let id = self.allocate_id()?;
            self.insert(NewVehicle::from(vehicle).with_id(id));
            ids.push(id);
        }

        debug!("appended {} vehicles", ids.len());
        Ok(ids)
    }

    fn allocate_id(&mut self) -> Result<VehicleId> {
        let id = self.next_id.ok_or_else(ids_exhausted)?;
        self.next_id = id.checked_add(1);
        Ok(id)
    }

    fn insert(&mut self, vehicle: Vehicle) {
        self.order.push(vehicle.id);
        self.records.insert(vehicle.id, vehicle);
    }
}

fn ids_exhausted() -> InventoryError {
    ValidationError::new("id", "no unused ids left to assign").into()
}

impl Default for VehicleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
