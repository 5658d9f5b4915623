//! Emitter (tower) bank: placement, upgrades, selling.
//!
//! Emitters live for the session and are mutated only by player commands,
//! never by the simulation tick. The bank owns grid-cell occupancy; path
//! cells and the gold balance belong to the host, which passes its blocked
//! set into `place`.

use crate::archetypes::{EmitterKind, MAX_EMITTER_LEVEL};
use crate::entities::EntityId;
use log::debug;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Identifier for a placed emitter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct EmitterId(pub u32);

/// Why a placement request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("cell is outside the emitter grid")]
    OutOfBounds,
    #[error("cell already holds an emitter")]
    Occupied,
    #[error("cell is blocked by the map")]
    Blocked,
}

/// Why an upgrade/sell request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmitterError {
    #[error("no emitter with that id")]
    UnknownEmitter,
    #[error("emitter is already at max level")]
    MaxLevel,
}

/// One placed emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    pub id: EmitterId,
    pub kind: EmitterKind,
    pub gx: i32,
    pub gy: i32,
    /// World-space center of the grid cell, cached at placement.
    pub x: f32,
    pub y: f32,
    pub level: u8,
    /// Radians; updated by the targeting system when it fires.
    pub aim_angle: f32,
    /// Elapsed-time bank converted into discrete shots.
    pub fire_accum: f32,
    /// Last acquired target, re-validated every tick.
    pub target: Option<EntityId>,
}

/// All emitters plus cell occupancy.
#[derive(Debug)]
pub struct EmitterBank {
    emitters: Vec<Emitter>,
    occupied: HashMap<(i32, i32), EmitterId>,
    next_id: u32,
    grid: (i32, i32),
    cell_size: f32,
}

impl EmitterBank {
    pub fn new(grid: (i32, i32), cell_size: f32) -> Self {
        Self {
            emitters: Vec::new(),
            occupied: HashMap::new(),
            next_id: 0,
            grid,
            cell_size,
        }
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Emitter> {
        self.emitters.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Emitter> {
        self.emitters.iter_mut()
    }

    pub fn get(&self, id: EmitterId) -> Option<&Emitter> {
        self.emitters.iter().find(|e| e.id == id)
    }

    /// Places an emitter at a grid cell. `blocked` is the host's set of
    /// path/obstacle cells.
    pub fn place(
        &mut self,
        kind: EmitterKind,
        gx: i32,
        gy: i32,
        blocked: &HashSet<(i32, i32)>,
    ) -> Result<EmitterId, PlacementError> {
        if gx < 0 || gy < 0 || gx >= self.grid.0 || gy >= self.grid.1 {
            debug!("placement rejected out of bounds at ({gx}, {gy})");
            return Err(PlacementError::OutOfBounds);
        }
        if self.occupied.contains_key(&(gx, gy)) {
            debug!("placement rejected, ({gx}, {gy}) occupied");
            return Err(PlacementError::Occupied);
        }
        if blocked.contains(&(gx, gy)) {
            debug!("placement rejected, ({gx}, {gy}) blocked by map");
            return Err(PlacementError::Blocked);
        }

        let id = EmitterId(self.next_id);
        self.next_id += 1;
        self.emitters.push(Emitter {
            id,
            kind,
            gx,
            gy,
            x: (gx as f32 + 0.5) * self.cell_size,
            y: (gy as f32 + 0.5) * self.cell_size,
            level: 1,
            aim_angle: 0.0,
            fire_accum: 0.0,
            target: None,
        });
        let _ = self.occupied.insert((gx, gy), id);
        Ok(id)
    }

    /// Raises the emitter's level by one. Returns the new level.
    pub fn upgrade(&mut self, id: EmitterId) -> Result<u8, EmitterError> {
        let emitter = self
            .emitters
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(EmitterError::UnknownEmitter)?;
        if emitter.level >= MAX_EMITTER_LEVEL {
            return Err(EmitterError::MaxLevel);
        }
        emitter.level += 1;
        Ok(emitter.level)
    }

    /// Removes the emitter and frees its cell.
    pub fn sell(&mut self, id: EmitterId) -> Result<Emitter, EmitterError> {
        let index = self
            .emitters
            .iter()
            .position(|e| e.id == id)
            .ok_or(EmitterError::UnknownEmitter)?;
        let emitter = self.emitters.remove(index);
        let _ = self.occupied.remove(&(emitter.gx, emitter.gy));
        Ok(emitter)
    }
}
