//! Block registry: maps compact [`BlockId`] values to per-face textures and solidity.
//!
//! The registry is built once at startup and shared read-only between meshing
//! workers. Id 0 is always empty space and id 255 is the chunk-edge sentinel;
//! neither can be registered.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compact identifier stored inside every chunk cell (1 byte).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct BlockId(pub u8);

impl BlockId {
    /// Empty space.
    pub const EMPTY: Self = Self(0);
    pub const DIRT: Self = Self(1);
    pub const DIRT_GRASS: Self = Self(2);
    pub const GRASS: Self = Self(3);
    pub const GRAVEL: Self = Self(4);
    pub const ROCK: Self = Self(5);
    pub const WATER: Self = Self(6);
    pub const SAND: Self = Self(7);
    pub const GRASS_SHORT: Self = Self(8);
    /// Placeholder for cells outside any loaded chunk. Present but never solid.
    pub const CHUNK_EDGE: Self = Self(255);

    /// Returns `true` for [`BlockId::EMPTY`].
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// How a block is turned into geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockShape {
    /// Full cube, one face per exposed side.
    #[default]
    Cube,
    /// Water-like volume: only the top surface is drawn, without occlusion,
    /// and it goes to the translucent buffer.
    Liquid,
    /// Foliage drawn as two crossed double-sided quads.
    Cross,
}

/// Immutable description of one block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    pub id: BlockId,
    /// Human-readable name (e.g. "dirt", "water").
    pub name: String,
    /// Texture index per face in the order up, front, left, back, right, down.
    pub texture_ids: [u8; 6],
    /// Whether the block hides the faces of its neighbours.
    pub solid: bool,
    pub shape: BlockShape,
}

impl BlockDef {
    /// Convenience constructor for a solid cube.
    pub fn cube(id: BlockId, name: &str, texture_ids: [u8; 6]) -> Self {
        Self {
            id,
            name: name.to_string(),
            texture_ids,
            solid: true,
            shape: BlockShape::Cube,
        }
    }

    /// Texture for the face with the given index (0 = up ... 5 = down).
    #[inline]
    pub fn texture(&self, face: usize) -> u8 {
        self.texture_ids[face]
    }
}

/// Errors that can occur during block registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A block with the same name has already been registered.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// The id slot is already taken by another block.
    #[error("block id {0} is already registered")]
    DuplicateId(u8),
    /// Ids 0 (empty) and 255 (chunk edge) cannot carry a definition.
    #[error("block id {0} is reserved")]
    ReservedId(u8),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

const SLOTS: usize = 256;

/// Dense id → definition table with an O(1) solidity lookup for hot loops.
pub struct BlockRegistry {
    defs: Vec<Option<BlockDef>>,
    /// Rebuilt on every registration; unregistered ids stay `false`.
    solid: [bool; SLOTS],
    name_to_id: HashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Creates a registry with no blocks besides the reserved ids.
    pub fn new() -> Self {
        Self {
            defs: vec![None; SLOTS],
            solid: [false; SLOTS],
            name_to_id: HashMap::new(),
        }
    }

    /// Creates a registry holding the eight standard blocks.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for def in default_blocks() {
            // The default table has unique names and ids.
            if let Err(err) = registry.register(def) {
                tracing::error!("default block table is inconsistent: {err}");
            }
        }
        registry
    }

    /// Registers a block definition at its own id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ReservedId`] for ids 0 and 255,
    /// [`RegistryError::DuplicateId`] if the slot is taken and
    /// [`RegistryError::DuplicateName`] if the name is taken.
    pub fn register(&mut self, def: BlockDef) -> Result<BlockId, RegistryError> {
        let id = def.id;
        if id == BlockId::EMPTY || id == BlockId::CHUNK_EDGE {
            return Err(RegistryError::ReservedId(id.0));
        }
        if self.defs[id.0 as usize].is_some() {
            return Err(RegistryError::DuplicateId(id.0));
        }
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }

        self.solid[id.0 as usize] = def.solid;
        self.name_to_id.insert(def.name.clone(), id);
        self.defs[id.0 as usize] = Some(def);
        Ok(id)
    }

    /// Returns the definition for `id`, or `None` for empty, the chunk-edge
    /// sentinel and unregistered ids.
    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockDef> {
        self.defs[id.0 as usize].as_ref()
    }

    /// Returns the id registered under `name`.
    pub fn lookup_by_name(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    /// Number of registered blocks.
    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    /// Returns `true` if no block is registered.
    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }

    pub fn is_registered(&self, id: BlockId) -> bool {
        self.defs[id.0 as usize].is_some()
    }

    /// `false` for empty, the chunk-edge sentinel, non-solid blocks (water,
    /// foliage) and unregistered ids.
    #[inline]
    pub fn is_solid(&self, id: BlockId) -> bool {
        self.solid[id.0 as usize]
    }

    /// [`is_solid`](Self::is_solid) as 0 or 1 for occlusion sums.
    #[inline]
    pub fn is_solid_int(&self, id: BlockId) -> u8 {
        self.solid[id.0 as usize] as u8
    }

    pub fn is_liquid(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|def| def.shape == BlockShape::Liquid)
    }

    pub fn is_cross(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|def| def.shape == BlockShape::Cross)
    }

    /// Iterates over all registered definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockDef> {
        self.defs.iter().flatten()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The standard block set.
pub fn default_blocks() -> Vec<BlockDef> {
    vec![
        BlockDef::cube(BlockId::DIRT, "dirt", [1; 6]),
        BlockDef::cube(BlockId::DIRT_GRASS, "dirtgrass", [3, 2, 2, 2, 2, 1]),
        BlockDef::cube(BlockId::GRASS, "grass", [3; 6]),
        BlockDef::cube(BlockId::GRAVEL, "gravel", [4; 6]),
        BlockDef::cube(BlockId::ROCK, "rock", [5; 6]),
        BlockDef {
            id: BlockId::WATER,
            name: "water".to_string(),
            texture_ids: [6; 6],
            solid: false,
            shape: BlockShape::Liquid,
        },
        BlockDef::cube(BlockId::SAND, "sand", [7; 6]),
        BlockDef {
            id: BlockId::GRASS_SHORT,
            name: "grass_short".to_string(),
            texture_ids: [0, 8, 8, 8, 8, 0],
            solid: false,
            shape: BlockShape::Cross,
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
