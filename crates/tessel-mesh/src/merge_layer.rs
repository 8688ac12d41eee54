//! Scratch layers holding pending faces during greedy merging.
//!
//! A [`PendingFace`] is one packed `u32`:
//!
//! ```text
//!  31      25 24     17 16  15     8 7       0
//! +----------+---------+--+---------+---------+
//! |  height  |  width  |P | texture |   AO    |
//! +----------+---------+--+---------+---------+
//! ```
//!
//! `AO` holds two bits per corner (corner `k` at bit `2k`). `P` marks the
//! cell as occupied so a texture-0 face with no occlusion still differs from
//! an empty cell. Width and height are filled in by the merge passes.
//!
//! Merging runs in two passes. [`merge_row`] collapses runs of equal faces
//! along a row into the run's first cell. [`merge_vertical`] then compares a
//! layer with the previous one cell by cell: equal runs grow the previous
//! run's height, anything else finalizes the previous run.

use tessel_voxel::CHUNK_SIZE;

const N: usize = CHUNK_SIZE;

/// Packed face record stored in a merge layer. Zero means "no face".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PendingFace(pub u32);

impl PendingFace {
    pub const EMPTY: Self = Self(0);

    /// Bits compared when merging: AO, texture, the occupied flag and width.
    pub const SIGNATURE_MASK: u32 = 0x01FF_FFFF;

    const PRESENT: u32 = 1 << 16;
    const WIDTH_SHIFT: u32 = 17;
    const HEIGHT_SHIFT: u32 = 25;

    /// A fresh single-cell face, before any merging.
    #[inline]
    pub fn new(texture: u8, ao: [u8; 4]) -> Self {
        Self(Self::PRESENT | (texture as u32) << 8 | pack_ao(ao) as u32)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn signature(self) -> u32 {
        self.0 & Self::SIGNATURE_MASK
    }

    #[inline]
    pub fn texture(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub fn ao(self) -> [u8; 4] {
        unpack_ao(self.0 as u8)
    }

    /// Run length along the row.
    #[inline]
    pub fn width(self) -> u32 {
        (self.0 >> Self::WIDTH_SHIFT) & 0xFF
    }

    /// Number of layers the run spans.
    #[inline]
    pub fn height(self) -> u32 {
        self.0 >> Self::HEIGHT_SHIFT
    }

    #[inline]
    fn with_extent(self, width: u32, height: u32) -> Self {
        debug_assert!(width <= N as u32 && height <= N as u32);
        let base = self.0 & !(0xFF << Self::WIDTH_SHIFT) & ((1 << Self::HEIGHT_SHIFT) - 1);
        Self(base | width << Self::WIDTH_SHIFT | height << Self::HEIGHT_SHIFT)
    }
}

/// Packs four 0–3 corner values, corner `k` at bit `2k`.
#[inline]
pub fn pack_ao(ao: [u8; 4]) -> u8 {
    ao[0] | ao[1] << 2 | ao[2] << 4 | ao[3] << 6
}

#[inline]
pub fn unpack_ao(bits: u8) -> [u8; 4] {
    [bits & 3, (bits >> 2) & 3, (bits >> 4) & 3, (bits >> 6) & 3]
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// Horizontal pass over one row.
///
/// Every maximal run of cells with the same signature is collapsed into its
/// first cell, which gets width = run length and height = 1. The remaining
/// cells of the run are zeroed.
pub fn merge_row(row: &mut [PendingFace]) {
    let len = row.len();
    let mut i = 0;
    while i < len {
        let face = row[i];
        let mut j = i + 1;
        while j < len && row[j] == face {
            row[j] = PendingFace::EMPTY;
            j += 1;
        }
        if !face.is_empty() {
            row[i] = face.with_extent((j - i) as u32, 1);
        }
        i = j;
    }
}

/// Vertical pass between two row-merged layers of equal length.
///
/// For each cell, a run in `current` with the same signature (texture, AO
/// and width) as the run in `previous` absorbs it and grows by the previous
/// height. Any other run in `previous` is finished and handed to `emit`
/// with its cell index. `previous` is left zeroed.
pub fn merge_vertical(
    previous: &mut [PendingFace],
    current: &mut [PendingFace],
    mut emit: impl FnMut(usize, PendingFace),
) {
    debug_assert_eq!(previous.len(), current.len());
    for (i, (top, cur)) in previous.iter_mut().zip(current.iter_mut()).enumerate() {
        if top.is_empty() {
            continue;
        }
        if top.signature() == cur.signature() {
            *cur = cur.with_extent(cur.width(), top.height() + 1);
        } else {
            emit(i, *top);
        }
        *top = PendingFace::EMPTY;
    }
}

/// Emits every run left in `layer` and clears it.
pub fn flush(layer: &mut [PendingFace], mut emit: impl FnMut(usize, PendingFace)) {
    for (i, face) in layer.iter_mut().enumerate() {
        if !face.is_empty() {
            emit(i, *face);
            *face = PendingFace::EMPTY;
        }
    }
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// Four side-face planes for one height layer, stored back to back so the
/// vertical pass can treat them as one slice.
#[derive(Clone)]
pub struct SideLayers {
    cells: Vec<PendingFace>,
}

/// Cells in one side plane.
pub const PLANE_CELLS: usize = N * N;

impl SideLayers {
    pub fn new() -> Self {
        Self {
            cells: vec![PendingFace::EMPTY; 4 * PLANE_CELLS],
        }
    }

    #[inline]
    pub fn set(&mut self, plane: usize, a: usize, b: usize, face: PendingFace) {
        self.cells[plane * PLANE_CELLS + b * N + a] = face;
    }

    #[inline]
    pub fn get(&self, plane: usize, a: usize, b: usize) -> PendingFace {
        self.cells[plane * PLANE_CELLS + b * N + a]
    }

    /// Runs [`merge_row`] over all `4 * N` rows.
    pub fn merge_rows(&mut self) {
        for row in self.cells.chunks_exact_mut(N) {
            merge_row(row);
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(PendingFace::EMPTY);
    }

    pub fn as_mut_slice(&mut self) -> &mut [PendingFace] {
        &mut self.cells
    }

    /// Splits a flat cell index into `(plane, a, b)`.
    #[inline]
    pub fn locate(index: usize) -> (usize, usize, usize) {
        let plane = index / PLANE_CELLS;
        let rest = index % PLANE_CELLS;
        (plane, rest % N, rest / N)
    }
}

impl Default for SideLayers {
    fn default() -> Self {
        Self::new()
    }
}
