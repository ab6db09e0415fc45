//! Fixed constants for the three-level point tree.

/// Number of masked levels below the root (Level-1, Level-2, Leaf).
///
/// Structural, not data driven: every tree has exactly this depth.
pub const TREE_DEPTH: usize = 3;

/// Screen-size ratio below which a node collapses to one averaged point.
///
/// Compared against `diagonal / -view_z`.
pub const ACCUMULATION_THRESHOLD: f32 = 0.05;

/// Default log2 branching factor of a Level-1 node (32³ Level-2 slots).
pub const LEVEL1_LOG2DIM: u32 = 5;

/// Default log2 branching factor of a Level-2 node (16³ leaf slots).
pub const LEVEL2_LOG2DIM: u32 = 4;

/// Default log2 dimension of a leaf (8³ voxels).
pub const LEAF_LOG2DIM: u32 = 3;

/// Target point density used when deriving a voxel size from raw positions.
pub const DEFAULT_POINTS_PER_VOXEL: u32 = 8;

/// Color assigned to points ingested without a color attribute (white).
pub const DEFAULT_PACKED_COLOR: u32 = 0x00FF_FFFF;
