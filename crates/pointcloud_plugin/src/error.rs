//! Error type for tree construction and buffer population.

use thiserror::Error;

/// Errors surfaced at the crate boundary.
///
/// Geometric tests and classification never fail; invariant violations there
/// are debug assertions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PointCloudError {
  #[error("point set is empty")]
  EmptyPointSet,

  #[error("color count {colors} does not match position count {positions}")]
  ColorCountMismatch { positions: usize, colors: usize },

  #[error("non-finite coordinate at point {index}")]
  NonFiniteCoordinate { index: usize },

  #[error("invalid voxel size {0}")]
  InvalidVoxelSize(f64),

  #[error("invalid tree layout {0:?}")]
  InvalidLayout(crate::tree::TreeLayout),

  #[error("index coordinate of point {index} does not fit in i32")]
  CoordinateOverflow { index: usize },

  #[error("{buffer} buffer too small: needed {needed}, got {got}")]
  BufferTooSmall {
    buffer: &'static str,
    needed: usize,
    got: usize,
  },
}

impl PointCloudError {
  /// Check a caller-provided buffer length against the required length.
  pub fn check_len(buffer: &'static str, needed: usize, got: usize) -> Result<()> {
    if got < needed {
      Err(Self::BufferTooSmall { buffer, needed, got })
    } else {
      Ok(())
    }
  }
}

pub type Result<T> = std::result::Result<T, PointCloudError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_check_len() {
    assert!(PointCloudError::check_len("points", 4, 4).is_ok());
    assert!(PointCloudError::check_len("points", 4, 10).is_ok());
    assert_eq!(
      PointCloudError::check_len("points", 4, 3),
      Err(PointCloudError::BufferTooSmall {
        buffer: "points",
        needed: 4,
        got: 3
      })
    );
  }

  #[test]
  fn test_display() {
    let err = PointCloudError::ColorCountMismatch {
      positions: 3,
      colors: 2,
    };
    assert_eq!(err.to_string(), "color count 2 does not match position count 3");
  }
}
