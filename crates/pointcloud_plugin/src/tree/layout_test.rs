use super::*;

/// Default spans are 8 / 128 / 4096 voxels.
#[test]
fn test_default_spans() {
  let layout = TreeLayout::default();
  assert_eq!(layout.span(NodeLevel::Leaf), 8);
  assert_eq!(layout.span(NodeLevel::Level2), 128);
  assert_eq!(layout.span(NodeLevel::Level1), 4096);
  assert!(layout.is_valid());
}

/// Origins are the containing node's minimum corner.
#[test]
fn test_origin_positive() {
  let layout = TreeLayout::default();
  let voxel = IVec3::new(9, 130, 4097);

  assert_eq!(layout.origin(NodeLevel::Leaf, voxel), IVec3::new(8, 128, 4096));
  assert_eq!(layout.origin(NodeLevel::Level2, voxel), IVec3::new(0, 128, 4096));
  assert_eq!(layout.origin(NodeLevel::Level1, voxel), IVec3::new(0, 0, 4096));
}

/// Negative coordinates floor toward negative infinity.
#[test]
fn test_origin_negative() {
  let layout = TreeLayout::default();

  assert_eq!(layout.origin(NodeLevel::Leaf, IVec3::splat(-1)), IVec3::splat(-8));
  assert_eq!(layout.origin(NodeLevel::Leaf, IVec3::splat(-8)), IVec3::splat(-8));
  assert_eq!(layout.origin(NodeLevel::Leaf, IVec3::splat(-9)), IVec3::splat(-16));
  assert_eq!(
    layout.origin(NodeLevel::Level1, IVec3::new(-1, 0, 5000)),
    IVec3::new(-4096, 0, 4096)
  );
}

/// A voxel always lies inside the node whose origin it maps to.
#[test]
fn test_origin_contains_voxel() {
  let layout = TreeLayout::default();
  for v in [-5000, -129, -8, -1, 0, 7, 8, 127, 128, 5000] {
    let voxel = IVec3::new(v, -v, v / 2);
    for level in NodeLevel::ALL {
      let origin = layout.origin(level, voxel);
      let span = layout.span(level);
      assert!((voxel - origin).cmpge(IVec3::ZERO).all(), "{level:?} {voxel}");
      assert!((voxel - origin).cmplt(IVec3::splat(span)).all(), "{level:?} {voxel}");
    }
  }
}

#[test]
fn test_invalid_layouts() {
  let too_deep = TreeLayout {
    level1_log2dim: 20,
    level2_log2dim: 8,
    leaf_log2dim: 3,
  };
  assert!(!too_deep.is_valid());

  let flat = TreeLayout {
    level1_log2dim: 0,
    ..Default::default()
  };
  assert!(!flat.is_valid());
}

/// Dims whose sum overflows u32 are invalid, not wrapped.
#[test]
fn test_overflowing_dims_are_invalid() {
  let huge = TreeLayout {
    level1_log2dim: u32::MAX,
    level2_log2dim: 1,
    leaf_log2dim: 1,
  };
  assert_eq!(huge.total_log2dim(NodeLevel::Level1), u32::MAX);
  assert!(!huge.is_valid());

  let huge_inner = TreeLayout {
    level2_log2dim: u32::MAX,
    ..Default::default()
  };
  assert!(!huge_inner.is_valid());
}
