use super::*;
use crate::test_utils::{multi_level_tree, two_point_tree};

#[test]
fn test_shape_counts() {
  let tree = multi_level_tree();
  let shape = tree.shape();
  assert_eq!(shape.count(NodeLevel::Level1), 2);
  assert_eq!(shape.count(NodeLevel::Level2), 3);
  assert_eq!(shape.count(NodeLevel::Leaf), 5);
  assert_eq!(shape.total(), 10);

  for level in NodeLevel::ALL {
    assert_eq!(tree.node_count(level), shape.count(level));
  }
}

#[test]
fn test_empty_shape() {
  assert_eq!(TreeShape::default().total(), 0);
}

/// Leaf point ranges cover the point arrays in order.
#[test]
fn test_leaf_ranges_cover_points() {
  let tree = multi_level_tree();
  let mut next = 0;
  for leaf in tree.leaves() {
    assert_eq!(leaf.points.start, next);
    next = leaf.points.end;
  }
  assert_eq!(next, tree.point_count());
  assert!(!tree.is_empty());
}

#[test]
fn test_index_bounds_per_level() {
  let tree = multi_level_tree();

  let l1 = tree.index_bounds(NodeRef::level1(1));
  assert_eq!(l1.min, DVec3::new(4095.5, -0.5, -0.5));
  assert_eq!(l1.size(), DVec3::splat(4096.0));

  let l2 = tree.index_bounds(NodeRef::level2(2));
  assert_eq!(l2.min, DVec3::new(4991.5, -0.5, -0.5));
  assert_eq!(l2.size(), DVec3::splat(128.0));

  let leaf = tree.index_bounds(NodeRef::leaf(4));
  assert_eq!(leaf.min, DVec3::new(4999.5, 7.5, -0.5));
  assert_eq!(leaf.max, DVec3::new(5007.5, 15.5, 7.5));
}

#[test]
fn test_bounding_box_corners() {
  let tree = two_point_tree();
  let corners = tree.bounding_box_corners(NodeRef::leaf(0));
  assert_eq!(corners[0], DVec3::splat(-0.5));
  assert_eq!(corners[7], DVec3::splat(7.5));
  assert_eq!(corners[3], DVec3::new(7.5, 7.5, -0.5));
}

/// Node geometry is expressed in world units.
#[test]
fn test_node_geometry_world_space() {
  let tree = two_point_tree();
  let geometry = tree.node_geometry(NodeRef::leaf(0));
  assert_eq!(geometry.center, Vec3::splat(3.5));
  assert!((geometry.size - 8.0 * 3f32.sqrt()).abs() < 1e-4);
  assert_eq!(geometry.corners[0], Vec3::splat(-0.5));
}

#[test]
fn test_leaf_positions_and_colors() {
  let tree = two_point_tree();
  let positions: Vec<DVec3> = tree.leaf_positions(0).collect();
  assert_eq!(positions, vec![DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0)]);
  assert_eq!(tree.leaf_colors(0), &[0xFF0000, 0x00FF00]);
}

#[test]
fn test_point_decodes_color() {
  let tree = two_point_tree();
  let p = tree.point(1);
  assert_eq!(p.position(), Vec3::new(2.0, 0.0, 0.0));
  assert_eq!((p.r, p.g, p.b, p.a), (0.0, 1.0, 0.0, 1.0));
}

#[test]
fn test_children_of_leaf_are_points() {
  let tree = multi_level_tree();
  assert_eq!(tree.children(NodeRef::leaf(2)), 3..6);
  assert_eq!(tree.child_count(NodeRef::leaf(2)), 3);
}
