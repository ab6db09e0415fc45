//! Axis-aligned bounding box with double precision for index-space extents.

use glam::{DVec3, IVec3};

/// Double-precision axis-aligned bounding box.
///
/// Node extents are expressed in continuous index space: voxel `v` covers
/// `[v - 0.5, v + 0.5]` on each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DAabb3 {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl DAabb3 {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Extent of a node with the given origin voxel and edge length in voxels.
	pub fn from_voxel_span(origin: IVec3, span: i32) -> Self {
		let min = origin.as_dvec3() - DVec3::splat(0.5);
		Self {
			min,
			max: min + DVec3::splat(span as f64),
		}
	}

	/// The 8 corners. Bit 0 of the corner index selects max x, bit 1 max y,
	/// bit 2 max z.
	pub fn corners(&self) -> [DVec3; 8] {
		std::array::from_fn(|i| {
			DVec3::new(
				if i & 1 == 0 { self.min.x } else { self.max.x },
				if i & 2 == 0 { self.min.y } else { self.max.y },
				if i & 4 == 0 { self.min.z } else { self.max.z },
			)
		})
	}

	/// Check if this AABB contains a point.
	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// Get the size of the AABB (max - min).
	#[inline]
	pub fn size(&self) -> DVec3 {
		self.max - self.min
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> DVec3 {
		(self.min + self.max) * 0.5
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_from_voxel_span() {
		let aabb = DAabb3::from_voxel_span(IVec3::new(8, 0, -8), 8);
		assert_eq!(aabb.min, DVec3::new(7.5, -0.5, -8.5));
		assert_eq!(aabb.max, DVec3::new(15.5, 7.5, -0.5));
	}

	#[test]
	fn test_corners_bit_order() {
		let aabb = DAabb3::new(DVec3::ZERO, DVec3::new(1.0, 2.0, 3.0));
		let corners = aabb.corners();
		assert_eq!(corners[0], DVec3::ZERO);
		assert_eq!(corners[1], DVec3::new(1.0, 0.0, 0.0));
		assert_eq!(corners[2], DVec3::new(0.0, 2.0, 0.0));
		assert_eq!(corners[4], DVec3::new(0.0, 0.0, 3.0));
		assert_eq!(corners[7], DVec3::new(1.0, 2.0, 3.0));
	}

	#[test]
	fn test_contains_point() {
		let aabb = DAabb3::from_voxel_span(IVec3::ZERO, 8);

		// Inside
		assert!(aabb.contains_point(DVec3::splat(3.0)));

		// On boundary
		assert!(aabb.contains_point(DVec3::splat(-0.5)));
		assert!(aabb.contains_point(DVec3::splat(7.5)));

		// Outside
		assert!(!aabb.contains_point(DVec3::splat(-0.6)));
		assert!(!aabb.contains_point(DVec3::splat(7.6)));
	}

	#[test]
	fn test_size_and_center() {
		let aabb = DAabb3::new(DVec3::new(-1.0, -2.0, -3.0), DVec3::new(1.0, 2.0, 3.0));
		assert_eq!(aabb.size(), DVec3::new(2.0, 4.0, 6.0));
		assert_eq!(aabb.center(), DVec3::ZERO);
	}
}
