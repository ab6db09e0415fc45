//! Core data types shared with the renderer.

use glam::{Vec3, Vec4};

/// Renderer-facing point: world position plus normalized RGBA.
///
/// Layout matches the host vertex struct `{x, y, z, r, g, b, a}`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
  pub x: f32,
  pub y: f32,
  pub z: f32,
  pub r: f32,
  pub g: f32,
  pub b: f32,
  pub a: f32,
}

impl Point {
  /// All-zero point, alpha included. Written for nodes with nothing to
  /// average so the renderer draws nothing visible there.
  pub const EMPTY: Self = Self {
    x: 0.0,
    y: 0.0,
    z: 0.0,
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 0.0,
  };

  pub fn new(position: Vec3, color: Vec4) -> Self {
    Self {
      x: position.x,
      y: position.y,
      z: position.z,
      r: color.x,
      g: color.y,
      b: color.z,
      a: color.w,
    }
  }

  /// Build a point from a world position and a packed 24-bit color.
  #[inline]
  pub fn from_packed(position: Vec3, packed: u32) -> Self {
    Self::new(position, unpack_rgb(packed).normalized())
  }

  #[inline]
  pub fn position(&self) -> Vec3 {
    Vec3::new(self.x, self.y, self.z)
  }

  #[inline]
  pub fn color(&self) -> Vec4 {
    Vec4::new(self.r, self.g, self.b, self.a)
  }
}

/// 8-bit RGBA color decoded from the packed attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Rgba8 {
  /// Channels scaled to 0..1.
  #[inline]
  pub fn normalized(&self) -> Vec4 {
    Vec4::new(
      self.r as f32 / 255.0,
      self.g as f32 / 255.0,
      self.b as f32 / 255.0,
      self.a as f32 / 255.0,
    )
  }
}

/// Pack 8-bit RGB into the 24-bit integer color attribute (`0xRRGGBB`).
///
/// Alpha is not part of the packed form.
#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
  ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Decode a packed color. Alpha is always 255; bits above 24 are ignored.
#[inline]
pub fn unpack_rgb(packed: u32) -> Rgba8 {
  Rgba8 {
    r: ((packed >> 16) & 0xFF) as u8,
    g: ((packed >> 8) & 0xFF) as u8,
    b: (packed & 0xFF) as u8,
    a: 255,
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
