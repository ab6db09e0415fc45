use super::*;

// Color packing tests
#[test]
fn test_color_roundtrip_all_channels() {
  for r in 0..=255u8 {
    for g in 0..=255u8 {
      for b in 0..=255u8 {
        let decoded = unpack_rgb(pack_rgb(r, g, b));
        assert_eq!((decoded.r, decoded.g, decoded.b), (r, g, b));
        assert_eq!(decoded.a, 255);
      }
    }
  }
}

#[test]
fn test_pack_known_values() {
  assert_eq!(pack_rgb(255, 0, 0), 0xFF0000);
  assert_eq!(pack_rgb(0, 255, 0), 0x00FF00);
  assert_eq!(pack_rgb(0, 0, 255), 0x0000FF);
  assert_eq!(pack_rgb(0x12, 0x34, 0x56), 0x123456);
}

#[test]
fn test_unpack_ignores_high_bits() {
  let decoded = unpack_rgb(0xAB12_3456);
  assert_eq!((decoded.r, decoded.g, decoded.b, decoded.a), (0x12, 0x34, 0x56, 255));
}

#[test]
fn test_normalized_color() {
  let c = unpack_rgb(0xFF0000).normalized();
  assert_eq!(c, Vec4::new(1.0, 0.0, 0.0, 1.0));
}

// Point tests
#[test]
fn test_point_from_packed() {
  let p = Point::from_packed(Vec3::new(1.0, 2.0, 3.0), 0x00FF00);
  assert_eq!(p.position(), Vec3::new(1.0, 2.0, 3.0));
  assert_eq!(p.color(), Vec4::new(0.0, 1.0, 0.0, 1.0));
}

#[test]
fn test_point_layout_is_seven_floats() {
  assert_eq!(std::mem::size_of::<Point>(), 7 * std::mem::size_of::<f32>());
}

#[test]
fn test_empty_point_is_transparent() {
  assert_eq!(Point::EMPTY.a, 0.0);
  assert_eq!(Point::EMPTY, Point::default());
}
