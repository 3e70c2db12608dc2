// projection.rs — cube surface to equirectangular texture coordinates

use glam::{Vec2, Vec3};
use std::f32::consts::PI;

/// Points closer to the origin than this have no usable direction.
const DEGENERATE_LENGTH: f32 = 1e-6;

/// Returned for degenerate input instead of dividing by zero.
pub const FALLBACK_UV: Vec2 = Vec2::new(0.5, 0.5);

/// How face textures are mapped onto the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// Each face shows its own square image.
    #[default]
    Flat,
    /// One panorama wrapped around all faces as if the cube were a sphere.
    Spherical,
}

pub fn lerp3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Bilinear point on the quad `v0 v1 v2 v3` (boundary order).
///
/// `s` runs along `v0 -> v1` (and `v3 -> v2`), `t` from the first edge to
/// the second.
pub fn bilinear(corners: &[Vec3; 4], s: f32, t: f32) -> Vec3 {
    let [v0, v1, v2, v3] = *corners;
    lerp3(lerp3(v0, v1, s), lerp3(v3, v2, s), t)
}

/// Equirectangular (longitude, latitude) coordinates of the direction `p`.
///
/// `u` is in `[0, 1)`: the seam behind the viewer at `-X` maps to `0.0`
/// from both sides of `z = 0`. `v` is in `[0, 1]` with `0` at `+Y`.
pub fn cube_to_sphere_uv(p: Vec3) -> Vec2 {
    let length = p.length();
    if !length.is_finite() || length < DEGENERATE_LENGTH {
        return FALLBACK_UV;
    }
    let n = p / length;

    let mut u = 0.5 + n.z.atan2(n.x) / (2.0 * PI);
    if u >= 1.0 {
        u = 0.0;
    }
    let v = 0.5 - n.y.clamp(-1.0, 1.0).asin() / PI;

    Vec2::new(u.max(0.0), v.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CubeFace;

    fn assert_uv(actual: Vec2, expected: (f32, f32)) {
        assert!(
            (actual.x - expected.0).abs() < 1e-5 && (actual.y - expected.1).abs() < 1e-5,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_poles() {
        assert_uv(cube_to_sphere_uv(Vec3::new(0.0, 1.0, 0.0)), (0.5, 0.0));
        assert_uv(cube_to_sphere_uv(Vec3::new(0.0, -1.0, 0.0)), (0.5, 1.0));
    }

    #[test]
    fn test_horizon_axes() {
        assert_uv(cube_to_sphere_uv(Vec3::X), (0.5, 0.5));
        assert_uv(cube_to_sphere_uv(Vec3::Z), (0.75, 0.5));
        assert_uv(cube_to_sphere_uv(Vec3::NEG_Z), (0.25, 0.5));
    }

    #[test]
    fn test_seam_folds_to_zero() {
        assert_uv(cube_to_sphere_uv(Vec3::NEG_X), (0.0, 0.5));
        assert_uv(cube_to_sphere_uv(Vec3::new(-1.0, 0.0, -0.0)), (0.0, 0.5));
    }

    #[test]
    fn test_scale_invariant() {
        let p = Vec3::new(0.3, -0.7, 1.0);
        assert_eq!(cube_to_sphere_uv(p), cube_to_sphere_uv(p * 5.0));
    }

    #[test]
    fn test_degenerate_point_returns_fallback() {
        assert_eq!(cube_to_sphere_uv(Vec3::ZERO), FALLBACK_UV);
        assert_eq!(cube_to_sphere_uv(Vec3::splat(1e-9)), FALLBACK_UV);
        assert_eq!(cube_to_sphere_uv(Vec3::new(f32::NAN, 0.0, 1.0)), FALLBACK_UV);
    }

    #[test]
    fn test_range_over_cube_surface() {
        let steps = 16;
        for face in CubeFace::ALL {
            let corners = face.corners();
            for i in 0..=steps {
                for j in 0..=steps {
                    let p = bilinear(&corners, i as f32 / steps as f32, j as f32 / steps as f32);
                    let uv = cube_to_sphere_uv(p);
                    assert!((0.0..1.0).contains(&uv.x), "u out of range at {p:?}: {uv:?}");
                    assert!((0.0..=1.0).contains(&uv.y), "v out of range at {p:?}: {uv:?}");
                }
            }
        }
    }

    #[test]
    fn test_bilinear_corner_exactness() {
        for face in CubeFace::ALL {
            let c = face.corners();
            assert_eq!(bilinear(&c, 0.0, 0.0), c[0]);
            assert_eq!(bilinear(&c, 1.0, 0.0), c[1]);
            assert_eq!(bilinear(&c, 1.0, 1.0), c[2]);
            assert_eq!(bilinear(&c, 0.0, 1.0), c[3]);
        }
    }

    #[test]
    fn test_lerp3_endpoints() {
        let a = Vec3::new(-1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, -5.0, 0.5);
        assert_eq!(lerp3(a, b, 0.0), a);
        assert_eq!(lerp3(a, b, 1.0), b);
        assert_eq!(lerp3(a, b, 0.5), (a + b) * 0.5);
    }
}
