//! Procedural geometry.

use crate::Vertex;
use glam::Vec3;
use std::f32::consts::TAU;

/// Shape of a (p, q) torus knot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusKnot {
    pub radius: f32,
    pub tube: f32,
    pub tubular_segments: u32,
    pub radial_segments: u32,
    pub p: u32,
    pub q: u32,
}

impl Default for TorusKnot {
    /// The knot drawn by the sketch: a coarse, triangular-section 4/3 knot.
    fn default() -> Self {
        Self {
            radius: 9.0,
            tube: 3.0,
            tubular_segments: 768,
            radial_segments: 3,
            p: 4,
            q: 3,
        }
    }
}

impl TorusKnot {
    /// Segment counts actually tessellated; fewer than three make no tube.
    fn segments(&self) -> (u32, u32) {
        (self.tubular_segments.max(3), self.radial_segments.max(3))
    }

    pub fn vertex_count(&self) -> usize {
        let (tubular, radial) = self.segments();
        ((tubular + 1) * (radial + 1)) as usize
    }

    pub fn index_count(&self) -> usize {
        let (tubular, radial) = self.segments();
        (tubular * radial * 6) as usize
    }

    /// Point on the knot's centre curve at parameter `u`.
    fn curve(&self, u: f32) -> Vec3 {
        let p = self.p as f32;
        let q = self.q as f32;
        let qu_over_p = q / p * u;
        let cs = qu_over_p.cos();
        Vec3::new(
            self.radius * (2.0 + cs) * 0.5 * u.cos(),
            self.radius * (2.0 + cs) * 0.5 * u.sin(),
            self.radius * qu_over_p.sin() * 0.5,
        )
    }

    /// Build the tube around the curve.
    ///
    /// The u texture coordinate runs along the tube (0..1 once around the
    /// knot) and v around its cross-section. Seams duplicate vertices so
    /// the texture wraps cleanly.
    pub fn build(&self) -> (Vec<Vertex>, Vec<u32>) {
        let (tubular, radial) = self.segments();
        let mut vertices = Vec::with_capacity(self.vertex_count());
        let mut indices = Vec::with_capacity(self.index_count());

        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * self.p as f32 * TAU;
            let p1 = self.curve(u);
            let p2 = self.curve(u + 0.01);

            // Frenet-like frame from two close samples.
            let t = p2 - p1;
            let n = p2 + p1;
            let b = t.cross(n);
            let n = b.cross(t).normalize();
            let b = b.normalize();

            for j in 0..=radial {
                let v = j as f32 / radial as f32 * TAU;
                let cx = -self.tube * v.cos();
                let cy = self.tube * v.sin();
                let position = p1 + n * cx + b * cy;
                let normal = (position - p1).normalize();
                vertices.push(Vertex {
                    position: position.to_array(),
                    normal: normal.to_array(),
                    uv: [i as f32 / tubular as f32, j as f32 / radial as f32],
                });
            }
        }

        let stride = radial + 1;
        for j in 1..=tubular {
            for i in 1..=radial {
                let a = stride * (j - 1) + (i - 1);
                let b = stride * j + (i - 1);
                let c = stride * j + i;
                let d = stride * (j - 1) + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        (vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_knot_counts() {
        let knot = TorusKnot::default();
        let (vertices, indices) = knot.build();
        assert_eq!(vertices.len(), 769 * 4);
        assert_eq!(indices.len(), 768 * 3 * 6);
        assert_eq!(vertices.len(), knot.vertex_count());
        assert_eq!(indices.len(), knot.index_count());
    }

    #[test]
    fn degenerate_segments_counted_as_built() {
        let knot = TorusKnot {
            tubular_segments: 1,
            radial_segments: 0,
            ..TorusKnot::default()
        };
        let (vertices, indices) = knot.build();
        assert_eq!(vertices.len(), 4 * 4);
        assert_eq!(vertices.len(), knot.vertex_count());
        assert_eq!(indices.len(), knot.index_count());
    }

    #[test]
    fn indices_in_range_and_normals_unit() {
        let (vertices, indices) = TorusKnot::default().build();
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        for v in &vertices {
            let len = Vec3::from_array(v.normal).length();
            assert!((len - 1.0).abs() < 1e-3, "normal length {len}");
            assert!(v.uv[0] >= 0.0 && v.uv[0] <= 1.0);
            assert!(v.uv[1] >= 0.0 && v.uv[1] <= 1.0);
        }
    }

    #[test]
    fn knot_stays_within_expected_radius() {
        let knot = TorusKnot::default();
        let (vertices, _) = knot.build();
        // Centre curve peaks at 1.5 * radius; the tube adds at most `tube`.
        let bound = knot.radius * 1.5 + knot.tube + 1e-3;
        for v in &vertices {
            assert!(Vec3::from_array(v.position).length() <= bound);
        }
    }
}
