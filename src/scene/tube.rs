//! Tube mesh built by sweeping a 2D cross-section along a 3D path.
//!
//! Frames are parallel-transported from ring to ring so the tube does not
//! twist where the path bends. Consecutive duplicate points are dropped before
//! sweeping.

use crate::geo::{Cartesian3, Position};

/// Smallest separation between path points treated as distinct, in metres.
const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Errors raised while building a tube.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TubeError {
    /// The path collapses to fewer than two distinct points.
    #[error("path has {distinct} distinct point(s), need at least 2")]
    Degenerate { distinct: usize },

    /// The cross-section has fewer than three vertices.
    #[error("cross-section needs at least 3 vertices, got {0}")]
    InvalidShape(usize),
}

/// Closed regular polygon approximating a circle of `radius`, in the
/// cross-section plane.
pub fn circle_shape(radius: f64, segments: usize) -> Vec<[f64; 2]> {
    (0..segments)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / segments as f64;
            [radius * theta.cos(), radius * theta.sin()]
        })
        .collect()
}

/// Triangle mesh in ECEF metres.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeMesh {
    pub positions: Vec<Cartesian3>,
    pub normals: Vec<Cartesian3>,
    /// Triangle list, three vertex indices per face.
    pub indices: Vec<u32>,
    /// Number of rings along the path (one per distinct point).
    pub rings: usize,
    /// Vertices per ring.
    pub segments: usize,
}

impl TubeMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Drops consecutive points closer than [`MIN_SEGMENT_LENGTH`].
fn dedupe(points: &[Cartesian3]) -> Vec<Cartesian3> {
    let mut out: Vec<Cartesian3> = Vec::with_capacity(points.len());
    for &p in points {
        match out.last() {
            Some(&last) if last.distance(p) < MIN_SEGMENT_LENGTH => {}
            _ => out.push(p),
        }
    }
    out
}

/// Any unit vector perpendicular to `t`.
fn perpendicular(t: Cartesian3) -> Cartesian3 {
    let axis = if t.x.abs() < 0.9 {
        Cartesian3::new(1.0, 0.0, 0.0)
    } else {
        Cartesian3::new(0.0, 1.0, 0.0)
    };
    t.cross(axis).normalize()
}

/// Rotates `v` so that it stays perpendicular to the path when the tangent
/// turns from `t0` to `t1`.
fn transport(v: Cartesian3, t0: Cartesian3, t1: Cartesian3) -> Cartesian3 {
    let axis = t0.cross(t1);
    let sin = axis.magnitude();
    let cos = t0.dot(t1);
    if sin < 1e-12 {
        return v;
    }
    let k = axis.scale(1.0 / sin);
    // Rodrigues rotation
    v.scale(cos)
        .add(k.cross(v).scale(sin))
        .add(k.scale(k.dot(v) * (1.0 - cos)))
}

/// Sweeps `shape` along `positions`.
///
/// Tangents at interior points are the average of the adjacent segment
/// directions. Each ring has `shape.len()` vertices; flat caps add one centre
/// vertex plus a ring of cap vertices at each end.
pub fn build_tube_mesh(positions: &[Position], shape: &[[f64; 2]]) -> Result<TubeMesh, TubeError> {
    if shape.len() < 3 {
        return Err(TubeError::InvalidShape(shape.len()));
    }
    let cartesian: Vec<Cartesian3> = positions.iter().map(Position::to_cartesian).collect();
    let points = dedupe(&cartesian);
    if points.len() < 2 {
        return Err(TubeError::Degenerate {
            distinct: points.len(),
        });
    }

    let n = points.len();
    let segments = shape.len();

    let tangents: Vec<Cartesian3> = (0..n)
        .map(|i| {
            let prev = if i == 0 { points[0] } else { points[i - 1] };
            let next = if i == n - 1 { points[n - 1] } else { points[i + 1] };
            let t = next.sub(prev).normalize();
            if t.magnitude() > 0.0 {
                t
            } else {
                points[1].sub(points[0]).normalize()
            }
        })
        .collect();

    let mut mesh = TubeMesh {
        rings: n,
        segments,
        ..TubeMesh::default()
    };

    let mut normal = perpendicular(tangents[0]);
    for i in 0..n {
        if i > 0 {
            normal = transport(normal, tangents[i - 1], tangents[i]).normalize();
        }
        let binormal = tangents[i].cross(normal);
        for &[u, v] in shape {
            let offset = normal.scale(u).add(binormal.scale(v));
            mesh.positions.push(points[i].add(offset));
            mesh.normals.push(offset.normalize());
        }
    }

    let seg = segments as u32;
    for ring in 0..(n as u32 - 1) {
        let a = ring * seg;
        let b = a + seg;
        for j in 0..seg {
            let k = (j + 1) % seg;
            mesh.indices.extend_from_slice(&[a + j, b + j, b + k]);
            mesh.indices.extend_from_slice(&[a + j, b + k, a + k]);
        }
    }

    add_cap(&mut mesh, points[0], tangents[0].scale(-1.0), 0, true);
    add_cap(&mut mesh, points[n - 1], tangents[n - 1], n - 1, false);

    Ok(mesh)
}

/// Adds a flat triangle fan closing ring `ring`, facing along `facing`.
fn add_cap(mesh: &mut TubeMesh, center: Cartesian3, facing: Cartesian3, ring: usize, start: bool) {
    let segments = mesh.segments;
    let base = mesh.positions.len() as u32;
    mesh.positions.push(center);
    mesh.normals.push(facing);
    for j in 0..segments {
        let p = mesh.positions[ring * segments + j];
        mesh.positions.push(p);
        mesh.normals.push(facing);
    }
    let seg = segments as u32;
    for j in 0..seg {
        let a = base + 1 + j;
        let b = base + 1 + (j + 1) % seg;
        // Wind the start cap the other way so both caps face outwards.
        if start {
            mesh.indices.extend_from_slice(&[base, b, a]);
        } else {
            mesh.indices.extend_from_slice(&[base, a, b]);
        }
    }
}
