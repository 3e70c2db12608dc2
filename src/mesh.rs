// mesh.rs — skybox face meshes: flat quads and subdivided spherical strips
//
// Faces are emitted as triangle strips. Strips inside one index list are
// separated by `STRIP_RESTART`, which the pipeline treats as primitive
// restart.

use crate::geometry::{CubeFace, FaceMap};
use crate::projection::{bilinear, cube_to_sphere_uv, ProjectionMode};
use std::ops::Range;

/// Primitive restart value for `u32` strip indices.
pub const STRIP_RESTART: u32 = u32::MAX;

/// UVs of the four face corners in boundary order.
pub const FLAT_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Grid resolution of the spherical rasterizer, always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subdivision(u32);

impl Subdivision {
    pub const DEFAULT: Subdivision = Subdivision(20);
    pub const MAX: u32 = 256;

    /// Values below 1 are clamped to 1, values above [`Self::MAX`] to the max.
    pub fn new(n: u32) -> Self {
        if n == 0 {
            log::warn!("subdivision 0 is invalid, using 1");
        }
        Self(n.clamp(1, Self::MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Subdivision {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Default)]
pub struct FaceMesh {
    pub vertices: Vec<SkyVertex>,
    pub indices: Vec<u32>,
}

impl FaceMesh {
    pub fn strip_count(&self) -> usize {
        if self.indices.is_empty() {
            return 0;
        }
        self.indices.iter().filter(|&&i| i == STRIP_RESTART).count() + 1
    }

    pub fn triangle_count(&self) -> usize {
        self.indices
            .split(|&i| i == STRIP_RESTART)
            .map(|strip| strip.len().saturating_sub(2))
            .sum()
    }

    /// Vertex indices of each strip.
    pub fn strips(&self) -> impl Iterator<Item = &[u32]> {
        self.indices
            .split(|&i| i == STRIP_RESTART)
            .filter(|strip| !strip.is_empty())
    }
}

/// One textured quad, as a 4-vertex strip.
pub fn build_flat_face(face: CubeFace) -> FaceMesh {
    let vertices = face
        .corners()
        .iter()
        .zip(FLAT_UVS)
        .map(|(p, uv)| SkyVertex {
            position: p.to_array(),
            uv,
        })
        .collect();

    FaceMesh {
        vertices,
        // v0 v1 v3 v2 covers the quad with the corner winding preserved
        indices: vec![0, 1, 3, 2],
    }
}

/// `n` strips of `2(n+1)` vertices walking the face, each vertex UV-mapped
/// through the spherical projection.
pub fn build_spherical_face(face: CubeFace, subdivision: Subdivision) -> FaceMesh {
    let n = subdivision.get();
    let corners = face.corners();
    let per_strip = 2 * (n as usize + 1);

    let mut vertices = Vec::with_capacity(per_strip * n as usize);
    let mut indices = Vec::with_capacity((per_strip + 1) * n as usize);

    for i in 0..n {
        let t0 = i as f32 / n as f32;
        let t1 = (i + 1) as f32 / n as f32;

        if i > 0 {
            indices.push(STRIP_RESTART);
        }

        for j in 0..=n {
            let s = j as f32 / n as f32;
            let pa = bilinear(&corners, s, t0);
            let pb = bilinear(&corners, s, t1);

            for p in [pa, pb] {
                indices.push(vertices.len() as u32);
                vertices.push(SkyVertex {
                    position: p.to_array(),
                    uv: cube_to_sphere_uv(p).to_array(),
                });
            }
        }
    }

    FaceMesh { vertices, indices }
}

pub fn build_face(face: CubeFace, mode: ProjectionMode, subdivision: Subdivision) -> FaceMesh {
    match mode {
        ProjectionMode::Flat => build_flat_face(face),
        ProjectionMode::Spherical => build_spherical_face(face, subdivision),
    }
}

/// All six faces for one projection mode.
#[derive(Debug, Clone)]
pub struct SkyboxMesh {
    pub mode: ProjectionMode,
    pub subdivision: Subdivision,
    pub faces: FaceMap<FaceMesh>,
}

/// The six faces packed into one vertex and one index buffer.
#[derive(Debug, Clone, Default)]
pub struct MergedMesh {
    pub vertices: Vec<SkyVertex>,
    pub indices: Vec<u32>,
    /// Index range of each face inside `indices`.
    pub ranges: FaceMap<Range<u32>>,
}

impl SkyboxMesh {
    pub fn build(mode: ProjectionMode, subdivision: Subdivision) -> Self {
        Self {
            mode,
            subdivision,
            faces: FaceMap::from_fn(|face| build_face(face, mode, subdivision)),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(|(_, m)| m.triangle_count()).sum()
    }

    pub fn merged(&self) -> MergedMesh {
        let mut merged = MergedMesh::default();
        for (face, mesh) in self.faces.iter() {
            let base = merged.vertices.len() as u32;
            let start = merged.indices.len() as u32;
            merged.vertices.extend_from_slice(&mesh.vertices);
            merged.indices.extend(mesh.indices.iter().map(|&i| {
                if i == STRIP_RESTART {
                    STRIP_RESTART
                } else {
                    base + i
                }
            }));
            merged.ranges[face] = start..merged.indices.len() as u32;
        }
        merged
    }
}
