//! # Fixed Meshes
//!
//! Hand-laid meshes that are not solids of revolution: the display quad,
//! the land plane, the skybox and the wall corner. All are non-indexed
//! triangle lists with white vertex colors.

use cgmath::{Vector2, Vector3};

use super::mesh_buffer::MeshBuffer;

fn white() -> Vector3<f32> {
    Vector3::new(1.0, 1.0, 1.0)
}

/// Corners of a unit quad as two counter-clockwise triangles
const QUAD_CORNERS: [[f32; 2]; 6] = [
    [1.0, 1.0],
    [0.0, 0.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
    [0.0, 0.0],
];

/// Screen-aligned quad of edge `size` centered on the origin, facing +Z.
///
/// A size below 2.0 leaves a border of the display clear color around it.
pub fn display_quad(size: f32) -> MeshBuffer {
    let mut mesh = MeshBuffer::new();
    for [u, v] in QUAD_CORNERS {
        mesh.push_vertex(
            Vector3::new((u - 0.5) * size, (v - 0.5) * size, 0.0),
            Vector3::unit_z(),
            white(),
            Vector2::new(u, v),
        );
    }
    mesh
}

/// Horizontal plane of `size` at `height`, facing +Y.
pub fn land(size: Vector2<f32>, height: f32) -> MeshBuffer {
    let mut mesh = MeshBuffer::new();
    for [u, v] in QUAD_CORNERS {
        mesh.push_vertex(
            Vector3::new((v - 0.5) * size.x, height, (u - 0.5) * size.y),
            Vector3::unit_y(),
            white(),
            Vector2::new(u, v),
        );
    }
    mesh
}

/// Three quads of edge `size` meeting at `origin`, one per axis plane.
pub fn wall(size: f32, origin: Vector3<f32>) -> MeshBuffer {
    // (first in-plane axis, second in-plane axis, normal axis)
    const AXES: [[usize; 3]; 3] = [[0, 1, 2], [2, 0, 1], [1, 2, 0]];

    let mut mesh = MeshBuffer::new();
    for [a, b, n] in AXES {
        for [u, v] in QUAD_CORNERS {
            let mut position = origin;
            position[a] += u * size;
            position[b] += v * size;

            let mut normal = Vector3::new(0.0, 0.0, 0.0);
            normal[n] = 1.0;

            mesh.push_vertex(position, normal, white(), Vector2::new(u, v));
        }
    }
    mesh
}

/// Inward-facing cube of `size` centered on `center`.
///
/// UVs address a horizontal-cross cubemap laid out in a 4x3 grid.
pub fn skybox(size: Vector3<f32>, center: Vector3<f32>) -> MeshBuffer {
    const THIRD: f32 = 1.0 / 3.0;
    const TWO_THIRDS: f32 = 2.0 / 3.0;

    // (unit-cube corners, inward normal, grid UVs) per face
    let faces: [([[f32; 3]; 6], [f32; 3], [[f32; 2]; 6]); 6] = [
        // front
        (
            [[0., 1., 1.], [1., 0., 1.], [0., 0., 1.], [0., 1., 1.], [1., 1., 1.], [1., 0., 1.]],
            [0., 0., -1.],
            [[0.25, TWO_THIRDS], [0.5, THIRD], [0.25, THIRD], [0.25, TWO_THIRDS], [0.5, TWO_THIRDS], [0.5, THIRD]],
        ),
        // back
        (
            [[0., 1., 0.], [0., 0., 0.], [1., 1., 0.], [0., 0., 0.], [1., 0., 0.], [1., 1., 0.]],
            [0., 0., 1.],
            [[1.0, TWO_THIRDS], [1.0, THIRD], [0.75, TWO_THIRDS], [1.0, THIRD], [0.75, THIRD], [0.75, TWO_THIRDS]],
        ),
        // right
        (
            [[1., 1., 1.], [1., 1., 0.], [1., 0., 1.], [1., 1., 0.], [1., 0., 0.], [1., 0., 1.]],
            [-1., 0., 0.],
            [[0.5, TWO_THIRDS], [0.75, TWO_THIRDS], [0.5, THIRD], [0.75, TWO_THIRDS], [0.75, THIRD], [0.5, THIRD]],
        ),
        // left
        (
            [[0., 1., 1.], [0., 0., 0.], [0., 1., 0.], [0., 1., 1.], [0., 0., 1.], [0., 0., 0.]],
            [1., 0., 0.],
            [[0.25, TWO_THIRDS], [0.0, THIRD], [0.0, TWO_THIRDS], [0.25, TWO_THIRDS], [0.25, THIRD], [0.0, THIRD]],
        ),
        // top
        (
            [[0., 1., 1.], [0., 1., 0.], [1., 1., 0.], [1., 1., 1.], [0., 1., 1.], [1., 1., 0.]],
            [0., -1., 0.],
            [[0.25, TWO_THIRDS], [0.25, 1.0], [0.5, 1.0], [0.5, TWO_THIRDS], [0.25, TWO_THIRDS], [0.5, 1.0]],
        ),
        // bottom
        (
            [[0., 0., 0.], [0., 0., 1.], [1., 0., 1.], [0., 0., 0.], [1., 0., 1.], [1., 0., 0.]],
            [0., 1., 0.],
            [[0.25, 0.0], [0.25, THIRD], [0.5, THIRD], [0.25, 0.0], [0.5, THIRD], [0.5, 0.0]],
        ),
    ];

    let mut mesh = MeshBuffer::new();
    for (corners, normal, uvs) in faces.iter() {
        for (corner, uv) in corners.iter().zip(uvs.iter()) {
            let position = Vector3::new(
                (corner[0] - 0.5) * size.x + center.x,
                (corner[1] - 0.5) * size.y + center.y,
                (corner[2] - 0.5) * size.z + center.z,
            );
            mesh.push_vertex(position, (*normal).into(), white(), (*uv).into());
        }
    }
    mesh
}
