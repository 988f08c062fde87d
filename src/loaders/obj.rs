//! Wavefront OBJ loading
//!
//! Models are triangulated by `tobj` and flattened into a non-indexed
//! [`MeshBuffer`], one record per face corner. Files without normals get
//! flat face normals, files without texture coordinates get polar UVs and
//! every vertex is white.

use std::io::BufRead;
use std::path::Path;

use cgmath::{Vector2, Vector3};
use log::{debug, warn};

use crate::error::ResourceError;
use crate::gfx::geometry::MeshBuffer;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Loads and flattens every model of an OBJ file.
///
/// Materials are ignored; a missing MTL file is not an error.
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshBuffer, ResourceError> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let (models, materials) = tobj::load_obj(path, &load_options()).map_err(|e| ResourceError::obj_load(&name, e))?;
    if let Err(e) = materials {
        debug!("No materials for '{}': {}", name, e);
    }
    flatten(&name, &models)
}

/// Loads an OBJ from any buffered reader. `mtllib` statements are ignored.
pub fn load_obj_buf<R: BufRead>(name: &str, reader: &mut R) -> Result<MeshBuffer, ResourceError> {
    let (models, _) = tobj::load_obj_buf(reader, &load_options(), |_| Err(tobj::LoadError::OpenFileFailed))
        .map_err(|e| ResourceError::obj_load(name, e))?;
    flatten(name, &models)
}

fn flatten(name: &str, models: &[tobj::Model]) -> Result<MeshBuffer, ResourceError> {
    let white = Vector3::new(1.0, 1.0, 1.0);
    let mut buffer = MeshBuffer::new();

    for model in models {
        let mesh = &model.mesh;
        let has_normals = !mesh.normals.is_empty();
        let has_uvs = !mesh.texcoords.is_empty();

        let mut part = MeshBuffer::new();
        for &index in &mesh.indices {
            let i = index as usize;
            let Some(position) = vec3_at(&mesh.positions, i) else {
                warn!("'{}': index {} out of range in '{}'", name, i, model.name);
                continue;
            };
            let normal = if has_normals {
                vec3_at(&mesh.normals, i).unwrap_or(Vector3::unit_y())
            } else {
                Vector3::new(0.0, 0.0, 0.0)
            };
            let uv = if has_uvs {
                mesh.texcoords
                    .get(2 * i..2 * i + 2)
                    .map(|t| Vector2::new(t[0], t[1]))
                    .unwrap_or(Vector2::new(0.0, 0.0))
            } else {
                Vector2::new(0.0, 0.0)
            };
            part.push_vertex(position, normal, white, uv);
        }

        if !has_normals {
            part.generate_flat_normals();
        }
        if !has_uvs {
            part.generate_polar_uvs();
        }
        buffer.append(&part);
    }

    if buffer.triangle_count() == 0 {
        return Err(ResourceError::EmptyModel(name.to_string()));
    }
    debug!("Loaded '{}': {} triangles from {} models", name, buffer.triangle_count(), models.len());
    Ok(buffer)
}

fn vec3_at(values: &[f32], i: usize) -> Option<Vector3<f32>> {
    values.get(3 * i..3 * i + 3).map(|v| Vector3::new(v[0], v[1], v[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD: &str = "
o quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
f 1 2 3 4
";

    const TRIANGLE_WITH_ATTRIBUTES: &str = "
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 0.0 1.0
vn 0.0 1.0 0.0
vt 0.25 0.75
f 1/1/1 2/1/1 3/1/1
";

    #[test]
    fn test_quad_is_triangulated_with_generated_attributes() {
        let mesh = load_obj_buf("quad", &mut Cursor::new(QUAD)).unwrap();

        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.is_aligned());
        for normal in &mesh.normals {
            assert!((normal.z - 1.0).abs() < 1e-6);
        }
        assert!(mesh.colors.iter().all(|c| *c == Vector3::new(1.0, 1.0, 1.0)));
        // the origin corner maps to the center of the polar projection
        let origin = mesh.positions.iter().position(|p| *p == Vector3::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(mesh.uvs[origin], Vector2::new(0.5, 0.5));
    }

    #[test]
    fn test_file_attributes_are_kept() {
        let mesh = load_obj_buf("tri", &mut Cursor::new(TRIANGLE_WITH_ATTRIBUTES)).unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.normals.iter().all(|n| *n == Vector3::new(0.0, 1.0, 0.0)));
        assert!(mesh.uvs.iter().all(|uv| *uv == Vector2::new(0.25, 0.75)));
    }

    #[test]
    fn test_empty_model_rejected() {
        let result = load_obj_buf("points", &mut Cursor::new("v 0 0 0\nv 1 0 0\n"));
        assert!(matches!(result, Err(ResourceError::EmptyModel(name)) if name == "points"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_obj("does/not/exist.obj").unwrap_err();
        assert!(matches!(err, ResourceError::ObjLoad { .. }));
        assert!(err.to_string().contains("does/not/exist.obj"));
    }
}
