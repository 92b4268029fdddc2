//! OBJ file loader for 3D models

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use super::mesh::{Mesh, Vertex};
use super::{MeshLoader, ResourceError};

/// OBJ parsing failure
#[derive(Error, Debug)]
pub enum ObjError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be parsed
    #[error("Parse error on line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// The file parsed but does not describe a usable mesh
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Wavefront OBJ reader
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and return a mesh
    ///
    /// # Errors
    /// IO failures and malformed OBJ content.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh, ObjError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::parse(BufReader::new(file), path)
    }

    /// Parse OBJ text from any buffered reader; `source` is recorded on the mesh
    ///
    /// Faces with more than three corners are fan-triangulated.
    ///
    /// # Errors
    /// IO failures and malformed OBJ content.
    pub fn parse(reader: impl BufRead, source: &Path) -> Result<Mesh, ObjError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = number + 1;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                "v" => positions.push(parse_components(&parts[1..], line_no, "vertex")?),
                "vn" => normals.push(parse_components(&parts[1..], line_no, "normal")?),
                "vt" => tex_coords.push(parse_components(&parts[1..], line_no, "tex coord")?),
                "f" => {
                    if parts.len() < 4 {
                        return Err(parse_error(line_no, "face needs at least three vertices"));
                    }

                    let mut face_indices = Vec::with_capacity(parts.len() - 1);
                    for corner in &parts[1..] {
                        let mut refs = corner.split('/');
                        let position = refs
                            .next()
                            .and_then(|i| resolve_index(i, positions.len()))
                            .and_then(|i| positions.get(i))
                            .ok_or_else(|| parse_error(line_no, "position index out of bounds"))?;
                        let tex_coord = refs
                            .next()
                            .and_then(|i| resolve_index(i, tex_coords.len()))
                            .and_then(|i| tex_coords.get(i))
                            .unwrap_or(&[0.0, 0.0]);
                        let normal = refs
                            .next()
                            .and_then(|i| resolve_index(i, normals.len()))
                            .and_then(|i| normals.get(i))
                            .unwrap_or(&[0.0, 1.0, 0.0]);

                        vertices.push(Vertex {
                            position: *position,
                            normal: *normal,
                            tex_coord: *tex_coord,
                        });
                        let index = u32::try_from(vertices.len() - 1)
                            .map_err(|_| ObjError::InvalidFormat("too many vertices".to_string()))?;
                        face_indices.push(index);
                    }

                    for i in 1..face_indices.len() - 1 {
                        indices.extend_from_slice(&[face_indices[0], face_indices[i], face_indices[i + 1]]);
                    }
                }
                _ => {
                    // Ignore other commands
                }
            }
        }

        if vertices.is_empty() {
            return Err(ObjError::InvalidFormat("No vertices found in OBJ file".to_string()));
        }

        Ok(Mesh::new(source, vertices, indices))
    }
}

fn parse_error(line: usize, message: &str) -> ObjError {
    ObjError::ParseError {
        line,
        message: message.to_string(),
    }
}

fn parse_components<const N: usize>(parts: &[&str], line: usize, what: &str) -> Result<[f32; N], ObjError> {
    if parts.len() < N {
        return Err(parse_error(line, &format!("{what} needs {N} components")));
    }
    let mut out = [0.0; N];
    for (slot, text) in out.iter_mut().zip(parts) {
        *slot = text
            .parse()
            .map_err(|_| parse_error(line, &format!("invalid {what} component '{text}'")))?;
    }
    Ok(out)
}

/// Convert a 1-based (or negative, relative) OBJ index to a 0-based one
fn resolve_index(text: &str, len: usize) -> Option<usize> {
    let index: isize = text.parse().ok()?;
    match index {
        0 => None,
        i if i > 0 => Some(i.unsigned_abs() - 1),
        i => len.checked_sub(i.unsigned_abs()),
    }
}

/// [`MeshLoader`] reading Wavefront OBJ files from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjMeshLoader;

impl MeshLoader for ObjMeshLoader {
    fn load_mesh(&self, path: &Path) -> Result<Mesh, ResourceError> {
        ObjLoader::load_obj(path).map_err(|source| ResourceError::Mesh {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";

    #[test]
    fn test_parse_quad_is_fan_triangulated() {
        let mesh = ObjLoader::parse(Cursor::new(QUAD), Path::new("quad.obj")).unwrap();

        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices()[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.source(), Path::new("quad.obj"));

        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min.coords.as_slice(), &[0.0, 0.0, 0.0]);
        assert_eq!(max.coords.as_slice(), &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_negative_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = ObjLoader::parse(Cursor::new(text), Path::new("tri.obj")).unwrap();
        assert_eq!(mesh.vertices()[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_out_of_bounds_index_reports_line() {
        let text = "v 0 0 0\nf 1 2 3\n";
        let err = ObjLoader::parse(Cursor::new(text), Path::new("bad.obj")).unwrap_err();
        assert!(matches!(err, ObjError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_empty_file_is_invalid() {
        let err = ObjLoader::parse(Cursor::new("# nothing\n"), Path::new("empty.obj")).unwrap_err();
        assert!(matches!(err, ObjError::InvalidFormat(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ObjMeshLoader.load_mesh(Path::new("definitely/not/here.obj")).unwrap_err();
        assert!(matches!(err, ResourceError::Mesh { source: ObjError::Io(_), .. }));
    }
}
