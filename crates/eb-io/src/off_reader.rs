//! Minimal OFF (Object File Format) reader.
//!
//! Supports the plain `OFF` header, `# ` comments, and triangle faces only
//! (a face record with a leading count other than 3 is rejected, since the
//! codec never accepts meshes with faces of degree other than three).

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use eb_core::MeshData;

use crate::traits::Reader;

/// Reads an OFF file.
#[derive(Debug)]
pub struct OffReader {
    path: std::path::PathBuf,
}

impl OffReader {
    /// Opens `path` for reading, failing if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            ));
        }
        Ok(Self { path })
    }

    /// Parses the mesh out of the file.
    pub fn read_mesh(&mut self) -> io::Result<MeshData> {
        let file = fs::File::open(&self.path)?;
        read_off(BufReader::new(file))
    }
}

impl Reader for OffReader {
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        OffReader::open(path)
    }

    fn read_mesh(&mut self) -> io::Result<MeshData> {
        OffReader::read_mesh(self)
    }
}

fn bad_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Parses OFF-formatted text from `reader`, skipping blank lines and `#`
/// comments anywhere they appear (the format permits them between any two
/// tokens, not just at line starts).
pub fn read_off<R: BufRead>(reader: R) -> io::Result<MeshData> {
    let mut tokens = reader
        .lines()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flat_map(|line| {
            let line = match line.split_once('#') {
                Some((before, _)) => before.to_string(),
                None => line,
            };
            line.split_whitespace().map(str::to_string).collect::<Vec<_>>()
        });

    let header = tokens.next().ok_or_else(|| bad_data("empty OFF file"))?;
    if header != "OFF" && header != "COFF" {
        return Err(bad_data(format!("unsupported OFF header: {header}")));
    }

    let num_vertices: usize = tokens
        .next()
        .ok_or_else(|| bad_data("missing vertex count"))?
        .parse()
        .map_err(|_| bad_data("vertex count is not an integer"))?;
    let num_faces: usize = tokens
        .next()
        .ok_or_else(|| bad_data("missing face count"))?
        .parse()
        .map_err(|_| bad_data("face count is not an integer"))?;
    let _num_edges: usize = tokens
        .next()
        .ok_or_else(|| bad_data("missing edge count"))?
        .parse()
        .map_err(|_| bad_data("edge count is not an integer"))?;

    let mut points = Vec::with_capacity(num_vertices);
    for _ in 0..num_vertices {
        let mut coord = || -> io::Result<f64> {
            tokens
                .next()
                .ok_or_else(|| bad_data("truncated vertex record"))?
                .parse()
                .map_err(|_| bad_data("vertex coordinate is not a number"))
        };
        points.push([coord()?, coord()?, coord()?]);
    }

    let mut faces = Vec::with_capacity(num_faces);
    for _ in 0..num_faces {
        let degree: usize = tokens
            .next()
            .ok_or_else(|| bad_data("truncated face record"))?
            .parse()
            .map_err(|_| bad_data("face degree is not an integer"))?;
        if degree != 3 {
            return Err(bad_data(format!(
                "face has degree {degree}, only triangles are supported"
            )));
        }
        let mut index = || -> io::Result<u32> {
            tokens
                .next()
                .ok_or_else(|| bad_data("truncated face record"))?
                .parse()
                .map_err(|_| bad_data("face index is not an integer"))
        };
        faces.push([index()?, index()?, index()?]);
    }

    Ok(MeshData::new(points, faces))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_simple_tetrahedron() {
        let text = "OFF\n\
             4 4 0\n\
             0.0 0.0 0.0\n\
             1.0 0.0 0.0\n\
             0.0 1.0 0.0\n\
             0.0 0.0 1.0\n\
             3 0 2 1\n\
             3 0 1 3\n\
             3 0 3 2\n\
             3 1 2 3\n";
        let mesh = read_off(text.as_bytes()).unwrap();
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.faces.len(), 4);
        assert_eq!(mesh.faces[0], [0, 2, 1]);
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        let text = "OFF\n\
             # a comment\n\
             \n\
             3 1 0\n\
             0 0 0 # origin\n\
             1 0 0\n\
             0 1 0\n\
             3 0 1 2\n";
        let mesh = read_off(text.as_bytes()).unwrap();
        assert_eq!(mesh.points.len(), 3);
        assert_eq!(mesh.faces.len(), 1);
    }

    #[test]
    fn rejects_non_triangular_faces() {
        let text = "OFF\n4 1 0\n0 0 0\n1 0 0\n0 1 0\n1 1 0\n4 0 1 2 3\n";
        assert!(read_off(text.as_bytes()).is_err());
    }

    #[test]
    fn rejects_bad_header() {
        let text = "NOTOFF\n0 0 0\n";
        assert!(read_off(text.as_bytes()).is_err());
    }
}
