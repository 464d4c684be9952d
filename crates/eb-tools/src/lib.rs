//! Shared plumbing for the `eb_encode`/`eb_decode` binaries: a CLI-level
//! error type that wraps the codec's and I/O's own errors into a single
//! `std::process::exit` code, and the duplicate-vertex merge pass the
//! encoder itself does not perform (spec §6.4: merging is a CLI concern,
//! not a core one).

use std::collections::HashMap;

use eb_core::{EbError, MeshData};
use thiserror::Error;

/// Everything that can go wrong in a binary, collapsed to a single type so
/// `main` can match on it once and pick an exit code.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Codec(#[from] EbError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Exit code for a `CliError`: 1 for any data/I-O failure, matching
/// `clap`'s own usage-error code of 2 staying reserved for argument
/// parsing failures.
pub const EXIT_FAILURE: i32 = 1;

/// Welds together vertices at identical positions, remapping face indices
/// and dropping now-unused vertex slots. Used only behind `--merge-duplicates`;
/// the codec itself rejects coincident vertices outright (spec §3 edge
/// cases), so resolving duplicates is entirely this crate's job.
pub fn merge_duplicate_vertices(mesh: MeshData) -> MeshData {
    let mut seen: HashMap<[u64; 3], u32> = HashMap::with_capacity(mesh.points.len());
    let mut points = Vec::with_capacity(mesh.points.len());
    let mut remap = Vec::with_capacity(mesh.points.len());

    for p in &mesh.points {
        let key = [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()];
        let idx = *seen.entry(key).or_insert_with(|| {
            let idx = points.len() as u32;
            points.push(*p);
            idx
        });
        remap.push(idx);
    }

    let faces = mesh
        .faces
        .iter()
        .map(|f| [remap[f[0] as usize], remap[f[1] as usize], remap[f[2] as usize]])
        .collect();

    MeshData::new(points, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_coincident_vertices() {
        let mesh = MeshData::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0],
            ],
            vec![[0, 1, 2], [3, 1, 2]],
        );
        let merged = merge_duplicate_vertices(mesh);
        assert_eq!(merged.points.len(), 3);
        assert_eq!(merged.faces[0], merged.faces[1]);
    }

    #[test]
    fn leaves_distinct_vertices_alone() {
        let mesh = MeshData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        );
        let merged = merge_duplicate_vertices(mesh.clone());
        assert_eq!(merged.points, mesh.points);
        assert_eq!(merged.faces, mesh.faces);
    }
}
