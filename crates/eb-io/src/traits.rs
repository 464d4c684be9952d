//! Common reader/writer interface for mesh file formats.
//!
//! The codec core (`eb-core`) only knows about [`eb_core::MeshData`] and
//! [`eb_core::DecodedMesh`]; everything format-specific (parsing OFF text,
//! writing it back out) lives behind these two traits so a caller can be
//! generic over "however this mesh got onto disk."

use std::io;
use std::path::Path;

use eb_core::MeshData;

/// Reads a mesh from a file.
pub trait Reader: Sized {
    /// Opens `path` for reading.
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self>;

    /// Reads the mesh (vertex positions and triangle-vertex indices).
    fn read_mesh(&mut self) -> io::Result<MeshData>;
}

/// Writes a mesh to a file.
pub trait Writer {
    /// Writes `mesh` to `path`.
    fn write_mesh<P: AsRef<Path>>(&self, mesh: &MeshData, path: P) -> io::Result<()>;
}
