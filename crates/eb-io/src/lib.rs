//! `eb-io` — adapts the OFF mesh file format to the Edgebreaker codec core.
//!
//! The core (`eb-core`) only ever sees [`eb_core::MeshData`] in and
//! [`eb_core::DecodedMesh`] out; this crate is the thin layer that gets a
//! mesh off disk and back onto it again, in the one format the CLI tools
//! need (spec §6.4 names OFF explicitly as the interchange format).

pub mod off_reader;
pub mod off_writer;
pub mod traits;

pub use off_reader::{read_off, OffReader};
pub use off_writer::{write_off, OffWriter};
pub use traits::{Reader, Writer};
