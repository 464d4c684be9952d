//! `eb-core` — the Edgebreaker connectivity/geometry codec.
//!
//! This crate implements THE CORE of the codec: the Edgebreaker
//! connectivity traversal (encoder + decoder), parallelogram geometry
//! prediction, the context-adaptive binary arithmetic coder, and the
//! bit-exact EB container format that ties them together. External mesh
//! I/O and the CLI front-ends live one layer up, in `eb-io` and `eb-tools`.

pub mod arithmetic_coder;
pub mod bit_stream;
pub mod compression_config;
pub mod container;
pub mod context_selector;
pub mod corner_table;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod geometry_indices;
pub mod mesh;
pub mod opcode;
pub mod predictor;
pub mod quantization;

pub use compression_config::CompressionOptions;
pub use container::{read_eb_file, write_eb_file, DecodedContainer};
pub use decoder::{decode, decode_eb_file, DecodedMesh};
pub use encoder::{encode_mesh, EncodedMesh};
pub use error::{EbError, EbResult};
pub use mesh::MeshData;
