//! Container assembly: ZIP entry writing, manifest building and the
//! assembler orchestrating them.

pub mod assembler;
pub mod manifest;
pub mod zip;

pub use assembler::{assemble, ContainerAssembler};
pub use manifest::{Manifest, ManifestEntry};
pub use zip::ZipWriter;
