//! ASiC-E/BDoc container assembly.
//!
//! Produces ZIP-based signature containers whose byte layout satisfies the
//! ASiC-E specification: the `mimetype` entry first and uncompressed with
//! exact size/CRC fields, an OpenDocument manifest, verbatim data files and
//! detached XAdES signature files — with support for incremental
//! re-packaging of a previously opened container.
//!
//! Cryptographic signature production and verification live in an external
//! signature engine; this crate only packages the already-produced
//! artifacts and exposes the shared data model the validation crate reads.

pub mod container;
pub mod errors;
pub mod types;

// Convenience re-exports
pub use container::{assemble, ContainerAssembler, Manifest, ManifestEntry, ZipWriter};
pub use errors::{AssemblyError, AssemblyResult};
pub use types::{
    signature_path, CompressionMode, ContentSource, DataFile, PreservedEntry, RevocationEvidence,
    Signature, SignatureEvidence, TimestampEvidence, ASICE_MIMETYPE, MANIFEST_PATH, MIMETYPE_PATH,
};

// Re-export bytes for caller convenience
pub use bytes::Bytes;
