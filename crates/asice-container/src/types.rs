//! Shared data model for ASiC-E/BDoc containers.
//!
//! These types are the only coupling between the assembly path (this crate)
//! and the validation path (`asice-validation`): the assembler borrows or
//! consumes them to produce bytes, the validation chains read the evidence
//! fields and nothing else.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::io::{Cursor, Read};

/// ASiC-E container media type, the exact ASCII bytes of the `mimetype` entry.
pub const ASICE_MIMETYPE: &str = "application/vnd.etsi.asic-e+zip";

/// Path of the mimetype entry (always the first, uncompressed entry).
pub const MIMETYPE_PATH: &str = "mimetype";

/// Path of the OpenDocument manifest inside the container.
pub const MANIFEST_PATH: &str = "META-INF/manifest.xml";

/// Path of the Nth detached signature file.
pub fn signature_path(index: usize) -> String {
    format!("META-INF/signatures{index}.xml")
}

/// Compression mode of one archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    /// Uncompressed; header carries exact size and CRC-32 of the payload.
    Stored,
    /// Raw DEFLATE.
    Deflated,
}

/// A byte source consumed exactly once per entry write.
///
/// Collapses the bytes-vs-stream split into one type: callers hand over
/// either an owned buffer or a reader, the writer drains whichever it got.
pub enum ContentSource {
    /// Fully buffered payload.
    Bytes(Bytes),
    /// Streaming payload, drained to EOF on write.
    Reader(Box<dyn Read + Send>),
}

impl ContentSource {
    /// Turn the source into a reader; buffered payloads read from memory.
    pub fn into_read(self) -> Box<dyn Read + Send> {
        match self {
            ContentSource::Bytes(bytes) => Box::new(Cursor::new(bytes)),
            ContentSource::Reader(reader) => reader,
        }
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSource::Bytes(bytes) => write!(f, "ContentSource::Bytes({} bytes)", bytes.len()),
            ContentSource::Reader(_) => write!(f, "ContentSource::Reader"),
        }
    }
}

impl From<Bytes> for ContentSource {
    fn from(bytes: Bytes) -> Self {
        ContentSource::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ContentSource {
    fn from(bytes: Vec<u8>) -> Self {
        ContentSource::Bytes(bytes.into())
    }
}

/// One packaged document: unique entry name, media type and content.
#[derive(Debug)]
pub struct DataFile {
    /// Entry name inside the archive (must be a valid archive path).
    pub name: String,
    /// Media type recorded in the container manifest.
    pub media_type: String,
    content: ContentSource,
}

impl DataFile {
    /// Data file backed by an in-memory payload.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            content: ContentSource::Bytes(content.into()),
        }
    }

    /// Data file backed by a reader, drained once when the entry is written.
    pub fn from_reader(
        name: impl Into<String>,
        media_type: impl Into<String>,
        reader: impl Read + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            content: ContentSource::Reader(Box::new(reader)),
        }
    }

    /// Consume the file, yielding its content source.
    pub fn into_content(self) -> ContentSource {
        self.content
    }
}

/// A timestamp token bound to a signature, as parsed by the signature engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampEvidence {
    /// Generation time of the token; absent means no timestamp-based checks apply.
    pub generation_time: Option<DateTime<Utc>>,
    /// Raw token bytes (opaque here, verified by the signature engine).
    pub token: Bytes,
}

/// An OCSP response bound to a signature, as parsed by the signature engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationEvidence {
    /// Produced-at time of the response, if the engine could extract one.
    pub produced_at: Option<DateTime<Utc>>,
    /// Raw response bytes (opaque here).
    pub response: Bytes,
}

/// The already-parsed, already-verified evidence attached to one signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureEvidence {
    /// First signature timestamp, when present.
    pub timestamp: Option<TimestampEvidence>,
    /// First contained OCSP response, when present.
    pub revocation: Option<RevocationEvidence>,
}

/// One detached signature artifact. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Raw XAdES signature bytes, packaged verbatim.
    pub raw: Bytes,
    /// Parsed evidence supplied by the signature engine.
    pub evidence: SignatureEvidence,
}

impl Signature {
    /// Signature with no attached evidence.
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Self {
            raw: raw.into(),
            evidence: SignatureEvidence::default(),
        }
    }

    /// Attach a timestamp token.
    pub fn with_timestamp(mut self, timestamp: TimestampEvidence) -> Self {
        self.evidence.timestamp = Some(timestamp);
        self
    }

    /// Attach an OCSP response.
    pub fn with_revocation(mut self, revocation: RevocationEvidence) -> Self {
        self.evidence.revocation = Some(revocation);
        self
    }
}

/// An entry copied verbatim from an existing container being re-packaged.
#[derive(Debug)]
pub struct PreservedEntry {
    /// Archive path of the entry in the source container.
    pub path: String,
    /// Original compression mode. A `mimetype` entry is forced to STORED
    /// on write regardless of what the source container claimed.
    pub mode: CompressionMode,
    content: ContentSource,
}

impl PreservedEntry {
    /// Preserved entry with its original mode and content.
    pub fn new(
        path: impl Into<String>,
        mode: CompressionMode,
        content: impl Into<ContentSource>,
    ) -> Self {
        Self {
            path: path.into(),
            mode,
            content: content.into(),
        }
    }

    /// Preserved entry backed by a reader.
    pub fn from_reader(
        path: impl Into<String>,
        mode: CompressionMode,
        reader: impl Read + Send + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            mode,
            content: ContentSource::Reader(Box::new(reader)),
        }
    }

    /// Consume the entry, yielding its content source.
    pub fn into_content(self) -> ContentSource {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_path_naming() {
        assert_eq!(signature_path(0), "META-INF/signatures0.xml");
        assert_eq!(signature_path(7), "META-INF/signatures7.xml");
    }

    #[test]
    fn content_source_reads_back_bytes() {
        let source = ContentSource::from(b"hello".to_vec());
        let mut buf = Vec::new();
        source.into_read().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn signature_builder_attaches_evidence() {
        let sig = Signature::new(b"<xml/>".as_slice()).with_revocation(RevocationEvidence {
            produced_at: None,
            response: Bytes::from_static(b"ocsp"),
        });
        assert!(sig.evidence.revocation.is_some());
        assert!(sig.evidence.timestamp.is_none());
    }
}
