//! Container assembler: emits a complete ASiC-E archive.
//!
//! The assembler drives [`ZipWriter`] and [`Manifest`] to produce the
//! byte layout the ASiC-E specification mandates. For a fresh container the
//! emission order is fixed:
//!
//! 1. `mimetype` — STORED, first, no comment, exact size/CRC
//! 2. `META-INF/manifest.xml` — DEFLATED
//! 3. one DEFLATED entry per data file, content copied verbatim
//! 4. `META-INF/signatures<N>.xml` — DEFLATED, N from a caller-supplied index
//!
//! Re-packaging an existing container replays its preserved entries instead
//! of steps 2–3 and appends new signatures; across any number of cycles the
//! caller must keep the mimetype entry first, unique and uncompressed.
//!
//! The assembler holds exclusive sequential ownership of the output sink for
//! the lifetime of one assembly; on a fatal error the sink is simply dropped
//! unfinished — releasing it stays with the caller.

use crate::container::manifest::Manifest;
use crate::container::zip::ZipWriter;
use crate::errors::AssemblyResult;
use crate::types::{
    signature_path, CompressionMode, DataFile, PreservedEntry, Signature, ASICE_MIMETYPE,
    MANIFEST_PATH, MIMETYPE_PATH,
};
use std::io::{Cursor, Write};
use tracing::debug;

/// Assembles one container onto a `Write` sink.
///
/// The zip comment, when configured, is attached to the manifest, data-file
/// and signature entries and as the whole-archive comment at finalize time.
/// It is never attached to the mimetype entry (which must stay spec-minimal)
/// nor to preserved entries (which are replayed verbatim). The comment is
/// fixed at construction, before any write path can reach `finalize`.
pub struct ContainerAssembler<W: Write> {
    zip: ZipWriter<W>,
    zip_comment: Option<String>,
}

impl<W: Write> ContainerAssembler<W> {
    /// Start assembling onto `out`.
    pub fn new(out: W) -> Self {
        Self {
            zip: ZipWriter::new(out),
            zip_comment: None,
        }
    }

    /// Configure the zip comment for this assembly.
    pub fn with_zip_comment(mut self, comment: impl Into<String>) -> Self {
        self.zip_comment = Some(comment.into());
        self
    }

    /// Write the `mimetype` entry: STORED, exact ASCII bytes of the ASiC-E
    /// media type, size and CRC-32 precomputed over those bytes, no comment.
    ///
    /// Must be the first write into a fresh container — conforming readers
    /// locate the media type by assuming the first entry is an uncompressed
    /// `mimetype`.
    pub fn write_mimetype(&mut self) -> AssemblyResult<()> {
        debug!("writing asice mimetype entry");
        let mut bytes = ASICE_MIMETYPE.as_bytes();
        self.zip
            .write_entry(MIMETYPE_PATH, &mut bytes, CompressionMode::Stored, None)
    }

    /// Serialize and write the OpenDocument manifest for `data_files`.
    pub fn write_manifest(&mut self, data_files: &[DataFile]) -> AssemblyResult<()> {
        debug!(files = data_files.len(), "writing container manifest");
        let xml = Manifest::for_data_files(data_files).to_xml();
        self.zip.write_entry(
            MANIFEST_PATH,
            &mut xml.as_bytes(),
            CompressionMode::Deflated,
            self.zip_comment.as_deref(),
        )
    }

    /// Write one DEFLATED entry per data file, consuming each content source
    /// exactly once.
    pub fn write_data_files(
        &mut self,
        data_files: impl IntoIterator<Item = DataFile>,
    ) -> AssemblyResult<()> {
        for data_file in data_files {
            debug!(name = %data_file.name, "adding data file to container");
            let name = data_file.name.clone();
            let mut reader = data_file.into_content().into_read();
            self.zip.write_entry(
                &name,
                &mut *reader,
                CompressionMode::Deflated,
                self.zip_comment.as_deref(),
            )?;
        }
        Ok(())
    }

    /// Write signature entries at `META-INF/signatures<N>.xml`, numbering
    /// from `start_index` in iteration order. When re-packaging, the caller
    /// supplies the next free index so existing signature files keep their
    /// names.
    pub fn write_signatures(
        &mut self,
        signatures: &[Signature],
        start_index: usize,
    ) -> AssemblyResult<()> {
        debug!(
            count = signatures.len(),
            start_index, "adding signatures to container"
        );
        for (offset, signature) in signatures.iter().enumerate() {
            let path = signature_path(start_index + offset);
            self.zip.write_entry(
                &path,
                &mut signature.raw.as_ref(),
                CompressionMode::Deflated,
                self.zip_comment.as_deref(),
            )?;
        }
        Ok(())
    }

    /// Replay entries preserved from an existing container, keeping each
    /// one's original compression mode — except that a `mimetype` entry
    /// (compared case-insensitively) is always forced to STORED, so a
    /// non-conformant source container cannot re-introduce a compressed
    /// mimetype.
    pub fn write_preserved_entries(
        &mut self,
        entries: impl IntoIterator<Item = PreservedEntry>,
    ) -> AssemblyResult<()> {
        for entry in entries {
            debug!(path = %entry.path, "replaying preserved container entry");
            let mode = if entry.path.eq_ignore_ascii_case(MIMETYPE_PATH) {
                CompressionMode::Stored
            } else {
                entry.mode
            };
            let path = entry.path.clone();
            let mut reader = entry.into_content().into_read();
            self.zip.write_entry(&path, &mut *reader, mode, None)?;
        }
        Ok(())
    }

    /// Flush and close the central directory, applying the archive comment.
    /// Returns the underlying sink; no further writes are possible.
    pub fn finalize(self) -> AssemblyResult<W> {
        debug!("finalizing container archive");
        self.zip.finish(self.zip_comment.as_deref())
    }
}

impl ContainerAssembler<Cursor<Vec<u8>>> {
    /// Assembler backed by an in-memory buffer. The finalized bytes are
    /// recovered with [`finalize_to_bytes`](Self::finalize_to_bytes) — only
    /// this variant's type exposes that operation, so requesting an
    /// in-memory result from a stream-backed assembler is a compile error
    /// rather than a runtime one.
    pub fn in_memory() -> Self {
        Self::new(Cursor::new(Vec::new()))
    }

    /// Finalize and return the complete archive bytes.
    pub fn finalize_to_bytes(self) -> AssemblyResult<Vec<u8>> {
        Ok(self.finalize()?.into_inner())
    }
}

/// Assemble a fresh container in one call: mimetype, manifest, data files,
/// signatures (numbered from 0), finalize. Returns the underlying sink.
pub fn assemble<W: Write>(
    out: W,
    data_files: Vec<DataFile>,
    signatures: &[Signature],
    zip_comment: Option<&str>,
) -> AssemblyResult<W> {
    let mut assembler = ContainerAssembler::new(out);
    if let Some(comment) = zip_comment {
        assembler = assembler.with_zip_comment(comment);
    }
    assembler.write_mimetype()?;
    assembler.write_manifest(&data_files)?;
    assembler.write_data_files(data_files)?;
    assembler.write_signatures(signatures, 0)?;
    assembler.finalize()
}
