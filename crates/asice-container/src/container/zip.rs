//! Sequential ZIP writer with the determinism the ASiC-E profile requires.
//!
//! The writer works over any `Write` sink, no seeking: each entry's payload
//! is buffered (and compressed) before its local header is emitted, so the
//! header always carries the exact CRC-32 and sizes and no data descriptor
//! is needed. Conforming ASiC-E readers depend on that for the `mimetype`
//! entry, which must be locatable as the first, uncompressed entry with
//! byte-exact size/CRC fields.
//!
//! # Determinism guarantees
//!
//! - fixed DOS timestamp (1980-01-01 00:00:00) on every entry
//! - no extra fields, no data descriptors
//! - entries appear in the archive in exactly the order they were written
//!
//! Entries are written strictly sequentially; an entry is fully closed
//! (payload flushed, central-directory record captured) before the next one
//! opens. `finish` consumes the writer, so writing after finalization is
//! unrepresentable.

use crate::errors::{AssemblyError, AssemblyResult};
use crate::types::CompressionMode;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::io::{self, Read, Write};

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIR_SIG: u32 = 0x0605_4b50;

/// Version 2.0: deflate support, no zip64.
const VERSION_NEEDED: u16 = 20;
const VERSION_MADE_BY: u16 = 20;

/// General-purpose bit 11: entry names and comments are UTF-8.
const FLAG_UTF8: u16 = 1 << 11;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

/// 1980-01-01 00:00:00 in MS-DOS date/time encoding.
const DOS_TIME: u16 = 0;
const DOS_DATE: u16 = 0x0021;

/// Central-directory record captured when an entry is closed.
struct EntryRecord {
    name: String,
    comment: Option<String>,
    method: u16,
    crc: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    header_offset: u32,
}

/// Writes one logical entry at a time into an open archive stream.
pub struct ZipWriter<W: Write> {
    out: W,
    offset: u64,
    entries: Vec<EntryRecord>,
    names: HashSet<String>,
}

impl<W: Write> ZipWriter<W> {
    /// Start a new archive on `out`. The writer owns the sink until
    /// [`finish`](Self::finish) or a fatal error.
    pub fn new(out: W) -> Self {
        Self {
            out,
            offset: 0,
            entries: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Write one entry, draining `source` to EOF exactly once.
    ///
    /// STORED entries are copied verbatim; DEFLATED entries are compressed
    /// with raw DEFLATE. Either way the payload is buffered first so the
    /// local header carries final CRC-32 and size fields. `comment`, when
    /// given, is attached to the entry's central-directory record.
    pub fn write_entry(
        &mut self,
        path: &str,
        source: &mut dyn Read,
        mode: CompressionMode,
        comment: Option<&str>,
    ) -> AssemblyResult<()> {
        self.validate_name(path)?;

        let mut raw = Vec::new();
        source
            .read_to_end(&mut raw)
            .map_err(|e| entry_write_error(path, e))?;

        let crc = crc32fast::hash(&raw);
        let uncompressed_size = size_field(path, raw.len())?;

        let (method, payload) = match mode {
            CompressionMode::Stored => (METHOD_STORED, raw),
            CompressionMode::Deflated => {
                let encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                let compressed = write_through(encoder, &raw).map_err(|e| entry_write_error(path, e))?;
                (METHOD_DEFLATED, compressed)
            }
        };
        let compressed_size = size_field(path, payload.len())?;

        let header_offset = u32::try_from(self.offset).map_err(|_| {
            entry_write_error(path, io::Error::other("archive exceeds 4 GiB, zip64 not supported"))
        })?;

        self.emit_local_header(path, method, crc, compressed_size, uncompressed_size)
            .and_then(|()| self.out.write_all(&payload))
            .map_err(|e| entry_write_error(path, e))?;

        self.offset += u64::from(compressed_size);
        self.names.insert(path.to_string());
        self.entries.push(EntryRecord {
            name: path.to_string(),
            comment: comment.map(str::to_owned),
            method,
            crc,
            compressed_size,
            uncompressed_size,
            header_offset,
        });
        Ok(())
    }

    /// Finalize the archive: central directory, end-of-central-directory
    /// record and optional whole-archive comment. Returns the underlying
    /// sink, flushed.
    pub fn finish(mut self, archive_comment: Option<&str>) -> AssemblyResult<W> {
        tracing::debug!(entries = self.entries.len(), "finalizing zip central directory");
        let central_offset = self.offset;
        let mut central_size = 0u64;
        for entry in std::mem::take(&mut self.entries) {
            central_size += self
                .emit_central_record(&entry)
                .map_err(AssemblyError::Finalize)?;
        }

        let comment = archive_comment.unwrap_or("").as_bytes();
        let result: io::Result<()> = (|| {
            write_u32(&mut self.out, END_OF_CENTRAL_DIR_SIG)?;
            write_u16(&mut self.out, 0)?; // this disk
            write_u16(&mut self.out, 0)?; // disk with central directory
            let count = u16::try_from(self.names.len())
                .map_err(|_| io::Error::other("too many entries for a non-zip64 archive"))?;
            write_u16(&mut self.out, count)?;
            write_u16(&mut self.out, count)?;
            write_u32(&mut self.out, narrow(central_size)?)?;
            write_u32(&mut self.out, narrow(central_offset)?)?;
            write_u16(
                &mut self.out,
                u16::try_from(comment.len())
                    .map_err(|_| io::Error::other("archive comment too long"))?,
            )?;
            self.out.write_all(comment)?;
            self.out.flush()
        })();
        result.map_err(AssemblyError::Finalize)?;
        Ok(self.out)
    }

    fn emit_local_header(
        &mut self,
        name: &str,
        method: u16,
        crc: u32,
        compressed_size: u32,
        uncompressed_size: u32,
    ) -> io::Result<()> {
        let name_bytes = name.as_bytes();
        write_u32(&mut self.out, LOCAL_HEADER_SIG)?;
        write_u16(&mut self.out, VERSION_NEEDED)?;
        write_u16(&mut self.out, FLAG_UTF8)?;
        write_u16(&mut self.out, method)?;
        write_u16(&mut self.out, DOS_TIME)?;
        write_u16(&mut self.out, DOS_DATE)?;
        write_u32(&mut self.out, crc)?;
        write_u32(&mut self.out, compressed_size)?;
        write_u32(&mut self.out, uncompressed_size)?;
        write_u16(&mut self.out, name_bytes.len() as u16)?;
        write_u16(&mut self.out, 0)?; // extra field length
        self.out.write_all(name_bytes)?;
        self.offset += 30 + name_bytes.len() as u64;
        Ok(())
    }

    /// Emit one central-directory record; returns its size in bytes.
    fn emit_central_record(&mut self, entry: &EntryRecord) -> io::Result<u64> {
        let name_bytes = entry.name.as_bytes();
        let comment_bytes = entry.comment.as_deref().unwrap_or("").as_bytes();
        let comment_len = u16::try_from(comment_bytes.len())
            .map_err(|_| io::Error::other("entry comment too long"))?;
        write_u32(&mut self.out, CENTRAL_HEADER_SIG)?;
        write_u16(&mut self.out, VERSION_MADE_BY)?;
        write_u16(&mut self.out, VERSION_NEEDED)?;
        write_u16(&mut self.out, FLAG_UTF8)?;
        write_u16(&mut self.out, entry.method)?;
        write_u16(&mut self.out, DOS_TIME)?;
        write_u16(&mut self.out, DOS_DATE)?;
        write_u32(&mut self.out, entry.crc)?;
        write_u32(&mut self.out, entry.compressed_size)?;
        write_u32(&mut self.out, entry.uncompressed_size)?;
        write_u16(&mut self.out, name_bytes.len() as u16)?;
        write_u16(&mut self.out, 0)?; // extra field length
        write_u16(&mut self.out, comment_len)?;
        write_u16(&mut self.out, 0)?; // disk number start
        write_u16(&mut self.out, 0)?; // internal attributes
        write_u32(&mut self.out, 0)?; // external attributes
        write_u32(&mut self.out, entry.header_offset)?;
        self.out.write_all(name_bytes)?;
        self.out.write_all(comment_bytes)?;
        Ok(46 + name_bytes.len() as u64 + comment_bytes.len() as u64)
    }

    /// Entry names must be relative, forward-slash paths with no traversal,
    /// short enough for the 16-bit header length field, unique within one
    /// assembly.
    fn validate_name(&self, path: &str) -> AssemblyResult<()> {
        let malformed = path.is_empty()
            || path.len() > usize::from(u16::MAX)
            || path.starts_with('/')
            || path.contains('\\')
            || path.split('/').any(|c| c.is_empty() || c == "." || c == "..");
        if malformed {
            return Err(AssemblyError::InvalidEntryName(path.to_string()));
        }
        if self.names.contains(path) {
            return Err(AssemblyError::DuplicateEntry(path.to_string()));
        }
        Ok(())
    }
}

fn entry_write_error(path: &str, source: io::Error) -> AssemblyError {
    tracing::error!(path, error = %source, "zip entry write failed");
    AssemblyError::EntryWrite {
        path: path.to_string(),
        source,
    }
}

fn write_through(mut encoder: DeflateEncoder<Vec<u8>>, raw: &[u8]) -> io::Result<Vec<u8>> {
    encoder.write_all(raw)?;
    encoder.finish()
}

fn size_field(path: &str, len: usize) -> AssemblyResult<u32> {
    u32::try_from(len).map_err(|_| {
        entry_write_error(path, io::Error::other("entry exceeds 4 GiB, zip64 not supported"))
    })
}

fn narrow(value: u64) -> io::Result<u32> {
    u32::try_from(value).map_err(|_| io::Error::other("archive exceeds 4 GiB, zip64 not supported"))
}

fn write_u16<W: Write>(out: &mut W, value: u16) -> io::Result<()> {
    out.write_all(&value.to_le_bytes())
}

fn write_u32<W: Write>(out: &mut W, value: u32) -> io::Result<()> {
    out.write_all(&value.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn write_single(path: &str, data: &[u8], mode: CompressionMode) -> Vec<u8> {
        let mut writer = ZipWriter::new(Vec::new());
        writer
            .write_entry(path, &mut Cursor::new(data), mode, None)
            .unwrap();
        writer.finish(None).unwrap()
    }

    #[test]
    fn stored_local_header_fields_are_exact() {
        let data = b"stored payload";
        let bytes = write_single("a.txt", data, CompressionMode::Stored);

        assert_eq!(&bytes[0..4], &LOCAL_HEADER_SIG.to_le_bytes());
        // method
        assert_eq!(&bytes[8..10], &METHOD_STORED.to_le_bytes());
        // crc
        assert_eq!(&bytes[14..18], &crc32fast::hash(data).to_le_bytes());
        // compressed == uncompressed == payload length
        assert_eq!(&bytes[18..22], &(data.len() as u32).to_le_bytes());
        assert_eq!(&bytes[22..26], &(data.len() as u32).to_le_bytes());
        // name immediately follows the fixed header
        assert_eq!(&bytes[30..35], b"a.txt");
        // payload follows verbatim
        assert_eq!(&bytes[35..35 + data.len()], data);
    }

    #[test]
    fn duplicate_entry_rejected() {
        let mut writer = ZipWriter::new(Vec::new());
        writer
            .write_entry("x", &mut Cursor::new(b"1"), CompressionMode::Deflated, None)
            .unwrap();
        let err = writer
            .write_entry("x", &mut Cursor::new(b"2"), CompressionMode::Deflated, None)
            .unwrap_err();
        assert!(matches!(err, AssemblyError::DuplicateEntry(name) if name == "x"));
    }

    #[test]
    fn traversing_and_absolute_names_rejected() {
        let mut writer = ZipWriter::new(Vec::new());
        for name in ["", "/etc/passwd", "a/../b", "./a", "a\\b", "a//b"] {
            let err = writer
                .write_entry(name, &mut Cursor::new(b""), CompressionMode::Stored, None)
                .unwrap_err();
            assert!(
                matches!(err, AssemblyError::InvalidEntryName(_)),
                "name {name:?} should be invalid"
            );
        }
    }

    #[test]
    fn overlong_name_rejected_and_header_limit_name_kept_intact() {
        let mut writer = ZipWriter::new(Vec::new());
        let overlong = "a".repeat(70_020);
        let err = writer
            .write_entry(&overlong, &mut Cursor::new(b""), CompressionMode::Stored, None)
            .unwrap_err();
        assert!(matches!(err, AssemblyError::InvalidEntryName(_)));

        // The longest representable name still round-trips with an exact
        // length field.
        let longest = "b".repeat(usize::from(u16::MAX));
        writer
            .write_entry(&longest, &mut Cursor::new(b""), CompressionMode::Stored, None)
            .unwrap();
        let bytes = writer.finish(None).unwrap();
        assert_eq!(&bytes[26..28], &u16::MAX.to_le_bytes());
        assert_eq!(&bytes[30..30 + longest.len()], longest.as_bytes());
    }

    #[test]
    fn archive_comment_lands_at_the_tail() {
        let mut writer = ZipWriter::new(Vec::new());
        writer
            .write_entry("a", &mut Cursor::new(b"x"), CompressionMode::Stored, None)
            .unwrap();
        let bytes = writer.finish(Some("trailing comment")).unwrap();
        assert!(bytes.ends_with(b"trailing comment"));
    }

    #[test]
    fn deterministic_across_rewrites() {
        let first = write_single("f.bin", b"same bytes", CompressionMode::Deflated);
        let second = write_single("f.bin", b"same bytes", CompressionMode::Deflated);
        assert_eq!(first, second);
    }
}
