//! Byte-level and round-trip checks of the produced container format.
//!
//! Round-trip assertions deliberately re-read the archive with the `zip`
//! crate, an implementation independent of our writer.

use asice_container::{
    assemble, ContainerAssembler, DataFile, Signature, ASICE_MIMETYPE, MANIFEST_PATH,
};
use std::io::{Cursor, Read, Write};
use zip::ZipArchive;

fn sample_files() -> Vec<DataFile> {
    vec![
        DataFile::from_bytes("document.txt", "text/plain", b"hello bdoc".as_slice()),
        DataFile::from_bytes(
            "report.pdf",
            "application/pdf",
            b"%PDF-1.4 fake body".as_slice(),
        ),
    ]
}

fn sample_signatures() -> Vec<Signature> {
    vec![
        Signature::new(b"<xades>first</xades>".as_slice()),
        Signature::new(b"<xades>second</xades>".as_slice()),
    ]
}

#[test]
fn mimetype_is_first_stored_and_byte_exact() {
    let bytes = assemble(Vec::new(), sample_files(), &sample_signatures(), None).unwrap();

    // Raw local file header of the very first entry.
    assert_eq!(&bytes[0..4], b"PK\x03\x04", "local header signature");
    assert_eq!(
        u16::from_le_bytes([bytes[8], bytes[9]]),
        0,
        "mimetype must use method STORED"
    );
    let mimetype = ASICE_MIMETYPE.as_bytes();
    assert_eq!(
        u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]),
        crc32fast::hash(mimetype),
        "declared CRC-32 must cover the exact mimetype bytes"
    );
    assert_eq!(
        u32::from_le_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]),
        mimetype.len() as u32,
        "compressed size equals the mimetype string length"
    );
    assert_eq!(
        u32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]),
        mimetype.len() as u32,
        "uncompressed size equals the mimetype string length"
    );
    assert_eq!(&bytes[30..38], b"mimetype");
    assert_eq!(&bytes[38..38 + mimetype.len()], mimetype);

    // Independent reader agrees.
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let first = archive.by_index(0).unwrap();
    assert_eq!(first.name(), "mimetype");
    assert_eq!(first.compression(), zip::CompressionMethod::Stored);
    assert_eq!(first.size(), mimetype.len() as u64);
}

#[test]
fn mimetype_carries_no_comment_even_when_configured() {
    let mut assembler = ContainerAssembler::in_memory().with_zip_comment("bdoc zip comment");
    let files = sample_files();
    assembler.write_mimetype().unwrap();
    assembler.write_manifest(&files).unwrap();
    assembler.write_data_files(files).unwrap();
    let bytes = assembler.finalize_to_bytes().unwrap();

    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.comment(), b"bdoc zip comment");

    let mimetype = archive.by_name("mimetype").unwrap();
    assert_eq!(mimetype.comment(), "", "mimetype entry must stay comment-free");
    drop(mimetype);

    let manifest = archive.by_name(MANIFEST_PATH).unwrap();
    assert_eq!(manifest.comment(), "bdoc zip comment");
}

#[test]
fn round_trip_preserves_data_files_signatures_and_manifest() -> anyhow::Result<()> {
    let bytes = assemble(Vec::new(), sample_files(), &sample_signatures(), None)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    for (name, expected) in [
        ("document.txt", b"hello bdoc".as_slice()),
        ("report.pdf", b"%PDF-1.4 fake body".as_slice()),
    ] {
        let mut entry = archive.by_name(name)?;
        assert_eq!(entry.compression(), zip::CompressionMethod::Deflated);
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        assert_eq!(content, expected, "data file {name} must survive verbatim");
    }

    for (path, expected) in [
        ("META-INF/signatures0.xml", b"<xades>first</xades>".as_slice()),
        ("META-INF/signatures1.xml", b"<xades>second</xades>".as_slice()),
    ] {
        let mut entry = archive.by_name(path)?;
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        assert_eq!(content, expected, "signature {path} must survive verbatim");
    }

    let mut manifest_xml = String::new();
    archive.by_name(MANIFEST_PATH)?.read_to_string(&mut manifest_xml)?;
    assert_eq!(
        manifest_xml.matches("manifest:file-entry").count(),
        3,
        "root entry plus one per data file"
    );
    assert!(manifest_xml.contains("manifest:full-path=\"document.txt\" manifest:media-type=\"text/plain\""));
    assert!(manifest_xml
        .contains("manifest:full-path=\"report.pdf\" manifest:media-type=\"application/pdf\""));
    Ok(())
}

#[test]
fn streamed_data_files_are_copied_verbatim() {
    let payload = vec![0xAB_u8; 64 * 1024];
    let files = vec![DataFile::from_reader(
        "blob.bin",
        "application/octet-stream",
        Cursor::new(payload.clone()),
    )];
    let bytes = assemble(Vec::new(), files, &[], None).unwrap();

    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut content = Vec::new();
    archive
        .by_name("blob.bin")
        .unwrap()
        .read_to_end(&mut content)
        .unwrap();
    assert_eq!(content, payload);
}

#[test]
fn file_backed_assembly_is_readable_from_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("container.asice");

    let out = std::fs::File::create(&path)?;
    let mut assembler = ContainerAssembler::new(out);
    let files = sample_files();
    assembler.write_mimetype()?;
    assembler.write_manifest(&files)?;
    assembler.write_data_files(files)?;
    assembler.write_signatures(&sample_signatures(), 0)?;
    assembler.finalize()?.flush()?;

    let mut archive = ZipArchive::new(std::fs::File::open(&path)?)?;
    assert_eq!(archive.by_index(0)?.name(), "mimetype");
    assert_eq!(archive.len(), 6);
    Ok(())
}

#[test]
fn identical_inputs_produce_identical_archives() {
    let build = || assemble(Vec::new(), sample_files(), &sample_signatures(), None).unwrap();
    assert_eq!(build(), build(), "assembly must be deterministic");
}
