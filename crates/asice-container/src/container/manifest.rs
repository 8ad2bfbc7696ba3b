//! OpenDocument manifest for the container.
//!
//! The manifest is the XML index at `META-INF/manifest.xml` listing every
//! packaged data file with its media type, after one root entry declaring
//! the container's own ASiC-E media type for the `/` path. It is built
//! transiently during assembly and discarded once serialized.

use crate::types::{DataFile, ASICE_MIMETYPE};

const MANIFEST_NAMESPACE: &str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";

/// One `(full_path, media_type)` pair of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub full_path: String,
    pub media_type: String,
}

/// Ordered list of manifest entries, one per data file.
///
/// Order follows the input order of the data files: it affects only
/// readability, but keeping it deterministic keeps containers reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build the manifest for a set of data files, preserving input order.
    pub fn for_data_files(data_files: &[DataFile]) -> Self {
        let entries = data_files
            .iter()
            .map(|file| ManifestEntry {
                full_path: file.name.clone(),
                media_type: file.media_type.clone(),
            })
            .collect();
        Self { entries }
    }

    /// The `(path, media-type)` pairs, in input order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Serialize to the OASIS OpenDocument manifest document.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.entries.len() * 96);
        xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        xml.push_str(&format!(
            "<manifest:manifest xmlns:manifest=\"{MANIFEST_NAMESPACE}\">\n"
        ));
        xml.push_str(&format!(
            " <manifest:file-entry manifest:full-path=\"/\" manifest:media-type=\"{ASICE_MIMETYPE}\"/>\n"
        ));
        for entry in &self.entries {
            xml.push_str(&format!(
                " <manifest:file-entry manifest:full-path=\"{}\" manifest:media-type=\"{}\"/>\n",
                escape_attribute(&entry.full_path),
                escape_attribute(&entry.media_type),
            ));
        }
        xml.push_str("</manifest:manifest>\n");
        xml
    }
}

/// Escape the five XML-significant characters for attribute context.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
