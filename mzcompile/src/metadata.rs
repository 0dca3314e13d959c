//! The metadata decoded from a compiled artifact.
//!
//! These structures only exist for the duration of one extraction call, they
//! are never persisted by this crate.

use serde::{Deserialize, Serialize};

/// The information carried on the document's root element.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RootInfo {
    /// The project name, if the root element carried one.
    pub project_name: Option<String>,
}

/// One compiled input file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FileEntry {
    /// The stable identifier of this file within the compilation.
    pub id: String,
    /// The display name of this file.
    pub name: String,
    /// The path the file was compiled from.
    pub file_path: String,
    /// The analysis protocols applied to this file, in document order.
    pub protocols: Vec<ProtocolEntry>,
}

/// One analysis protocol of a compiled input file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ProtocolEntry {
    /// The identifier of the software this protocol was run with, resolved
    /// against the document's software list.
    pub software_ref: String,
    /// The names of the enzymes used, in document order.
    pub enzymes: Vec<String>,
    /// The modification settings used, in document order.
    pub modifications: Vec<ModificationEntry>,
}

/// One modification setting of an analysis protocol.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ModificationEntry {
    /// The monoisotopic mass delta of the modification.
    pub mass_delta: f64,
    /// The residues the modification applies to.
    pub residues: String,
}

/// One entry of the document's analysis software list.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SoftwareEntry {
    /// The identifier software references resolve against.
    pub id: String,
    /// The display name. Absent when the source document encodes the name in
    /// a form the decoder does not recognise.
    pub name: Option<String>,
}

/// All compiled input files, in document order.
pub type FilesList = Vec<FileEntry>;
/// All analysis software entries, in document order.
pub type SoftwareList = Vec<SoftwareEntry>;

/// Find the software entry a protocol references.
pub(crate) fn resolve_software<'a>(
    software: &'a [SoftwareEntry],
    reference: &str,
) -> Option<&'a SoftwareEntry> {
    software.iter().find(|entry| entry.id == reference)
}
