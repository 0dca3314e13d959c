//! Selective extraction of the metadata sections of a compiled artifact.
//!
//! The artifact wraps one XML document whose bulk (spectra, peptides,
//! proteins, clustering) dwarfs its metadata. The extractor pull-parses the
//! document, decodes exactly the `filesList` and `softwareList` subtrees and
//! skips every other root child without buffering it, stopping as soon as
//! both sections were found. Extraction cost is therefore bounded by the
//! token count, never by the object count, of the unrecognised sections.

use std::io::{BufRead, BufReader};

use flate2::bufread::GzDecoder;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use tracing::warn;

use crate::{
    artifact::CompiledArtifact,
    error::CompileError,
    metadata::{FileEntry, FilesList, ModificationEntry, ProtocolEntry, RootInfo, SoftwareEntry, SoftwareList},
};

/// The tag name every compiled artifact's root element must carry.
pub const ROOT_TAG: &str = "mzCompilation";
/// The root child listing the compiled input files.
pub const FILES_LIST_TAG: &str = "filesList";
/// The root child listing the analysis software.
pub const SOFTWARE_LIST_TAG: &str = "softwareList";

const FILE_TAG: &str = "file";
const PROTOCOL_TAG: &str = "protocol";
const ENZYME_TAG: &str = "enzyme";
const MODIFICATION_TAG: &str = "modification";
const SOFTWARE_TAG: &str = "software";
const CV_PARAM_TAG: &str = "cvParam";
const USER_PARAM_TAG: &str = "userParam";

/// The decoded metadata of one compiled artifact.
///
/// Either list is `None` when the document closed, or a mid-stream fault was
/// hit, before the corresponding section was seen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentMetadata {
    /// The root element's information, read before anything else.
    pub root: RootInfo,
    /// The compiled input files, when the `filesList` section was decoded.
    pub files: Option<FilesList>,
    /// The analysis software, when the `softwareList` section was decoded.
    pub software: Option<SoftwareList>,
}

/// Decode the two metadata sections of a compiled artifact without decoding
/// anything else.
///
/// A fault before the root element was accepted is fatal. A fault after that
/// point is recovered locally: it is logged, extraction stops and whatever
/// sections were already fully decoded are kept.
/// # Errors
/// * [`CompileError::MissingRoot`] or [`CompileError::Xml`] when no root
///   element can be read at all.
/// * [`CompileError::RootTagMismatch`] when the root element is not
///   [`ROOT_TAG`] (compared case-insensitively), raised before anything past
///   the root tag is read.
pub fn extract_metadata(artifact: &CompiledArtifact) -> Result<DocumentMetadata, CompileError> {
    // Layer the readers just like the writer side layered its sinks; all of
    // them unwind by drop on every exit path.
    let decoder = GzDecoder::new(artifact.reader());
    let mut reader = Reader::from_reader(BufReader::new(decoder));
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let (root, root_has_children) = loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => break (root_info(&element)?, true),
            Event::Empty(element) => break (root_info(&element)?, false),
            Event::End(_) | Event::Eof => return Err(CompileError::MissingRoot),
            // Prolog content before the root element.
            _ => {}
        }
    };

    let mut metadata = DocumentMetadata {
        root,
        files: None,
        software: None,
    };
    if !root_has_children {
        return Ok(metadata);
    }

    let mut skip_buf = Vec::new();
    loop {
        if metadata.files.is_some() && metadata.software.is_some() {
            break;
        }
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) => {
                if metadata.files.is_none() && matches_tag(&element, FILES_LIST_TAG) {
                    match decode_files_list(&mut reader) {
                        Ok(files) => metadata.files = Some(files),
                        Err(error) => {
                            warn!("stopped extraction inside the files list: {error}");
                            break;
                        }
                    }
                } else if metadata.software.is_none() && matches_tag(&element, SOFTWARE_LIST_TAG) {
                    match decode_software_list(&mut reader) {
                        Ok(software) => metadata.software = Some(software),
                        Err(error) => {
                            warn!("stopped extraction inside the software list: {error}");
                            break;
                        }
                    }
                } else if let Err(error) = skip_subtree(&mut reader, &element, &mut skip_buf) {
                    warn!("stopped extraction while skipping a section: {error}");
                    break;
                }
            }
            Ok(Event::Empty(element)) => {
                if metadata.files.is_none() && matches_tag(&element, FILES_LIST_TAG) {
                    metadata.files = Some(Vec::new());
                } else if metadata.software.is_none() && matches_tag(&element, SOFTWARE_LIST_TAG) {
                    metadata.software = Some(Vec::new());
                }
            }
            // The root's own end tag, or a document that simply stopped.
            Ok(Event::End(_) | Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                warn!("stopped extraction on a mid-stream fault: {error}");
                break;
            }
        }
    }

    Ok(metadata)
}

/// Check the root tag and capture its optional `name` attribute.
fn root_info(element: &BytesStart) -> Result<RootInfo, CompileError> {
    if !matches_tag(element, ROOT_TAG) {
        return Err(CompileError::RootTagMismatch {
            found: String::from_utf8_lossy(element.local_name().as_ref()).into_owned(),
            expected: ROOT_TAG,
        });
    }
    Ok(RootInfo {
        project_name: attribute(element, "name"),
    })
}

/// Case-insensitive comparison of an element's local name against a known tag.
fn matches_tag(element: &BytesStart, tag: &str) -> bool {
    element
        .local_name()
        .as_ref()
        .eq_ignore_ascii_case(tag.as_bytes())
}

/// The value of the named attribute, matched case-insensitively on the local
/// name. Unparseable attributes are treated as absent.
fn attribute(element: &BytesStart, key: &str) -> Option<String> {
    element
        .attributes()
        .filter_map(Result::ok)
        .find(|attribute| {
            attribute
                .key
                .local_name()
                .as_ref()
                .eq_ignore_ascii_case(key.as_bytes())
        })
        .and_then(|attribute| attribute.unescape_value().ok())
        .map(std::borrow::Cow::into_owned)
}

/// Advance the cursor past the subtree opened by `start` without interpreting
/// or buffering any of its content.
fn skip_subtree<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    buf: &mut Vec<u8>,
) -> Result<(), quick_xml::Error> {
    let end = start.to_end().into_owned();
    buf.clear();
    reader.read_to_end_into(end.name(), buf).map(|_| ())
}

fn premature_end() -> quick_xml::Error {
    quick_xml::Error::Io(std::sync::Arc::new(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "the document ended inside a metadata section",
    )))
}

/// Decode a `filesList` subtree, leaving the cursor just past its end tag.
fn decode_files_list<R: BufRead>(reader: &mut Reader<R>) -> Result<FilesList, quick_xml::Error> {
    let mut files = Vec::new();
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) if matches_tag(&element, FILE_TAG) => {
                let mut entry = file_entry(&element);
                decode_file(reader, &mut entry)?;
                files.push(entry);
            }
            Event::Empty(element) if matches_tag(&element, FILE_TAG) => {
                files.push(file_entry(&element));
            }
            Event::Start(element) => skip_subtree(reader, &element, &mut skip_buf)?,
            Event::End(_) => return Ok(files),
            Event::Eof => return Err(premature_end()),
            _ => {}
        }
    }
}

fn file_entry(element: &BytesStart) -> FileEntry {
    FileEntry {
        id: attribute(element, "id").unwrap_or_default(),
        name: attribute(element, "name").unwrap_or_default(),
        file_path: attribute(element, "filePath").unwrap_or_default(),
        protocols: Vec::new(),
    }
}

/// Decode the protocols of one `file` element.
fn decode_file<R: BufRead>(
    reader: &mut Reader<R>,
    entry: &mut FileEntry,
) -> Result<(), quick_xml::Error> {
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) if matches_tag(&element, PROTOCOL_TAG) => {
                let mut protocol = protocol_entry(&element);
                decode_protocol(reader, &mut protocol)?;
                entry.protocols.push(protocol);
            }
            Event::Empty(element) if matches_tag(&element, PROTOCOL_TAG) => {
                entry.protocols.push(protocol_entry(&element));
            }
            Event::Start(element) => skip_subtree(reader, &element, &mut skip_buf)?,
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(premature_end()),
            _ => {}
        }
    }
}

fn protocol_entry(element: &BytesStart) -> ProtocolEntry {
    ProtocolEntry {
        software_ref: attribute(element, "softwareRef").unwrap_or_default(),
        enzymes: Vec::new(),
        modifications: Vec::new(),
    }
}

/// Decode the enzymes and modifications of one `protocol` element.
fn decode_protocol<R: BufRead>(
    reader: &mut Reader<R>,
    protocol: &mut ProtocolEntry,
) -> Result<(), quick_xml::Error> {
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Empty(element)
                if matches_tag(&element, ENZYME_TAG) || matches_tag(&element, MODIFICATION_TAG) =>
            {
                record_setting(protocol, &element);
            }
            Event::Start(element)
                if matches_tag(&element, ENZYME_TAG) || matches_tag(&element, MODIFICATION_TAG) =>
            {
                record_setting(protocol, &element);
                // A non-empty setting element may still carry children this
                // decoder has no use for.
                skip_subtree(reader, &element, &mut skip_buf)?;
            }
            Event::Start(element) => skip_subtree(reader, &element, &mut skip_buf)?,
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(premature_end()),
            _ => {}
        }
    }
}

/// Record one enzyme or modification setting on the protocol.
fn record_setting(protocol: &mut ProtocolEntry, element: &BytesStart) {
    if matches_tag(element, ENZYME_TAG) {
        if let Some(name) = attribute(element, "name") {
            protocol.enzymes.push(name);
        }
    } else if let Some(mass_delta) = attribute(element, "massDelta")
        .and_then(|value| value.parse::<f64>().ok())
    {
        protocol.modifications.push(ModificationEntry {
            mass_delta,
            residues: attribute(element, "residues").unwrap_or_default(),
        });
    }
    // A modification without a parseable mass delta is dropped, in line with
    // the policy of never failing on unrecognised metadata details.
}

/// Decode a `softwareList` subtree, leaving the cursor just past its end tag.
fn decode_software_list<R: BufRead>(
    reader: &mut Reader<R>,
) -> Result<SoftwareList, quick_xml::Error> {
    let mut software = Vec::new();
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) if matches_tag(&element, SOFTWARE_TAG) => {
                let mut entry = SoftwareEntry {
                    id: attribute(&element, "id").unwrap_or_default(),
                    name: None,
                };
                decode_software(reader, &mut entry)?;
                software.push(entry);
            }
            Event::Empty(element) if matches_tag(&element, SOFTWARE_TAG) => {
                software.push(SoftwareEntry {
                    id: attribute(&element, "id").unwrap_or_default(),
                    name: None,
                });
            }
            Event::Start(element) => skip_subtree(reader, &element, &mut skip_buf)?,
            Event::End(_) => return Ok(software),
            Event::Eof => return Err(premature_end()),
            _ => {}
        }
    }
}

/// Decode the display name of one `software` element. The name comes from
/// either a controlled vocabulary term (`cvParam`) or a free-text parameter
/// (`userParam`); when neither is present it stays absent.
fn decode_software<R: BufRead>(
    reader: &mut Reader<R>,
    entry: &mut SoftwareEntry,
) -> Result<(), quick_xml::Error> {
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Empty(element)
                if matches_tag(&element, CV_PARAM_TAG) || matches_tag(&element, USER_PARAM_TAG) =>
            {
                if entry.name.is_none() {
                    entry.name = attribute(&element, "name");
                }
            }
            Event::Start(element) => {
                if (matches_tag(&element, CV_PARAM_TAG) || matches_tag(&element, USER_PARAM_TAG))
                    && entry.name.is_none()
                {
                    entry.name = attribute(&element, "name");
                }
                skip_subtree(reader, &element, &mut skip_buf)?;
            }
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(premature_end()),
            _ => {}
        }
    }
}
