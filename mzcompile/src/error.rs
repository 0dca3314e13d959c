//! The error taxonomy of the compile-and-inspect pipeline.

use thiserror::Error;

/// Everything that can go fatally wrong while compiling an artifact or
/// inspecting its metadata. Mid-stream XML faults encountered after the root
/// element was accepted are not part of this taxonomy: those are recovered
/// locally by the extractor and at most shorten the report.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A pipe or disk fault while moving bytes. Fatal, the artifact of this
    /// invocation is unusable.
    #[error("I/O fault in the compilation pipeline: {0}")]
    Io(#[from] std::io::Error),

    /// The document producer failed while serialising. Surfaced to the caller
    /// when joining the [`crate::CompressionBridge`].
    #[error("the document producer failed: {0}")]
    Producer(std::io::Error),

    /// The artifact does not contain a recognisable document: no root element
    /// could be read at all.
    #[error("the artifact contains no root element")]
    MissingRoot,

    /// The artifact's root element is not the expected one. Raised before
    /// anything beyond the root tag is read.
    #[error("unexpected root element `{found}`, expected `{expected}`")]
    RootTagMismatch {
        /// The tag name that was actually found.
        found: String,
        /// The tag name a compiled artifact must carry.
        expected: &'static str,
    },

    /// The artifact could not be parsed far enough to reach the root element.
    #[error("the artifact is not well-formed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Inspection produced an empty report, evidence that the artifact could
    /// not be meaningfully introspected at all.
    #[error("inspection of the artifact produced an empty report")]
    EmptyReport,
}
