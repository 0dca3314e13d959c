//! The compiled artifact and its materialisation from the pipe.

use std::io::{Cursor, Read};

use crate::error::CompileError;

/// A finished compilation: one gzip member wrapping one UTF-8 XML document.
/// Immutable once materialised, so it can be handed to any thread for
/// inspection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompiledArtifact {
    bytes: Vec<u8>,
}

impl CompiledArtifact {
    /// Drain a byte source fully into a new artifact, returning only once
    /// end-of-stream was observed.
    ///
    /// The source keeps being drained even when reading fails midway: the
    /// producer on the other end of a pipe may be blocked waiting for buffer
    /// space, and abandoning the read end would leave it blocked forever.
    /// # Errors
    /// Any read fault is fatal, the partially materialised bytes are
    /// discarded and the compile operation must be aborted.
    pub fn materialize(mut source: impl Read) -> Result<Self, CompileError> {
        let mut bytes = Vec::new();
        match source.read_to_end(&mut bytes) {
            Ok(_) => Ok(Self { bytes }),
            Err(error) => {
                let _ = std::io::copy(&mut source, &mut std::io::sink());
                Err(CompileError::Io(error))
            }
        }
    }

    /// The compressed size of the artifact in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the artifact holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw compressed bytes, for callers that persist the artifact.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// A fresh sequential reader over the compressed bytes.
    pub(crate) fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.bytes)
    }
}
