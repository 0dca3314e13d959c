//! The boundary to the actual compilation algorithm.

use std::io::Write;

/// A producer of one compiled identification document. The merging, clustering
/// and inference work happens behind this trait, this crate only ever asks the
/// compiler to serialise the finished document into a byte sink.
pub trait Compiler {
    /// The project name of the document under compilation.
    fn name(&self) -> &str;

    /// Serialise the whole document into the given sink.
    /// # Errors
    /// If writing to the sink fails, or if the document cannot be produced.
    fn write_document(&self, sink: &mut dyn Write) -> std::io::Result<()>;
}
