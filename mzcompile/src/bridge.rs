//! The background worker that compresses the compiler's document into a pipe.

use std::thread::JoinHandle;

use flate2::{Compression, write::GzEncoder};
use tracing::{debug, error};

use crate::{compiler::Compiler, error::CompileError, pipe::PipeWriter};

/// A background thread running a [`Compiler`]'s serialisation against a gzip
/// encoder over the write end of a bounded pipe.
///
/// The worker starts immediately on [`CompressionBridge::spawn`], before the
/// consumer begins reading, and runs to completion or failure: there is no
/// cancellation. On any outcome it closes its layers innermost to outermost,
/// so the consumer always observes a clean end-of-stream and is never left
/// hanging on a half-closed pipe. The producer's own failure is reported
/// through [`CompressionBridge::join`].
#[derive(Debug)]
pub struct CompressionBridge {
    worker: JoinHandle<Result<(), CompileError>>,
}

impl CompressionBridge {
    /// Start compressing `compiler`'s document into `sink` on a background
    /// thread.
    pub fn spawn<C: Compiler + Send + 'static>(compiler: C, sink: PipeWriter) -> Self {
        let worker = std::thread::spawn(move || {
            let mut encoder = GzEncoder::new(sink, Compression::default());
            let produced = compiler.write_document(&mut encoder);
            // Innermost to outermost: finishing the encoder writes the gzip
            // trailer, dropping the returned pipe writer closes the pipe.
            let finished = encoder.finish();
            match (produced, finished) {
                (Ok(()), Ok(_writer)) => Ok(()),
                (Ok(()), Err(close_error)) => Err(CompileError::Io(close_error)),
                (Err(producer_error), finished) => {
                    if let Err(close_error) = finished {
                        debug!(
                            "closing the compression layers after the producer failed also failed: {close_error}"
                        );
                    }
                    error!("the document producer failed: {producer_error}");
                    Err(CompileError::Producer(producer_error))
                }
            }
        });
        Self { worker }
    }

    /// Wait for the worker to finish and surface its outcome.
    /// # Errors
    /// [`CompileError::Producer`] when the compiler failed while serialising,
    /// [`CompileError::Io`] when the compression layers could not be closed.
    pub fn join(self) -> Result<(), CompileError> {
        self.worker.join().unwrap_or_else(|_| {
            Err(CompileError::Producer(std::io::Error::other(
                "the compression bridge panicked",
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use flate2::bufread::GzDecoder;

    use super::CompressionBridge;
    use crate::{compiler::Compiler, pipe};

    struct FixedDocument(&'static [u8]);

    impl Compiler for FixedDocument {
        fn name(&self) -> &str {
            "fixed"
        }

        fn write_document(&self, sink: &mut dyn Write) -> std::io::Result<()> {
            sink.write_all(self.0)
        }
    }

    struct FailingDocument;

    impl Compiler for FailingDocument {
        fn name(&self) -> &str {
            "failing"
        }

        fn write_document(&self, sink: &mut dyn Write) -> std::io::Result<()> {
            sink.write_all(b"<partial>")?;
            Err(std::io::Error::other("merge fault"))
        }
    }

    #[test]
    fn document_round_trips_through_the_bridge() {
        let (writer, mut reader) = pipe::bounded(2);
        let bridge = CompressionBridge::spawn(FixedDocument(b"<doc>spectra</doc>"), writer);

        let mut compressed = Vec::new();
        reader.read_to_end(&mut compressed).unwrap();
        bridge.join().unwrap();

        let mut decompressed = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decompressed)
            .unwrap();
        assert_eq!(decompressed, b"<doc>spectra</doc>");
    }

    #[test]
    fn producer_failure_surfaces_on_join() {
        let (writer, mut reader) = pipe::bounded(2);
        let bridge = CompressionBridge::spawn(FailingDocument, writer);

        // The consumer still observes end-of-stream, the pipe is not left
        // half-closed.
        let mut compressed = Vec::new();
        reader.read_to_end(&mut compressed).unwrap();

        let error = bridge.join().unwrap_err();
        assert!(error.to_string().contains("merge fault"));
    }
}
