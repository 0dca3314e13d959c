//! Orchestration of the compile-and-inspect pipeline.

use crate::{
    artifact::CompiledArtifact,
    bridge::CompressionBridge,
    compiler::Compiler,
    error::CompileError,
    extract::extract_metadata,
    pipe,
    report::build_report,
};

/// The number of chunks the compile pipe may hold, bounding the pipeline's
/// peak memory to `DEFAULT_PIPE_CHUNKS * `[`pipe::MAX_CHUNK`] bytes no matter
/// how large the document grows.
pub const DEFAULT_PIPE_CHUNKS: usize = 16;

/// Run the compiler's serialisation through the compression bridge and
/// materialise the result.
///
/// The caller's thread drains the pipe while the bridge compresses on its
/// own thread; the bounded pipe is the only synchronisation between the two.
/// # Errors
/// A producer failure takes precedence over the materialiser fault it may
/// have caused downstream; either is fatal for this invocation, nothing is
/// retried.
pub fn compile<C: Compiler + Send + 'static>(compiler: C) -> Result<CompiledArtifact, CompileError> {
    let (writer, reader) = pipe::bounded(DEFAULT_PIPE_CHUNKS);
    let bridge = CompressionBridge::spawn(compiler, writer);
    // Materialise before joining: the bridge blocks on the pipe until the
    // artifact side drains it to end-of-stream.
    let materialized = CompiledArtifact::materialize(reader);
    bridge.join()?;
    materialized
}

/// Extract the metadata sections of an artifact and build the report.
/// # Errors
/// * Structural faults from [`extract_metadata`].
/// * [`CompileError::EmptyReport`] when the resulting text is empty, which is
///   taken as evidence that the artifact could not be meaningfully
///   introspected at all.
pub fn inspect(artifact: &CompiledArtifact) -> Result<String, CompileError> {
    let metadata = extract_metadata(artifact)?;
    let report = build_report(
        &metadata.root,
        metadata.files.as_deref().unwrap_or_default(),
        metadata.software.as_deref().unwrap_or_default(),
    );
    if report.is_empty() {
        return Err(CompileError::EmptyReport);
    }
    Ok(report)
}

/// Compile a document and summarise its metadata in one call.
/// # Errors
/// See [`compile`] and [`inspect`].
pub fn compile_and_inspect<C: Compiler + Send + 'static>(
    compiler: C,
) -> Result<(CompiledArtifact, String), CompileError> {
    let artifact = compile(compiler)?;
    let report = inspect(&artifact)?;
    Ok((artifact, report))
}
