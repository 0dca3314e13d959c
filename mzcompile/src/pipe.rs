//! A bounded single-producer/single-consumer byte pipe.
//!
//! The write end and the read end are handed to two different threads. The
//! writer blocks whenever the pipe holds `capacity` full chunks, the reader
//! blocks on an empty pipe, so peak memory stays bounded no matter how large
//! the stream is while bytes flow in strict FIFO order.

use std::{
    io::{Read, Write},
    sync::mpsc::{Receiver, SyncSender, sync_channel},
};

/// The maximal number of bytes moved per chunk.
pub const MAX_CHUNK: usize = 64 * 1024;

/// Create a connected pipe holding at most `capacity` chunks of at most
/// [`MAX_CHUNK`] bytes each.
pub fn bounded(capacity: usize) -> (PipeWriter, PipeReader) {
    let (sender, receiver) = sync_channel(capacity);
    (
        PipeWriter { sender },
        PipeReader {
            receiver,
            chunk: Vec::new(),
            pos: 0,
        },
    )
}

/// The write end of a [`bounded`] pipe. Dropping it closes the pipe, after
/// which the reader observes a clean end-of-stream.
#[derive(Debug)]
pub struct PipeWriter {
    sender: SyncSender<Vec<u8>>,
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let take = buf.len().min(MAX_CHUNK);
        self.sender.send(buf[..take].to_vec()).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "the read end of the pipe was dropped",
            )
        })?;
        Ok(take)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        // Every chunk is handed over on write, there is nothing to flush.
        Ok(())
    }
}

/// The read end of a [`bounded`] pipe.
#[derive(Debug)]
pub struct PipeReader {
    receiver: Receiver<Vec<u8>>,
    /// The chunk currently being handed out.
    chunk: Vec<u8>,
    /// The position up to which `chunk` was already read.
    pos: usize,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.chunk.len() {
            match self.receiver.recv() {
                Ok(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                // A dropped writer is the end of the stream.
                Err(_) => return Ok(0),
            }
        }
        let available = &self.chunk[self.pos..];
        let take = available.len().min(buf.len());
        buf[..take].copy_from_slice(&available[..take]);
        self.pos += take;
        Ok(take)
    }
}
