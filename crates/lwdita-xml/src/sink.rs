//! Append-only output targets for the serializer.

use std::convert::Infallible;
use std::io::{self, Write};

/// Receives serialized output chunk by chunk.
pub trait OutputSink {
    type Error;

    fn emit(&mut self, chunk: &str) -> Result<(), Self::Error>;

    /// Called once, after the last chunk.
    fn close(&mut self) -> Result<(), Self::Error>;
}

/// Accumulates output in memory.
#[derive(Debug, Default)]
pub struct StringSink {
    buffer: String,
    closed: bool,
}

impl StringSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl OutputSink for StringSink {
    type Error = Infallible;

    fn emit(&mut self, chunk: &str) -> Result<(), Infallible> {
        self.buffer.push_str(chunk);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Infallible> {
        self.closed = true;
        Ok(())
    }
}

/// Writes output to any [`Write`]; closing flushes.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    type Error = io::Error;

    fn emit(&mut self, chunk: &str) -> io::Result<()> {
        self.writer.write_all(chunk.as_bytes())
    }

    fn close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
