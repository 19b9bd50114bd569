//! Bounded byte pipe between the report writer and its reader.
//!
//! The writer side buffers lines into a `BytesMut` and hands a frame over
//! every time `chunk_size` bytes have accumulated. At most `capacity` frames
//! are in flight; past that the writer blocks until the reader catches up.
//!
//! Every stream ends with exactly one terminal frame: [`Frame::End`] after a
//! complete report, or [`Frame::Failed`] carrying the reason the report was
//! cut short. A channel that closes without one is reported as
//! [`ReportError::Truncated`].

use std::fmt;
use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use futures::{ready, Stream};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::ReportError;
use crate::format::ReportSink;

/// Unit of transfer between writer and reader.
#[derive(Debug)]
pub enum Frame {
    Data(Bytes),
    End,
    Failed(ReportError),
}

/// Create a connected writer/reader pair.
pub fn channel(chunk_size: usize, capacity: usize) -> (ReportWriter, ReportStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let writer = ReportWriter {
        tx,
        buf: BytesMut::with_capacity(chunk_size),
        chunk_size: chunk_size.max(1),
        bytes_sent: 0,
    };
    let stream = ReportStream {
        rx,
        pending: Bytes::new(),
        done: false,
    };
    (writer, stream)
}

/// Producer end. Must not be used from inside an async runtime: sends block
/// the calling thread.
pub struct ReportWriter {
    tx: mpsc::Sender<Frame>,
    buf: BytesMut,
    chunk_size: usize,
    bytes_sent: u64,
}

impl ReportWriter {
    /// Hand buffered bytes to the reader.
    pub fn flush(&mut self) -> Result<(), ReportError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = self.buf.split().freeze();
        self.bytes_sent += chunk.len() as u64;
        trace!(bytes = chunk.len(), "Sending report chunk");
        self.tx
            .blocking_send(Frame::Data(chunk))
            .map_err(|_| ReportError::Disconnected)
    }

    /// Total bytes handed to the reader so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Flush and send the terminal frame for `outcome`.
    pub fn finish(mut self, outcome: Result<(), ReportError>) -> Result<(), ReportError> {
        match outcome {
            Ok(()) => {
                self.flush()?;
                self.send(Frame::End)
            }
            Err(ReportError::Disconnected) => Err(ReportError::Disconnected),
            Err(e) => {
                // Whatever was produced before the failure is still delivered.
                self.flush()?;
                self.send(Frame::Failed(e))
            }
        }
    }

    fn send(&self, frame: Frame) -> Result<(), ReportError> {
        self.tx
            .blocking_send(frame)
            .map_err(|_| ReportError::Disconnected)
    }
}

impl ReportSink for ReportWriter {
    fn write_line(&mut self, line: fmt::Arguments<'_>) -> Result<(), ReportError> {
        use std::fmt::Write;
        // BytesMut grows on demand; formatting into it cannot fail.
        let _ = self.buf.write_fmt(line);
        self.buf.extend_from_slice(b"\n");
        if self.buf.len() >= self.chunk_size {
            self.flush()?;
        }
        Ok(())
    }
}

/// Consumer end: the report as a byte stream.
///
/// Read it synchronously through [`std::io::Read`] (outside an async
/// runtime), or asynchronously as a [`futures::Stream`] of chunks.
#[derive(Debug)]
pub struct ReportStream {
    rx: mpsc::Receiver<Frame>,
    pending: Bytes,
    done: bool,
}

impl ReportStream {
    fn on_frame(&mut self, frame: Option<Frame>) -> Option<Result<Bytes, ReportError>> {
        match frame {
            Some(Frame::Data(chunk)) => Some(Ok(chunk)),
            Some(Frame::End) => {
                self.done = true;
                None
            }
            Some(Frame::Failed(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                Some(Err(ReportError::Truncated))
            }
        }
    }
}

impl Read for ReportStream {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        while self.pending.is_empty() {
            if self.done {
                return Ok(0);
            }
            let frame = self.rx.blocking_recv();
            match self.on_frame(frame) {
                Some(Ok(chunk)) => self.pending = chunk,
                Some(Err(e)) => return Err(io::Error::new(io::ErrorKind::Other, e)),
                None => return Ok(0),
            }
        }
        let n = out.len().min(self.pending.len());
        out[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }
}

impl Stream for ReportStream {
    type Item = Result<Bytes, ReportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if !this.pending.is_empty() {
            return Poll::Ready(Some(Ok(std::mem::take(&mut this.pending))));
        }
        if this.done {
            return Poll::Ready(None);
        }
        let frame = ready!(this.rx.poll_recv(cx));
        Poll::Ready(this.on_frame(frame))
    }
}
