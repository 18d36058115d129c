//! Response body types
//!
//! Static responses are either empty, an in-memory buffer, or a file streamed
//! in fixed-size chunks. The file handle lives inside the body, so dropping
//! the response (client gone, connection timeout) closes the file.

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};

/// Body type of every response produced by this crate
pub type StaticBody = UnsyncBoxBody<Bytes, io::Error>;

const CHUNK_SIZE: usize = 64 * 1024;

/// Empty body (HEAD, 304, redirects)
pub fn empty() -> StaticBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// In-memory body
pub fn full(data: impl Into<Bytes>) -> StaticBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Stream `len` bytes of an already opened file
pub fn file(file: File, len: u64) -> StaticBody {
    FileBody::new(file, len).boxed_unsync()
}

/// Streams a file as `Bytes` frames
///
/// Never yields more than the length announced in `Content-Length`, even if
/// the file grows while it is being sent.
pub struct FileBody {
    file: Option<File>,
    remaining: u64,
}

impl FileBody {
    pub const fn new(file: File, len: u64) -> Self {
        Self {
            file: Some(file),
            remaining: len,
        }
    }
}

impl Body for FileBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.remaining == 0 {
            this.file = None;
            return Poll::Ready(None);
        }
        let Some(file) = this.file.as_mut() else {
            return Poll::Ready(None);
        };

        let want = usize::try_from(this.remaining).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE));
        let mut chunk = vec![0u8; want];
        let filled = {
            let mut buf = ReadBuf::new(&mut chunk);
            match Pin::new(file).poll_read(cx, &mut buf) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) => {
                    this.file = None;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(Ok(())) => buf.filled().len(),
            }
        };

        if filled == 0 {
            // Truncated underneath us
            this.file = None;
            return Poll::Ready(None);
        }

        chunk.truncate(filled);
        this.remaining -= filled as u64;
        if this.remaining == 0 {
            this.file = None;
        }
        Poll::Ready(Some(Ok(Frame::data(Bytes::from(chunk)))))
    }

    fn is_end_stream(&self) -> bool {
        self.file.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining)
    }
}
