//! Reconstruction reader
//!
//! [`PartsReader`] presents the ordered parts of a file as one continuous byte
//! stream. Parts are opened lazily and one at a time: part `i + 1` is only requested
//! from its backend once part `i` has delivered its declared length.

use futures::future::BoxFuture;
use futures::FutureExt;
use shardstore_core::{AppError, AppResult, FilePart};
use shardstore_storage::{BackendRegistry, PartBody};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf, Take};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

type OpenFuture = BoxFuture<'static, AppResult<PartBody>>;

enum State {
    NotStarted,
    Opening { index: usize, fut: OpenFuture },
    PartOpen { index: usize, body: Take<PartBody> },
    Exhausted,
    Closed,
    /// `deferred` holds an error raised while no read was waiting for it
    Failed { deferred: Option<io::Error> },
}

/// Observable position of a [`PartsReader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    NotStarted,
    /// Part `index` is being opened or read
    PartOpen { index: usize },
    Exhausted,
    Closed,
    Failed,
}

/// Streaming reader over the parts of one file.
///
/// Errors are reported as [`io::Error`] values wrapping an [`AppError`]:
/// a part that ends before its declared length yields [`io::ErrorKind::UnexpectedEof`],
/// a fired cancellation token yields [`io::ErrorKind::Interrupted`].
pub struct PartsReader {
    registry: Arc<BackendRegistry>,
    parts: Vec<FilePart>,
    state: State,
    cancel: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl PartsReader {
    pub fn new(
        registry: Arc<BackendRegistry>,
        parts: Vec<FilePart>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            parts,
            state: State::NotStarted,
            cancelled: Box::pin(cancel.clone().cancelled_owned()),
            cancel,
        }
    }

    pub fn state(&self) -> ReaderState {
        match &self.state {
            State::NotStarted => ReaderState::NotStarted,
            State::Opening { index, .. } | State::PartOpen { index, .. } => {
                ReaderState::PartOpen { index: *index }
            }
            State::Exhausted => ReaderState::Exhausted,
            State::Closed => ReaderState::Closed,
            State::Failed { .. } => ReaderState::Failed,
        }
    }

    /// Total number of bytes the reader yields when read to the end
    pub fn content_length(&self) -> u64 {
        self.parts.iter().map(|part| part.content_length).sum()
    }

    /// Release the part currently open, if any. Later reads fail.
    pub fn close(&mut self) {
        if matches!(self.state, State::Opening { .. } | State::PartOpen { .. }) {
            tracing::debug!(state = ?self.state(), "Parts reader closed");
            self.state = State::Closed;
        }
    }

    fn open_part(&self, index: usize) -> OpenFuture {
        let registry = self.registry.clone();
        let part = self.parts[index].clone();

        async move {
            let backend = registry.lookup(&part.backend_id).await?;
            let body = backend.download(&part.path).await?;
            tracing::debug!(
                part = index,
                backend = %part.backend_id,
                path = %part.path,
                size_bytes = part.content_length,
                "Part opened"
            );
            Ok(body)
        }
        .boxed()
    }

    /// Drop the current part and start opening the part at `next`.
    ///
    /// The open is polled once right away so a backend that answers immediately is
    /// ready before the caller reads again.
    fn advance(&mut self, next: usize, cx: &mut Context<'_>) {
        if next >= self.parts.len() {
            self.state = State::Exhausted;
            return;
        }

        let mut fut = self.open_part(next);
        self.state = match fut.as_mut().poll(cx) {
            Poll::Pending => State::Opening { index: next, fut },
            Poll::Ready(Ok(body)) => State::PartOpen {
                index: next,
                body: body.take(self.parts[next].content_length),
            },
            Poll::Ready(Err(e)) => State::Failed {
                deferred: Some(io::Error::other(e)),
            },
        };
    }

    fn fail(&mut self, error: io::Error) -> Poll<io::Result<()>> {
        self.state = State::Failed { deferred: None };
        Poll::Ready(Err(error))
    }
}

impl AsyncRead for PartsReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        let finished = matches!(
            this.state,
            State::Exhausted | State::Closed | State::Failed { .. }
        );
        if !finished
            && (this.cancel.is_cancelled() || this.cancelled.as_mut().poll(cx).is_ready())
        {
            tracing::debug!(state = ?this.state(), "Parts reader cancelled");
            return this.fail(io::Error::new(
                io::ErrorKind::Interrupted,
                AppError::Cancelled("read cancelled".to_string()),
            ));
        }

        loop {
            match &mut this.state {
                State::NotStarted => {
                    this.advance(0, cx);
                }
                State::Opening { index, fut } => {
                    let index = *index;
                    match fut.as_mut().poll(cx) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(Ok(body)) => {
                            let limit = this.parts[index].content_length;
                            this.state = State::PartOpen {
                                index,
                                body: body.take(limit),
                            };
                        }
                        Poll::Ready(Err(e)) => return this.fail(io::Error::other(e)),
                    }
                }
                State::PartOpen { index, body } => {
                    let index = *index;
                    if body.limit() == 0 {
                        this.advance(index + 1, cx);
                        continue;
                    }

                    let before = buf.filled().len();
                    match Pin::new(&mut *body).poll_read(cx, buf) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(Err(e)) => return this.fail(e),
                        Poll::Ready(Ok(())) => {
                            let read = buf.filled().len() - before;
                            if read == 0 && buf.remaining() > 0 {
                                let part = &this.parts[index];
                                let missing = body.limit();
                                let error = AppError::TransferFailed(format!(
                                    "part {} of {} on {} ended {} bytes early",
                                    index, part.path, part.backend_id, missing
                                ));
                                return this.fail(io::Error::new(
                                    io::ErrorKind::UnexpectedEof,
                                    error,
                                ));
                            }
                            if body.limit() == 0 {
                                tracing::debug!(part = index, "Part exhausted");
                                this.advance(index + 1, cx);
                            }
                            return Poll::Ready(Ok(()));
                        }
                    }
                }
                State::Exhausted => return Poll::Ready(Ok(())),
                State::Closed => {
                    return Poll::Ready(Err(io::Error::other(AppError::Internal(
                        "read from a closed parts reader".to_string(),
                    ))))
                }
                State::Failed { deferred } => {
                    let error = deferred.take().unwrap_or_else(|| {
                        io::Error::other(AppError::Internal(
                            "read from a failed parts reader".to_string(),
                        ))
                    });
                    return Poll::Ready(Err(error));
                }
            }
        }
    }
}
