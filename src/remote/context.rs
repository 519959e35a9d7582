use crate::error::{AirulesError, Result};
use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cancellation and deadline carried through every outbound request.
///
/// Clones share the cancel flag, so a handle kept by the caller can stop
/// work running further down the stack.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl RequestContext {
    /// No deadline, never cancelled unless [`RequestContext::cancel`] is called.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(AirulesError::Cancelled);
        }
        match self.remaining() {
            Some(remaining) if remaining.is_zero() => Err(AirulesError::TimedOut),
            _ => Ok(()),
        }
    }
}

/// Reader that stops yielding bytes once its context is cancelled or expired.
/// Failures of the wrapped stream are kept for [`ContextReader::take_source_error`].
pub struct ContextReader<R> {
    inner: R,
    ctx: RequestContext,
    source_error: Option<io::Error>,
}

impl<R: Read> ContextReader<R> {
    pub fn new(inner: R, ctx: RequestContext) -> Self {
        Self {
            inner,
            ctx,
            source_error: None,
        }
    }

    /// Takes the error the wrapped stream failed with, if any.
    pub fn take_source_error(&mut self) -> Option<io::Error> {
        self.source_error.take()
    }
}

impl<R: Read> Read for ContextReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Err(err) = self.ctx.check() {
            return Err(io::Error::other(err.to_string()));
        }
        match self.inner.read(buf) {
            Err(err) if err.kind() != io::ErrorKind::Interrupted => {
                self.source_error = Some(io::Error::new(err.kind(), err.to_string()));
                Err(err)
            }
            other => other,
        }
    }
}
