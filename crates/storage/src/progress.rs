//! Byte-level upload progress.

use bytes::Bytes;
use futures_util::Stream;
use futures_util::stream::{self, StreamExt};

use crate::ProgressFn;

/// Size of the slices the request body is streamed in.
pub const BODY_CHUNK_SIZE: usize = 64 * 1024;

/// Converts transferred byte counts into non-decreasing percentages.
#[derive(Debug, Clone)]
pub struct ByteProgress {
    total: u64,
    sent: u64,
    last: Option<u8>,
}

impl ByteProgress {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            sent: 0,
            last: None,
        }
    }

    /// Records `n` more bytes sent. Returns the new percentage if it changed.
    pub fn advance(&mut self, n: u64) -> Option<u8> {
        self.sent = (self.sent + n).min(self.total);
        let pct = self.percent();
        if self.last.is_some_and(|last| pct <= last) {
            return None;
        }
        self.last = Some(pct);
        Some(pct)
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent as f64 / self.total as f64) * 100.0).round() as u8
    }
}

/// Wraps `data` in a body stream that reports progress as each slice is
/// pulled by the transport.
pub(crate) fn progress_stream(
    data: Bytes,
    on_progress: ProgressFn,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let total = data.len();
    let slices: Vec<Bytes> = (0..total)
        .step_by(BODY_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + BODY_CHUNK_SIZE).min(total)))
        .collect();

    let mut tracker = ByteProgress::new(total as u64);
    stream::iter(slices).map(move |slice| {
        if let Some(pct) = tracker.advance(slice.len() as u64) {
            on_progress(pct);
        }
        Ok(slice)
    })
}
