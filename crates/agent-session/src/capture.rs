//! Bounded capture of a command's output streams.
//!
//! Only the first and last [`CAPTURE_LIMIT`] bytes of a stream stay in
//! memory. Of the bytes in between only the newlines are counted, so the
//! caller can still say how many lines went missing.

use std::collections::VecDeque;

/// Bytes kept from each end of a stream.
pub const CAPTURE_LIMIT: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct BoundedCapture {
    head: Vec<u8>,
    tail: VecDeque<u8>,
    limit: usize,
    dropped_bytes: usize,
    dropped_newlines: usize,
}

impl Default for BoundedCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundedCapture {
    pub fn new() -> Self {
        Self::with_limit(CAPTURE_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            head: Vec::new(),
            tail: VecDeque::new(),
            limit,
            dropped_bytes: 0,
            dropped_newlines: 0,
        }
    }

    pub fn push(&mut self, mut data: &[u8]) {
        let room = self.limit.saturating_sub(self.head.len());
        if room > 0 {
            let take = room.min(data.len());
            self.head.extend_from_slice(&data[..take]);
            data = &data[take..];
        }

        self.tail.extend(data);
        let overflow = self.tail.len().saturating_sub(self.limit);
        if overflow > 0 {
            self.dropped_bytes += overflow;
            self.dropped_newlines += self
                .tail
                .drain(..overflow)
                .filter(|byte| *byte == b'\n')
                .count();
        }
    }

    /// Bytes currently held.
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Newlines among the dropped bytes, or `None` when nothing was dropped.
    pub fn dropped_newlines(&self) -> Option<usize> {
        (self.dropped_bytes > 0).then_some(self.dropped_newlines)
    }

    /// The kept bytes, decoded lossily, and the dropped-newline count.
    ///
    /// When bytes were dropped the head and tail are joined directly, so a
    /// character split at the seam decodes as a replacement character.
    pub fn into_text(self) -> (String, Option<usize>) {
        let dropped = self.dropped_newlines();
        let mut bytes = self.head;
        bytes.extend(self.tail);
        (String::from_utf8_lossy(&bytes).into_owned(), dropped)
    }
}
