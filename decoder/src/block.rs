//! ASTERIX block framing.
//!
//! A block is one octet of category, a two-octet big-endian total
//! length (itself included), then the record payload.  Nothing else
//! delimits blocks in a file, so a bad length means the rest of the
//! stream cannot be trusted and framing stops there.
//!

use tracing::warn;

use crate::error::DecodeError;

/// One framed block: category plus its raw record payload.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Block<'a> {
    pub category: u8,
    /// Byte offset of the block header in the input
    pub offset: usize,
    pub payload: &'a [u8],
}

/// Frames a byte slice into successive blocks.
///
#[derive(Clone, Debug)]
pub struct BlockReader<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> BlockReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BlockReader {
            data,
            pos: 0,
            failed: false,
        }
    }

    /// Byte offset of the next unread block header.
    ///
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Frame the next block, or `None` at end of stream.  After a
    /// framing error the reader stays stopped.
    ///
    pub fn next_block(&mut self) -> Option<Result<Block<'a>, DecodeError>> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }

        let left = self.data.len() - self.pos;
        if left < 3 {
            warn!("ignoring {} trailing bytes, too short for a block header", left);
            self.pos = self.data.len();
            return None;
        }

        let offset = self.pos;
        let category = self.data[offset];
        let len = usize::from(self.data[offset + 1]) << 8 | usize::from(self.data[offset + 2]);

        if len < 3 {
            self.failed = true;
            return Some(Err(DecodeError::BadLength { offset, len }));
        }
        if len > left {
            self.failed = true;
            return Some(Err(DecodeError::ShortBlock {
                offset,
                declared: len,
                available: left,
            }));
        }

        self.pos += len;
        Some(Ok(Block {
            category,
            offset,
            payload: &self.data[offset + 3..offset + len],
        }))
    }
}

impl<'a> Iterator for BlockReader<'a> {
    type Item = Result<Block<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block()
    }
}

/// Split an input into at most `parts` slices that only break at block
/// boundaries, for caller-side parallel decoding.
///
pub fn partition(data: &[u8], parts: usize) -> Result<Vec<&[u8]>, DecodeError> {
    if data.is_empty() || parts <= 1 {
        return Ok(vec![data]);
    }

    // Collect block boundaries first
    let mut bounds = Vec::new();
    let mut reader = BlockReader::new(data);
    while let Some(block) = reader.next_block() {
        let block = block?;
        bounds.push(block.offset);
    }
    let end = reader.position();

    let per_part = bounds.len().div_ceil(parts);
    let mut out = Vec::new();
    for chunk in bounds.chunks(per_part.max(1)) {
        let start = chunk[0];
        let stop = chunk
            .last()
            .map(|&o| bounds.iter().find(|&&b| b > o).copied().unwrap_or(end))
            .unwrap_or(end);
        out.push(&data[start..stop]);
    }
    Ok(out)
}
