/// One hardware-legal piece of a larger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Logical address of the first byte.
    pub addr: u32,
    /// Offset of the first byte within the caller's buffer.
    pub offset: usize,
    pub len: usize,
}

impl Chunk {
    pub fn range(&self) -> core::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Walks a request in pieces that never cross a multiple of `boundary`.
///
/// For an address that is not boundary-aligned the first piece is short,
/// every following piece is at most `boundary` bytes long.
#[derive(Debug, Clone)]
pub struct Cursor {
    addr: u32,
    offset: usize,
    remaining: usize,
    boundary: u32,
}

impl Cursor {
    pub fn new(addr: u32, len: usize, boundary: u32) -> Self {
        debug_assert!(boundary > 0);
        Self {
            addr,
            offset: 0,
            remaining: len,
            boundary,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Iterator for Cursor {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining == 0 {
            return None;
        }
        let room = (self.boundary - self.addr % self.boundary) as usize;
        let len = self.remaining.min(room);
        let chunk = Chunk {
            addr: self.addr,
            offset: self.offset,
            len,
        };
        // len <= boundary, so it fits in a u32
        self.addr += len as u32;
        self.offset += len;
        self.remaining -= len;
        Some(chunk)
    }
}
