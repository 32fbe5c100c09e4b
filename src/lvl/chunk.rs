use std::fmt;

use crate::error::{ErrorLayer, Result, ToolError};

/// Size of a chunk header: 4 byte tag plus little-endian u32 payload size.
pub const HEADER_SIZE: usize = 8;

/// Four character chunk tag like `ucfb`, `entc` or `BASE`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const fn new(tag: &[u8; 4]) -> Self {
        FourCC(*tag)
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// One chunk borrowed out of a level file.  `offset` is the absolute offset
/// of the header within the file so errors can point at the right place.
#[derive(Clone, Copy, Debug)]
pub struct Chunk<'a> {
    pub tag: FourCC,
    pub offset: usize,
    pub data: &'a [u8],
}

impl<'a> Chunk<'a> {
    pub fn is(&self, tag: &[u8; 4]) -> bool {
        self.tag.0 == *tag
    }

    /// Absolute offset of the first payload byte.
    pub fn data_offset(&self) -> usize {
        self.offset + HEADER_SIZE
    }

    /// Absolute offset one past the last payload byte.
    pub fn end_offset(&self) -> usize {
        self.data_offset() + self.data.len()
    }

    /// Iterate the payload as a list of sibling chunks.
    pub fn children(&self) -> ChunkReader<'a> {
        ChunkReader::new(self.data, self.data_offset())
    }

    pub fn read_u32(&self, at: usize) -> Result<u32> {
        read_u32_le(self.data, at).ok_or_else(|| {
            ToolError::sticky(
                ErrorLayer::DataLayer,
                format!(
                    "Chunk '{}' at offset {} is too short to read a u32 at +{}",
                    self.tag, self.offset, at
                ),
            )
        })
    }

    /// Payload as a NUL terminated string.  Anything after the first NUL is
    /// padding.
    pub fn read_string(&self) -> String {
        read_c_string(self.data)
    }
}

pub fn read_u32_le(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn read_c_string(data: &[u8]) -> String {
    let end = data.iter().position(|b| *b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// Iterator over sibling chunks laid out back to back in `data`.  Each yielded
/// item is a `Result` since a bad size field makes the rest of the list
/// unreadable; after the first error the iterator is exhausted.
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    base_offset: usize,
    failed: bool,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8], base_offset: usize) -> Self {
        ChunkReader {
            data,
            pos: 0,
            base_offset,
            failed: false,
        }
    }

    fn fail(&mut self, message: String) -> Option<Result<Chunk<'a>>> {
        self.failed = true;
        Some(Err(ToolError::sticky(ErrorLayer::DataLayer, message)))
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }

        let offset = self.base_offset + self.pos;
        let remaining = self.data.len() - self.pos;
        if remaining < HEADER_SIZE {
            return self.fail(format!(
                "Truncated chunk header at offset {} ({} bytes left)",
                offset, remaining
            ));
        }

        let header = &self.data[self.pos..self.pos + HEADER_SIZE];
        let tag = FourCC([header[0], header[1], header[2], header[3]]);
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

        let start = self.pos + HEADER_SIZE;
        let end = match start.checked_add(size) {
            Some(end) if end <= self.data.len() => end,
            _ => {
                return self.fail(format!(
                    "Chunk '{}' at offset {} claims {} bytes but only {} remain",
                    tag,
                    offset,
                    size,
                    self.data.len() - start
                ));
            }
        };

        // Trailing alignment padding may be cut off at the end of the parent.
        self.pos = align4(end);

        Some(Ok(Chunk {
            tag,
            offset,
            data: &self.data[start..end],
        }))
    }
}
