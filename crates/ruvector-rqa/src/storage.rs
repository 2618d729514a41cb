//! Packed recurrence cell storage.
//!
//! [`RecurrenceBuffer`] is a flat cell array over a plain `Vec<u8>`, holding
//! either one bit or one byte per cell. Detectors only see `get`/`set`; the
//! encoding is a memory/access trade-off and never changes results.

use crate::partition::TileDescriptor;
use crate::types::Encoding;

/// Flat cell buffer in a fixed [`Encoding`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceBuffer {
    encoding: Encoding,
    cells: usize,
    bytes: Vec<u8>,
}

impl RecurrenceBuffer {
    /// Wrap already-encoded bytes.
    ///
    /// `bytes.len()` must equal `encoding.bytes_for(cells)`.
    pub fn from_bytes(encoding: Encoding, cells: usize, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), encoding.bytes_for(cells));
        Self {
            encoding,
            cells,
            bytes,
        }
    }

    /// Zero-filled buffer, for callers that cannot fail on allocation.
    pub fn zeroed(encoding: Encoding, cells: usize) -> Self {
        Self::from_bytes(encoding, cells, vec![0u8; encoding.bytes_for(cells)])
    }

    /// Cell encoding.
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells
    }

    /// Whether the buffer holds no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells == 0
    }

    /// Size of the backing storage in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Read cell `index`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.cells, "cell {index} out of range {}", self.cells);
        match self.encoding {
            Encoding::Bit => (self.bytes[index >> 3] >> (index & 7)) & 1 == 1,
            Encoding::Byte => self.bytes[index] != 0,
        }
    }

    /// Write cell `index`.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.cells, "cell {index} out of range {}", self.cells);
        match self.encoding {
            Encoding::Bit => {
                let mask = 1u8 << (index & 7);
                if value {
                    self.bytes[index >> 3] |= mask;
                } else {
                    self.bytes[index >> 3] &= !mask;
                }
            }
            Encoding::Byte => self.bytes[index] = u8::from(value),
        }
    }

    /// Number of set cells.
    pub fn count_ones(&self) -> usize {
        match self.encoding {
            Encoding::Bit => self.bytes.iter().map(|b| b.count_ones() as usize).sum(),
            Encoding::Byte => self.bytes.iter().filter(|&&b| b != 0).count(),
        }
    }
}

/// One materialised tile: its geometry plus the buffered recurrence values.
///
/// Owned by the tile's processing step and dropped once both detectors have
/// scanned it (or, with recycling, once the next tile of its strip has
/// copied its last row).
#[derive(Debug, Clone)]
pub struct SubMatrix {
    /// Tile geometry.
    pub descriptor: TileDescriptor,
    /// Row-major values over the buffered region.
    pub data: RecurrenceBuffer,
}

impl SubMatrix {
    /// Pair a descriptor with its filled buffer.
    pub fn new(descriptor: TileDescriptor, data: RecurrenceBuffer) -> Self {
        debug_assert_eq!(descriptor.buffer_cells(), data.len());
        Self { descriptor, data }
    }

    /// Value of global cell `(i, j)`, which must lie in the buffered region.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.data.get(self.descriptor.buffer_index(i, j))
    }
}

/// Encode the cells owned by byte `byte_index` of a buffer with `cells` cells.
///
/// `cell` is called for each owned cell index. Bytes never share cells, so
/// separate bytes can be produced by separate workers.
#[inline]
pub fn pack_byte(
    encoding: Encoding,
    byte_index: usize,
    cells: usize,
    cell: impl Fn(usize) -> bool,
) -> u8 {
    match encoding {
        Encoding::Byte => u8::from(cell(byte_index)),
        Encoding::Bit => {
            let first = byte_index << 3;
            let last = (first + 8).min(cells);
            (first..last).fold(0u8, |acc, index| {
                acc | (u8::from(cell(index)) << (index - first))
            })
        }
    }
}
