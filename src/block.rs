//! Resource block: a 32-byte header, a variable-length payload and 0–3
//! bytes of zero padding that realign the stream to 4 bytes.
//!
//! # Header layout (all integers little-endian)
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x00   | 4    | `size`: payload length in bytes |
//! | 0x04   | 10   | opaque |
//! | 0x0E   | 2    | `id`: resource identifier |
//! | 0x10   | 16   | opaque |
//!
//! Opaque bytes are carried through parse and serialize untouched.  The
//! `size` field is derived from the payload: [`ResourceBlock::set_payload`]
//! is the only way to change it.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{self, Read, Write};
use tracing::{trace, warn};

use crate::error::{ResourceError, Result};

/// Length of a block header, and of the package header.
pub const HEADER_SIZE: usize = 0x20;
/// Payloads are padded so every block ends on this boundary.
pub const BLOCK_ALIGN: usize = 4;

const SIZE_OFFSET: usize = 0x00;
const ID_OFFSET:   usize = 0x0E;

const ZERO_PAD: [u8; BLOCK_ALIGN - 1] = [0u8; BLOCK_ALIGN - 1];

/// Number of zero bytes that follow a payload of `len` bytes.
#[inline]
pub fn padding_len(len: usize) -> usize {
    (BLOCK_ALIGN - len % BLOCK_ALIGN) % BLOCK_ALIGN
}

/// Read until `buf` is full or the stream ends.  Returns the bytes read.
///
/// Unlike `read_exact` this reports how far it got, which the truncation
/// errors need.
pub(crate) fn read_full<R: Read>(mut reader: R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn checked_size(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        ResourceError::InvalidArgument(format!(
            "payload of {len} bytes does not fit the 32-bit size field"
        ))
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceBlock {
    header:  [u8; HEADER_SIZE],
    payload: Vec<u8>,
}

impl ResourceBlock {
    /// A block with the given id and payload; every opaque header byte is zero.
    pub fn new(id: u16, payload: Vec<u8>) -> Result<Self> {
        let mut block = Self::default();
        block.set_id(id);
        block.set_payload(payload)?;
        Ok(block)
    }

    /// Build a block from a raw header and a payload.
    ///
    /// The opaque header bytes and the id are kept as given; the `size`
    /// field is overwritten with the payload length.
    pub fn from_parts(header: [u8; HEADER_SIZE], payload: Vec<u8>) -> Result<Self> {
        let mut block = Self { header, payload: Vec::new() };
        block.set_payload(payload)?;
        Ok(block)
    }

    // ── Field accessors ─────────────────────────────────────────────────────

    pub fn header(&self) -> &[u8; HEADER_SIZE] {
        &self.header
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn id(&self) -> u16 {
        LittleEndian::read_u16(&self.header[ID_OFFSET..ID_OFFSET + 2])
    }

    pub fn set_id(&mut self, id: u16) {
        LittleEndian::write_u16(&mut self.header[ID_OFFSET..ID_OFFSET + 2], id);
    }

    /// The `size` field as stored in the header.  Always equal to
    /// `payload().len()` once a block has been constructed.
    pub(crate) fn declared_size(&self) -> u32 {
        LittleEndian::read_u32(&self.header[SIZE_OFFSET..SIZE_OFFSET + 4])
    }

    /// Replace the payload and rewrite the `size` field to match.
    ///
    /// Fails with [`ResourceError::InvalidArgument`] if the payload is longer
    /// than `u32::MAX`; the block is left unchanged in that case.
    pub fn set_payload(&mut self, payload: Vec<u8>) -> Result<()> {
        let size = checked_size(payload.len())?;
        LittleEndian::write_u32(&mut self.header[SIZE_OFFSET..SIZE_OFFSET + 4], size);
        self.payload = payload;
        Ok(())
    }

    /// Take the payload out of the block, leaving the header as-is.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Bytes this block occupies on the wire: header, payload and padding.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len() + padding_len(self.payload.len())
    }

    // ── Wire format ─────────────────────────────────────────────────────────

    /// Read one block.
    ///
    /// Returns `Ok(None)` when the stream ends exactly where a header would
    /// start; that is the normal end of a block sequence.  Any other short
    /// read is an error.
    pub fn read<R: Read>(mut reader: R) -> Result<Option<Self>> {
        let mut header = [0u8; HEADER_SIZE];
        let got = read_full(&mut reader, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got != HEADER_SIZE {
            return Err(ResourceError::TruncatedHeader { expected: HEADER_SIZE, actual: got });
        }

        let size = LittleEndian::read_u32(&header[SIZE_OFFSET..SIZE_OFFSET + 4]) as usize;

        // Grows with what is actually read, so a corrupt size cannot force
        // a multi-gigabyte allocation up front.
        let mut payload = Vec::new();
        let got = reader.by_ref().take(size as u64).read_to_end(&mut payload)?;
        if got != size {
            return Err(ResourceError::TruncatedPayload { expected: size, actual: got });
        }

        let pad = padding_len(size);
        if pad > 0 {
            let mut scratch = [0u8; BLOCK_ALIGN - 1];
            let got = read_full(&mut reader, &mut scratch[..pad])?;
            if got != pad {
                return Err(ResourceError::TruncatedPadding { expected: pad, actual: got });
            }
            if scratch[..pad].iter().any(|&b| b != 0) {
                warn!(padding = %hex::encode(&scratch[..pad]), "non-zero block padding ignored");
            }
        }

        let block = Self { header, payload };
        trace!(id = block.id(), size, "read block");
        Ok(Some(block))
    }

    /// Write header, payload and zero padding.
    ///
    /// Padding is derived from the current payload length.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.header)?;
        writer.write_all(&self.payload)?;
        writer.write_all(&ZERO_PAD[..padding_len(self.payload.len())])?;
        trace!(id = self.id(), size = self.payload.len(), "wrote block");
        Ok(())
    }
}
