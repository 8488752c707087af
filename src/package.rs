//! Resource package: a 32-byte opaque header followed by resource blocks
//! up to end of stream.
//!
//! There is no block count, footer or checksum.  A package is read in a
//! single forward pass: the header, then blocks until the stream ends
//! exactly on a block boundary.  Writing mirrors that order.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::block::{read_full, ResourceBlock, HEADER_SIZE};
use crate::error::{ResourceError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePackage {
    /// Opaque package header, written back verbatim.
    pub header: [u8; HEADER_SIZE],
    /// Blocks in file order.
    pub blocks: Vec<ResourceBlock>,
}

impl ResourcePackage {
    pub fn new(header: [u8; HEADER_SIZE]) -> Self {
        Self { header, blocks: Vec::new() }
    }

    // ── Wire format ─────────────────────────────────────────────────────────

    /// Read a whole package.  The package header is mandatory, even for a
    /// package without blocks.  On error nothing is returned.
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut header = [0u8; HEADER_SIZE];
        let got = read_full(&mut reader, &mut header)?;
        if got != HEADER_SIZE {
            return Err(ResourceError::TruncatedHeader { expected: HEADER_SIZE, actual: got });
        }

        let mut package = Self::new(header);
        while let Some(block) = ResourceBlock::read(&mut reader)? {
            package.blocks.push(block);
        }
        debug!(blocks = package.blocks.len(), "read package");
        Ok(package)
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.header)?;
        for block in &self.blocks {
            block.write(&mut writer)?;
        }
        debug!(blocks = self.blocks.len(), bytes = self.encoded_len(), "wrote package");
        Ok(())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(Cursor::new(bytes))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write(&mut out)?;
        Ok(out)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening package");
        Self::read(BufReader::new(File::open(path)?))
    }

    /// Write the package to `path`, replacing any existing file.
    ///
    /// The bytes go to a temporary file in the same directory which is then
    /// renamed over `path`, so a failed write leaves the old file intact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.write(&mut writer)?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| e.error)?;
        debug!(path = %path.display(), "saved package");
        Ok(())
    }

    /// Total serialized length in bytes.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.blocks.iter().map(ResourceBlock::encoded_len).sum::<usize>()
    }

    // ── Editing ─────────────────────────────────────────────────────────────

    /// First block carrying `id`, with its index.
    pub fn find_by_id(&self, id: u16) -> Option<(usize, &ResourceBlock)> {
        self.blocks.iter().enumerate().find(|(_, b)| b.id() == id)
    }

    pub fn block_mut(&mut self, index: usize) -> Result<&mut ResourceBlock> {
        let count = self.blocks.len();
        self.blocks.get_mut(index).ok_or_else(|| out_of_range(index, count))
    }

    pub fn replace_payload(&mut self, index: usize, payload: Vec<u8>) -> Result<()> {
        self.block_mut(index)?.set_payload(payload)
    }

    pub fn remove_block(&mut self, index: usize) -> Result<ResourceBlock> {
        if index >= self.blocks.len() {
            return Err(out_of_range(index, self.blocks.len()));
        }
        Ok(self.blocks.remove(index))
    }

    /// Move the block at `from` so it ends up at index `to`; the blocks in
    /// between shift by one.
    pub fn move_block(&mut self, from: usize, to: usize) -> Result<()> {
        let count = self.blocks.len();
        if from >= count {
            return Err(out_of_range(from, count));
        }
        if to >= count {
            return Err(out_of_range(to, count));
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        Ok(())
    }
}

fn out_of_range(index: usize, count: usize) -> ResourceError {
    ResourceError::InvalidArgument(format!(
        "block index {index} out of range (package has {count} blocks)"
    ))
}
