//! Sequential tar reader.
//!
//! Tar has no index, so entries are discovered by reading each header and
//! seeking over its content to the next one. Only [`ReadSeek`] is needed,
//! and content bytes are never requested: skipping a large member costs a
//! seek, not a download.

use anyhow::{Context, Result, bail};
use std::io::SeekFrom;

use crate::io::ReadSeek;

use super::structures::*;

/// Upper bound for GNU long-name and PAX records kept in memory.
const MAX_METADATA_SIZE: u64 = 1024 * 1024;

/// Walks the headers of a tar archive one entry at a time.
pub struct TarWalker<'a, R: ReadSeek> {
    reader: &'a mut R,
    /// Bytes between the cursor and the next header.
    skip: u64,
    done: bool,
}

impl<'a, R: ReadSeek> TarWalker<'a, R> {
    pub fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            skip: 0,
            done: false,
        }
    }

    /// The next entry, or `None` once the end-of-archive marker or the end
    /// of the data is reached.
    pub async fn next_entry(&mut self) -> Result<Option<TarEntry>> {
        let mut long_name = None;
        let mut pax_name = None;

        while !self.done {
            self.skip_content()?;

            let mut block = [0u8; BLOCK_SIZE];
            let n = read_full(&mut *self.reader, &mut block).await?;

            if n == 0 || (n == BLOCK_SIZE && is_zero_block(&block)) {
                self.done = true;
                if long_name.is_some() || pax_name.is_some() {
                    bail!("Unexpected end of archive after extended header");
                }
                break;
            }
            if n < BLOCK_SIZE {
                bail!("Unexpected end of archive: partial header of {} bytes", n);
            }

            let mut entry = TarEntry::from_block(&block)?;
            self.skip = entry.padded_size()?;

            if entry.entry_type.is_metadata() {
                match entry.entry_type {
                    EntryType::GnuLongName => {
                        long_name = Some(c_string(&self.read_metadata(entry.size).await?));
                    }
                    EntryType::PaxExtended => {
                        let data = self.read_metadata(entry.size).await?;
                        if let Some(path) = pax_path(&data)? {
                            pax_name = Some(path);
                        }
                    }
                    // Link targets and global records carry no entry names.
                    _ => {}
                }
                continue;
            }

            // PAX wins over a GNU long name when both are present.
            if let Some(name) = pax_name.or(long_name) {
                entry.name = name;
            }
            return Ok(Some(entry));
        }

        Ok(None)
    }

    /// Collect every remaining entry.
    pub async fn entries(&mut self) -> Result<Vec<TarEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry().await? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Move past the content of the previous header.
    fn skip_content(&mut self) -> Result<()> {
        if self.skip > 0 {
            let delta = i64::try_from(self.skip).context("tar entry too large")?;
            self.reader.seek(SeekFrom::Current(delta))?;
            self.skip = 0;
        }
        Ok(())
    }

    /// Read the data of a metadata record, leaving only its padding to skip.
    async fn read_metadata(&mut self, size: u64) -> Result<Vec<u8>> {
        if size > MAX_METADATA_SIZE {
            bail!("Tar extended header too large: {} bytes", size);
        }

        let mut data = vec![0u8; size as usize];
        let n = read_full(&mut *self.reader, &mut data).await?;
        if n < data.len() {
            bail!("Unexpected end of archive in extended header");
        }
        self.skip -= size;
        Ok(data)
    }
}

/// Read until `buf` is full or the data runs out, returning the bytes read.
async fn read_full<R: ReadSeek>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.is_eof() => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
