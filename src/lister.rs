//! Archive listing over a seekable remote reader.

use anyhow::Result;

use crate::io::{ReadAt, ReadSeek};
use crate::tar::TarWalker;
use crate::zip::ZipParser;

/// Archive formats recognised by URL suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Tar,
    Zip,
}

impl ArchiveKind {
    pub fn from_url(url: &str) -> Option<Self> {
        if url.ends_with(".tar") {
            Some(ArchiveKind::Tar)
        } else if url.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

/// Call `emit` with the name of every entry in the archive.
///
/// Tar names are emitted as each header is read; zip names once the
/// central directory has been loaded. The first error ends the listing.
pub async fn list_entries<R, F>(reader: &mut R, kind: ArchiveKind, mut emit: F) -> Result<()>
where
    R: ReadAt + ReadSeek,
    F: FnMut(&str),
{
    match kind {
        ArchiveKind::Tar => {
            let mut walker = TarWalker::new(reader);
            while let Some(entry) = walker.next_entry().await? {
                emit(&entry.name);
            }
        }
        ArchiveKind::Zip => {
            let mut parser = ZipParser::open(reader).await?;
            for entry in parser.list_files().await? {
                emit(&entry.file_name);
            }
        }
    }

    Ok(())
}
