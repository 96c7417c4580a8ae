//! Tar header walking.
//!
//! Handles ustar and GNU archives, including GNU long names and PAX
//! extended headers. Compressed tarballs are not supported; the archive is
//! read as stored on the server.

mod structures;
mod walker;

pub use structures::{BLOCK_SIZE, EntryType, TarEntry};
pub use walker::TarWalker;
