//! ZIP central directory listing.
//!
//! The EOCD record at the end of the archive points at the Central
//! Directory, which holds the metadata for every entry. Reading those two
//! structures is enough to list an archive, so a remote listing only touches
//! the archive's tail.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - Archive comments
//! - ZIP64 extensions for archives > 4GB
//!
//! ## Limitations
//!
//! - No multi-disk archive support

mod parser;
mod structures;

pub use parser::ZipParser;
pub use structures::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockClient, build_zip};

    #[tokio::test]
    async fn lists_entries_from_tail() {
        let files: [(&str, &[u8]); 3] = [("a.txt", b"hello"), ("dir/", b""), ("dir/b.bin", &[1, 2, 3])];
        let archive = build_zip(&files, b"");
        let mock = MockClient::new(archive);
        let mut reader = mock.reader();

        let mut parser = ZipParser::open(&mut reader).await.unwrap();
        let entries = parser.list_files().await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["a.txt", "dir/", "dir/b.bin"]);
        assert!(entries[1].is_directory);
        assert_eq!(entries[2].uncompressed_size, 3);
        assert_eq!(entries[2].compression_method, 0);
        assert_eq!(entries[0].lfh_offset, 0);
    }

    #[tokio::test]
    async fn finds_eocd_behind_comment() {
        let archive = build_zip(&[("only.txt", &b"x"[..])], b"an archive comment");
        let mock = MockClient::new(archive);
        let mut reader = mock.reader();

        let mut parser = ZipParser::open(&mut reader).await.unwrap();
        let (eocd, _) = parser.find_eocd().await.unwrap();
        assert_eq!(eocd.comment_len, 18);

        let entries = parser.list_files().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "only.txt");
    }

    #[tokio::test]
    async fn rejects_non_zip() {
        let mock = MockClient::new(b"definitely not an archive, just some text".to_vec());
        let mut reader = mock.reader();

        let mut parser = ZipParser::open(&mut reader).await.unwrap();
        let err = parser.list_files().await.unwrap_err();
        assert_eq!(err.to_string(), "Not a valid ZIP file");
    }

    #[tokio::test]
    async fn tiny_file_is_not_a_zip() {
        let mock = MockClient::new(b"PK".to_vec());
        let mut reader = mock.reader();

        let mut parser = ZipParser::open(&mut reader).await.unwrap();
        assert_eq!(parser.size(), 2);
        assert!(parser.list_files().await.is_err());
    }

    #[test]
    fn eocd_marks_zip64() {
        let mut raw = build_zip(&[], b"");
        raw[10..12].copy_from_slice(&[0xFF, 0xFF]);
        let eocd = EndOfCentralDirectory::from_bytes(&raw).unwrap();
        assert_eq!(eocd.total_entries, 0xFFFF);
        assert!(eocd.is_zip64());
    }
}
