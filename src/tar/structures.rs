use anyhow::{Result, bail};

/// Every tar record is a multiple of this.
pub const BLOCK_SIZE: usize = 512;

const NAME: std::ops::Range<usize> = 0..100;
const SIZE: std::ops::Range<usize> = 124..136;
const MTIME: std::ops::Range<usize> = 136..148;
const CHECKSUM: std::ops::Range<usize> = 148..156;
const TYPEFLAG: usize = 156;
const MAGIC: std::ops::Range<usize> = 257..262;
const PREFIX: std::ops::Range<usize> = 345..500;

/// Tar entry type flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Regular,
    HardLink,
    Symlink,
    CharDevice,
    BlockDevice,
    Directory,
    Fifo,
    Contiguous,
    /// GNU: the data is the name of the next entry.
    GnuLongName,
    /// GNU: the data is the link target of the next entry.
    GnuLongLink,
    /// PAX: records for the next entry.
    PaxExtended,
    /// PAX: records for the rest of the archive.
    PaxGlobal,
    Unknown(u8),
}

impl EntryType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            b'0' | b'\0' => EntryType::Regular,
            b'1' => EntryType::HardLink,
            b'2' => EntryType::Symlink,
            b'3' => EntryType::CharDevice,
            b'4' => EntryType::BlockDevice,
            b'5' => EntryType::Directory,
            b'6' => EntryType::Fifo,
            b'7' => EntryType::Contiguous,
            b'L' => EntryType::GnuLongName,
            b'K' => EntryType::GnuLongLink,
            b'x' => EntryType::PaxExtended,
            b'g' => EntryType::PaxGlobal,
            other => EntryType::Unknown(other),
        }
    }

    /// Records that describe the following entry instead of being one.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            EntryType::GnuLongName
                | EntryType::GnuLongLink
                | EntryType::PaxExtended
                | EntryType::PaxGlobal
        )
    }
}

/// Parsed tar header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarEntry {
    pub name: String,
    pub size: u64,
    pub mtime: u64,
    pub entry_type: EntryType,
}

impl TarEntry {
    pub fn from_block(block: &[u8]) -> Result<Self> {
        if block.len() < BLOCK_SIZE {
            bail!("Invalid tar header");
        }

        let stored = parse_numeric(&block[CHECKSUM])?;
        let (unsigned, signed) = checksums(block);
        if stored != unsigned && stored as i64 != signed {
            bail!("Invalid tar header checksum");
        }

        let mut name = c_string(&block[NAME]);
        if &block[MAGIC] == b"ustar" {
            let prefix = c_string(&block[PREFIX]);
            if !prefix.is_empty() {
                name = format!("{prefix}/{name}");
            }
        }

        Ok(Self {
            name,
            size: parse_numeric(&block[SIZE])?,
            mtime: parse_numeric(&block[MTIME])?,
            entry_type: EntryType::from_u8(block[TYPEFLAG]),
        })
    }

    /// Bytes of content plus padding up to the next header.
    pub fn padded_size(&self) -> Result<u64> {
        match padded(self.size) {
            Some(size) => Ok(size),
            None => bail!("tar entry too large: {} bytes", self.size),
        }
    }
}

pub fn padded(size: u64) -> Option<u64> {
    size.div_ceil(BLOCK_SIZE as u64).checked_mul(BLOCK_SIZE as u64)
}

pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Header sums with the checksum field counted as spaces, treating bytes as
/// unsigned and, for old writers, as signed.
fn checksums(block: &[u8]) -> (u64, i64) {
    let mut unsigned = 0u64;
    let mut signed = 0i64;
    for (i, &b) in block[..BLOCK_SIZE].iter().enumerate() {
        let b = if CHECKSUM.contains(&i) { b' ' } else { b };
        unsigned += b as u64;
        signed += b as i8 as i64;
    }
    (unsigned, signed)
}

/// Text up to the first NUL.
pub fn c_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Octal number, or GNU base-256 when the high bit of the first byte is set.
pub fn parse_numeric(field: &[u8]) -> Result<u64> {
    if field.first().is_some_and(|&b| b & 0x80 != 0) {
        if field[0] & 0x40 != 0 {
            bail!("Negative number in tar header");
        }
        let mut value = (field[0] & 0x3F) as u64;
        for &b in &field[1..] {
            if value > u64::MAX >> 8 {
                bail!("Number too large in tar header");
            }
            value = (value << 8) | b as u64;
        }
        return Ok(value);
    }

    let text = String::from_utf8_lossy(field);
    let text = text.trim_matches(|c: char| c == '\0' || c == ' ');
    if text.is_empty() {
        return Ok(0);
    }
    match u64::from_str_radix(text, 8) {
        Ok(value) => Ok(value),
        Err(_) => bail!("Invalid octal number {text:?} in tar header"),
    }
}

/// The `path` record of a PAX extended header, if any.
///
/// Records look like `"<len> <key>=<value>\n"`, where `len` counts the whole
/// record including itself.
pub fn pax_path(mut data: &[u8]) -> Result<Option<String>> {
    let mut path = None;

    while !data.is_empty() && data[0] != 0 {
        let Some(space) = data.iter().position(|&b| b == b' ') else {
            bail!("Invalid PAX record");
        };
        let len: usize = match std::str::from_utf8(&data[..space]).ok().and_then(|s| s.parse().ok()) {
            Some(len) if len > space + 1 && len <= data.len() => len,
            _ => bail!("Invalid PAX record"),
        };

        let record = &data[space + 1..len];
        let Some(record) = record.strip_suffix(b"\n") else {
            bail!("Invalid PAX record");
        };
        let Some(eq) = record.iter().position(|&b| b == b'=') else {
            bail!("Invalid PAX record");
        };

        if &record[..eq] == b"path" {
            path = Some(String::from_utf8_lossy(&record[eq + 1..]).into_owned());
        }

        data = &data[len..];
    }

    Ok(path)
}
