//! Gzip handling for blob files.

use std::io::{self, BufReader, Cursor, Read, Write};

use flate2::bufread::MultiGzDecoder;
use flate2::write::GzEncoder;
use serde::Deserialize;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression applied to a blob's raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Detect gzip from the leading magic bytes
    #[default]
    Auto,
    /// Always gunzip
    Gzip,
    /// Plain JSON
    None,
}

impl Compression {
    /// Parse a compression setting from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Some(Compression::Auto),
            "gzip" | "gz" => Some(Compression::Gzip),
            "none" | "plain" => Some(Compression::None),
            _ => None,
        }
    }
}

/// Layer decompression and buffering over a raw blob reader.
///
/// With [`Compression::Auto`] the first two bytes are read to look for the
/// gzip magic; they are replayed in front of the rest of the stream.
pub fn decompress<R>(mut reader: R, compression: Compression) -> io::Result<Box<dyn Read + Send>>
where
    R: Read + Send + 'static,
{
    let mut head = [0u8; 2];
    let mut filled = 0;
    if compression == Compression::Auto {
        while filled < head.len() {
            match reader.read(&mut head[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    let gzip = match compression {
        Compression::Gzip => true,
        Compression::None => false,
        Compression::Auto => filled == GZIP_MAGIC.len() && head == GZIP_MAGIC,
    };

    let replayed = Cursor::new(head).take(filled as u64).chain(reader);
    let buffered = BufReader::new(replayed);
    if gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(buffered))))
    } else {
        Ok(Box::new(buffered))
    }
}

/// Wrap a writer so everything written to it is gzip-compressed.
pub fn compressed_writer<W: Write>(writer: W) -> GzEncoder<W> {
    GzEncoder::new(writer, flate2::Compression::default())
}
