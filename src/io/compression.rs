use std::fs::File;
use std::io::{
    Read,
    Write,
};
use std::ops::Deref;
use std::path::Path;

use log::debug;
use memmap2::Mmap;

use crate::error::Error;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression of an input file. GEO distributes IDATs gzipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gz,
}

impl Compression {
    pub fn name(&self) -> &str {
        match self {
            Compression::None => "none",
            Compression::Gz => "gzip",
        }
    }

    /// Detects compression from the leading bytes.
    pub fn detect(header: &[u8]) -> Self {
        if header.starts_with(&GZIP_MAGIC) {
            Compression::Gz
        }
        else {
            Compression::None
        }
    }

    /// Wraps `handle` in a writer of this compression. Used by
    /// [`IdatWriter`](crate::io::idat::IdatWriter) to write gzipped fixture
    /// files; reading goes through [`read_file_bytes`].
    pub fn get_encoder<W: Write + 'static>(
        &self,
        handle: W,
        compression_level: u32,
    ) -> Box<dyn Write> {
        match self {
            Compression::Gz => {
                Box::new(flate2::write::GzEncoder::new(
                    handle,
                    flate2::Compression::new(compression_level),
                ))
            },
            Compression::None => Box::new(handle),
        }
    }
}

/// Whole-file contents, memory mapped when uncompressed.
pub enum FileBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            FileBytes::Mapped(mmap) => &mmap[..],
            FileBytes::Owned(bytes) => bytes.as_slice(),
        }
    }
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

/// Reads a possibly gzipped file. The handle is closed before returning.
pub fn read_file_bytes<P: AsRef<Path>>(path: P) -> Result<FileBytes, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let len = file.metadata().map_err(|e| Error::io(path, e))?.len();
    if len == 0 {
        return Ok(FileBytes::Owned(Vec::new()));
    }

    // Safety: the map is read-only and dropped with the decode call.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(path, e))?;
    match Compression::detect(&mmap) {
        Compression::None => Ok(FileBytes::Mapped(mmap)),
        Compression::Gz => {
            debug!("Decompressing {}", path.display());
            let mut decoder = flate2::read::MultiGzDecoder::new(&mmap[..]);
            let mut buffer = Vec::with_capacity(mmap.len() * 4);
            decoder
                .read_to_end(&mut buffer)
                .map_err(|e| Error::io(path, e))?;
            Ok(FileBytes::Owned(buffer))
        },
    }
}
