//! Compression Operations

use crate::Compression;
use crate::error::{ErrorKind, Result};
#[cfg(feature = "brotli")]
use brotli::{CompressorWriter as BrotliEncoder, Decompressor as BrotliDecoder};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::GzDecoder, write::GzEncoder};
use std::io::{self, Read, Write};
use tracing::instrument;
#[cfg(feature = "zstd")]
use zstd::stream::{read::Decoder as ZstdDecoder, write::Encoder as ZstdEncoder};

// Use the highest compression level available for the formats; a site is
// compressed once per change and then served many times.
const GZIP_LEVEL: GzCompression = GzCompression::best();
#[cfg(feature = "zstd")]
const ZSTD_LEVEL: i32 = 19;
#[cfg(feature = "brotli")]
const BROTLI_LEVEL: u32 = 11;
#[cfg(feature = "brotli")]
const BROTLI_BUFFER_SIZE: usize = 4096;
#[cfg(feature = "brotli")]
const BROTLI_LG_WINDOW_SIZE: u32 = 22;

impl Compression {
    /// Compress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitesync_compress::Compression;
    ///
    /// let data = b"Hello, world!";
    /// let compressed = Compression::Gzip.compress(data).unwrap();
    /// assert_ne!(compressed, data);
    /// ```
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.compress_to(input, Vec::new())
    }

    /// Decompress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sitesync_compress::Compression;
    ///
    /// let original = b"Hello, world!";
    /// let compressed = Compression::Gzip.compress(original).unwrap();
    /// let decompressed = Compression::Gzip.decompress(&compressed).unwrap();
    /// assert_eq!(decompressed, original);
    /// ```
    #[instrument(skip(input), fields(format = %self, input_size = input.len()))]
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        match self {
            Compression::None => output.extend_from_slice(input),
            #[cfg(feature = "brotli")]
            Compression::Brotli => {
                BrotliDecoder::new(input, BROTLI_BUFFER_SIZE)
                    .read_to_end(&mut output)
                    .or_raise(|| ErrorKind::InvalidData)?;
            },
            Compression::Gzip => {
                GzDecoder::new(input).read_to_end(&mut output).or_raise(|| ErrorKind::InvalidData)?;
            },
            #[cfg(feature = "zstd")]
            Compression::Zstd => {
                ZstdDecoder::new(input)
                    .or_raise(|| ErrorKind::Encoder)?
                    .read_to_end(&mut output)
                    .or_raise(|| ErrorKind::InvalidData)?;
            },
        }
        Ok(output)
    }

    /// Compress everything from a reader into a writer, finishing the encoder
    /// and handing the writer back.
    ///
    /// Unlike dropping a wrapped encoder, finishing explicitly surfaces any
    /// error raised while flushing the trailing compressed block. Gzip output
    /// carries no timestamp or filename, so identical input always produces
    /// identical output.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use sitesync_compress::Compression;
    ///
    /// let input = Cursor::new(b"Hello, world!");
    /// let output = Compression::Gzip.compress_to(input, Vec::new()).unwrap();
    /// assert_eq!(Compression::Gzip.decompress(&output).unwrap(), b"Hello, world!");
    /// ```
    #[instrument(skip(reader, writer), fields(format = %self, input_size))]
    pub fn compress_to<R: Read, W: Write>(&self, mut reader: R, mut writer: W) -> Result<W> {
        let (size, writer) = match self {
            Compression::None => {
                let size = io::copy(&mut reader, &mut writer).or_raise(|| ErrorKind::Io)?;
                writer.flush().or_raise(|| ErrorKind::Io)?;
                (size, writer)
            },
            #[cfg(feature = "brotli")]
            Compression::Brotli => {
                let mut encoder = BrotliEncoder::new(writer, BROTLI_BUFFER_SIZE, BROTLI_LEVEL, BROTLI_LG_WINDOW_SIZE);
                let size = io::copy(&mut reader, &mut encoder).or_raise(|| ErrorKind::Io)?;
                encoder.flush().or_raise(|| ErrorKind::Io)?;
                // Closes the stream; brotli has no fallible finish().
                (size, encoder.into_inner())
            },
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(writer, GZIP_LEVEL);
                let size = io::copy(&mut reader, &mut encoder).or_raise(|| ErrorKind::Io)?;
                (size, encoder.finish().or_raise(|| ErrorKind::Io)?)
            },
            #[cfg(feature = "zstd")]
            Compression::Zstd => {
                let mut encoder = ZstdEncoder::new(writer, ZSTD_LEVEL).or_raise(|| ErrorKind::Encoder)?;
                let size = io::copy(&mut reader, &mut encoder).or_raise(|| ErrorKind::Io)?;
                (size, encoder.finish().or_raise(|| ErrorKind::Io)?)
            },
        };
        tracing::Span::current().record("input_size", size);
        Ok(writer)
    }
}
