use crate::digest::DigestWriter;
use crate::mime;
use crate::upload::error::{ErrorKind, Result};
use crate::walk::LocalFile;
use exn::ResultExt;
use sitesync_compress::{Compression, CompressionPolicy};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

/// The bytes that would be stored for a file, ready to digest and upload.
#[derive(Debug)]
pub struct Payload {
    body: Body,
    pub content_type: String,
    pub compression: Compression,
    /// Hex MD5 of the body
    pub digest: String,
}

#[derive(Debug)]
enum Body {
    /// Uploaded straight from the source file. The digest covers the bytes
    /// read during `prepare`; an edit before the put makes the stored entity
    /// tag differ, and the next run uploads the file again.
    Original(PathBuf),
    /// Compressed copy; the file is removed when this is dropped.
    Spooled(TempPath),
}

impl Payload {
    /// Read, sniff, compress and digest a file. Blocking.
    pub fn prepare(file: &LocalFile, policy: &CompressionPolicy) -> Result<Self> {
        let read_error = || ErrorKind::Read(file.path.clone());
        let mut source = File::open(&file.path).or_raise(read_error)?;

        let mut head = Vec::with_capacity(mime::SNIFF_LEN);
        (&mut source).take(mime::SNIFF_LEN as u64).read_to_end(&mut head).or_raise(read_error)?;
        let content_type = mime::content_type(&file.extension, &head);
        source.rewind().or_raise(read_error)?;

        let compression = policy.choose(file.size, &file.extension);
        let (body, digest) = match compression {
            Compression::None => {
                let mut writer = DigestWriter::new(io::sink());
                io::copy(&mut BufReader::new(source), &mut writer).or_raise(read_error)?;
                let (_, digest) = writer.finish();
                (Body::Original(file.path.clone()), digest)
            },
            encoding => {
                tracing::info!(key = file.key, %encoding, size = file.size, "Compressing");
                let spool = NamedTempFile::new().or_raise(|| ErrorKind::Compression)?;
                let writer = encoding
                    .compress_to(BufReader::new(source), DigestWriter::new(spool))
                    .or_raise(|| ErrorKind::Compression)?;
                let (spool, digest) = writer.finish();
                (Body::Spooled(spool.into_temp_path()), digest)
            },
        };
        Ok(Self { body, content_type, compression, digest })
    }

    /// Path of the bytes to upload.
    pub fn path(&self) -> &Path {
        match &self.body {
            Body::Original(path) => path,
            Body::Spooled(path) => path,
        }
    }
}
