//! Types for the upload pipeline.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use roost_storage::UploadReader;
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, ReadBuf};

/// Request body spooled to a temporary file. The file is removed once the
/// source is dropped.
pub struct UploadSource {
    file: File,
    _path: TempPath,
    observed: u64,
    written: u64,
}

impl UploadSource {
    pub async fn spooled() -> io::Result<Self> {
        let temp = tokio::task::spawn_blocking(|| {
            tempfile::Builder::new().prefix("roost-upload-").tempfile()
        })
        .await
        .map_err(io::Error::other)??;
        let (file, path) = temp.into_parts();

        Ok(Self {
            file: File::from_std(file),
            _path: path,
            observed: 0,
            written: 0,
        })
    }

    /// Append a chunk unless that would exceed `cap`. Every chunk is counted,
    /// so [`observed`](Self::observed) stays accurate for oversize bodies.
    pub async fn push_chunk(&mut self, chunk: &[u8], cap: u64) -> io::Result<()> {
        self.observed += chunk.len() as u64;
        if self.written + chunk.len() as u64 <= cap {
            self.file.write_all(chunk).await?;
            self.written += chunk.len() as u64;
        }
        Ok(())
    }

    /// Total bytes the client sent, including any beyond the cap.
    pub fn observed(&self) -> u64 {
        self.observed
    }

    pub async fn finish(&mut self) -> io::Result<()> {
        self.file.flush().await?;
        self.rewind().await
    }

    pub async fn rewind(&mut self) -> io::Result<()> {
        self.file.seek(io::SeekFrom::Start(0)).await?;
        Ok(())
    }

    /// Read up to `len` bytes from the start, leaving the cursor at offset 0.
    pub async fn read_prefix(&mut self, len: usize) -> io::Result<Vec<u8>> {
        self.rewind().await?;
        let mut prefix = Vec::with_capacity(len);
        (&mut self.file)
            .take(len as u64)
            .read_to_end(&mut prefix)
            .await?;
        self.rewind().await?;
        Ok(prefix)
    }

    pub fn into_reader(self) -> UploadReader {
        Box::pin(self)
    }
}

impl AsyncRead for UploadSource {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_read(cx, buf)
    }
}

/// One file part of a request together with what the client claimed about it.
pub struct UploadRequest {
    pub source: UploadSource,
    pub declared_filename: String,
    /// Bytes observed while spooling, not a client header.
    pub declared_size: u64,
    pub declared_content_type: String,
}

impl UploadRequest {
    pub fn new(source: UploadSource, filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        let declared_size = source.observed();
        Self {
            source,
            declared_filename: filename.into(),
            declared_size,
            declared_content_type: content_type.into(),
        }
    }

    /// Spool an in-memory body. Used by callers that already hold the bytes.
    pub async fn from_bytes(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: &[u8],
    ) -> io::Result<Self> {
        let mut source = UploadSource::spooled().await?;
        source.push_chunk(data, u64::MAX).await?;
        source.finish().await?;
        Ok(Self::new(source, filename, content_type))
    }
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("declared_filename", &self.declared_filename)
            .field("declared_size", &self.declared_size)
            .field("declared_content_type", &self.declared_content_type)
            .finish()
    }
}
