use crate::domain::ports::LineSource;
use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Lines from any buffered async reader (stdin, a child's pipe, a file)
pub struct ReaderLogSource<R> {
    reader: R,
    buf: Vec<u8>,
    name: String,
}

impl<R> ReaderLogSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(1024),
            name: name.into(),
        }
    }

    /// Read the next line, `None` once the reader is exhausted
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(decode_line(&self.buf)))
    }
}

#[async_trait]
impl<R> LineSource for ReaderLogSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.read_line().await?)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Drop the line terminator and decode, replacing invalid UTF-8
pub(crate) fn decode_line(bytes: &[u8]) -> String {
    let line = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
