//! Line-prefixing writer.
//!
//! [`LinePrefixWriter`] wraps an async sink and inserts a fixed prefix in
//! front of the first byte of every line written through it. The only state
//! carried between calls is whether the next byte starts a new line, so the
//! output is the same no matter how the input is split into chunks.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Immutable prefix bytes, shared read-only by every writer of one run.
///
/// An empty prefix turns [`LinePrefixWriter`] into a plain passthrough.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix(Arc<[u8]>);

impl Prefix {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(bytes.as_ref()))
    }

    /// The empty prefix.
    pub fn none() -> Self {
        Self(Arc::from(&[] as &[u8]))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Prefix {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&str> for Prefix {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<Option<String>> for Prefix {
    fn from(text: Option<String>) -> Self {
        text.map(Self::new).unwrap_or_default()
    }
}

/// A sink write failed part-way through a chunk.
///
/// `consumed` counts the input bytes that reached the sink before the
/// failure; prefix bytes are not included.
#[derive(Debug, Error)]
#[error("write failed after {consumed} input bytes: {source}")]
pub struct PrefixWriteError {
    pub consumed: usize,
    #[source]
    pub source: io::Error,
}

/// Writer that prefixes every line forwarded to its sink.
///
/// Each stream owns its own writer; two streams never share the
/// line-start flag.
#[derive(Debug)]
pub struct LinePrefixWriter<W> {
    inner: W,
    prefix: Prefix,
    at_line_start: bool,
}

impl<W: AsyncWrite + Unpin> LinePrefixWriter<W> {
    pub fn new(inner: W, prefix: Prefix) -> Self {
        Self {
            inner,
            prefix,
            at_line_start: true,
        }
    }

    /// Forwards one chunk of input to the sink, inserting the prefix before
    /// each line's first byte.
    ///
    /// Returns the number of input bytes consumed, which is always
    /// `chunk.len()` on success. An empty chunk writes nothing and leaves the
    /// line-start flag untouched.
    ///
    /// # Errors
    /// Returns [`PrefixWriteError`] as soon as the sink fails. The flag is
    /// left consistent with the bytes that were actually forwarded: a failed
    /// prefix write keeps it set, so the prefix is emitted again on the next
    /// call.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize, PrefixWriteError> {
        if self.prefix.is_empty() {
            return write_counted(&mut self.inner, chunk, 0).await;
        }

        let mut consumed = 0;
        while consumed < chunk.len() {
            if self.at_line_start {
                self.inner
                    .write_all(self.prefix.as_bytes())
                    .await
                    .map_err(|source| PrefixWriteError { consumed, source })?;
                self.at_line_start = false;
            }

            let rest = &chunk[consumed..];
            let line_len = rest
                .iter()
                .position(|&b| b == b'\n')
                .map_or(rest.len(), |idx| idx + 1);
            let segment = &rest[..line_len];

            consumed = write_counted(&mut self.inner, segment, consumed).await?;
            if segment.ends_with(b"\n") {
                self.at_line_start = true;
            }
        }

        Ok(consumed)
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().await
    }

    /// Whether the next forwarded byte will be preceded by the prefix.
    pub fn is_at_line_start(&self) -> bool {
        self.at_line_start
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Writes `bytes` in full, adding each accepted byte to `consumed`.
async fn write_counted<W: AsyncWrite + Unpin>(
    sink: &mut W,
    mut bytes: &[u8],
    mut consumed: usize,
) -> Result<usize, PrefixWriteError> {
    while !bytes.is_empty() {
        match sink.write(bytes).await {
            Ok(0) => {
                return Err(PrefixWriteError {
                    consumed,
                    source: io::ErrorKind::WriteZero.into(),
                });
            }
            Ok(n) => {
                consumed += n;
                bytes = &bytes[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(source) => return Err(PrefixWriteError { consumed, source }),
        }
    }
    Ok(consumed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Accepts `budget` bytes, then fails every write with `BrokenPipe`.
    struct FailingSink {
        written: Vec<u8>,
        budget: usize,
    }

    impl AsyncWrite for FailingSink {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.budget == 0 {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "sink closed",
                )));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            self.written.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    async fn transform(prefix: &str, chunks: &[&[u8]]) -> Vec<u8> {
        let mut writer = LinePrefixWriter::new(Vec::new(), Prefix::from(prefix));
        for chunk in chunks {
            let n = writer.write_chunk(chunk).await.unwrap();
            assert_eq!(n, chunk.len());
        }
        writer.into_inner()
    }

    #[tokio::test]
    async fn test_prefix_each_line() {
        let out = transform("> ", &[b"a\nb\nc"]).await;
        assert_eq!(out, b"> a\n> b\n> c");
    }

    #[tokio::test]
    async fn test_no_prefix_after_trailing_newline() {
        let out = transform("[p] ", &[b"x\ny\n"]).await;
        assert_eq!(out, b"[p] x\n[p] y\n");
    }

    #[tokio::test]
    async fn test_empty_lines_get_prefix() {
        let out = transform("# ", &[b"\n\nend\n"]).await;
        assert_eq!(out, b"# \n# \n# end\n");
    }

    #[tokio::test]
    async fn test_carriage_return_is_ordinary_byte() {
        let out = transform("> ", &[b"a\r\nb\rc\n"]).await;
        assert_eq!(out, b"> a\r\n> b\rc\n");
    }

    #[tokio::test]
    async fn test_empty_prefix_is_passthrough() {
        let input: &[u8] = b"one\ntwo\n\nthree";
        let out = transform("", &[&input[..5], &input[5..], b""]).await;
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn test_chunking_does_not_change_output() {
        let input: &[u8] = b"first line\n\nthird\nno newline at end";
        let whole = transform(">> ", &[input]).await;

        for split_a in 0..=input.len() {
            for split_b in split_a..=input.len() {
                let chunks = [
                    &input[..split_a],
                    &input[split_a..split_b],
                    &input[split_b..],
                ];
                let out = transform(">> ", &chunks).await;
                assert_eq!(out, whole, "split at {} and {}", split_a, split_b);
            }
        }
    }

    #[tokio::test]
    async fn test_byte_at_a_time() {
        let input: &[u8] = b"a\nbb\n";
        let chunks: Vec<&[u8]> = input.chunks(1).collect();
        let out = transform("- ", &chunks).await;
        assert_eq!(out, b"- a\n- bb\n");
    }

    #[tokio::test]
    async fn test_empty_chunk_keeps_state() {
        let mut writer = LinePrefixWriter::new(Vec::new(), Prefix::from("> "));
        assert_eq!(writer.write_chunk(b"").await.unwrap(), 0);
        assert!(writer.is_at_line_start());
        assert!(writer.get_ref().is_empty());

        writer.write_chunk(b"abc").await.unwrap();
        assert!(!writer.is_at_line_start());
        writer.write_chunk(b"").await.unwrap();
        assert!(!writer.is_at_line_start());
        assert_eq!(writer.get_ref().as_slice(), b"> abc");
    }

    #[tokio::test]
    async fn test_writers_do_not_share_line_state() {
        let prefix = Prefix::from("| ");
        let mut out = LinePrefixWriter::new(Vec::new(), prefix.clone());
        let mut err = LinePrefixWriter::new(Vec::new(), prefix);

        out.write_chunk(b"partial").await.unwrap();
        err.write_chunk(b"e1\n").await.unwrap();
        out.write_chunk(b" done\n").await.unwrap();
        err.write_chunk(b"e2").await.unwrap();

        assert_eq!(out.into_inner(), b"| partial done\n");
        assert_eq!(err.into_inner(), b"| e1\n| e2");
    }

    #[tokio::test]
    async fn test_failure_reports_consumed_bytes() {
        // "> " fits, then only "ab" of the first line.
        let sink = FailingSink {
            written: Vec::new(),
            budget: 4,
        };
        let mut writer = LinePrefixWriter::new(sink, Prefix::from("> "));

        let err = writer.write_chunk(b"ab\ncd").await.unwrap_err();
        assert_eq!(err.consumed, 2);
        assert_eq!(err.source.kind(), io::ErrorKind::BrokenPipe);
        assert!(!writer.is_at_line_start());
        assert_eq!(writer.get_ref().written, b"> ab");
    }

    #[tokio::test]
    async fn test_failed_prefix_write_keeps_line_start() {
        let sink = FailingSink {
            written: Vec::new(),
            budget: 5,
        };
        let mut writer = LinePrefixWriter::new(sink, Prefix::from("> "));

        let err = writer.write_chunk(b"ab\ncd").await.unwrap_err();
        // "> ab\n" fits exactly; the second prefix does not.
        assert_eq!(err.consumed, 3);
        assert!(writer.is_at_line_start());
    }

    #[tokio::test]
    async fn test_passthrough_failure_reports_consumed_bytes() {
        let sink = FailingSink {
            written: Vec::new(),
            budget: 3,
        };
        let mut writer = LinePrefixWriter::new(sink, Prefix::none());

        let err = writer.write_chunk(b"hello").await.unwrap_err();
        assert_eq!(err.consumed, 3);
        assert_eq!(writer.into_inner().written, b"hel");
    }

    #[test]
    fn test_prefix_from_option() {
        assert!(Prefix::from(None::<String>).is_empty());
        assert_eq!(Prefix::from(Some("[x] ".to_string())).as_bytes(), b"[x] ");
        assert_eq!(Prefix::default(), Prefix::none());
    }
}
