//! Best-effort forwarding of one child output stream.
//!
//! A relay drains its source until end-of-stream. Sink failures are logged
//! and swallowed; the source is still drained so the child never blocks on a
//! full pipe.

use std::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, warn};

use super::prefix::LinePrefixWriter;

const RELAY_READ_BUFFER: usize = 16384; // 16KB per read for good throughput

/// Which child stream a relay is forwarding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// What a finished relay did. Only used for logging; it never affects the
/// exit code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Bytes read from the source.
    pub bytes_read: u64,
    /// Input bytes accepted by the sink.
    pub bytes_forwarded: u64,
    /// Set once a write or flush failed; later input is discarded.
    pub sink_failed: bool,
}

/// Copies `source` into `sink` until end-of-stream.
///
/// The sink is flushed after every chunk so output shows up as the child
/// produces it. Interrupted reads are retried, any other read error ends the
/// relay.
pub async fn relay<R, W>(
    kind: StreamKind,
    mut source: R,
    sink: &mut LinePrefixWriter<W>,
) -> RelayReport
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; RELAY_READ_BUFFER];
    let mut report = RelayReport::default();

    loop {
        let n = match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(stream = %kind, "read error, ending relay: {}", e);
                break;
            }
        };
        report.bytes_read += n as u64;

        if report.sink_failed {
            continue;
        }

        match sink.write_chunk(&buf[..n]).await {
            Ok(written) => report.bytes_forwarded += written as u64,
            Err(e) => {
                report.bytes_forwarded += e.consumed as u64;
                report.sink_failed = true;
                warn!(stream = %kind, "destination write failed, discarding further output: {}", e);
                continue;
            }
        }

        if let Err(e) = sink.flush().await {
            report.sink_failed = true;
            warn!(stream = %kind, "destination flush failed, discarding further output: {}", e);
        }
    }

    debug!(
        stream = %kind,
        bytes_read = report.bytes_read,
        bytes_forwarded = report.bytes_forwarded,
        sink_failed = report.sink_failed,
        "relay finished"
    );
    report
}
