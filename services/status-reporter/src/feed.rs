//! Upstream feed reader.
//!
//! Reads newline-delimited JSON feed messages and routes them onto the
//! reporter's two input channels. The channels close when the reader hits
//! end of input, which the reporter treats as fatal.

use anyhow::Result;
use statusrep_events::{parse_feed_line, EndpointUpdate, EventError, FeedItem};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Counters for one run of the feed reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Messages forwarded to the reporter.
    pub forwarded: u64,

    /// Lines that could not be decoded.
    pub skipped: u64,
}

/// Forward feed messages from `reader` until end of input.
///
/// Stops early if the reporter has gone away.
pub async fn forward_feed<R>(
    reader: R,
    in_sync_tx: mpsc::Sender<bool>,
    updates_tx: mpsc::Sender<EndpointUpdate>,
) -> Result<FeedStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = FeedStats::default();
    let mut line_no: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;

        let msg = match parse_feed_line(&line) {
            Ok(msg) => msg,
            Err(EventError::Empty) => continue,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed feed line");
                stats.skipped += 1;
                continue;
            }
        };

        debug!(line = line_no, feed_type = msg.feed_type(), "Forwarding feed message");

        let sent = match msg.route() {
            FeedItem::InSync(in_sync) => in_sync_tx.send(in_sync).await.is_ok(),
            FeedItem::Endpoint(update) => updates_tx.send(update).await.is_ok(),
        };
        if !sent {
            info!("Reporter stopped, closing feed");
            return Ok(stats);
        }
        stats.forwarded += 1;
    }

    info!(
        forwarded = stats.forwarded,
        skipped = stats.skipped,
        "Feed reached end of input"
    );
    Ok(stats)
}
