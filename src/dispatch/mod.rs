pub mod telegram;

pub use telegram::TelegramSink;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

use crate::pipeline::ScanReport;

pub const NO_MATCHES_MESSAGE: &str = "No strong matches found based on current criteria.";

/// Destination for rendered match digests (chat reply, scheduled broadcast).
#[async_trait]
pub trait DispatchSink: Send + Sync {
    async fn send(&self, destination: &str, text: &str) -> Result<()>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Sink used when no push channel is configured: the digest goes to the log.
pub struct LogSink;

#[async_trait]
impl DispatchSink for LogSink {
    async fn send(&self, destination: &str, text: &str) -> Result<()> {
        info!("Digest for {}:\n{}", destination, text);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Render a scan as a plain-text digest.
pub fn render_digest(report: &ScanReport) -> String {
    if report.matches.is_empty() {
        return NO_MATCHES_MESSAGE.to_string();
    }

    let mut out = match (report.dates.first(), report.dates.last()) {
        (Some(first), Some(last)) if first != last => {
            format!("⚽ Strong matches {} → {}\n", first, last)
        }
        (Some(first), _) => format!("⚽ Strong matches {}\n", first),
        _ => "⚽ Strong matches\n".to_string(),
    };
    for m in &report.matches {
        out.push('\n');
        out.push_str(&m.summary);
    }
    out
}

/// Send `text` to every destination. Failures are logged and never retried;
/// returns how many destinations accepted the message.
pub async fn dispatch(sink: &dyn DispatchSink, destinations: &[String], text: &str) -> usize {
    let mut delivered = 0;
    for destination in destinations {
        match sink.send(destination, text).await {
            Ok(()) => delivered += 1,
            Err(e) => error!("{}: delivery to {} failed: {:#}", sink.name(), destination, e),
        }
    }
    delivered
}
