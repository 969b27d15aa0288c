//! Host logging sink.

use log::{error, info};

/// Where invocation-level messages go. Mirrors the host logger: `info`,
/// `error`, and a plain `log` that defaults to info severity.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);

    fn log(&self, message: &str) {
        self.info(message);
    }
}

/// Sink that writes through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn info(&self, message: &str) {
        info!(target: "last9_forwarder", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "last9_forwarder", "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemorySink;

    #[test]
    fn test_default_log_goes_to_info() {
        let sink = MemorySink::default();
        sink.log("plain");
        sink.error("bad");

        assert_eq!(sink.infos(), vec!["plain".to_string()]);
        assert_eq!(sink.errors(), vec!["bad".to_string()]);
    }

    #[test_log::test]
    fn test_console_sink_writes_through_log() {
        let sink = ConsoleSink;
        sink.log("Received 1 logs");
        sink.error("Max retries reached");
    }
}
