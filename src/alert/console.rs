use std::io::Write;

use super::{AlertError, AlertSink, NotifyFuture, log_failure};
use crate::http_probe::prelude::*;

/// Writes alerts to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

pub fn format_alert(result: &ProbeResult) -> String {
    format!(
        "⚠️ ALERT: website {} is unhealthy ({})!\n   Error: {}",
        result.url(),
        result.status(),
        result.error_detail().unwrap_or("no detail")
    )
}

impl ConsoleSink {
    fn write(&self, result: &ProbeResult) -> Result<(), AlertError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", format_alert(result))?;
        stdout.flush()?;
        Ok(())
    }
}

impl AlertSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn notify<'a>(&'a self, result: &'a ProbeResult) -> NotifyFuture<'a> {
        Box::pin(async move {
            if let Err(e) = self.write(result) {
                log_failure(self.name(), result, &e);
            }
        })
    }
}
