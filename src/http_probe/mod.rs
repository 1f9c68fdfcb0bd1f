pub mod probe;
pub mod result;

pub mod prelude {
    pub use super::probe::{ProbeTarget, probe_url};
    pub use super::result::{ProbeResult, ProbeStatus};
}

use std::fmt::Write;

/// Render an error together with its chain of sources.
pub(crate) fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, "\n\nCaused by: {}", src);
        err = src;
    }
    s
}

/// Client for tests talking to local mock servers; ignores proxy settings from the environment.
#[cfg(test)]
pub(crate) fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client")
}
