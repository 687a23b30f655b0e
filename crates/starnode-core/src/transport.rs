//! Single-stream HTTP GET transport.
//!
//! Uses the curl crate (libcurl easy interface). One easy handle per attempt,
//! redirects followed, the body streamed sequentially into a staged file.

use crate::retry::AttemptError;
use crate::storage::StagedFile;
use std::str;
use std::time::Duration;

/// Something that can GET a URL into a staged file. The fetch loop only talks
/// to this trait, so tests can script mirror outcomes without a network.
pub trait Transport {
    /// Download `url` into `sink`. Returns bytes written on a 2xx final status.
    fn download(&self, url: &str, sink: &mut StagedFile) -> Result<u64, AttemptError>;
}

/// Per-attempt curl limits. Every attempt is bounded so a hung mirror cannot
/// stall the whole retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Total time allowed for one attempt, including the body transfer.
    pub attempt_timeout: Duration,
    /// Abort if below this many bytes/sec for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub max_redirections: u32,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            attempt_timeout: Duration::from_secs(600),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            max_redirections: 10,
        }
    }
}

/// Blocking libcurl transport.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: CurlOptions,
}

impl CurlTransport {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &CurlOptions {
        &self.opts
    }
}

impl Transport for CurlTransport {
    fn download(&self, url: &str, sink: &mut StagedFile) -> Result<u64, AttemptError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(self.opts.max_redirections)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        easy.timeout(self.opts.attempt_timeout)?;
        easy.low_speed_limit(self.opts.low_speed_limit)?;
        easy.low_speed_time(self.opts.low_speed_time)?;
        easy.useragent(concat!("starnode/", env!("CARGO_PKG_VERSION")))?;

        let mut storage_err: Option<std::io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    let line = line.trim_end();
                    if line.starts_with("HTTP/") {
                        tracing::trace!(status_line = line, "response");
                    }
                }
                true
            })?;
            transfer.write_function(|data| match sink.write_chunk(data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    storage_err = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };

        if let Some(e) = storage_err {
            return Err(AttemptError::Storage(e));
        }
        performed?;

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(AttemptError::Http(code));
        }
        Ok(sink.bytes_written())
    }
}
