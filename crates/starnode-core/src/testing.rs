//! Test doubles shared by unit tests: a scripted transport and a recording
//! service manager.

use crate::retry::AttemptError;
use crate::service::{ServiceAction, ServiceBackend, ServiceError, ServiceManager, ServiceOutput};
use crate::storage::StagedFile;
use crate::transport::Transport;
use std::cell::RefCell;

pub(crate) enum Route {
    Serve(Vec<u8>),
    Status(u32),
    DiskFull,
}

/// Answers by URL key (exact match, or key followed by `/`) and records every
/// URL requested. Unknown URLs fail like a refused connection.
pub(crate) struct ScriptedTransport {
    routes: Vec<(String, Route)>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new<K: Into<String>>(routes: Vec<(K, Route)>) -> Self {
        Self {
            routes: routes.into_iter().map(|(k, r)| (k.into(), r)).collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn download(&self, url: &str, sink: &mut StagedFile) -> Result<u64, AttemptError> {
        self.calls.borrow_mut().push(url.to_string());
        let route = self
            .routes
            .iter()
            .find(|(key, _)| url == key || url.starts_with(&format!("{}/", key)))
            .map(|(_, r)| r);
        match route {
            Some(Route::Serve(body)) => {
                sink.write_chunk(body).map_err(AttemptError::Storage)?;
                Ok(sink.bytes_written())
            }
            Some(Route::Status(code)) => {
                sink.write_chunk(b"<html>error page</html>")
                    .map_err(AttemptError::Storage)?;
                Err(AttemptError::Http(*code))
            }
            Some(Route::DiskFull) => Err(AttemptError::Storage(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no space left on device",
            ))),
            // CURLE_COULDNT_CONNECT
            None => Err(AttemptError::Curl(curl::Error::new(7))),
        }
    }
}

/// Records `(action, service)` pairs; optionally reports failure for one action.
pub(crate) struct RecordingManager {
    pub(crate) calls: RefCell<Vec<(ServiceAction, Option<String>)>>,
    pub(crate) fail_on: Option<ServiceAction>,
}

impl RecordingManager {
    pub(crate) fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    pub(crate) fn calls(&self) -> Vec<(ServiceAction, Option<String>)> {
        self.calls.borrow().clone()
    }
}

impl ServiceManager for RecordingManager {
    fn backend(&self) -> ServiceBackend {
        ServiceBackend::Systemd
    }

    fn run(&self, action: ServiceAction, service: Option<&str>) -> Result<ServiceOutput, ServiceError> {
        self.calls
            .borrow_mut()
            .push((action, service.map(str::to_string)));
        let success = self.fail_on != Some(action);
        Ok(ServiceOutput {
            success,
            code: Some(if success { 0 } else { 3 }),
            stdout: format!("{} {}", action, service.unwrap_or("-")),
            stderr: String::new(),
        })
    }
}
