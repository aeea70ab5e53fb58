//! Executes the core's `HttpRequest` values over the network.
//!
//! Each dispatch runs on its own worker thread and reports back over a
//! channel, so the UI loop never waits on a socket.

use std::sync::mpsc::Sender;
use std::thread;

use todo_core::{ApiError, Dispatch, HttpMethod, HttpRequest, HttpResponse, Operation};

/// A finished round-trip, ready to be settled on the UI thread.
#[derive(Debug)]
pub struct Completion {
    pub operation: Operation,
    pub outcome: Result<HttpResponse, ApiError>,
}

#[derive(Clone)]
pub struct Transport {
    agent: ureq::Agent,
}

impl Transport {
    /// 4xx/5xx statuses come back as data so the core decides what they mean.
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = &self.agent;
        let content_type = req
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
            .unwrap_or("application/json");

        let mut response = match (req.method, req.body.as_deref()) {
            (HttpMethod::Get, _) => agent.get(&req.path).call(),
            (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
            (HttpMethod::Post, Some(body)) => agent
                .post(&req.path)
                .content_type(content_type)
                .send(body.as_bytes()),
            (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
            (HttpMethod::Patch, Some(body)) => agent
                .patch(&req.path)
                .content_type(content_type)
                .send(body.as_bytes()),
            (HttpMethod::Patch, None) => agent.patch(&req.path).send_empty(),
        }
        .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        tracing::debug!(method = req.method.as_str(), path = %req.path, status, "Request finished");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// Run `dispatch` on a worker thread and send its completion to `tx`.
    pub fn spawn(&self, dispatch: Dispatch, tx: Sender<Completion>) {
        let transport = self.clone();
        thread::spawn(move || {
            let outcome = transport.execute(dispatch.request);
            if let Err(err) = &outcome {
                tracing::warn!(operation = ?dispatch.operation, error = %err, "Request failed");
            }
            // The receiver is gone only when the UI has already quit.
            let _ = tx.send(Completion {
                operation: dispatch.operation,
                outcome,
            });
        });
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
