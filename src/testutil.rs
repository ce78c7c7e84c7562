//! Test doubles shared across module tests

use crate::error::ProvisionError;
use crate::provision::{Endpoint, PortAllocator};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Hands out a scripted port list without probing anything
pub struct ScriptedPorts(VecDeque<u16>);

impl ScriptedPorts {
    pub fn new(ports: &[u16]) -> Box<Self> {
        Box::new(Self(ports.iter().copied().collect()))
    }
}

impl PortAllocator for ScriptedPorts {
    fn allocate(&mut self) -> Result<u16, ProvisionError> {
        self.0
            .pop_front()
            .ok_or(ProvisionError::PortsExhausted { start: 0, end: 0 })
    }
}

/// How a [`StubWorker`] answers requests
pub enum StubBehavior {
    /// Respond 200 with this JSON body
    Json(String),

    /// Count whitespace-separated words in the request's "data" field
    CountWords,

    /// Respond with this status line and an empty body
    Status(&'static str),

    /// Respond 200 with a body that is not valid JSON
    Garbage,

    /// Accept connections and read requests but never answer
    Silent,
}

/// A canned HTTP worker bound to an OS-assigned loopback port
///
/// Accepts connections in a loop, so readiness probes can connect and
/// disconnect before the real request arrives. Every complete request
/// is recorded.
pub struct StubWorker {
    pub port: u16,
    requests: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl StubWorker {
    pub async fn spawn(behavior: StubBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let task = tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let request = match read_request(&mut socket).await {
                    Some(request) => request,
                    // Readiness probes connect and leave without sending anything.
                    None => continue,
                };
                recorded.lock().unwrap().push(request.clone());
                respond(&mut socket, &behavior, &request).await;
            }
        });

        Self {
            port,
            requests,
            task,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: "127.0.0.1".to_string(),
            port: self.port,
        }
    }

    /// Complete requests received so far, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubWorker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Read one HTTP request, headers plus content-length body
///
/// Returns None when the peer disconnects before sending a full request.
async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(String::from_utf8_lossy(&buf).to_string())
}

async fn respond(socket: &mut TcpStream, behavior: &StubBehavior, request: &str) {
    let (status, body) = match behavior {
        StubBehavior::Json(body) => ("200 OK", body.clone()),
        StubBehavior::CountWords => ("200 OK", count_words_response(request)),
        StubBehavior::Status(status) => (*status, String::new()),
        StubBehavior::Garbage => ("200 OK", "not json".to_string()),
        StubBehavior::Silent => {
            // Hold the connection open without answering.
            tokio::time::sleep(Duration::from_secs(600)).await;
            return;
        }
    };

    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).await.ok();
    socket.shutdown().await.ok();
}

/// Build the worker protocol response for a counted request body
fn count_words_response(request: &str) -> String {
    let body = request.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("");
    let parsed: serde_json::Value = serde_json::from_str(body).unwrap();
    let text = parsed["data"].as_str().unwrap();

    let mut counts: HashMap<String, u64> = HashMap::new();
    for word in text.split_whitespace() {
        *counts.entry(word.to_string()).or_insert(0) += 1;
    }
    serde_json::json!({ "data": counts }).to_string()
}
