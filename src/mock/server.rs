use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::logging::HarnessLogger;
use crate::mock::router::{ApiRequest, RouteHandler, RouteOutcome};

/// Shared interception point. The server locks the handler for the full
/// duration of each request, so store mutations land in the order requests
/// were intercepted even when callers fire them concurrently.
pub type SharedHandler = Arc<Mutex<dyn RouteHandler + Send>>;

pub fn shared_handler<H: RouteHandler + Send + 'static>(handler: H) -> SharedHandler {
    Arc::new(Mutex::new(handler))
}

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
}

/// Serves the mock entry API on a real loopback socket so HTTP-level tests
/// and manually driven frontends can talk to it like a real backend.
/// Requests are accepted and answered one at a time on a background thread.
pub struct MockApiServer {
    base_url: String,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<Result<()>>>,
}

impl MockApiServer {
    /// Binds `127.0.0.1:{port}` (0 picks a free port) and starts serving.
    pub fn start(handler: SharedHandler, logger: HarnessLogger, port: u16) -> Result<Self> {
        let listener =
            TcpListener::bind(("127.0.0.1", port)).context("bind mock API server")?;
        listener
            .set_nonblocking(true)
            .context("set_nonblocking mock API server")?;
        let addr = listener.local_addr().context("mock API server local_addr")?;
        let base_url = format!("http://{addr}");
        logger.info(&format!("mock API listening on {base_url}"));

        let received = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let received_for_thread = Arc::clone(&received);
        let stop_for_thread = Arc::clone(&stop);

        let join = thread::spawn(move || -> Result<()> {
            loop {
                if stop_for_thread.load(Ordering::SeqCst) {
                    break;
                }
                match listener.accept() {
                    Ok((stream, _)) => {
                        serve_one(stream, &handler, &received_for_thread, &logger)?;
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(10));
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Ok(())
        });

        Ok(Self {
            base_url,
            received,
            stop,
            join: Some(join),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stops the accept loop and returns everything the server saw.
    pub fn shutdown(mut self) -> Result<Vec<ReceivedRequest>> {
        self.stop.store(true, Ordering::SeqCst);
        let join = self
            .join
            .take()
            .ok_or_else(|| anyhow::anyhow!("mock API server join handle missing"))?;
        let result = join
            .join()
            .map_err(|_| anyhow::anyhow!("mock API server panicked"))?;
        result?;
        let received = self
            .received
            .lock()
            .map_err(|_| anyhow::anyhow!("received list poisoned"))?
            .clone();
        Ok(received)
    }
}

fn serve_one(
    stream: TcpStream,
    handler: &SharedHandler,
    received: &Arc<Mutex<Vec<ReceivedRequest>>>,
    logger: &HarnessLogger,
) -> Result<()> {
    let parsed = read_http_request(stream)?;
    received
        .lock()
        .map_err(|_| anyhow::anyhow!("received list poisoned"))?
        .push(ReceivedRequest {
            method: parsed.method.clone(),
            path: parsed.path.clone(),
        });

    if !parsed.path.starts_with("/api/entry") {
        logger.warn(&format!("unroutable path: {}", parsed.path));
        return write_http_response(parsed.stream, 404, r#"{"error":"No such route"}"#);
    }

    // The path on the wire is origin-form; give the URL parser a base.
    let full_url = format!("http://mock.local{}", parsed.path);
    let body = if parsed.body.is_empty() {
        None
    } else {
        Some(String::from_utf8(parsed.body).context("request body is not valid utf-8")?)
    };
    let request = ApiRequest::from_url(&parsed.method, &full_url, body)?;

    let outcome = handler
        .lock()
        .map_err(|_| anyhow::anyhow!("route handler poisoned"))?
        .intercept(&request)?;

    match outcome {
        RouteOutcome::Fulfill(response) => {
            logger.info(&format!(
                "{} {} -> {}",
                parsed.method, parsed.path, response.status
            ));
            write_http_response(parsed.stream, response.status, &response.body.to_string())
        }
        RouteOutcome::Abort => {
            // Dropping the stream without writing anything is the
            // transport-level failure the caller is meant to observe.
            logger.warn(&format!("{} {} -> aborted", parsed.method, parsed.path));
            drop(parsed.stream);
            Ok(())
        }
        RouteOutcome::Continue => {
            // Nothing upstream exists on a loopback socket to continue to.
            logger.warn(&format!(
                "{} {} -> not intercepted",
                parsed.method, parsed.path
            ));
            write_http_response(parsed.stream, 404, r#"{"error":"No such route"}"#)
        }
    }
}

struct ParsedRequestWithStream {
    method: String,
    path: String,
    body: Vec<u8>,
    stream: TcpStream,
}

fn read_http_request(mut stream: TcpStream) -> Result<ParsedRequestWithStream> {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .context("set read timeout")?;

    let mut buffer = Vec::new();
    let mut temp = [0_u8; 1024];
    let mut header_end = None;

    while header_end.is_none() {
        let read = stream.read(&mut temp).context("read request headers")?;
        if read == 0 {
            bail!("unexpected EOF while reading headers");
        }
        buffer.extend_from_slice(&temp[..read]);
        header_end = find_subslice(&buffer, b"\r\n\r\n");
    }

    let header_end_index = header_end.unwrap_or_default() + 4;
    let header_text = String::from_utf8(buffer[..header_end_index].to_vec())
        .context("headers are not valid utf-8")?;

    let mut lines = header_text.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("missing request line"))?;
    let mut request_line_parts = request_line.split_whitespace();
    let method = request_line_parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("missing request method"))?
        .to_string();
    let path = request_line_parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("missing request path"))?
        .to_string();

    let mut content_length = 0_usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':')
            && name.eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse::<usize>().unwrap_or(0);
        }
    }

    let mut body = buffer[header_end_index..].to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut temp).context("read request body")?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&temp[..read]);
    }
    body.truncate(content_length);

    Ok(ParsedRequestWithStream {
        method,
        path,
        body,
        stream,
    })
}

fn write_http_response(mut stream: TcpStream, status: u16, body: &str) -> Result<()> {
    let status_text = match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "OK",
    };

    let response = format!(
        "HTTP/1.1 {status} {status_text}\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream
        .write_all(response.as_bytes())
        .context("write response")?;
    stream.flush().context("flush response")?;
    Ok(())
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
