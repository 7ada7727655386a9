use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use serde_json::json;

use notes_harness::mock::router::{ApiRequest, RouteHandler, RouteOutcome};
use notes_harness::mock::store::Entry;
use notes_harness::page::NotesPage;

const ENTRY_URL: &str = "http://app.local/api/entry";

/// In-process stand-in for the hosted notes page: a text area, a date
/// picker, a save button that disables on empty text, a loading indicator,
/// and an error region. Saves run on background threads through the shared
/// route handler, the same way the real page's fetches hit the interceptor.
pub struct FakePage<H: RouteHandler + Send + 'static> {
    handler: Arc<Mutex<H>>,
    text: String,
    date: String,
    error: Arc<Mutex<Option<String>>>,
    in_flight: Arc<AtomicUsize>,
    pending: Vec<JoinHandle<()>>,
}

impl<H: RouteHandler + Send + 'static> FakePage<H> {
    pub fn new(handler: Arc<Mutex<H>>) -> Self {
        Self {
            handler,
            text: String::new(),
            date: Utc::now().format("%Y-%m-%d").to_string(),
            error: Arc::new(Mutex::new(None)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            pending: Vec::new(),
        }
    }

    /// Blocks until every in-flight save has run to completion.
    pub fn settle_pending(&mut self) {
        for handle in self.pending.drain(..) {
            let _ = handle.join();
        }
    }

    fn set_error(error: &Arc<Mutex<Option<String>>>, message: String) {
        if let Ok(mut slot) = error.lock() {
            *slot = Some(message);
        }
    }
}

impl<H: RouteHandler + Send + 'static> NotesPage for FakePage<H> {
    fn fill_text(&mut self, content: &str) -> Result<()> {
        self.text = content.to_string();
        Ok(())
    }

    fn set_date(&mut self, date: &str) -> Result<()> {
        self.date = date.to_string();
        Ok(())
    }

    fn click_save(&mut self) -> Result<()> {
        if !self.save_enabled() {
            bail!("save button is disabled");
        }
        let body = json!({ "name": self.text, "Created_date": self.date }).to_string();
        let request = ApiRequest::from_url("POST", ENTRY_URL, Some(body))?;

        let handler = Arc::clone(&self.handler);
        let error = Arc::clone(&self.error);
        let in_flight = Arc::clone(&self.in_flight);
        // Counted before the thread starts so the indicator is already
        // visible when this call returns.
        in_flight.fetch_add(1, Ordering::SeqCst);

        self.pending.push(thread::spawn(move || {
            let outcome = match handler.lock() {
                Ok(mut handler) => handler.intercept(&request),
                Err(_) => Err(anyhow::anyhow!("route handler poisoned")),
            };
            match outcome {
                Ok(RouteOutcome::Fulfill(response)) if response.status < 400 => {}
                Ok(RouteOutcome::Fulfill(response)) => {
                    let message = response.body["error"]
                        .as_str()
                        .unwrap_or("Failed to save note")
                        .to_string();
                    Self::set_error(&error, message);
                }
                Ok(RouteOutcome::Abort) | Err(_) => {
                    Self::set_error(&error, "Failed to save note".to_string());
                }
                Ok(RouteOutcome::Continue) => {
                    Self::set_error(&error, "Save request was not handled".to_string());
                }
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
        }));
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        // Navigation does not cancel anything; started saves finish first.
        self.settle_pending();
        if let Ok(mut slot) = self.error.lock() {
            *slot = None;
        }
        self.text.clear();

        let url = format!("{ENTRY_URL}?date={}", self.date);
        let request = ApiRequest::from_url("GET", &url, None)?;
        let outcome = self
            .handler
            .lock()
            .map_err(|_| anyhow::anyhow!("route handler poisoned"))?
            .intercept(&request)?;

        match outcome {
            RouteOutcome::Fulfill(response) if response.status == 200 => {
                let entries: Vec<Entry> = serde_json::from_value(response.body)?;
                if let Some(entry) = entries.last() {
                    self.text = render_sanitized(&entry.name);
                }
            }
            RouteOutcome::Fulfill(response) => {
                let message = response.body["error"]
                    .as_str()
                    .unwrap_or("Failed to load notes")
                    .to_string();
                Self::set_error(&self.error, message);
            }
            RouteOutcome::Abort => {
                Self::set_error(&self.error, "Failed to load notes".to_string());
            }
            RouteOutcome::Continue => {}
        }
        Ok(())
    }

    fn dispatch_date_event(&mut self, date: &str) -> Result<()> {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            Self::set_error(&self.error, "Invalid date format".to_string());
            return Ok(());
        }
        self.date = date.to_string();
        Ok(())
    }

    fn text_value(&self) -> String {
        self.text.clone()
    }

    fn date_value(&self) -> String {
        self.date.clone()
    }

    fn save_enabled(&self) -> bool {
        !self.text.is_empty()
    }

    fn loading_visible(&self) -> Option<bool> {
        Some(self.in_flight.load(Ordering::SeqCst) > 0)
    }

    fn error_message(&self) -> Option<String> {
        self.error.lock().ok().and_then(|slot| slot.clone())
    }
}

/// What the page shows for stored content: script blocks are stripped on
/// render, everything else is displayed verbatim. Matches the app's
/// render-time sanitization; the mock itself never rewrites content.
pub fn render_sanitized(content: &str) -> String {
    let mut out = String::new();
    let mut rest = content;
    while let Some(start) = rest.find("<script") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</script>") {
            Some(end) => rest = &rest[start + end + "</script>".len()..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}
