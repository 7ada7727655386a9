use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde_json::json;

use crate::mock::store::Entry;

/// HTTP client for the notes entry API. Points at either a live deployment
/// or a [`MockApiServer`](crate::mock::server::MockApiServer) base URL.
#[derive(Debug, Clone)]
pub struct NotesApiClient {
    base_url: String,
    agent: ureq::Agent,
}

impl NotesApiClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let sanitized = sanitize_base_url(&base_url)?;
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            base_url: sanitized,
            agent,
        })
    }

    pub fn entry_by_id(&self, id: &str) -> Result<Entry> {
        let url = format!("{}/api/entry?id={id}", self.base_url);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| map_http_error(err, "fetch entry by id"))?;
        response
            .into_json()
            .context("API returned invalid JSON for entry")
    }

    pub fn entries_for_date(&self, date: &str) -> Result<Vec<Entry>> {
        let url = format!("{}/api/entry?date={date}", self.base_url);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| map_http_error(err, "fetch entries by date"))?;
        response
            .into_json()
            .context("API returned invalid JSON for date lookup")
    }

    pub fn all_entries(&self) -> Result<Vec<Entry>> {
        let url = format!("{}/api/entry", self.base_url);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| map_http_error(err, "list entries"))?;
        response
            .into_json()
            .context("API returned invalid JSON for entry listing")
    }

    /// POSTs a new entry. The API acknowledges with `{"success":true}` and
    /// assigns the id itself; fetch by date to discover it.
    pub fn create_entry(&self, name: &str, date: &str) -> Result<()> {
        let url = format!("{}/api/entry", self.base_url);
        self.agent
            .post(&url)
            .send_json(json!({ "name": name, "Created_date": date }))
            .map_err(|err| map_http_error(err, "create entry"))?;
        Ok(())
    }

    pub fn update_entry(&self, id: &str, name: Option<&str>, date: Option<&str>) -> Result<()> {
        let url = format!("{}/api/entry", self.base_url);
        let mut body = json!({ "id": id });
        if let Some(name) = name {
            body["name"] = json!(name);
        }
        if let Some(date) = date {
            body["Created_date"] = json!(date);
        }
        self.agent
            .put(&url)
            .send_json(body)
            .map_err(|err| map_http_error(err, "update entry"))?;
        Ok(())
    }

    pub fn delete_entry(&self, id: &str) -> Result<()> {
        let url = format!("{}/api/entry?id={id}", self.base_url);
        self.agent
            .delete(&url)
            .call()
            .map_err(|err| map_http_error(err, "delete entry"))?;
        Ok(())
    }
}

fn sanitize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        bail!("API base URL must not be empty");
    }
    let parsed =
        url::Url::parse(trimmed).with_context(|| format!("invalid API base URL: {trimmed}"))?;
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        bail!("API base URL must be http or https: {trimmed}");
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn map_http_error(err: ureq::Error, action: &str) -> anyhow::Error {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            let message = extract_error_message(&body);
            anyhow::anyhow!("{action} failed with HTTP {status}: {message}")
        }
        ureq::Error::Transport(transport) => {
            anyhow::anyhow!("{action} failed: {}", transport)
        }
    }
}

fn extract_error_message(body: &str) -> String {
    if body.trim().is_empty() {
        return "empty response body".to_string();
    }
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(error) = parsed.get("error").and_then(|v| v.as_str())
    {
        return error.to_string();
    }
    body.trim().to_string()
}
