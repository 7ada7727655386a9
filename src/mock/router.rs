use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::mock::netsim::NetworkProfile;
use crate::mock::store::{Entry, EntryStore, EntryUpdate, canonical_instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Other(String),
}

impl Method {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Other(raw) => raw,
        }
    }
}

/// The query parameters the entry API understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestQuery {
    pub date: Option<String>,
    pub id: Option<String>,
}

/// An intercepted HTTP-shaped request, already broken into the pieces the
/// router dispatches on. The raw body stays a string here; decoding happens
/// inside the handler so malformed JSON can be told apart from absent fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub query: RequestQuery,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, query: RequestQuery, body: Option<String>) -> Self {
        Self {
            method,
            query,
            body,
        }
    }

    /// Builds a request description from a full URL, picking out the `date`
    /// and `id` query parameters and ignoring everything else.
    pub fn from_url(method: &str, url: &str, body: Option<String>) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("invalid request URL: {url}"))?;
        let mut query = RequestQuery::default();
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "date" => query.date = Some(value.into_owned()),
                "id" => query.id = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(Self {
            method: Method::parse(method),
            query,
            body,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    pub fn success(status: u16) -> Self {
        Self {
            status,
            body: json!({ "success": true }),
        }
    }
}

/// What the interception point does with a request. Passing the request
/// through untouched is a first-class outcome, not a fallthrough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Fulfill(ApiResponse),
    /// Transport-level failure: the connection dies without a response.
    Abort,
    /// Not handled here; let the request continue to whatever is upstream.
    Continue,
}

pub trait RouteHandler {
    fn intercept(&mut self, request: &ApiRequest) -> Result<RouteOutcome>;
}

/// Write-request body. Both POST and PUT share this shape; which fields are
/// required differs per method and is checked by the handler.
#[derive(Debug, Default, Deserialize)]
struct WriteBody {
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "Created_date")]
    created_date: Option<String>,
}

impl WriteBody {
    /// Absent body decodes as all-fields-absent (a 400 concern), while a
    /// present-but-malformed body is a harness failure and propagates.
    fn decode(body: Option<&String>) -> Result<Self> {
        match body {
            Some(raw) => serde_json::from_str(raw).context("malformed request body"),
            None => Ok(Self::default()),
        }
    }
}

/// The mock entry API: translates intercepted requests into store calls and
/// shaped responses, after the network profile's simulated delay.
#[derive(Debug)]
pub struct EntryRouter {
    store: EntryStore,
    profile: NetworkProfile,
}

impl EntryRouter {
    pub fn new(store: EntryStore) -> Self {
        Self {
            store,
            profile: NetworkProfile::default(),
        }
    }

    pub fn with_profile(store: EntryStore, profile: NetworkProfile) -> Self {
        Self { store, profile }
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntryStore {
        &mut self.store
    }

    pub fn set_profile(&mut self, profile: NetworkProfile) {
        self.profile = profile;
    }

    fn handle_get(&self, query: &RequestQuery) -> RouteOutcome {
        if let Some(id) = &query.id {
            return match self.store.find_by_id(id) {
                Some(entry) => fulfill_entry(200, &entry),
                None => RouteOutcome::Fulfill(ApiResponse::error(404, "Entry not found")),
            };
        }
        if let Some(date) = &query.date {
            return match self.store.find_by_date(date) {
                Ok(entries) => fulfill_entries(200, &entries),
                Err(_) => RouteOutcome::Fulfill(ApiResponse::error(400, "Invalid date format")),
            };
        }
        fulfill_entries(200, &self.store.list_all())
    }

    fn handle_post(&mut self, request: &ApiRequest) -> Result<RouteOutcome> {
        let body = WriteBody::decode(request.body.as_ref())?;
        let (Some(name), Some(created_date)) = (body.name, body.created_date) else {
            return Ok(RouteOutcome::Fulfill(ApiResponse::error(
                400,
                "Name and date are required",
            )));
        };
        if name.is_empty() || created_date.is_empty() {
            return Ok(RouteOutcome::Fulfill(ApiResponse::error(
                400,
                "Name and date are required",
            )));
        }
        self.store.add(&name, &created_date, None);
        Ok(RouteOutcome::Fulfill(ApiResponse::success(201)))
    }

    fn handle_put(&mut self, request: &ApiRequest) -> Result<RouteOutcome> {
        let body = WriteBody::decode(request.body.as_ref())?;
        let Some(id) = body.id else {
            return Ok(RouteOutcome::Fulfill(ApiResponse::error(
                400,
                "ID is required",
            )));
        };
        let updates = EntryUpdate {
            name: body.name,
            created_date: body.created_date,
        };
        if self.store.update(&id, &updates) {
            Ok(RouteOutcome::Fulfill(ApiResponse::success(200)))
        } else {
            Ok(RouteOutcome::Fulfill(ApiResponse::error(
                404,
                "Entry not found",
            )))
        }
    }

    fn handle_delete(&mut self, query: &RequestQuery) -> RouteOutcome {
        let Some(id) = &query.id else {
            return RouteOutcome::Fulfill(ApiResponse::error(400, "ID is required"));
        };
        if self.store.remove(id) {
            RouteOutcome::Fulfill(ApiResponse::success(200))
        } else {
            RouteOutcome::Fulfill(ApiResponse::error(404, "Entry not found"))
        }
    }
}

impl RouteHandler for EntryRouter {
    fn intercept(&mut self, request: &ApiRequest) -> Result<RouteOutcome> {
        self.profile.wait();
        if self.profile.should_fail() {
            return Ok(RouteOutcome::Abort);
        }
        match &request.method {
            Method::Get => Ok(self.handle_get(&request.query)),
            Method::Post => self.handle_post(request),
            Method::Put => self.handle_put(request),
            Method::Delete => Ok(self.handle_delete(&request.query)),
            Method::Other(_) => Ok(RouteOutcome::Continue),
        }
    }
}

/// Store-bypassing handler that pins a scenario's response: POST always
/// succeeds and GET always returns one synthetic entry with the expected
/// content and date, irrespective of anything saved elsewhere. Used when a
/// test must assert an exact persisted value regardless of store ordering.
#[derive(Debug, Clone)]
pub struct PinnedRouter {
    entry: Entry,
    profile: NetworkProfile,
}

impl PinnedRouter {
    pub fn new(name: &str, date: &str) -> Result<Self> {
        Self::with_id(name, date, "test-id")
    }

    pub fn with_id(name: &str, date: &str, id: &str) -> Result<Self> {
        let created_date =
            canonical_instant(date).with_context(|| format!("pinned date is invalid: {date}"))?;
        Ok(Self {
            entry: Entry {
                name: name.to_string(),
                created_date,
                id: id.to_string(),
            },
            profile: NetworkProfile::instant(),
        })
    }

    pub fn set_profile(&mut self, profile: NetworkProfile) {
        self.profile = profile;
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }
}

impl RouteHandler for PinnedRouter {
    fn intercept(&mut self, request: &ApiRequest) -> Result<RouteOutcome> {
        self.profile.wait();
        if self.profile.should_fail() {
            return Ok(RouteOutcome::Abort);
        }
        match &request.method {
            Method::Post => Ok(RouteOutcome::Fulfill(ApiResponse::success(201))),
            Method::Get => Ok(fulfill_entries(200, std::slice::from_ref(&self.entry))),
            _ => Ok(RouteOutcome::Continue),
        }
    }
}

fn fulfill_entry(status: u16, entry: &Entry) -> RouteOutcome {
    RouteOutcome::Fulfill(ApiResponse::json(status, json!(entry)))
}

fn fulfill_entries(status: u16, entries: &[Entry]) -> RouteOutcome {
    RouteOutcome::Fulfill(ApiResponse::json(status, json!(entries)))
}
