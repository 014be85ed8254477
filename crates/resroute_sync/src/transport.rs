//! Network collaborator abstraction.
//!
//! The orchestrator talks to the remote through the [`Http`] trait. Two
//! implementations ship with the crate: [`MockHttp`] for scripted tests and
//! [`FileHttp`] which serves JSON fixtures from a directory.

use crate::error::HttpError;
use parking_lot::Mutex;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Request or response headers.
pub type Headers = BTreeMap<String, String>;

/// Result type for HTTP calls.
pub type HttpResult<T> = Result<T, HttpError>;

/// Header carrying the API key on remote requests.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// An HTTP client that decodes JSON responses.
///
/// Calls block; the orchestrator runs them on blocking workers.
pub trait Http: Send + Sync {
    /// Performs a GET.
    fn get(&self, url: &str, headers: Option<&Headers>, body: Option<&str>) -> HttpResult<Json>;

    /// Performs a POST.
    fn post(&self, url: &str, headers: Option<&Headers>, body: Option<&str>) -> HttpResult<Json>;

    /// Performs a PUT.
    fn put(&self, url: &str, headers: Option<&Headers>, body: Option<&str>) -> HttpResult<Json>;

    /// Performs a DELETE.
    fn delete(&self, url: &str, headers: Option<&Headers>, body: Option<&str>)
        -> HttpResult<Json>;

    /// Performs a HEAD and returns the response headers.
    fn head(&self, url: &str, headers: Option<&Headers>) -> HttpResult<Headers>;
}

/// HTTP method of a recorded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
    /// HEAD.
    Head,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        };
        f.write_str(name)
    }
}

/// A request observed by [`MockHttp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Method.
    pub method: Method,
    /// Target URL.
    pub url: String,
    /// Headers, if any were sent.
    pub headers: Option<Headers>,
    /// Body, if any was sent.
    pub body: Option<String>,
}

fn check_url(url: &str) -> HttpResult<()> {
    if url.trim().is_empty() {
        return Err(HttpError::BadRequest {
            message: "empty url".into(),
        });
    }
    Ok(())
}

/// A mock client for testing.
///
/// Responses are scripted per URL and returned for any method. Unscripted
/// URLs answer 404.
#[derive(Debug, Default)]
pub struct MockHttp {
    responses: Mutex<BTreeMap<String, HttpResult<Json>>>,
    head_responses: Mutex<BTreeMap<String, Headers>>,
    delay: Mutex<Option<Duration>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttp {
    /// Creates a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response for `url`.
    pub fn respond(&self, url: impl Into<String>, response: HttpResult<Json>) {
        self.responses.lock().insert(url.into(), response);
    }

    /// Scripts the HEAD response headers for `url`.
    pub fn respond_head(&self, url: impl Into<String>, headers: Headers) {
        self.head_responses.lock().insert(url.into(), headers);
    }

    /// Makes every call sleep for `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    fn record(&self, method: Method, url: &str, headers: Option<&Headers>, body: Option<&str>) {
        self.requests.lock().push(RecordedRequest {
            method,
            url: url.to_string(),
            headers: headers.cloned(),
            body: body.map(str::to_string),
        });

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
    }

    fn answer(
        &self,
        method: Method,
        url: &str,
        headers: Option<&Headers>,
        body: Option<&str>,
    ) -> HttpResult<Json> {
        check_url(url)?;
        self.record(method, url, headers, body);
        self.responses
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(HttpError::status(404, url)))
    }
}

impl Http for MockHttp {
    fn get(&self, url: &str, headers: Option<&Headers>, body: Option<&str>) -> HttpResult<Json> {
        self.answer(Method::Get, url, headers, body)
    }

    fn post(&self, url: &str, headers: Option<&Headers>, body: Option<&str>) -> HttpResult<Json> {
        self.answer(Method::Post, url, headers, body)
    }

    fn put(&self, url: &str, headers: Option<&Headers>, body: Option<&str>) -> HttpResult<Json> {
        self.answer(Method::Put, url, headers, body)
    }

    fn delete(
        &self,
        url: &str,
        headers: Option<&Headers>,
        body: Option<&str>,
    ) -> HttpResult<Json> {
        self.answer(Method::Delete, url, headers, body)
    }

    fn head(&self, url: &str, headers: Option<&Headers>) -> HttpResult<Headers> {
        check_url(url)?;
        self.record(Method::Head, url, headers, None);
        self.head_responses
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| HttpError::status(404, url))
    }
}

/// Serves JSON fixtures from a directory.
///
/// The URL's path (scheme, host and query dropped) names a file under the
/// root: `https://host/v1/listing.json` reads `<root>/v1/listing.json`.
/// Only GET and HEAD are served.
#[derive(Debug, Clone)]
pub struct FileHttp {
    root: PathBuf,
}

impl FileHttp {
    /// Creates a fixture server rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the fixture root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> HttpResult<PathBuf> {
        check_url(url)?;

        let without_scheme = match url.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
            None => url,
        };
        let path = without_scheme
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_start_matches('/');

        let relative = Path::new(path);
        if path.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(HttpError::BadRequest {
                message: format!("unusable fixture path in {url}"),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl Http for FileHttp {
    fn get(&self, url: &str, _headers: Option<&Headers>, _body: Option<&str>) -> HttpResult<Json> {
        let path = self.resolve(url)?;
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(HttpError::status(404, url));
            }
            Err(err) => return Err(HttpError::status(500, err.to_string())),
        };
        serde_json::from_slice(&bytes).map_err(|err| HttpError::status(500, err.to_string()))
    }

    fn post(&self, url: &str, _headers: Option<&Headers>, _body: Option<&str>) -> HttpResult<Json> {
        self.resolve(url)?;
        Err(HttpError::status(405, "fixtures are read-only"))
    }

    fn put(&self, url: &str, _headers: Option<&Headers>, _body: Option<&str>) -> HttpResult<Json> {
        self.resolve(url)?;
        Err(HttpError::status(405, "fixtures are read-only"))
    }

    fn delete(
        &self,
        url: &str,
        _headers: Option<&Headers>,
        _body: Option<&str>,
    ) -> HttpResult<Json> {
        self.resolve(url)?;
        Err(HttpError::status(405, "fixtures are read-only"))
    }

    fn head(&self, url: &str, _headers: Option<&Headers>) -> HttpResult<Headers> {
        let path = self.resolve(url)?;
        let meta = std::fs::metadata(&path).map_err(|_| HttpError::status(404, url))?;

        let mut headers = Headers::new();
        headers.insert("Content-Length".into(), meta.len().to_string());
        headers.insert("Content-Type".into(), "application/json".into());
        Ok(headers)
    }
}
