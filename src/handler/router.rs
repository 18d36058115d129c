//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: picks the static mount whose
//! prefix matches, hands the request to its resolver and writes the access log.

use super::static_files::StaticFiles;
use crate::config::AppState;
use crate::http::{self, StaticBody};
use crate::logger::{self, AccessLogEntry};
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, IF_MODIFIED_SINCE, IF_NONE_MATCH, REFERER,
    SERVER, USER_AGENT,
};
use hyper::{Method, Request, Response, Version};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// A resolver served under a URL prefix
#[derive(Debug)]
pub struct Mount {
    pub prefix: String,
    pub files: StaticFiles,
}

impl Mount {
    /// Whether `path` is the prefix itself or lies below it
    pub fn matches(&self, path: &str) -> bool {
        let prefix = self.normalized_prefix();
        prefix.is_empty()
            || path == prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Part of `path` below the prefix, always starting with `/`
    pub fn route_path<'p>(&self, path: &'p str) -> &'p str {
        let rest = path.strip_prefix(self.normalized_prefix()).unwrap_or(path);
        if rest.is_empty() {
            "/"
        } else {
            rest
        }
    }

    fn normalized_prefix(&self) -> &str {
        self.prefix.trim_end_matches('/')
    }
}

/// Request context encapsulating information needed for request processing
#[derive(Debug)]
pub struct RequestContext<'a> {
    pub method: &'a Method,
    /// Raw request path, as sent by the client
    pub path: &'a str,
    pub query: Option<&'a str>,
    /// Percent-decoded path relative to the mount prefix
    pub route_path: String,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

impl<'a> RequestContext<'a> {
    /// Context for a request served at the root of the URL space
    pub fn new(method: &'a Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            query: None,
            route_path: decode_path(path),
            if_none_match: None,
            if_modified_since: None,
        }
    }

    pub fn from_request<B>(req: &'a Request<B>, mount: &Mount) -> Self {
        let path = req.uri().path();
        Self {
            method: req.method(),
            path,
            query: req.uri().query(),
            route_path: decode_path(mount.route_path(path)),
            if_none_match: header_string(req.headers(), &IF_NONE_MATCH),
            if_modified_since: header_string(req.headers(), &IF_MODIFIED_SINCE),
        }
    }

    pub fn is_head(&self) -> bool {
        *self.method == Method::HEAD
    }

    pub fn is_get_or_head(&self) -> bool {
        matches!(*self.method, Method::GET | Method::HEAD)
    }

    /// Same URL with a trailing slash, query preserved
    pub fn slash_redirect_target(&self) -> String {
        match self.query {
            Some(q) => format!("{}/?{q}", self.path),
            None => format!("{}/", self.path),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<StaticBody>, Infallible> {
    let started = Instant::now();
    let logging = &state.config.logging;

    logger::log_headers_count(req.headers().len(), logging.show_headers);

    let mut response = route_request(&req, &state.mounts).await;

    match HeaderValue::from_str(&state.config.http.server_name) {
        Ok(server) => {
            response.headers_mut().insert(SERVER, server);
        }
        Err(_) => logger::log_warning("http.server_name is not a valid header value"),
    }

    if logging.access_log {
        let entry = access_log_entry(&req, &response, peer_addr, started);
        logger::log_access(&entry, &logging.access_log_format);
    }

    Ok(response)
}

/// Dispatch to the longest matching mount
pub async fn route_request<B>(req: &Request<B>, mounts: &[Mount]) -> Response<StaticBody> {
    let Some(mount) = match_mount(mounts, req.uri().path()) else {
        return http::build_404_response();
    };

    let ctx = RequestContext::from_request(req, mount);
    match mount.files.handle(&ctx).await {
        Ok(resp) => resp,
        Err(e) => {
            logger::log_error(&format!("Static mount '{}' is misconfigured: {e}", mount.prefix));
            http::build_500_response()
        }
    }
}

pub fn match_mount<'m>(mounts: &'m [Mount], path: &str) -> Option<&'m Mount> {
    mounts
        .iter()
        .filter(|m| m.matches(path))
        .max_by_key(|m| m.normalized_prefix().len())
}

fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn access_log_entry<B>(
    req: &Request<B>,
    resp: &Response<StaticBody>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = resp.status().as_u16();
    entry.body_bytes = if *req.method() == Method::HEAD {
        0
    } else {
        header_string(resp.headers(), &CONTENT_LENGTH)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    };
    entry.referer = header_string(req.headers(), &REFERER);
    entry.user_agent = header_string(req.headers(), &USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
