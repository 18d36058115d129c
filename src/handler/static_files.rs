//! Static file serving module
//!
//! `StaticFiles` resolves request paths against an ordered set of roots and
//! answers with cache-aware responses. Conditional requests are decided from
//! file metadata alone, before the file is ever opened.

use super::error::StaticFilesError;
use super::roots::{self, PackageLocator, PackageSpec, ResolvedEntry, Root};
use super::router::RequestContext;
use crate::http::{self, body, cache, date, mime, FileHeaders, StaticBody};
use crate::logger;
use hyper::{Response, StatusCode};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::{self, File};

const INDEX_FILE: &str = "index.html";
const NOT_FOUND_PAGE: &str = "404.html";

/// Construction options for [`StaticFiles`]
#[derive(Debug, Clone)]
pub struct StaticFilesOptions {
    /// Directory roots, searched first and in order
    pub directories: Vec<PathBuf>,
    /// Package roots, searched after the directories
    pub packages: Vec<PackageSpec>,
    /// Serve `index.html` for directories and `404.html` for misses
    pub html: bool,
    /// Verify directory roots exist when constructing
    pub check_dir: bool,
    /// Allow symlinks inside a root to point outside of it
    pub follow_symlink: bool,
    /// `Cache-Control` value attached to file responses
    pub cache_control: Option<String>,
}

impl Default for StaticFilesOptions {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            packages: Vec::new(),
            html: false,
            check_dir: true,
            follow_symlink: false,
            cache_control: None,
        }
    }
}

/// Static resource resolver over an ordered set of roots
#[derive(Debug)]
pub struct StaticFiles {
    roots: Vec<Root>,
    html: bool,
    follow_symlink: bool,
    cache_control: Option<String>,
    config_checked: AtomicBool,
}

impl StaticFiles {
    /// Build a resolver, failing fast on misconfiguration
    ///
    /// Package roots are located immediately. Directory roots are checked
    /// here only when `check_dir` is set; otherwise the first request does it.
    pub fn new(
        options: StaticFilesOptions,
        locator: &PackageLocator,
    ) -> Result<Self, StaticFilesError> {
        if options.check_dir {
            if let Some(dir) = options.directories.iter().find(|d| !d.is_dir()) {
                return Err(StaticFilesError::DirectoryNotFound(dir.clone()));
            }
        }

        let mut roots: Vec<Root> = options
            .directories
            .into_iter()
            .map(Root::Filesystem)
            .collect();
        for spec in &options.packages {
            roots.push(Root::packaged(spec, locator)?);
        }
        if roots.is_empty() {
            return Err(StaticFilesError::NotConfigured);
        }

        Ok(Self {
            roots,
            html: options.html,
            follow_symlink: options.follow_symlink,
            cache_control: options.cache_control,
            config_checked: AtomicBool::new(false),
        })
    }

    pub fn roots(&self) -> &[Root] {
        &self.roots
    }

    pub const fn html(&self) -> bool {
        self.html
    }

    /// Whether the lazy root check has already succeeded
    pub fn config_checked(&self) -> bool {
        self.config_checked.load(Ordering::Acquire)
    }

    /// Verify every root exists and is a directory
    ///
    /// Pure metadata reads: racing first requests may both run it.
    pub async fn check_config(&self) -> Result<(), StaticFilesError> {
        for root in &self.roots {
            let dir = root.directory();
            match fs::metadata(dir).await {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => return Err(StaticFilesError::NotADirectory(dir.to_path_buf())),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(StaticFilesError::DirectoryMissing(dir.to_path_buf()));
                }
                Err(source) => {
                    return Err(StaticFilesError::Io {
                        path: dir.to_path_buf(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }

    /// Serve one request
    ///
    /// Only misconfigured roots produce an `Err`; every per-request failure
    /// is already an HTTP response.
    pub async fn handle(
        &self,
        ctx: &RequestContext<'_>,
    ) -> Result<Response<StaticBody>, StaticFilesError> {
        if !self.config_checked() {
            self.check_config().await?;
            self.config_checked.store(true, Ordering::Release);
        }

        let path = self.get_path(&ctx.route_path);
        Ok(self.get_response(&path, ctx).await)
    }

    /// Relative filesystem path for a decoded route path
    pub fn get_path(&self, route_path: &str) -> PathBuf {
        roots::normalize_route_path(route_path)
    }

    /// First hit across roots, in configuration order
    pub async fn lookup_path(&self, path: &Path) -> io::Result<Option<ResolvedEntry>> {
        for root in &self.roots {
            if let Some(entry) = root.resolve(path, self.follow_symlink).await? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    pub async fn get_response(
        &self,
        path: &Path,
        ctx: &RequestContext<'_>,
    ) -> Response<StaticBody> {
        if !ctx.is_get_or_head() {
            logger::log_warning(&format!("Method not allowed: {}", ctx.method));
            return http::build_405_response();
        }

        let entry = match self.lookup_path(path).await {
            Ok(entry) => entry,
            Err(e) => return error_response(path, &e),
        };

        match entry {
            Some(entry) if entry.is_file() => return self.serve(&entry, ctx).await,
            Some(entry) if entry.is_dir() && self.html => {
                let index_path = path.join(INDEX_FILE);
                match self.lookup_path(&index_path).await {
                    Ok(Some(index)) if index.is_file() => {
                        if !ctx.path.ends_with('/') {
                            return http::build_redirect_response(&ctx.slash_redirect_target());
                        }
                        return self.serve(&index, ctx).await;
                    }
                    Ok(_) => {}
                    Err(e) => return error_response(&index_path, &e),
                }
            }
            _ => {}
        }

        self.not_found(ctx).await
    }

    /// 200 or 304 for a resolved file; a file gone since lookup is a miss
    async fn serve(&self, entry: &ResolvedEntry, ctx: &RequestContext<'_>) -> Response<StaticBody> {
        match self.file_response(entry, StatusCode::OK, ctx).await {
            Ok(resp) => resp,
            Err(e) if roots::is_missing(&e) => self.not_found(ctx).await,
            Err(e) => error_response(&entry.path, &e),
        }
    }

    /// Custom `404.html` in html mode, JSON 404 otherwise
    async fn not_found(&self, ctx: &RequestContext<'_>) -> Response<StaticBody> {
        if self.html {
            let page = Path::new(NOT_FOUND_PAGE);
            match self.lookup_path(page).await {
                Ok(Some(entry)) if entry.is_file() => {
                    return match self.file_response(&entry, StatusCode::NOT_FOUND, ctx).await {
                        Ok(resp) => resp,
                        Err(e) => error_response(&entry.path, &e),
                    };
                }
                Ok(_) => {}
                Err(e) => return error_response(page, &e),
            }
        }
        http::build_404_response()
    }

    /// Build the response for a file without reading it unless needed
    ///
    /// Errors only come from opening the file for a GET.
    async fn file_response(
        &self,
        entry: &ResolvedEntry,
        status: StatusCode,
        ctx: &RequestContext<'_>,
    ) -> io::Result<Response<StaticBody>> {
        let modified = entry.modified();
        let headers = FileHeaders {
            content_type: mime::guess_content_type(&entry.path),
            content_length: entry.size(),
            last_modified: date::format(modified),
            etag: cache::generate_etag(modified, entry.size()),
            cache_control: self.cache_control.as_deref(),
        };

        if status == StatusCode::OK
            && cache::is_not_modified(
                ctx.if_none_match.as_deref(),
                ctx.if_modified_since.as_deref(),
                &headers.etag,
                modified,
            )
        {
            return Ok(http::build_304_response(&headers));
        }

        if ctx.is_head() {
            return Ok(http::build_file_response(status, &headers, body::empty()));
        }

        let file = File::open(&entry.path).await?;
        Ok(http::build_file_response(
            status,
            &headers,
            body::file(file, headers.content_length),
        ))
    }
}

/// HTTP status for a filesystem error hit while serving
pub fn status_for_io_error(err: &io::Error) -> StatusCode {
    match err.kind() {
        ErrorKind::PermissionDenied => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::InvalidFilename => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(path: &Path, err: &io::Error) -> Response<StaticBody> {
    match status_for_io_error(err) {
        StatusCode::UNAUTHORIZED => {
            logger::log_warning(&format!("Permission denied for '{}': {err}", path.display()));
            http::build_401_response()
        }
        StatusCode::INTERNAL_SERVER_ERROR => {
            logger::log_error(&format!("Failed to serve '{}': {err}", path.display()));
            http::build_500_response()
        }
        status => http::build_error_response(status),
    }
}
