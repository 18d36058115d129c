//! Static roots
//!
//! A root is a directory searched for static content: either a plain
//! filesystem directory or a directory shipped inside a package. Both kinds
//! resolve request paths the same way and refuse to hand out anything that
//! lies outside of them.

use super::error::StaticFilesError;
use crate::logger;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::Metadata;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

/// Sub-directory served from a package when none is given
pub const DEFAULT_PACKAGE_SUBPATH: &str = "statics";

/// A package root as written in configuration: `"name"` or `{ name, path }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PackageSpec {
    Name(String),
    WithPath { name: String, path: String },
}

impl PackageSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::WithPath { name, .. } => name,
        }
    }

    pub fn subpath(&self) -> &str {
        match self {
            Self::Name(_) => DEFAULT_PACKAGE_SUBPATH,
            Self::WithPath { path, .. } => path,
        }
    }
}

impl From<&str> for PackageSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<(&str, &str)> for PackageSpec {
    fn from((name, path): (&str, &str)) -> Self {
        Self::WithPath {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

/// Finds the installed location of a package
///
/// Explicit locations win; otherwise each search path is tried in order for
/// a directory named after the package (`a.b` maps to `a/b`).
#[derive(Debug, Clone, Default)]
pub struct PackageLocator {
    search_paths: Vec<PathBuf>,
    locations: HashMap<String, PathBuf>,
}

impl PackageLocator {
    pub const fn new(search_paths: Vec<PathBuf>, locations: HashMap<String, PathBuf>) -> Self {
        Self {
            search_paths,
            locations,
        }
    }

    pub fn locate(&self, package: &str) -> Option<PathBuf> {
        if let Some(dir) = self.locations.get(package) {
            return Some(dir.clone());
        }

        let valid = package
            .split('.')
            .all(|s| !s.is_empty() && s != ".." && !s.contains(['/', '\\']));
        if !valid {
            return None;
        }

        let relative: PathBuf = package.split('.').collect();
        self.search_paths
            .iter()
            .map(|base| base.join(&relative))
            .find(|candidate| candidate.is_dir())
    }
}

/// A resolved filesystem entry, recomputed for every request
#[derive(Debug)]
pub struct ResolvedEntry {
    pub path: PathBuf,
    pub metadata: Metadata,
}

impl ResolvedEntry {
    pub fn is_file(&self) -> bool {
        self.metadata.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    pub fn size(&self) -> u64 {
        self.metadata.len()
    }

    pub fn modified(&self) -> SystemTime {
        self.metadata.modified().unwrap_or(UNIX_EPOCH)
    }
}

#[derive(Debug, Clone)]
pub enum Root {
    Filesystem(PathBuf),
    Packaged {
        package: String,
        subpath: String,
        directory: PathBuf,
    },
}

impl Root {
    /// Resolve a package root to its on-disk directory
    pub fn packaged(
        spec: &PackageSpec,
        locator: &PackageLocator,
    ) -> Result<Self, StaticFilesError> {
        let package = spec.name();
        let base = locator
            .locate(package)
            .ok_or_else(|| StaticFilesError::PackageNotFound(package.to_string()))?;
        let directory = normalize_lexically(&base.join(spec.subpath()));
        if !directory.is_dir() {
            return Err(StaticFilesError::PackageDirectoryNotFound {
                package: package.to_string(),
                subpath: spec.subpath().to_string(),
            });
        }

        Ok(Self::Packaged {
            package: package.to_string(),
            subpath: spec.subpath().to_string(),
            directory,
        })
    }

    pub fn directory(&self) -> &Path {
        match self {
            Self::Filesystem(dir) | Self::Packaged { directory: dir, .. } => dir,
        }
    }

    /// Look up `path` below this root
    ///
    /// `Ok(None)` covers both "no such file" and "outside this root".
    /// Any other filesystem failure is returned to the caller.
    pub async fn resolve(
        &self,
        path: &Path,
        follow_symlink: bool,
    ) -> io::Result<Option<ResolvedEntry>> {
        let root = self.directory();

        let (base, full) = if follow_symlink {
            let base = normalize_lexically(&std::path::absolute(root)?);
            let full = normalize_lexically(&base.join(path));
            (base, full)
        } else {
            let Ok(base) = fs::canonicalize(root).await else {
                return Ok(None);
            };
            let full = match fs::canonicalize(base.join(path)).await {
                Ok(p) => p,
                Err(e) if is_missing(&e) => return Ok(None),
                Err(e) => return Err(e),
            };
            (base, full)
        };

        if !full.starts_with(&base) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                path.display(),
                full.display()
            ));
            return Ok(None);
        }

        match fs::metadata(&full).await {
            Ok(metadata) => Ok(Some(ResolvedEntry {
                path: full,
                metadata,
            })),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filesystem(dir) => write!(f, "{}", dir.display()),
            Self::Packaged {
                package,
                subpath,
                directory,
            } => write!(f, "{package}:{subpath} ({})", directory.display()),
        }
    }
}

/// Errors meaning "nothing here", as opposed to "something went wrong"
///
/// `InvalidInput` is what the OS layer reports for names with a NUL byte,
/// which can never exist on disk.
pub fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::InvalidInput
    )
}

/// Turn a decoded route path into a relative filesystem path
///
/// Empty and `.` segments vanish and `..` cancels the previous segment.
/// Leading `..` segments are kept on purpose: root lookup rejects them.
pub fn normalize_route_path(route_path: &str) -> PathBuf {
    let mut parts: Vec<&str> = Vec::new();
    for segment in route_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }

    if parts.is_empty() {
        PathBuf::from(".")
    } else {
        parts.iter().collect()
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_route_path() {
        assert_eq!(normalize_route_path("/"), PathBuf::from("."));
        assert_eq!(normalize_route_path(""), PathBuf::from("."));
        assert_eq!(
            normalize_route_path("/css//site.css"),
            PathBuf::from("css/site.css")
        );
        assert_eq!(
            normalize_route_path("/a/./b/../c.txt"),
            PathBuf::from("a/c.txt")
        );
        assert_eq!(
            normalize_route_path("/../example.txt"),
            PathBuf::from("../example.txt")
        );
        assert_eq!(normalize_route_path("/a/../../x"), PathBuf::from("../x"));
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/srv/www/./a/../b")),
            PathBuf::from("/srv/www/b")
        );
        assert_eq!(
            normalize_lexically(Path::new("/srv/www/../../../etc")),
            PathBuf::from("/etc")
        );
    }

    #[test]
    fn test_package_spec_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            packages: Vec<PackageSpec>,
        }
        let parsed: Wrapper =
            toml::from_str(r#"packages = ["assets", { name = "docs", path = "public" }]"#)
                .unwrap();
        assert_eq!(parsed.packages[0], PackageSpec::from("assets"));
        assert_eq!(parsed.packages[0].subpath(), DEFAULT_PACKAGE_SUBPATH);
        assert_eq!(parsed.packages[1], PackageSpec::from(("docs", "public")));
        assert_eq!(parsed.packages[1].subpath(), "public");
    }

    #[test]
    fn test_locator_search_paths() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("vendor/site/assets")).unwrap();

        let locator = PackageLocator::new(vec![tmp.path().join("vendor")], HashMap::new());
        assert_eq!(
            locator.locate("site.assets"),
            Some(tmp.path().join("vendor/site/assets"))
        );
        assert_eq!(locator.locate("missing"), None);
        assert_eq!(locator.locate("site..assets"), None);
        assert_eq!(locator.locate("../vendor"), None);
    }

    #[test]
    fn test_locator_explicit_location_wins() {
        let mut locations = HashMap::new();
        locations.insert("site".to_string(), PathBuf::from("/opt/site"));
        let locator = PackageLocator::new(vec![PathBuf::from("/nowhere")], locations);
        assert_eq!(locator.locate("site"), Some(PathBuf::from("/opt/site")));
    }

    #[test]
    fn test_packaged_root_errors() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("site")).unwrap();
        let locator = PackageLocator::new(vec![tmp.path().to_path_buf()], HashMap::new());

        let err = Root::packaged(&PackageSpec::from("nope"), &locator).unwrap_err();
        assert!(matches!(err, StaticFilesError::PackageNotFound(_)));

        let err = Root::packaged(&PackageSpec::from("site"), &locator).unwrap_err();
        assert!(matches!(
            err,
            StaticFilesError::PackageDirectoryNotFound { .. }
        ));

        std::fs::create_dir_all(tmp.path().join("site/statics")).unwrap();
        let root = Root::packaged(&PackageSpec::from("site"), &locator).unwrap();
        assert_eq!(root.directory(), tmp.path().join("site/statics"));
    }

    #[tokio::test]
    async fn test_resolve_rejects_escape() {
        let tmp = tempfile::tempdir().unwrap();
        let inner = tmp.path().join("inner");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(tmp.path().join("secret.txt"), "outside").unwrap();
        std::fs::write(inner.join("ok.txt"), "inside").unwrap();

        let root = Root::Filesystem(inner);
        for follow in [false, true] {
            let hit = root.resolve(Path::new("ok.txt"), follow).await.unwrap();
            assert!(hit.is_some_and(|e| e.is_file() && e.size() == 6));

            let escaped = root
                .resolve(Path::new("../secret.txt"), follow)
                .await
                .unwrap();
            assert!(escaped.is_none());
        }
    }

    #[tokio::test]
    async fn test_resolve_missing_and_file_as_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("example.txt"), "x").unwrap();
        let root = Root::Filesystem(tmp.path().to_path_buf());

        let missing = root.resolve(Path::new("nope.txt"), false).await.unwrap();
        assert!(missing.is_none());

        let file_as_dir = root
            .resolve(Path::new("example.txt/foo"), false)
            .await
            .unwrap();
        assert!(file_as_dir.is_none());
    }

    #[tokio::test]
    async fn test_resolve_nul_byte_is_a_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Root::Filesystem(tmp.path().to_path_buf());
        for follow in [false, true] {
            let hit = root.resolve(Path::new("a\0b"), follow).await.unwrap();
            assert!(hit.is_none());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root_dir = tmp.path().join("root");
        std::fs::create_dir(&root_dir).unwrap();
        std::fs::write(tmp.path().join("shared.txt"), "shared").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("shared.txt"), root_dir.join("link.txt"))
            .unwrap();

        let root = Root::Filesystem(root_dir);
        let strict = root.resolve(Path::new("link.txt"), false).await.unwrap();
        assert!(strict.is_none());

        let relaxed = root.resolve(Path::new("link.txt"), true).await.unwrap();
        assert!(relaxed.is_some_and(|e| e.is_file()));
    }
}
