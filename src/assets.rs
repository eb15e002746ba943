//! Static content collaborator.
//!
//! The router only asks two questions of it: "is there an asset at this
//! path?" and "give me its payload". Everything else, path traversal and
//! hidden-file policy included, lives behind [`StaticResolver`].

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::payload::{ContentType, Payload};

/// Resolves request paths to static assets.
///
/// `locate` decides whether the static route matches at all, for any method,
/// so a `POST` to a servable file is answered `405` rather than `404`.
/// Both methods may block; they run on the dispatching task.
pub trait StaticResolver: Send + Sync + 'static {
    /// Returns the asset that would be served for `path`, if any.
    fn locate(&self, path: &str) -> Option<PathBuf>;

    /// Reads a located asset.
    fn load(&self, asset: &Path) -> io::Result<Payload>;
}

/// Serves files from a directory.
///
/// - `/` and directories serve their `index.html`
/// - `/name` falls back to `/name.html`
/// - `..`, and any segment starting with `.` or `_`, never resolve
pub struct StaticDir {
    root: PathBuf,
}

impl StaticDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(name) => {
                    let name_str = name.to_str()?;
                    if name_str.starts_with('.') || name_str.starts_with('_') {
                        return None;
                    }
                    path.push(name);
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(path)
    }
}

impl StaticResolver for StaticDir {
    fn locate(&self, path: &str) -> Option<PathBuf> {
        let file = self.map_path(path)?;

        if file.is_dir() {
            let index = file.join("index.html");
            return index.is_file().then_some(index);
        }
        if file.is_file() {
            return Some(file);
        }
        if file.extension().is_none() {
            let html = file.with_extension("html");
            return html.is_file().then_some(html);
        }
        None
    }

    fn load(&self, asset: &Path) -> io::Result<Payload> {
        let bytes = fs::read(asset)?;
        let content_type = asset.extension()
            .and_then(|ext| ext.to_str())
            .map_or(ContentType::OctetStream, ContentType::from_extension);
        Ok(Payload::new(content_type.as_str(), bytes))
    }
}
