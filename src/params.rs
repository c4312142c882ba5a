//! Raw request parameters.
//!
//! A [`ParameterSet`] carries the textual and file-backed values extracted
//! from a request before any coercion happens. Names are not unique: query
//! strings and form bodies may repeat a name, and the values for one name
//! keep their arrival order. Uploaded content arrives as a [`FileHandle`]
//! over a temporary file that is removed when the last handle drops, which
//! bounds upload lifetime to the dispatch that received it.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tempfile::{NamedTempFile, TempPath};
use url::Url;

/// Shared handle to request-scoped temporary file content.
///
/// Cloning shares the underlying file; the file is deleted when the final
/// clone drops.
#[derive(Clone)]
pub struct FileHandle {
    inner: Arc<TempPath>,
}

impl FileHandle {
    #[must_use]
    pub fn new(path: TempPath) -> Self {
        FileHandle {
            inner: Arc::new(path),
        }
    }

    /// Detaches the file from its open handle and takes ownership of the
    /// path, keeping deletion-on-drop.
    #[must_use]
    pub fn from_file(file: NamedTempFile) -> Self {
        FileHandle::new(file.into_temp_path())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner
    }

    /// `file://` locator for the underlying path, when the path is
    /// absolute.
    #[must_use]
    pub fn locator(&self) -> Option<Url> {
        Url::from_file_path(self.path()).ok()
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FileHandle").field(&self.path()).finish()
    }
}

/// One supplied value, before coercion.
#[derive(Debug, Clone)]
pub enum RawValue {
    Text(String),
    File(FileHandle),
}

impl RawValue {
    /// Textual rendition used by scalar coercion. File values render as
    /// their path string, not their content.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RawValue::Text(s) => Cow::Borrowed(s),
            RawValue::File(handle) => handle.path().to_string_lossy(),
        }
    }

    #[must_use]
    pub fn as_file(&self) -> Option<&FileHandle> {
        match self {
            RawValue::File(handle) => Some(handle),
            RawValue::Text(_) => None,
        }
    }
}

/// Multimap of raw request parameters keyed by name.
#[derive(Debug, Default)]
pub struct ParameterSet {
    values: HashMap<String, Vec<RawValue>>,
}

impl ParameterSet {
    #[must_use]
    pub fn new() -> Self {
        ParameterSet::default()
    }

    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values
            .entry(name.into())
            .or_default()
            .push(RawValue::Text(value.into()));
    }

    pub fn insert_file(&mut self, name: impl Into<String>, file: FileHandle) {
        self.values
            .entry(name.into())
            .or_default()
            .push(RawValue::File(file));
    }

    /// All values supplied under `name`, in arrival order.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[RawValue]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
