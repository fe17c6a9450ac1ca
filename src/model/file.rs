use crate::error::{Error, ErrorType, IntoResult};
use crate::{utils, Result};
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::Arc;

/// The kinds of transaction export that the server knows how to ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Xlsx,
    Json,
}

impl FileKind {
    /// Determines the kind from a file name's extension, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(FileKind::Csv),
            "xlsx" => Some(FileKind::Xlsx),
            "json" => Some(FileKind::Json),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileKind::Csv => "text/csv",
            FileKind::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            FileKind::Json => "application/json",
        }
    }
}

/// A selected transaction file, held in memory until it is uploaded. The contents are opaque to
/// the client; only the extension is checked.
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle {
    name: String,
    kind: FileKind,
    bytes: Arc<[u8]>,
}

impl FileHandle {
    /// Creates a handle from bytes already in memory.
    ///
    /// # Errors
    /// A `Validation` error if `name` does not end in `.csv`, `.xlsx` or `.json`.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let name = name.into();
        let kind = FileKind::from_name(&name).ok_or_else(|| {
            Error::validation(format!(
                "'{name}' is not a supported file type, expected .csv, .xlsx or .json"
            ))
        })?;
        Ok(Self {
            name,
            kind,
            bytes: Arc::from(bytes.into()),
        })
    }

    /// Reads the file at `path` into memory.
    pub async fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::validation(format!("'{}' is not a file", path.display())))?;
        // Check the extension before reading a possibly large file for nothing.
        if FileKind::from_name(&name).is_none() {
            return Self::from_bytes(name, Vec::new());
        }
        let bytes = utils::read_bytes(path).await.pub_result(ErrorType::Io)?;
        Self::from_bytes(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Debug for FileHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}
