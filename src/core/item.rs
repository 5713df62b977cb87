//! Queue item definition: identity, source bytes and result artifacts.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::status::ItemStatus;
use crate::core::types::CompressionStats;
use crate::preview::PreviewHandle;
use crate::utils::FileKind;

/// Opaque identifier of a queue item.
///
/// Backed by a random v4 UUID so ids never collide within a queue's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw file as supplied by a picker or drop surface.
///
/// The bytes are immutable and shared, so handing a copy to a transform task
/// does not duplicate the content.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    declared_type: Option<String>,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        declared_type: Option<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type,
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared MIME type, if the surface reported one
    pub fn declared_type(&self) -> Option<&str> {
        self.declared_type.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Transformed bytes produced for one item.
#[derive(Debug, Clone)]
pub struct Artifact {
    bytes: Arc<[u8]>,
    kind: FileKind,
}

impl Artifact {
    pub fn new(bytes: impl Into<Arc<[u8]>>, kind: FileKind) -> Self {
        Self {
            bytes: bytes.into(),
            kind,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// One file's full record as it moves through the pipeline.
#[derive(Debug)]
pub struct QueueItem {
    id: ItemId,
    source: SourceFile,
    kind: FileKind,
    preview: Option<PreviewHandle>,
    pub(crate) status: ItemStatus,
}

impl QueueItem {
    pub(crate) fn new(source: SourceFile, kind: FileKind) -> Self {
        Self {
            id: ItemId::new(),
            source,
            kind,
            preview: None,
            status: ItemStatus::Pending,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn status(&self) -> &ItemStatus {
        &self.status
    }

    pub fn original_size(&self) -> u64 {
        self.source.size()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    /// The transformed artifact; present only when the item is `Done`.
    pub fn result(&self) -> Option<&Artifact> {
        self.status.output()
    }

    pub fn result_size(&self) -> Option<u64> {
        self.result().map(Artifact::size)
    }

    /// Size statistics, present only when the item is `Done`.
    pub fn stats(&self) -> Option<CompressionStats> {
        self.result_size()
            .map(|size| CompressionStats::new(self.original_size(), size))
    }

    pub(crate) fn attach_preview(&mut self, handle: PreviewHandle) {
        debug_assert!(self.preview.is_none(), "item already owns a preview");
        self.preview = Some(handle);
    }

    /// Detaches the preview so it can be released; a second call yields `None`.
    pub(crate) fn take_preview(&mut self) -> Option<PreviewHandle> {
        self.preview.take()
    }
}
