//! Ingestion boundary: raw files in, queue items out.

use tracing::{debug, warn};

use crate::core::{AdmissionPolicy, QueueItem, SourceFile};
use crate::preview::PreviewRegistry;
use crate::utils::{FileKind, Rejection, RejectionReason, resolve_kind};

/// Outcome of one drop or pick action.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// New items, in arrival order
    pub items: Vec<QueueItem>,
    /// Files kept out of the queue
    pub rejected: Vec<Rejection>,
}

/// Filters raw files against a tool's accepted kinds and admission limits.
pub struct FileIngestor<'a> {
    accepted: &'a [FileKind],
    policy: &'a AdmissionPolicy,
}

impl<'a> FileIngestor<'a> {
    pub fn new(accepted: &'a [FileKind], policy: &'a AdmissionPolicy) -> Self {
        Self { accepted, policy }
    }

    /// Builds queue items for the accepted files.
    ///
    /// `queued_items` and `queued_bytes` describe what the queue already holds
    /// so the admission limits cover the queue as a whole. Previewable items
    /// get their preview handle allocated here.
    pub fn ingest(
        &self,
        files: Vec<SourceFile>,
        queued_items: usize,
        queued_bytes: u64,
        previews: &PreviewRegistry,
    ) -> IngestReport {
        let mut report = IngestReport::default();
        let mut count = queued_items;
        let mut bytes = queued_bytes;

        for file in files {
            let kind = match self.classify(&file) {
                Ok(kind) => kind,
                Err(reason) => {
                    report.rejected.push(reject(&file, reason));
                    continue;
                }
            };

            if let Err(reason) = self.admit(count, bytes, file.size()) {
                report.rejected.push(reject(&file, reason));
                continue;
            }

            let mut item = QueueItem::new(file, kind);
            if kind.is_previewable() {
                match previews.allocate(item.id(), item.source()) {
                    Ok(handle) => item.attach_preview(handle),
                    // A fresh id cannot already own a preview
                    Err(e) => warn!("Preview allocation failed for '{}': {}", item.name(), e),
                }
            }

            count += 1;
            bytes += item.original_size();
            debug!("Accepted '{}' as {}", item.name(), kind);
            report.items.push(item);
        }

        report
    }

    fn classify(&self, file: &SourceFile) -> Result<FileKind, RejectionReason> {
        let declared_kind = file.declared_type().and_then(FileKind::from_mime);
        let extension_kind = crate::utils::kind_from_extension(file.name()).ok();

        // Either signal may qualify the file, the way a browser accept list works
        [declared_kind, extension_kind]
            .into_iter()
            .flatten()
            .find(|kind| self.accepted.contains(kind))
            .ok_or_else(|| RejectionReason::UnsupportedType {
                declared: resolve_kind(file.name(), file.declared_type())
                    .map(|kind| kind.mime().to_string())
                    .or_else(|| file.declared_type().map(str::to_string))
                    .unwrap_or_else(|| "unknown".to_string()),
            })
    }

    fn admit(&self, count: usize, bytes: u64, size: u64) -> Result<(), RejectionReason> {
        if let Some(max) = self.policy.max_items {
            if count >= max {
                return Err(RejectionReason::ItemLimit { max });
            }
        }
        if let Some(max) = self.policy.max_total_bytes {
            if bytes.saturating_add(size) > max {
                return Err(RejectionReason::ByteLimit { size, max });
            }
        }
        Ok(())
    }
}

fn reject(file: &SourceFile, reason: RejectionReason) -> Rejection {
    debug!("Rejected '{}': {}", file.name(), reason);
    Rejection {
        name: file.name().to_string(),
        reason,
    }
}
