use async_trait::async_trait;
use bytes::Bytes;

use crate::model::{Document, Reference};

/// Outcome of a parser's structural extraction (§6 Parser collaborator).
#[derive(Clone, Debug, Default)]
pub struct ParseResult {
    pub document: Option<Document>,
    /// References the parser found besides the main document (e.g. PDF
    /// links embedded in an HTML index entry). Only acted upon by the Fetch
    /// Worker when `download_payloads = true` (§4.4 step 4).
    pub extra_refs: Vec<Reference>,
    /// Non-fatal problems (e.g. a scanned-only PDF that could not be
    /// OCR'd) returned as data, never raised (§6, §9 PDF extraction
    /// failure modes).
    pub errors: Vec<String>,
}

/// Per-source structural extraction (§6). Implementations are deterministic
/// and perform no I/O; replacing a source's parser never touches the
/// runtime (§9 Open Questions — "parsers are replaceable").
#[async_trait]
pub trait Parser: Send + Sync {
    async fn parse(&self, bytes: Bytes, content_type: &str, url: &str) -> ParseResult;
}
