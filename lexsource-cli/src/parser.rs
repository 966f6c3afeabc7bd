//! A structural no-op parser: wraps the fetched bytes into a `Document`
//! without attempting any source-specific extraction. Real per-source
//! parsers live outside this crate; this one exists only so `run` has
//! something to hand the Persistence actor.

use async_trait::async_trait;
use bytes::Bytes;

use lexsource_config::SourceId;
use lexsource_core::collaborators::{ParseResult, Parser};
use lexsource_core::Document;

pub struct PassthroughParser;

#[async_trait]
impl Parser for PassthroughParser {
    async fn parse(&self, bytes: Bytes, _content_type: &str, url: &str) -> ParseResult {
        let document = Document {
            id: url.to_string(),
            source_id: SourceId::NationalGazette,
            external_id: url.to_string(),
            title: url.to_string(),
            publication_date: None,
            category: None,
            scope: None,
            status: None,
            articles: vec![format!("{} bytes fetched", bytes.len())],
            reforms: vec![],
            raw_blob_ref: None,
        };
        ParseResult {
            document: Some(document),
            extra_refs: vec![],
            errors: vec![],
        }
    }
}
