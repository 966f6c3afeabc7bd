//! Flat-file index adapter used in place of a concrete source adapter
//! (out of scope, §1): reads a JSON array of references once and serves it
//! as a single page, so `run` has something concrete for Discovery to drive.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use lexsource_config::{JobConfig, SourceId};
use lexsource_core::collaborators::{IndexAdapter, IndexPage};
use lexsource_core::{CollaboratorError, IndexAdapterFactory, Reference};

#[derive(Deserialize)]
struct RawReference {
    external_id: String,
    url: String,
    #[serde(default)]
    title: Option<String>,
}

pub async fn load_references(path: &Path) -> anyhow::Result<Vec<Reference>> {
    let bytes = tokio::fs::read(path).await?;
    let raw: Vec<RawReference> = serde_json::from_slice(&bytes)?;
    Ok(raw
        .into_iter()
        .map(|r| Reference {
            source_id: SourceId::NationalGazette,
            external_id: r.external_id,
            url: r.url,
            title: r.title,
            opaque_metadata: BTreeMap::new(),
        })
        .collect())
}

struct StaticReferenceIndex {
    remaining: Option<Vec<Reference>>,
}

#[async_trait]
impl IndexAdapter for StaticReferenceIndex {
    async fn next_page(&mut self) -> Result<Option<IndexPage>, CollaboratorError> {
        match self.remaining.take() {
            Some(candidates) => Ok(Some(IndexPage { candidates })),
            None => Ok(None),
        }
    }
}

pub struct StaticReferenceIndexFactory {
    references: Mutex<Vec<Reference>>,
}

impl StaticReferenceIndexFactory {
    pub fn new(references: Vec<Reference>) -> Self {
        StaticReferenceIndexFactory {
            references: Mutex::new(references),
        }
    }
}

impl IndexAdapterFactory for StaticReferenceIndexFactory {
    fn create(&self, _config: &JobConfig) -> Box<dyn IndexAdapter> {
        let references = self.references.lock().unwrap().clone();
        Box::new(StaticReferenceIndex { remaining: Some(references) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexsource_config::DiscoveryMode;

    #[tokio::test]
    async fn load_references_parses_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refs.json");
        tokio::fs::write(
            &path,
            r#"[{"external_id": "a", "url": "https://example.test/a", "title": "A"},
               {"external_id": "b", "url": "https://example.test/b"}]"#,
        )
        .await
        .unwrap();

        let references = load_references(&path).await.unwrap();
        assert_eq!(references.len(), 2);
        assert_eq!(references[0].external_id, "a");
        assert_eq!(references[0].title.as_deref(), Some("A"));
        assert_eq!(references[1].title, None);
    }

    #[tokio::test]
    async fn adapter_serves_exactly_one_page_then_exhausts() {
        let references = vec![Reference {
            source_id: SourceId::NationalGazette,
            external_id: "a".to_string(),
            url: "https://example.test/a".to_string(),
            title: None,
            opaque_metadata: BTreeMap::new(),
        }];
        let factory = StaticReferenceIndexFactory::new(references.clone());
        let config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
        let mut adapter = factory.create(&config);

        let first = adapter.next_page().await.unwrap().unwrap();
        assert_eq!(first.candidates.len(), 1);
        assert!(adapter.next_page().await.unwrap().is_none());
    }
}
