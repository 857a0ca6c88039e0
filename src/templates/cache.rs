//! Compiled template cache keyed by target language and template name.
//!
//! The cache is an explicit object: a renderer receives it through an `Arc`, so
//! separate generation runs can share one cache or keep their own.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::language::Language;

use super::renderer::CompiledTemplate;

type CacheKey = (Language, String);

/// Size and contents of a [`TemplateCache`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    /// Cached keys as `<language>/<name>`, sorted
    pub templates: Vec<String>,
}

#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<CacheKey, Arc<CompiledTemplate>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, language: Language, name: &str) -> Option<Arc<CompiledTemplate>> {
        let entries = self.entries.read().await;
        entries.get(&(language, name.to_string())).cloned()
    }

    /// Insert a compiled template. If another task cached the same key first,
    /// the existing entry wins and is returned.
    pub async fn insert(
        &self,
        language: Language,
        name: &str,
        template: CompiledTemplate,
    ) -> Arc<CompiledTemplate> {
        let mut entries = self.entries.write().await;
        entries
            .entry((language, name.to_string()))
            .or_insert_with(|| Arc::new(template))
            .clone()
    }

    pub async fn contains(&self, language: Language, name: &str) -> bool {
        self.entries
            .read()
            .await
            .contains_key(&(language, name.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every compiled template. Must not be called while a run is rendering.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        debug!(evicted = entries.len(), "Clearing template cache");
        entries.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let mut templates: Vec<String> = entries
            .keys()
            .map(|(language, name)| format!("{language}/{name}"))
            .collect();
        templates.sort();
        CacheStats {
            size: entries.len(),
            templates,
        }
    }
}
