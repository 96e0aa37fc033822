//! In-process tag repository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use scholia_core::{Error, Result, Tag, TagCategory, TagRepository};

/// Tag repository backed by a vector; names are unique.
#[derive(Debug, Default)]
pub struct InMemoryTagRepository {
    tags: RwLock<Vec<Tag>>,
}

impl InMemoryTagRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(tags: Vec<Tag>) -> Self {
        Self {
            tags: RwLock::new(tags),
        }
    }

    /// Snapshot of every stored tag, in insertion order.
    pub async fn all(&self) -> Vec<Tag> {
        self.tags.read().await.clone()
    }
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn list_by_category(&self, category: TagCategory) -> Result<Vec<Tag>> {
        let tags = self.tags.read().await;
        Ok(tags.iter().filter(|t| t.category == category).cloned().collect())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tags = self.tags.read().await;
        Ok(tags.iter().find(|t| t.name == name).cloned())
    }

    async fn create(&self, tag: Tag) -> Result<Tag> {
        let mut tags = self.tags.write().await;
        if tags.iter().any(|t| t.name == tag.name) {
            return Err(Error::InvalidInput(format!("tag already exists: {}", tag.name)));
        }
        tags.push(tag.clone());
        Ok(tag)
    }
}
