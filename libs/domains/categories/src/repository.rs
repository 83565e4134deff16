use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{Category, CategoryFilter, CategoryMetric};

/// Repository trait for Category persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: Category) -> CategoryResult<Category>;

    async fn get_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>>;

    /// Exact match, case-insensitive
    async fn get_by_name(&self, name: &str) -> CategoryResult<Option<Category>>;

    /// Names containing `fragment`, case-insensitive
    async fn search_by_name(&self, fragment: &str) -> CategoryResult<Vec<Category>>;

    /// Every category, ordered by name
    async fn list_all(&self) -> CategoryResult<Vec<Category>>;

    async fn list(&self, filter: CategoryFilter) -> CategoryResult<Vec<Category>>;

    async fn list_children(&self, parent_id: Uuid) -> CategoryResult<Vec<Category>>;

    async fn list_roots(&self) -> CategoryResult<Vec<Category>>;

    /// Categories nothing points to as parent
    async fn list_leaves(&self) -> CategoryResult<Vec<Category>>;

    async fn update(&self, category: Category) -> CategoryResult<Category>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: Uuid) -> CategoryResult<bool>;

    async fn exists(&self, id: Uuid) -> CategoryResult<bool>;
}

/// Per-category product aggregates.
///
/// Implemented over the product store. Only non-deleted products count, and
/// categories without such products are absent from the result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryMetricSource: Send + Sync {
    async fn category_totals(&self, metric: CategoryMetric) -> CategoryResult<Vec<(Uuid, i64)>>;
}

/// In-memory implementation of CategoryRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryCategoryRepository {
    categories: Arc<RwLock<HashMap<Uuid, Category>>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self {
            categories: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

fn by_name(mut categories: Vec<Category>) -> Vec<Category> {
    categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    categories
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn create(&self, category: Category) -> CategoryResult<Category> {
        let mut categories = self.categories.write().await;

        if categories
            .values()
            .any(|c| c.name.eq_ignore_ascii_case(&category.name))
        {
            return Err(CategoryError::DuplicateName(category.name));
        }

        categories.insert(category.id, category.clone());

        tracing::info!(category_id = %category.id, name = %category.name, "Created category");
        Ok(category)
    }

    async fn get_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>> {
        let categories = self.categories.read().await;
        Ok(categories.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> CategoryResult<Option<Category>> {
        let categories = self.categories.read().await;
        Ok(categories
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    async fn search_by_name(&self, fragment: &str) -> CategoryResult<Vec<Category>> {
        let needle = fragment.trim().to_lowercase();
        let categories = self.categories.read().await;
        Ok(by_name(
            categories
                .values()
                .filter(|c| c.name.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
        ))
    }

    async fn list_all(&self) -> CategoryResult<Vec<Category>> {
        let categories = self.categories.read().await;
        Ok(by_name(categories.values().cloned().collect()))
    }

    async fn list(&self, filter: CategoryFilter) -> CategoryResult<Vec<Category>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn list_children(&self, parent_id: Uuid) -> CategoryResult<Vec<Category>> {
        let categories = self.categories.read().await;
        Ok(by_name(
            categories
                .values()
                .filter(|c| c.parent_id == Some(parent_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_roots(&self) -> CategoryResult<Vec<Category>> {
        let categories = self.categories.read().await;
        Ok(by_name(
            categories
                .values()
                .filter(|c| c.parent_id.is_none())
                .cloned()
                .collect(),
        ))
    }

    async fn list_leaves(&self) -> CategoryResult<Vec<Category>> {
        let categories = self.categories.read().await;
        Ok(by_name(
            categories
                .values()
                .filter(|c| !categories.values().any(|child| child.parent_id == Some(c.id)))
                .cloned()
                .collect(),
        ))
    }

    async fn update(&self, category: Category) -> CategoryResult<Category> {
        let mut categories = self.categories.write().await;

        if !categories.contains_key(&category.id) {
            return Err(CategoryError::NotFound);
        }

        let name_taken = categories
            .values()
            .any(|c| c.id != category.id && c.name.eq_ignore_ascii_case(&category.name));
        if name_taken {
            return Err(CategoryError::DuplicateName(category.name));
        }

        categories.insert(category.id, category.clone());

        tracing::debug!(category_id = %category.id, "Updated category");
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> CategoryResult<bool> {
        let mut categories = self.categories.write().await;
        Ok(categories.remove(&id).is_some())
    }

    async fn exists(&self, id: Uuid) -> CategoryResult<bool> {
        let categories = self.categories.read().await;
        Ok(categories.contains_key(&id))
    }
}
