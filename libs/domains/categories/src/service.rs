use chrono::Utc;
use imaging::{ImageProcessor, UploadedFile};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{
    Category, CategoryFilter, CategoryMetric, CategoryMetricTotal, CategoryNode, CreateCategory,
    UpdateCategory,
};
use crate::repository::{CategoryMetricSource, CategoryRepository};

/// Category service
#[derive(Clone)]
pub struct CategoryService<R: CategoryRepository> {
    repository: Arc<R>,
    images: ImageProcessor,
    metrics: Option<Arc<dyn CategoryMetricSource>>,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repository: R, images: ImageProcessor) -> Self {
        Self {
            repository: Arc::new(repository),
            images,
            metrics: None,
        }
    }

    /// Enables [`Self::sorted_by_metric`].
    pub fn with_metrics(mut self, metrics: Arc<dyn CategoryMetricSource>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Shared handle for domains that check category existence.
    pub fn repository(&self) -> Arc<R> {
        self.repository.clone()
    }

    pub async fn get_category(&self, id: Uuid) -> CategoryResult<Category> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound)
    }

    pub async fn find_by_name(&self, fragment: &str) -> CategoryResult<Vec<Category>> {
        self.repository.search_by_name(fragment).await
    }

    pub async fn list_all(&self) -> CategoryResult<Vec<Category>> {
        self.repository.list_all().await
    }

    pub async fn list_categories(&self, filter: CategoryFilter) -> CategoryResult<Vec<Category>> {
        self.repository.list(filter).await
    }

    pub async fn subcategories(&self, id: Uuid) -> CategoryResult<Vec<Category>> {
        if !self.repository.exists(id).await? {
            return Err(CategoryError::NotFound);
        }
        self.repository.list_children(id).await
    }

    /// Categories without a parent
    pub async fn parent_categories(&self) -> CategoryResult<Vec<Category>> {
        self.repository.list_roots().await
    }

    /// Categories without children
    pub async fn leaf_categories(&self) -> CategoryResult<Vec<Category>> {
        self.repository.list_leaves().await
    }

    pub async fn exists(&self, id: Uuid) -> CategoryResult<bool> {
        self.repository.exists(id).await
    }

    /// The whole forest, children ordered by name.
    pub async fn tree(&self) -> CategoryResult<Vec<CategoryNode>> {
        let all = self.repository.list_all().await?;

        let mut children: HashMap<Uuid, Vec<&Category>> = HashMap::new();
        for category in &all {
            if let Some(parent_id) = category.parent_id {
                children.entry(parent_id).or_default().push(category);
            }
        }

        Ok(all
            .iter()
            .filter(|c| c.parent_id.is_none())
            .map(|root| build_node(root, &children))
            .collect())
    }

    pub async fn create_category(&self, input: CreateCategory) -> CategoryResult<Category> {
        input
            .validate()
            .map_err(|e| CategoryError::Validation(e.to_string()))?;

        let name = input.name.trim().to_string();
        if self.repository.get_by_name(&name).await?.is_some() {
            tracing::warn!(name = %name, "Rejected duplicate category name");
            return Err(CategoryError::DuplicateName(name));
        }

        if let Some(parent_id) = input.parent_id {
            if !self.repository.exists(parent_id).await? {
                return Err(CategoryError::ParentNotFound);
            }
        }

        let mut category = Category::new(name, input.description, input.parent_id);
        if let Some(image) = input.image {
            let file = UploadedFile::from_base64(&category.name, &image.content_type, &image.content)?;
            let processed = self.images.process_without_thumbnail(file).await?;
            category.image_content = Some(processed.content);
            category.image_content_type = Some(processed.content_type);
        }
        let created = self.repository.create(category).await?;

        tracing::info!(category_id = %created.id, "Created category");
        Ok(created)
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        input: UpdateCategory,
    ) -> CategoryResult<Category> {
        input
            .validate()
            .map_err(|e| CategoryError::Validation(e.to_string()))?;

        let mut category = self.get_category(id).await?;

        let name = input.name.trim().to_string();
        let taken = self
            .repository
            .get_by_name(&name)
            .await?
            .is_some_and(|existing| existing.id != id);
        if taken {
            return Err(CategoryError::DuplicateName(name));
        }

        if let Some(parent_id) = input.parent_id {
            self.ensure_not_ancestor(id, parent_id).await?;
        }

        category.name = name;
        category.description = input.description;
        category.parent_id = input.parent_id;
        category.updated_at = Utc::now();

        let updated = self.repository.update(category).await?;
        tracing::info!(category_id = %id, "Updated category");
        Ok(updated)
    }

    /// Walks up from `parent_id`; reaching `id` would close a cycle.
    async fn ensure_not_ancestor(&self, id: Uuid, parent_id: Uuid) -> CategoryResult<()> {
        let mut cursor = Some(parent_id);
        while let Some(current) = cursor {
            if current == id {
                tracing::warn!(category_id = %id, parent_id = %parent_id, "Rejected category cycle");
                return Err(CategoryError::Validation(
                    "A category cannot be its own ancestor".to_string(),
                ));
            }
            let node = self
                .repository
                .get_by_id(current)
                .await?
                .ok_or(CategoryError::ParentNotFound)?;
            cursor = node.parent_id;
        }
        Ok(())
    }

    pub async fn delete_category(&self, id: Uuid) -> CategoryResult<()> {
        self.get_category(id).await?;

        if !self.repository.list_children(id).await?.is_empty() {
            return Err(CategoryError::Validation(
                "Category has subcategories; delete them first".to_string(),
            ));
        }

        if !self.repository.delete(id).await? {
            return Err(CategoryError::NotFound);
        }

        tracing::info!(category_id = %id, "Deleted category");
        Ok(())
    }

    pub async fn upload_image(&self, id: Uuid, file: UploadedFile) -> CategoryResult<Category> {
        let mut category = self.get_category(id).await?;
        let processed = self.images.process_without_thumbnail(file).await?;

        category.image_content = Some(processed.content);
        category.image_content_type = Some(processed.content_type);
        category.updated_at = Utc::now();

        let updated = self.repository.update(category).await?;
        tracing::info!(category_id = %id, "Category image uploaded");
        Ok(updated)
    }

    /// Content type and bytes
    pub async fn get_image(&self, id: Uuid) -> CategoryResult<(String, Vec<u8>)> {
        let category = self.get_category(id).await?;
        match (category.image_content_type, category.image_content) {
            (Some(content_type), Some(content)) if !content.is_empty() => {
                Ok((content_type, content))
            }
            _ => Err(CategoryError::ImageNotFound),
        }
    }

    /// Categories with live products, highest total first, ties by name.
    /// `page` is applied after ranking.
    pub async fn sorted_by_metric(
        &self,
        metric: CategoryMetric,
        page: CategoryFilter,
    ) -> CategoryResult<Vec<CategoryMetricTotal>> {
        let source = self
            .metrics
            .as_ref()
            .ok_or_else(|| CategoryError::Internal("Category metrics are not configured".into()))?;

        let totals = source.category_totals(metric).await?;

        let mut ranked = Vec::with_capacity(totals.len());
        for (category_id, total) in totals {
            // Totals may name a category deleted since; skip it.
            if let Some(category) = self.repository.get_by_id(category_id).await? {
                ranked.push(CategoryMetricTotal { category, total });
            }
        }

        ranked.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.name.cmp(&b.category.name))
        });
        Ok(ranked
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }
}

fn build_node(category: &Category, children: &HashMap<Uuid, Vec<&Category>>) -> CategoryNode {
    let mut node = CategoryNode::leaf(category);
    if let Some(kids) = children.get(&category.id) {
        node.subcategories = kids.iter().map(|c| build_node(c, children)).collect();
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{
        InMemoryCategoryRepository, MockCategoryMetricSource, MockCategoryRepository,
    };
    use imaging::ImageConfig;
    use mockall::predicate::*;

    fn processor() -> ImageProcessor {
        ImageProcessor::new(ImageConfig::default())
    }

    fn service() -> CategoryService<InMemoryCategoryRepository> {
        CategoryService::new(InMemoryCategoryRepository::new(), processor())
    }

    fn create(name: &str, parent_id: Option<Uuid>) -> CreateCategory {
        CreateCategory {
            name: name.to_string(),
            description: None,
            parent_id,
            image: None,
        }
    }

    fn update(name: &str, parent_id: Option<Uuid>) -> UpdateCategory {
        UpdateCategory {
            name: name.to_string(),
            description: Some("updated".into()),
            parent_id,
        }
    }

    fn png() -> Vec<u8> {
        use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
        let img = ImageBuffer::from_pixel(40, 20, Rgb([10u8, 120, 200]));
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_get_missing_category() {
        let result = service().get_category(Uuid::now_v7()).await;
        let err = result.unwrap_err();
        assert!(matches!(err, CategoryError::NotFound));
        assert_eq!(err.to_string(), "Category not found.");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let service = service();
        service.create_category(create("Music", None)).await.unwrap();

        let result = service.create_category(create(" music ", None)).await;
        assert!(matches!(result, Err(CategoryError::DuplicateName(_))));
    }

    #[tokio::test]
    async fn test_create_requires_existing_parent() {
        let result = service()
            .create_category(create("Vinyl", Some(Uuid::now_v7())))
            .await;
        assert!(matches!(result, Err(CategoryError::ParentNotFound)));
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let result = service().create_category(create("", None)).await;
        assert!(matches!(result, Err(CategoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_tree_nests_children() {
        let service = service();
        let home = service.create_category(create("Home", None)).await.unwrap();
        let kitchen = service
            .create_category(create("Kitchen", Some(home.id)))
            .await
            .unwrap();
        service
            .create_category(create("Knives", Some(kitchen.id)))
            .await
            .unwrap();
        service.create_category(create("Garden", None)).await.unwrap();

        let tree = service.tree().await.unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "Garden");
        assert_eq!(tree[1].name, "Home");
        assert_eq!(tree[1].subcategories[0].name, "Kitchen");
        assert_eq!(tree[1].subcategories[0].subcategories[0].name, "Knives");
    }

    #[tokio::test]
    async fn test_subcategories_of_missing_category() {
        let result = service().subcategories(Uuid::now_v7()).await;
        assert!(matches!(result, Err(CategoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_rejects_cycle() {
        let service = service();
        let a = service.create_category(create("A", None)).await.unwrap();
        let b = service.create_category(create("B", Some(a.id))).await.unwrap();
        let c = service.create_category(create("C", Some(b.id))).await.unwrap();

        let own = service.update_category(a.id, update("A", Some(a.id))).await;
        assert!(matches!(own, Err(CategoryError::Validation(_))));

        let descendant = service.update_category(a.id, update("A", Some(c.id))).await;
        assert!(matches!(descendant, Err(CategoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_moves_and_renames() {
        let service = service();
        let a = service.create_category(create("A", None)).await.unwrap();
        let b = service.create_category(create("B", None)).await.unwrap();

        let moved = service
            .update_category(b.id, update("B2", Some(a.id)))
            .await
            .unwrap();
        assert_eq!(moved.name, "B2");
        assert_eq!(moved.parent_id, Some(a.id));
        assert_eq!(moved.description.as_deref(), Some("updated"));
    }

    #[tokio::test]
    async fn test_update_keeps_own_name() {
        let service = service();
        let a = service.create_category(create("Same", None)).await.unwrap();
        assert!(service.update_category(a.id, update("Same", None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_with_children_is_rejected() {
        let service = service();
        let parent = service.create_category(create("Parent", None)).await.unwrap();
        let child = service
            .create_category(create("Child", Some(parent.id)))
            .await
            .unwrap();

        let result = service.delete_category(parent.id).await;
        assert!(matches!(result, Err(CategoryError::Validation(_))));

        service.delete_category(child.id).await.unwrap();
        service.delete_category(parent.id).await.unwrap();
        assert!(!service.exists(parent.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_category() {
        let mut mock_repo = MockCategoryRepository::new();
        mock_repo.expect_get_by_id().returning(|_| Ok(None));

        let service = CategoryService::new(mock_repo, processor());
        let result = service.delete_category(Uuid::now_v7()).await;
        assert!(matches!(result, Err(CategoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_upload_and_read_image() {
        let service = service();
        let category = service.create_category(create("Pics", None)).await.unwrap();

        let file = UploadedFile::new(Some("c.png".into()), Some("image/png".into()), png());
        service.upload_image(category.id, file).await.unwrap();

        let (content_type, bytes) = service.get_image(category.id).await.unwrap();
        assert_eq!(content_type, "image/png");
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_inline_image() {
        use base64::Engine;
        let service = service();
        let mut input = create("Posters", None);
        input.image = Some(crate::models::InlineImage {
            content_type: "image/png".into(),
            content: base64::engine::general_purpose::STANDARD.encode(png()),
        });

        let category = service.create_category(input).await.unwrap();
        assert!(category.has_image());

        let mut input = create("Broken", None);
        input.image = Some(crate::models::InlineImage {
            content_type: "image/png".into(),
            content: "not base64!".into(),
        });
        assert!(matches!(
            service.create_category(input).await,
            Err(CategoryError::Image(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let service = service();
        let category = service.create_category(create("Docs", None)).await.unwrap();

        let file = UploadedFile::new(
            Some("a.pdf".into()),
            Some("application/pdf".into()),
            vec![1, 2, 3],
        );
        let result = service.upload_image(category.id, file).await;
        assert!(matches!(result, Err(CategoryError::Image(_))));
    }

    #[tokio::test]
    async fn test_missing_image() {
        let service = service();
        let category = service.create_category(create("Bare", None)).await.unwrap();
        let result = service.get_image(category.id).await;
        assert!(matches!(result, Err(CategoryError::ImageNotFound)));
    }

    #[tokio::test]
    async fn test_sorted_by_metric_orders_by_total_then_name() {
        let repo = InMemoryCategoryRepository::new();
        let service = CategoryService::new(repo.clone(), processor());
        let books = service.create_category(create("Books", None)).await.unwrap();
        let art = service.create_category(create("Art", None)).await.unwrap();
        let cars = service.create_category(create("Cars", None)).await.unwrap();

        let mut source = MockCategoryMetricSource::new();
        let (b, a, c) = (books.id, art.id, cars.id);
        source
            .expect_category_totals()
            .with(eq(CategoryMetric::Views))
            .times(1)
            .returning(move |_| Ok(vec![(b, 5), (c, 9), (a, 5), (Uuid::now_v7(), 100)]));

        let service = service.with_metrics(Arc::new(source));
        let ranked = service
            .sorted_by_metric(CategoryMetric::Views, CategoryFilter::default())
            .await
            .unwrap();

        let names: Vec<_> = ranked.iter().map(|r| r.category.name.as_str()).collect();
        assert_eq!(names, vec!["Cars", "Art", "Books"]);
        assert_eq!(ranked[0].total, 9);
    }

    #[tokio::test]
    async fn test_sorted_by_metric_pages_after_ranking() {
        let service = service();
        let mut totals = Vec::new();
        for (name, total) in [("Garden", 1), ("Music", 7), ("Toys", 4), ("Shoes", 2)] {
            let category = service.create_category(create(name, None)).await.unwrap();
            totals.push((category.id, total));
        }

        let mut source = MockCategoryMetricSource::new();
        source
            .expect_category_totals()
            .returning(move |_| Ok(totals.clone()));
        let service = service.with_metrics(Arc::new(source));

        let page = service
            .sorted_by_metric(
                CategoryMetric::ProductCount,
                CategoryFilter {
                    limit: 2,
                    offset: 1,
                },
            )
            .await
            .unwrap();

        let names: Vec<_> = page.iter().map(|r| r.category.name.as_str()).collect();
        assert_eq!(names, vec!["Toys", "Shoes"]);
    }

    #[tokio::test]
    async fn test_sorted_by_metric_without_source() {
        let result = service()
            .sorted_by_metric(CategoryMetric::Views, CategoryFilter::default())
            .await;
        assert!(matches!(result, Err(CategoryError::Internal(_))));
    }
}
