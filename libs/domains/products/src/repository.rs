use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain_categories::CategoryMetric;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductFilter, ProductImage};

/// Repository trait for Product and ProductImage persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, product: Product) -> ProductResult<Product>;

    /// Includes soft-deleted products
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Non-deleted products, newest first
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;

    async fn update(&self, product: Product) -> ProductResult<Product>;

    async fn increment_views(&self, id: Uuid) -> ProductResult<()>;

    /// Clears `company_id` on every product of the company
    async fn detach_company(&self, company_id: Uuid) -> ProductResult<u64>;

    /// Per-category totals over non-deleted products
    async fn category_totals(&self, metric: CategoryMetric) -> ProductResult<Vec<(Uuid, i64)>>;

    async fn add_image(&self, image: ProductImage) -> ProductResult<ProductImage>;

    /// Ordered by display_order
    async fn list_images(&self, product_id: Uuid) -> ProductResult<Vec<ProductImage>>;

    async fn get_image(&self, product_id: Uuid, image_id: Uuid)
    -> ProductResult<Option<ProductImage>>;

    async fn update_image(&self, image: ProductImage) -> ProductResult<ProductImage>;

    /// Returns false when nothing was deleted
    async fn delete_image(&self, product_id: Uuid, image_id: Uuid) -> ProductResult<bool>;

    async fn delete_images(&self, product_id: Uuid) -> ProductResult<u64>;

    /// Unsets `is_primary` on every image of the product
    async fn clear_primary(&self, product_id: Uuid) -> ProductResult<()>;

    /// Adds or removes the pair and moves `favorite_count` by one.
    /// Returns true when the product is now a favorite.
    async fn toggle_favorite(&self, user_id: Uuid, product_id: Uuid) -> ProductResult<bool>;

    /// Non-deleted favorites of the user, most recently added first
    async fn list_favorites(
        &self,
        user_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> ProductResult<Vec<Product>>;
}

/// In-memory implementation of ProductRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
    images: Arc<RwLock<HashMap<Uuid, ProductImage>>>,
    favorites: Arc<RwLock<HashMap<(Uuid, Uuid), DateTime<Utc>>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn metric_value(product: &Product, metric: CategoryMetric) -> i64 {
    match metric {
        CategoryMetric::Favorites => product.favorite_count,
        CategoryMetric::Views => product.view_count,
        CategoryMetric::Quantity => i64::from(product.quantity),
        CategoryMetric::ProductCount => 1,
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;
        products.insert(product.id, product.clone());

        tracing::info!(product_id = %product.id, name = %product.name, "Created product");
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(&id).cloned())
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;

        let mut result: Vec<Product> = products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(result
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn update(&self, product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;

        if !products.contains_key(&product.id) {
            return Err(ProductError::NotFound(product.id));
        }
        products.insert(product.id, product.clone());

        tracing::debug!(product_id = %product.id, "Updated product");
        Ok(product)
    }

    async fn increment_views(&self, id: Uuid) -> ProductResult<()> {
        let mut products = self.products.write().await;
        if let Some(product) = products.get_mut(&id) {
            product.view_count += 1;
        }
        Ok(())
    }

    async fn detach_company(&self, company_id: Uuid) -> ProductResult<u64> {
        let mut products = self.products.write().await;
        let mut detached = 0;
        for product in products
            .values_mut()
            .filter(|p| p.company_id == Some(company_id))
        {
            product.company_id = None;
            detached += 1;
        }
        Ok(detached)
    }

    async fn category_totals(&self, metric: CategoryMetric) -> ProductResult<Vec<(Uuid, i64)>> {
        let products = self.products.read().await;
        let mut totals: HashMap<Uuid, i64> = HashMap::new();
        for product in products.values().filter(|p| !p.deleted) {
            *totals.entry(product.category_id).or_default() += metric_value(product, metric);
        }
        Ok(totals.into_iter().collect())
    }

    async fn add_image(&self, image: ProductImage) -> ProductResult<ProductImage> {
        let mut images = self.images.write().await;
        images.insert(image.id, image.clone());
        Ok(image)
    }

    async fn list_images(&self, product_id: Uuid) -> ProductResult<Vec<ProductImage>> {
        let images = self.images.read().await;
        let mut result: Vec<ProductImage> = images
            .values()
            .filter(|i| i.product_id == product_id)
            .cloned()
            .collect();
        result.sort_by_key(|i| (i.display_order, i.created_at));
        Ok(result)
    }

    async fn get_image(
        &self,
        product_id: Uuid,
        image_id: Uuid,
    ) -> ProductResult<Option<ProductImage>> {
        let images = self.images.read().await;
        Ok(images
            .get(&image_id)
            .filter(|i| i.product_id == product_id)
            .cloned())
    }

    async fn update_image(&self, image: ProductImage) -> ProductResult<ProductImage> {
        let mut images = self.images.write().await;
        if !images.contains_key(&image.id) {
            return Err(ProductError::ImageNotFound(image.id));
        }
        images.insert(image.id, image.clone());
        Ok(image)
    }

    async fn delete_image(&self, product_id: Uuid, image_id: Uuid) -> ProductResult<bool> {
        let mut images = self.images.write().await;
        let owned = images
            .get(&image_id)
            .is_some_and(|i| i.product_id == product_id);
        Ok(owned && images.remove(&image_id).is_some())
    }

    async fn delete_images(&self, product_id: Uuid) -> ProductResult<u64> {
        let mut images = self.images.write().await;
        let before = images.len();
        images.retain(|_, i| i.product_id != product_id);
        Ok((before - images.len()) as u64)
    }

    async fn clear_primary(&self, product_id: Uuid) -> ProductResult<()> {
        let mut images = self.images.write().await;
        for image in images.values_mut().filter(|i| i.product_id == product_id) {
            image.is_primary = false;
        }
        Ok(())
    }

    async fn toggle_favorite(&self, user_id: Uuid, product_id: Uuid) -> ProductResult<bool> {
        // favorites before products, everywhere
        let mut favorites = self.favorites.write().await;
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&product_id)
            .ok_or(ProductError::NotFound(product_id))?;

        let favorited = if favorites.remove(&(user_id, product_id)).is_some() {
            product.favorite_count -= 1;
            false
        } else {
            favorites.insert((user_id, product_id), Utc::now());
            product.favorite_count += 1;
            true
        };

        tracing::debug!(%user_id, %product_id, favorited, "Toggled favorite");
        Ok(favorited)
    }

    async fn list_favorites(
        &self,
        user_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> ProductResult<Vec<Product>> {
        let favorites = self.favorites.read().await;
        let products = self.products.read().await;

        let mut marked: Vec<(DateTime<Utc>, &Product)> = favorites
            .iter()
            .filter(|((user, _), _)| *user == user_id)
            .filter_map(|((_, product_id), at)| products.get(product_id).map(|p| (*at, p)))
            .filter(|(_, p)| !p.deleted)
            .collect();
        marked.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(marked
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, p)| p.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn product(category_id: Uuid, views: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::now_v7(),
            name: "Widget".into(),
            status: Default::default(),
            sell_type: Default::default(),
            condition: Default::default(),
            condition_comment: None,
            price: Decimal::new(1000, 2),
            offer_price: None,
            shipping_cost: None,
            each_additional_item_shipping_cost: None,
            quantity: 2,
            inventory_location: None,
            warranty: None,
            brand: None,
            product_code: None,
            manufacturing_piece_number: None,
            manufacturing_date: None,
            expiration_date: None,
            ean: None,
            manufacturing_place: None,
            category_id,
            company_id: None,
            author_id: Uuid::now_v7(),
            view_count: views,
            favorite_count: 0,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn image(product_id: Uuid, order: i32) -> ProductImage {
        ProductImage {
            id: Uuid::now_v7(),
            product_id,
            file_name: format!("{order}.png"),
            content_type: "image/png".into(),
            file_size: 3,
            file_extension: "png".into(),
            content: vec![1, 2, 3],
            thumbnail: None,
            is_primary: order == 0,
            display_order: order,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_category_totals_skip_deleted() {
        let repo = InMemoryProductRepository::new();
        let category = Uuid::now_v7();
        repo.create(product(category, 3)).await.unwrap();
        repo.create(product(category, 4)).await.unwrap();
        let mut gone = product(category, 100);
        gone.deleted = true;
        repo.create(gone).await.unwrap();

        let views = repo.category_totals(CategoryMetric::Views).await.unwrap();
        assert_eq!(views, vec![(category, 7)]);

        let count = repo
            .category_totals(CategoryMetric::ProductCount)
            .await
            .unwrap();
        assert_eq!(count, vec![(category, 2)]);
    }

    #[tokio::test]
    async fn test_images_are_ordered_and_scoped() {
        let repo = InMemoryProductRepository::new();
        let product_id = Uuid::now_v7();
        repo.add_image(image(product_id, 2)).await.unwrap();
        let first = repo.add_image(image(product_id, 0)).await.unwrap();
        repo.add_image(image(Uuid::now_v7(), 1)).await.unwrap();

        let images = repo.list_images(product_id).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].id, first.id);

        assert!(!repo.delete_image(Uuid::now_v7(), first.id).await.unwrap());
        assert!(repo.delete_image(product_id, first.id).await.unwrap());
        assert_eq!(repo.delete_images(product_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_favorites_move_the_favorites_ranking() {
        let repo = InMemoryProductRepository::new();
        let (garden, music) = (Uuid::now_v7(), Uuid::now_v7());
        let rake = repo.create(product(garden, 0)).await.unwrap();
        let drum = repo.create(product(music, 0)).await.unwrap();
        let (ann, bob) = (Uuid::now_v7(), Uuid::now_v7());

        assert!(repo.toggle_favorite(ann, drum.id).await.unwrap());
        assert!(repo.toggle_favorite(ann, rake.id).await.unwrap());
        assert!(repo.toggle_favorite(bob, rake.id).await.unwrap());

        let mut totals = repo.category_totals(CategoryMetric::Favorites).await.unwrap();
        totals.sort_by(|a, b| b.1.cmp(&a.1));
        assert_eq!(totals, vec![(garden, 2), (music, 1)]);

        // second toggle removes
        assert!(!repo.toggle_favorite(ann, rake.id).await.unwrap());
        assert!(!repo.toggle_favorite(bob, rake.id).await.unwrap());
        let mut totals = repo.category_totals(CategoryMetric::Favorites).await.unwrap();
        totals.sort_by(|a, b| b.1.cmp(&a.1));
        assert_eq!(totals, vec![(music, 1), (garden, 0)]);

        let reloaded = repo.get_by_id(rake.id).await.unwrap().unwrap();
        assert_eq!(reloaded.favorite_count, 0);
    }

    #[tokio::test]
    async fn test_list_favorites_newest_first_and_skips_deleted() {
        let repo = InMemoryProductRepository::new();
        let category = Uuid::now_v7();
        let user = Uuid::now_v7();
        let first = repo.create(product(category, 0)).await.unwrap();
        let second = repo.create(product(category, 0)).await.unwrap();
        let mut gone = repo.create(product(category, 0)).await.unwrap();

        for id in [first.id, second.id, gone.id] {
            repo.toggle_favorite(user, id).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        gone.deleted = true;
        repo.update(gone).await.unwrap();

        let ids: Vec<Uuid> = repo
            .list_favorites(user, 10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let page = repo.list_favorites(user, 1, 1).await.unwrap();
        assert_eq!(page[0].id, first.id);
        assert!(repo.list_favorites(Uuid::now_v7(), 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_favorite_unknown_product() {
        let repo = InMemoryProductRepository::new();
        let missing = Uuid::now_v7();
        assert!(matches!(
            repo.toggle_favorite(Uuid::now_v7(), missing).await,
            Err(ProductError::NotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn test_detach_company() {
        let repo = InMemoryProductRepository::new();
        let company = Uuid::now_v7();
        let mut owned = product(Uuid::now_v7(), 0);
        owned.company_id = Some(company);
        let owned = repo.create(owned).await.unwrap();

        assert_eq!(repo.detach_company(company).await.unwrap(), 1);
        let reloaded = repo.get_by_id(owned.id).await.unwrap().unwrap();
        assert_eq!(reloaded.company_id, None);
    }
}
