//! Product Service - Business logic layer

use async_trait::async_trait;
use chrono::Utc;
use domain_categories::{
    CategoryError, CategoryMetric, CategoryMetricSource, CategoryRepository, CategoryResult,
};
use domain_users::{Role, User, UserRepository};
use imaging::{ImageProcessor, ProcessedImage, UploadedFile};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CreateProduct, FavoriteStatus, FavoritesQuery, Product, ProductDetails, ProductFilter,
    ProductImage, UpdateProduct,
};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// Sellers manage their own listings; company listings are managed by the
/// company's admin sellers. Every public query hides soft-deleted products.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
    images: ImageProcessor,
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            users: self.users.clone(),
            categories: self.categories.clone(),
            images: self.images.clone(),
        }
    }
}

fn to_image(
    product_id: Uuid,
    processed: ProcessedImage,
    is_primary: bool,
    display_order: i32,
) -> ProductImage {
    ProductImage {
        id: Uuid::now_v7(),
        product_id,
        file_size: processed.file_size() as i64,
        file_name: processed.file_name,
        content_type: processed.content_type,
        file_extension: processed.file_extension,
        content: processed.content,
        thumbnail: processed.thumbnail,
        is_primary,
        display_order,
        created_at: Utc::now(),
    }
}

/// Company listings belong to the company's admin sellers; the others to
/// their author.
fn can_manage(user: &User, product: &Product) -> bool {
    match product.company_id {
        Some(company_id) => {
            user.has_role(Role::CompanyAdminSeller) && user.company_id == Some(company_id)
        }
        None => product.author_id == user.id,
    }
}

fn next_display_order(images: &[ProductImage]) -> i32 {
    images
        .iter()
        .map(|i| i.display_order + 1)
        .max()
        .unwrap_or(0)
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(
        repository: R,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        images: ImageProcessor,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            users,
            categories,
            images,
        }
    }

    /// Shared handle for the companies domain and category metrics.
    pub fn repository(&self) -> Arc<R> {
        self.repository.clone()
    }

    fn max_images(&self) -> usize {
        self.images.config().max_per_product
    }

    fn too_many_images(&self) -> ProductError {
        ProductError::Validation(format!(
            "Maximum {} images allowed per product",
            self.max_images()
        ))
    }

    async fn load_caller(&self, id: Uuid) -> ProductResult<User> {
        self.users
            .get_by_id(id)
            .await?
            .filter(User::exists)
            .ok_or(ProductError::UserNotFound)
    }

    async fn active_product(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .filter(|p| !p.deleted)
            .ok_or(ProductError::NotFound(id))
    }

    /// Loads a live product and checks the caller may change it.
    async fn managed_product(&self, id: Uuid, caller_id: Uuid) -> ProductResult<Product> {
        let user = self.load_caller(caller_id).await?;
        let product = self.active_product(id).await?;

        if !can_manage(&user, &product) {
            tracing::warn!(product_id = %id, user_id = %caller_id, "Product change refused");
            return Err(ProductError::Forbidden(
                "User is not authorized to update this product".to_string(),
            ));
        }
        Ok(product)
    }

    async fn ensure_category(&self, category_id: Uuid) -> ProductResult<()> {
        if self.categories.exists(category_id).await? {
            Ok(())
        } else {
            Err(ProductError::Validation(format!(
                "Category not found: {}",
                category_id
            )))
        }
    }

    async fn process_all(&self, files: Vec<UploadedFile>) -> ProductResult<Vec<ProcessedImage>> {
        let mut processed = Vec::with_capacity(files.len());
        for file in files {
            processed.push(self.images.process(file).await?);
        }
        Ok(processed)
    }

    async fn details(&self, product: Product) -> ProductResult<ProductDetails> {
        let images = self.repository.list_images(product.id).await?;
        Ok(ProductDetails { product, images })
    }

    /// Marks `image_id` as the only primary image.
    async fn make_primary(&self, product_id: Uuid, image_id: Uuid) -> ProductResult<()> {
        self.repository.clear_primary(product_id).await?;
        if let Some(mut image) = self.repository.get_image(product_id, image_id).await? {
            image.is_primary = true;
            self.repository.update_image(image).await?;
        }
        Ok(())
    }

    /// Create a listing for the caller, with its pictures
    #[instrument(skip(self, input, files), fields(product_name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProduct,
        files: Vec<UploadedFile>,
        caller_id: Uuid,
    ) -> ProductResult<ProductDetails> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        let user = self.load_caller(caller_id).await?;
        if !user.has_role(Role::Seller) {
            return Err(ProductError::Forbidden(
                "Only sellers can create products".to_string(),
            ));
        }
        self.ensure_category(input.category_id).await?;
        if files.len() > self.max_images() {
            return Err(self.too_many_images());
        }

        let processed = self.process_all(files).await?;
        let product = self
            .repository
            .create(Product::from_request(input, user.id, user.company_id))
            .await?;

        let mut images = Vec::with_capacity(processed.len());
        for (index, image) in processed.into_iter().enumerate() {
            let image = to_image(product.id, image, index == 0, index as i32);
            images.push(self.repository.add_image(image).await?);
        }

        tracing::info!(product_id = %product.id, images = images.len(), "Product listed");
        Ok(ProductDetails { product, images })
    }

    /// Partial update plus image removal, addition and primary selection
    #[instrument(skip(self, input, files))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProduct,
        files: Vec<UploadedFile>,
        caller_id: Uuid,
    ) -> ProductResult<ProductDetails> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        let mut product = self.managed_product(id, caller_id).await?;
        let current = self.repository.list_images(id).await?;
        let kept: Vec<&ProductImage> = current
            .iter()
            .filter(|i| !input.remove_image_ids.contains(&i.id))
            .collect();

        if kept.len() + files.len() > self.max_images() {
            return Err(self.too_many_images());
        }
        if let Some(primary_id) = input.primary_image_id {
            if !kept.iter().any(|i| i.id == primary_id) {
                return Err(ProductError::Validation(format!(
                    "Primary image ID {} not found",
                    primary_id
                )));
            }
        }
        if let Some(category_id) = input.category_id {
            if category_id != product.category_id {
                self.ensure_category(category_id).await?;
            }
        }

        let processed = self.process_all(files).await?;
        let mut display_order = next_display_order(&current);

        input.apply_to(&mut product);
        product.touch();
        let product = self.repository.update(product).await?;

        for image_id in &input.remove_image_ids {
            self.repository.delete_image(id, *image_id).await?;
        }

        let mut first_new = None;
        for image in processed {
            let added = self
                .repository
                .add_image(to_image(id, image, false, display_order))
                .await?;
            first_new.get_or_insert(added.id);
            display_order += 1;
        }

        let primary = match (input.primary_image_id, first_new) {
            (Some(explicit), _) => Some(explicit),
            (None, Some(new)) => Some(new),
            (None, None) => self
                .repository
                .list_images(id)
                .await?
                .iter()
                .min_by_key(|i| i.display_order)
                .map(|i| i.id),
        };
        if let Some(image_id) = primary {
            self.make_primary(id, image_id).await?;
        }

        tracing::info!(product_id = %id, "Product updated");
        self.details(product).await
    }

    /// Removes the pictures and soft deletes the listing
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid, caller_id: Uuid) -> ProductResult<()> {
        let product = self.managed_product(id, caller_id).await?;
        self.soft_delete(product).await
    }

    async fn soft_delete(&self, mut product: Product) -> ProductResult<()> {
        let removed = self.repository.delete_images(product.id).await?;
        product.deleted = true;
        product.touch();
        let product = self.repository.update(product).await?;

        tracing::info!(product_id = %product.id, images_removed = removed, "Product deleted");
        Ok(())
    }

    /// Platform admin removal of any listing
    #[instrument(skip(self))]
    pub async fn admin_delete_product(&self, id: Uuid, caller_id: Uuid) -> ProductResult<()> {
        let user = self.load_caller(caller_id).await?;
        if !user.has_role(Role::AppAdmin) {
            return Err(ProductError::Forbidden("Admin access required".to_string()));
        }
        let product = self.active_product(id).await?;
        self.soft_delete(product).await
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        id: Uuid,
        quantity: i32,
        caller_id: Uuid,
    ) -> ProductResult<Product> {
        if quantity < 0 {
            return Err(ProductError::Validation(
                "Quantity cannot be negative".to_string(),
            ));
        }
        let mut product = self.managed_product(id, caller_id).await?;
        product.set_quantity(quantity);
        product.touch();
        self.repository.update(product).await
    }

    #[instrument(skip(self))]
    pub async fn update_price(
        &self,
        id: Uuid,
        price: Decimal,
        caller_id: Uuid,
    ) -> ProductResult<Product> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(ProductError::Validation("Invalid Price".to_string()));
        }
        let mut product = self.managed_product(id, caller_id).await?;
        product.price = price;
        product.touch();
        self.repository.update(product).await
    }

    /// Public product page; counts a view
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<ProductDetails> {
        let mut product = self.active_product(id).await?;
        self.repository.increment_views(id).await?;
        product.view_count += 1;
        self.details(product).await
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        self.repository.list(filter).await
    }

    /// Most recently listed products
    #[instrument(skip(self))]
    pub async fn new_arrivals(&self, limit: usize) -> ProductResult<Vec<Product>> {
        self.repository
            .list(ProductFilter {
                limit,
                ..Default::default()
            })
            .await
    }

    /// Adds the product to the caller's favorites, or removes it if it was
    /// already there.
    #[instrument(skip(self))]
    pub async fn toggle_favorite(
        &self,
        product_id: Uuid,
        caller_id: Uuid,
    ) -> ProductResult<FavoriteStatus> {
        self.load_caller(caller_id).await?;
        self.active_product(product_id).await?;

        let favorited = self
            .repository
            .toggle_favorite(caller_id, product_id)
            .await?;
        let product = self
            .repository
            .get_by_id(product_id)
            .await?
            .ok_or(ProductError::NotFound(product_id))?;

        tracing::info!(%product_id, %caller_id, favorited, "Favorite toggled");
        Ok(FavoriteStatus {
            product_id,
            favorited,
            favorite_count: product.favorite_count,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_favorites(
        &self,
        caller_id: Uuid,
        query: FavoritesQuery,
    ) -> ProductResult<Vec<Product>> {
        self.load_caller(caller_id).await?;
        self.repository
            .list_favorites(caller_id, query.limit, query.offset)
            .await
    }

    /// Append one picture; `is_primary` replaces the current primary
    #[instrument(skip(self, file))]
    pub async fn upload_image(
        &self,
        product_id: Uuid,
        file: UploadedFile,
        is_primary: bool,
        caller_id: Uuid,
    ) -> ProductResult<ProductImage> {
        self.managed_product(product_id, caller_id).await?;
        let current = self.repository.list_images(product_id).await?;
        if current.len() >= self.max_images() {
            return Err(self.too_many_images());
        }

        let processed = self.images.process(file).await?;
        let primary = is_primary || current.is_empty();
        if primary {
            self.repository.clear_primary(product_id).await?;
        }

        let image = self
            .repository
            .add_image(to_image(
                product_id,
                processed,
                primary,
                next_display_order(&current),
            ))
            .await?;

        tracing::info!(product_id = %product_id, image_id = %image.id, "Product image added");
        Ok(image)
    }

    pub async fn list_images(&self, product_id: Uuid) -> ProductResult<Vec<ProductImage>> {
        self.active_product(product_id).await?;
        self.repository.list_images(product_id).await
    }

    async fn stored_image(&self, product_id: Uuid, image_id: Uuid) -> ProductResult<ProductImage> {
        self.active_product(product_id).await?;
        self.repository
            .get_image(product_id, image_id)
            .await?
            .ok_or(ProductError::ImageNotFound(image_id))
    }

    /// Content type and bytes of the resized picture
    pub async fn get_image(
        &self,
        product_id: Uuid,
        image_id: Uuid,
    ) -> ProductResult<(String, Vec<u8>)> {
        let image = self.stored_image(product_id, image_id).await?;
        Ok((image.content_type, image.content))
    }

    pub async fn get_thumbnail(
        &self,
        product_id: Uuid,
        image_id: Uuid,
    ) -> ProductResult<(String, Vec<u8>)> {
        let image = self.stored_image(product_id, image_id).await?;
        let thumbnail = image
            .thumbnail
            .ok_or(ProductError::ImageNotFound(image_id))?;
        Ok((image.content_type, thumbnail))
    }

    /// Deleting the primary promotes the lowest remaining display order
    #[instrument(skip(self))]
    pub async fn delete_image(
        &self,
        product_id: Uuid,
        image_id: Uuid,
        caller_id: Uuid,
    ) -> ProductResult<()> {
        self.managed_product(product_id, caller_id).await?;
        let image = self
            .repository
            .get_image(product_id, image_id)
            .await?
            .ok_or(ProductError::ImageNotFound(image_id))?;

        if !self.repository.delete_image(product_id, image_id).await? {
            return Err(ProductError::ImageNotFound(image_id));
        }

        if image.is_primary {
            let remaining = self.repository.list_images(product_id).await?;
            if let Some(next) = remaining.iter().min_by_key(|i| i.display_order) {
                self.make_primary(product_id, next.id).await?;
            }
        }

        tracing::info!(product_id = %product_id, image_id = %image_id, "Product image deleted");
        Ok(())
    }
}

/// Feeds product aggregates to [`domain_categories::CategoryService::sorted_by_metric`].
pub struct ProductCategoryMetrics<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductCategoryMetrics<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: ProductRepository + 'static> CategoryMetricSource for ProductCategoryMetrics<R> {
    async fn category_totals(&self, metric: CategoryMetric) -> CategoryResult<Vec<(Uuid, i64)>> {
        self.repository
            .category_totals(metric)
            .await
            .map_err(|e| CategoryError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductCondition, ProductSellType, ProductStatus};
    use crate::repository::{InMemoryProductRepository, MockProductRepository};
    use domain_categories::{Category, InMemoryCategoryRepository};
    use domain_users::InMemoryUserRepository;
    use imaging::ImageConfig;
    use mockall::predicate::*;

    fn money(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn png() -> Vec<u8> {
        use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
        let img = ImageBuffer::from_pixel(12, 8, Rgb([200u8, 10, 10]));
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn upload(name: &str) -> UploadedFile {
        UploadedFile::new(Some(name.to_string()), Some("image/png".to_string()), png())
    }

    fn input(category_id: Uuid, quantity: i32) -> CreateProduct {
        CreateProduct {
            name: "Espresso Machine".into(),
            sell_type: ProductSellType::Direct,
            condition: ProductCondition::New,
            condition_comment: None,
            price: money("249.00"),
            offer_price: None,
            shipping_cost: None,
            each_additional_item_shipping_cost: None,
            quantity,
            inventory_location: None,
            warranty: Some("2 years".into()),
            brand: None,
            product_code: None,
            manufacturing_piece_number: None,
            manufacturing_date: None,
            expiration_date: None,
            ean: None,
            manufacturing_place: None,
            category_id,
        }
    }

    struct Fixture {
        service: ProductService<InMemoryProductRepository>,
        users: Arc<InMemoryUserRepository>,
        category_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let categories = Arc::new(InMemoryCategoryRepository::new());
        let category = categories
            .create(Category::new("Kitchen".into(), None, None))
            .await
            .unwrap();

        let service = ProductService::new(
            InMemoryProductRepository::new(),
            users.clone(),
            categories,
            ImageProcessor::new(ImageConfig {
                max_per_product: 3,
                ..ImageConfig::default()
            }),
        );
        Fixture {
            service,
            users,
            category_id: category.id,
        }
    }

    async fn user(users: &InMemoryUserRepository, email: &str, roles: &[Role]) -> User {
        let mut user = User::new("Sam".into(), "Seller".into(), email, None, "hash".into());
        for role in roles {
            user.grant(*role);
        }
        users.create(user).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_requires_seller_role() {
        let f = fixture().await;
        let buyer = user(&f.users, "buyer@shop.test", &[]).await;

        let result = f
            .service
            .create_product(input(f.category_id, 1), vec![], buyer.id)
            .await;
        assert!(matches!(result, Err(ProductError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_unknown_caller_is_not_found() {
        let f = fixture().await;
        let result = f
            .service
            .create_product(input(f.category_id, 1), vec![], Uuid::now_v7())
            .await;
        assert!(matches!(result, Err(ProductError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_create_with_unknown_category_is_bad_request() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;

        let result = f
            .service
            .create_product(input(Uuid::now_v7(), 1), vec![], seller.id)
            .await;
        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_marks_first_image_primary() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;

        let details = f
            .service
            .create_product(
                input(f.category_id, 0),
                vec![upload("a.png"), upload("b.png")],
                seller.id,
            )
            .await
            .unwrap();

        assert_eq!(details.product.status, ProductStatus::OutOfStock);
        assert_eq!(details.product.author_id, seller.id);
        assert_eq!(details.images.len(), 2);
        assert!(details.images[0].is_primary);
        assert!(!details.images[1].is_primary);
        assert_eq!(details.images[1].display_order, 1);
        assert!(details.images[0].thumbnail.is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_too_many_images() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;
        let files = (0..4).map(|i| upload(&format!("{}.png", i))).collect();

        let err = f
            .service
            .create_product(input(f.category_id, 1), files, seller.id)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Maximum 3 images allowed per product");
    }

    #[tokio::test]
    async fn test_other_seller_cannot_update() {
        let f = fixture().await;
        let owner = user(&f.users, "owner@shop.test", &[Role::Seller]).await;
        let other = user(&f.users, "other@shop.test", &[Role::Seller]).await;
        let details = f
            .service
            .create_product(input(f.category_id, 1), vec![], owner.id)
            .await
            .unwrap();

        let err = f
            .service
            .update_quantity(details.product.id, 5, other.id)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User is not authorized to update this product");
    }

    #[tokio::test]
    async fn test_company_admin_manages_company_listing() {
        let f = fixture().await;
        let company_id = Uuid::now_v7();

        let mut author = User::new("A".into(), "B".into(), "a@shop.test", None, "h".into());
        author.grant(Role::Seller);
        author.company_id = Some(company_id);
        let author = f.users.create(author).await.unwrap();

        let mut admin = User::new("C".into(), "D".into(), "c@shop.test", None, "h".into());
        admin.grant(Role::Seller);
        admin.grant(Role::CompanyAdminSeller);
        admin.company_id = Some(company_id);
        let admin = f.users.create(admin).await.unwrap();

        let details = f
            .service
            .create_product(input(f.category_id, 1), vec![], author.id)
            .await
            .unwrap();
        assert_eq!(details.product.company_id, Some(company_id));

        let updated = f
            .service
            .update_price(details.product.id, money("199.50"), admin.id)
            .await
            .unwrap();
        assert_eq!(updated.price, money("199.50"));

        // A plain seller of the same company is not an admin
        let result = f
            .service
            .update_quantity(details.product.id, 2, author.id)
            .await;
        assert!(matches!(result, Err(ProductError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_quantity_and_price_guards() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;
        let id = f
            .service
            .create_product(input(f.category_id, 2), vec![], seller.id)
            .await
            .unwrap()
            .product
            .id;

        assert!(matches!(
            f.service.update_quantity(id, -1, seller.id).await,
            Err(ProductError::Validation(_))
        ));
        let err = f
            .service
            .update_price(id, money("-0.01"), seller.id)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid Price");

        let product = f.service.update_quantity(id, 0, seller.id).await.unwrap();
        assert_eq!(product.status, ProductStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_update_resolves_primary_image() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;
        let details = f
            .service
            .create_product(
                input(f.category_id, 1),
                vec![upload("a.png"), upload("b.png")],
                seller.id,
            )
            .await
            .unwrap();
        let id = details.product.id;
        let second = details.images[1].id;

        // Unknown primary id
        let missing = Uuid::now_v7();
        let err = f
            .service
            .update_product(
                id,
                UpdateProduct {
                    primary_image_id: Some(missing),
                    ..Default::default()
                },
                vec![],
                seller.id,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Primary image ID {} not found", missing));

        // Explicit primary
        let updated = f
            .service
            .update_product(
                id,
                UpdateProduct {
                    primary_image_id: Some(second),
                    ..Default::default()
                },
                vec![],
                seller.id,
            )
            .await
            .unwrap();
        let primaries: Vec<Uuid> = updated
            .images
            .iter()
            .filter(|i| i.is_primary)
            .map(|i| i.id)
            .collect();
        assert_eq!(primaries, vec![second]);

        // A new image takes over when nothing is named
        let updated = f
            .service
            .update_product(id, UpdateProduct::default(), vec![upload("c.png")], seller.id)
            .await
            .unwrap();
        let newest = updated.images.iter().max_by_key(|i| i.display_order).unwrap();
        assert!(newest.is_primary);
        assert_eq!(updated.images.iter().filter(|i| i.is_primary).count(), 1);
    }

    #[tokio::test]
    async fn test_update_counts_removed_images_against_limit() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;
        let details = f
            .service
            .create_product(
                input(f.category_id, 1),
                vec![upload("a.png"), upload("b.png"), upload("c.png")],
                seller.id,
            )
            .await
            .unwrap();

        let result = f
            .service
            .update_product(
                details.product.id,
                UpdateProduct::default(),
                vec![upload("d.png")],
                seller.id,
            )
            .await;
        assert!(matches!(result, Err(ProductError::Validation(_))));

        let updated = f
            .service
            .update_product(
                details.product.id,
                UpdateProduct {
                    remove_image_ids: vec![details.images[0].id],
                    ..Default::default()
                },
                vec![upload("d.png")],
                seller.id,
            )
            .await
            .unwrap();
        assert_eq!(updated.images.len(), 3);
        assert!(updated.images.iter().all(|i| i.id != details.images[0].id));
    }

    #[tokio::test]
    async fn test_get_product_counts_views_and_hides_deleted() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;
        let id = f
            .service
            .create_product(input(f.category_id, 1), vec![upload("a.png")], seller.id)
            .await
            .unwrap()
            .product
            .id;

        f.service.get_product(id).await.unwrap();
        let details = f.service.get_product(id).await.unwrap();
        assert_eq!(details.product.view_count, 2);

        f.service.delete_product(id, seller.id).await.unwrap();
        assert!(matches!(
            f.service.get_product(id).await,
            Err(ProductError::NotFound(_))
        ));
        assert!(f.service.list_products(ProductFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_delete_requires_app_admin() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;
        let admin = user(&f.users, "admin@shop.test", &[Role::AppAdmin]).await;
        let id = f
            .service
            .create_product(input(f.category_id, 1), vec![], seller.id)
            .await
            .unwrap()
            .product
            .id;

        assert!(matches!(
            f.service.admin_delete_product(id, seller.id).await,
            Err(ProductError::Forbidden(_))
        ));
        f.service.admin_delete_product(id, admin.id).await.unwrap();
        assert!(matches!(
            f.service.admin_delete_product(id, admin.id).await,
            Err(ProductError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deleting_primary_promotes_next_image() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;
        let details = f
            .service
            .create_product(
                input(f.category_id, 1),
                vec![upload("a.png"), upload("b.png")],
                seller.id,
            )
            .await
            .unwrap();
        let id = details.product.id;

        f.service
            .delete_image(id, details.images[0].id, seller.id)
            .await
            .unwrap();

        let images = f.service.list_images(id).await.unwrap();
        assert_eq!(images.len(), 1);
        assert!(images[0].is_primary);

        assert!(matches!(
            f.service.get_image(id, details.images[0].id).await,
            Err(ProductError::ImageNotFound(_))
        ));
        let (content_type, bytes) = f.service.get_thumbnail(id, images[0].id).await.unwrap();
        assert_eq!(content_type, "image/png");
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn test_upload_primary_replaces_existing_primary() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;
        let id = f
            .service
            .create_product(input(f.category_id, 1), vec![upload("a.png")], seller.id)
            .await
            .unwrap()
            .product
            .id;

        let image = f
            .service
            .upload_image(id, upload("b.png"), true, seller.id)
            .await
            .unwrap();
        assert!(image.is_primary);
        assert_eq!(image.display_order, 1);

        let images = f.service.list_images(id).await.unwrap();
        assert_eq!(images.iter().filter(|i| i.is_primary).count(), 1);
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let f = fixture().await;
        let seller = user(&f.users, "s@shop.test", &[Role::Seller]).await;
        let id = f
            .service
            .create_product(input(f.category_id, 1), vec![], seller.id)
            .await
            .unwrap()
            .product
            .id;

        let empty = UploadedFile::new(Some("x.png".into()), Some("image/png".into()), vec![]);
        let result = f.service.upload_image(id, empty, false, seller.id).await;
        assert!(matches!(result, Err(ProductError::Image(_))));
    }

    #[tokio::test]
    async fn test_new_arrivals_uses_limit() {
        let users = Arc::new(InMemoryUserRepository::new());
        let categories = Arc::new(InMemoryCategoryRepository::new());

        let mut mock = MockProductRepository::new();
        mock.expect_list()
            .withf(|filter| filter.limit == 4 && filter.offset == 0)
            .times(1)
            .returning(|_| Ok(vec![]));

        let service = ProductService::new(
            mock,
            users,
            categories,
            ImageProcessor::new(ImageConfig::default()),
        );
        assert!(service.new_arrivals(4).await.unwrap().is_empty());
    }

    async fn ranked_names<C: CategoryRepository>(
        ranking: &domain_categories::CategoryService<C>,
    ) -> Vec<String> {
        ranking
            .sorted_by_metric(
                CategoryMetric::Favorites,
                domain_categories::CategoryFilter::default(),
            )
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.category.name)
            .collect()
    }

    #[tokio::test]
    async fn test_favorites_reorder_categories_by_favorites() {
        let users = Arc::new(InMemoryUserRepository::new());
        let categories = InMemoryCategoryRepository::new();
        let kitchen = categories
            .create(Category::new("Kitchen".into(), None, None))
            .await
            .unwrap();
        let garden = categories
            .create(Category::new("Garden".into(), None, None))
            .await
            .unwrap();
        let service = ProductService::new(
            InMemoryProductRepository::new(),
            users.clone(),
            Arc::new(categories.clone()),
            ImageProcessor::new(ImageConfig::default()),
        );
        let ranking = domain_categories::CategoryService::new(
            categories,
            ImageProcessor::new(ImageConfig::default()),
        )
        .with_metrics(Arc::new(ProductCategoryMetrics::new(service.repository())));

        let seller = user(&users, "seller@shop.test", &[Role::Seller]).await;
        let fan = user(&users, "fan@shop.test", &[]).await;
        let pan = service
            .create_product(input(kitchen.id, 1), vec![], seller.id)
            .await
            .unwrap()
            .product;
        let hose = service
            .create_product(input(garden.id, 1), vec![], seller.id)
            .await
            .unwrap()
            .product;

        service.toggle_favorite(pan.id, fan.id).await.unwrap();
        assert_eq!(ranked_names(&ranking).await, vec!["Kitchen", "Garden"]);

        service.toggle_favorite(hose.id, fan.id).await.unwrap();
        service.toggle_favorite(hose.id, seller.id).await.unwrap();
        assert_eq!(ranked_names(&ranking).await, vec!["Garden", "Kitchen"]);

        let status = service.toggle_favorite(hose.id, seller.id).await.unwrap();
        assert!(!status.favorited);
        assert_eq!(status.favorite_count, 1);
        // 1 to 1, ties by name
        assert_eq!(ranked_names(&ranking).await, vec!["Garden", "Kitchen"]);

        service.toggle_favorite(pan.id, seller.id).await.unwrap();
        assert_eq!(ranked_names(&ranking).await, vec!["Kitchen", "Garden"]);
    }

    #[tokio::test]
    async fn test_favorites_need_live_product_and_user() {
        let f = fixture().await;
        let seller = user(&f.users, "seller@shop.test", &[Role::Seller]).await;
        let fan = user(&f.users, "fan@shop.test", &[]).await;
        let product = f
            .service
            .create_product(input(f.category_id, 1), vec![], seller.id)
            .await
            .unwrap()
            .product;

        assert!(matches!(
            f.service.toggle_favorite(product.id, Uuid::now_v7()).await,
            Err(ProductError::UserNotFound)
        ));

        let status = f.service.toggle_favorite(product.id, fan.id).await.unwrap();
        assert_eq!(
            status,
            FavoriteStatus {
                product_id: product.id,
                favorited: true,
                favorite_count: 1,
            }
        );
        let listed = f
            .service
            .list_favorites(fan.id, FavoritesQuery::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        f.service.delete_product(product.id, seller.id).await.unwrap();
        assert!(matches!(
            f.service.toggle_favorite(product.id, fan.id).await,
            Err(ProductError::NotFound(_))
        ));
        assert!(
            f.service
                .list_favorites(fan.id, FavoritesQuery::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_metrics_adapter_maps_errors() {
        let mut mock = MockProductRepository::new();
        mock.expect_category_totals()
            .with(eq(CategoryMetric::Views))
            .returning(|_| Err(ProductError::Internal("down".into())));

        let metrics = ProductCategoryMetrics::new(Arc::new(mock));
        let result = metrics.category_totals(CategoryMetric::Views).await;
        assert!(matches!(result, Err(CategoryError::Internal(_))));
    }
}
