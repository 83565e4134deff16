use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// `None` for root categories
    pub parent_id: Option<Uuid>,
    #[serde(skip)]
    pub image_content: Option<Vec<u8>>,
    #[serde(skip)]
    pub image_content_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: String, description: Option<String>, parent_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name,
            description,
            parent_id,
            image_content: None,
            image_content_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_content.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// A category with its subcategories, recursively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    #[schema(no_recursion)]
    pub subcategories: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn leaf(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            parent_id: category.parent_id,
            subcategories: Vec::new(),
        }
    }
}

/// Product aggregates categories can be ranked by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum CategoryMetric {
    Favorites,
    Views,
    Quantity,
    ProductCount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryMetricTotal {
    pub category: Category,
    pub total: i64,
}

/// Base64 image sent inline with a JSON body.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct InlineImage {
    #[validate(length(min = 1))]
    pub content_type: String,
    /// Standard base64, no data-URI prefix
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    #[validate(nested)]
    pub image: Option<InlineImage>,
}

/// Replaces name, description and parent. A missing `parent_id` makes the
/// category a root.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct CategoryFilter {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct NameQuery {
    /// Case-insensitive fragment of the name
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}
