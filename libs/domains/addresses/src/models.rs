use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Who an address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressOwner {
    User(Uuid),
    Company(Uuid),
}

impl AddressOwner {
    /// Value of the `owner_kind` column
    pub fn kind(&self) -> &'static str {
        match self {
            AddressOwner::User(_) => "USER",
            AddressOwner::Company(_) => "COMPANY",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            AddressOwner::User(id) | AddressOwner::Company(id) => *id,
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "USER" => Some(AddressOwner::User(id)),
            "COMPANY" => Some(AddressOwner::Company(id)),
            _ => None,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AddressType {
    Billing,
    Shipping,
    Expedition,
    Contact,
}

/// Postal address of a user or a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub owner: AddressOwner,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub reference: Option<String>,
    pub address_type: AddressType,
    /// At most one per (owner, address_type)
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    pub fn new(owner: AddressOwner, input: AddressRequest) -> Self {
        let now = Utc::now();
        let mut address = Self {
            id: Uuid::now_v7(),
            owner,
            name: String::new(),
            email: None,
            phone_number: None,
            address_line1: String::new(),
            address_line2: None,
            city: String::new(),
            state: None,
            postal_code: String::new(),
            country: String::new(),
            reference: None,
            address_type: input.address_type,
            is_default: false,
            created_at: now,
            updated_at: now,
        };
        input.apply_to(&mut address);
        address
    }
}

/// Body for adding or replacing an address
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub address_line1: String,
    #[validate(length(max = 255))]
    pub address_line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(max = 255))]
    pub reference: Option<String>,
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressRequest {
    /// Copies every field, including `is_default`, onto `address`.
    pub fn apply_to(self, address: &mut Address) {
        address.name = self.name;
        address.email = self.email;
        address.phone_number = self.phone_number;
        address.address_line1 = self.address_line1;
        address.address_line2 = self.address_line2;
        address.city = self.city;
        address.state = self.state;
        address.postal_code = self.postal_code;
        address.country = self.country;
        address.reference = self.reference;
        address.address_type = self.address_type;
        address.is_default = self.is_default;
    }
}

/// Page request, zero-based
#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_page_size(),
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

fn default_page_size() -> u64 {
    20
}

/// One page of addresses, default first then oldest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressPage {
    pub items: Vec<Address>,
    pub page: u64,
    pub size: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressSummary {
    pub count: u64,
    pub has_addresses: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HasDefaultResponse {
    pub address_type: AddressType,
    pub has_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: u64,
}

/// Default first, then by creation time.
pub(crate) fn display_order(a: &Address, b: &Address) -> std::cmp::Ordering {
    b.is_default
        .cmp(&a.is_default)
        .then(a.created_at.cmp(&b.created_at))
}
