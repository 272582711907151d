use serde::Deserialize;
use serde_json::Value;

/// Listing field names as stored.
pub mod fields {
    pub const NAME: &str = "name";
    pub const SUBCATEGORY: &str = "subcategory";
    pub const SELLER_EMAIL: &str = "sellerEmail";
    pub const PRICE: &str = "price";
    pub const QUANTITY: &str = "quantity";
    pub const DESCRIPTION: &str = "description";
    pub const PICTURE_URL: &str = "pictureUrl";
}

/// Name of the index backing name search.
pub const NAME_INDEX: &str = "toyCarsName";

/// Body of a listing update. Absent fields are written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PriceUpdate {
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default)]
    pub description: Value,
}

/// `?email=` on owner-scoped routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerQuery {
    pub email: Option<String>,
}
