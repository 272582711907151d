//! Request-to-query mapping for listing routes. No I/O here.

use carzone_db::{Document, Filter, Projection, SortDirection};
use carzone_http::error::AppError;
use carzone_kernel::settings::MissingEmailPolicy;
use serde_json::Value;

use super::models::{fields, PriceUpdate};
use crate::utils::decode_slug;

/// Path segment on `/sort-car/{order}` that selects cheapest first.
const LOW_TO_HIGH: &str = "low";

pub fn category(slug: &str) -> Filter {
    Filter::eq(fields::SUBCATEGORY, decode_slug(slug))
}

/// Seller filter, with an absent email resolved by `policy`.
pub fn owner(email: Option<&str>, policy: MissingEmailPolicy) -> Result<Filter, AppError> {
    match (email, policy) {
        (Some(email), _) => Ok(Filter::eq(fields::SELLER_EMAIL, email)),
        (None, MissingEmailPolicy::MatchMissing) => Ok(Filter::eq(fields::SELLER_EMAIL, Value::Null)),
        (None, MissingEmailPolicy::MatchAll) => Ok(Filter::all()),
        (None, MissingEmailPolicy::Reject) => Err(AppError::missing_parameter("email")),
    }
}

pub fn name_search(text: &str) -> Filter {
    Filter::contains_ignore_case(fields::NAME, text)
}

pub fn price_order(segment: &str) -> SortDirection {
    if segment == LOW_TO_HIGH {
        SortDirection::Ascending
    } else {
        SortDirection::Descending
    }
}

pub fn gallery_projection() -> Projection {
    Projection::only([fields::PICTURE_URL])
}

/// The three overwritable fields, always all present.
pub fn price_update(update: PriceUpdate) -> Document {
    let mut set = Document::new();
    set.insert(fields::PRICE.to_string(), update.price);
    set.insert(fields::QUANTITY.to_string(), update.quantity);
    set.insert(fields::DESCRIPTION.to_string(), update.description);
    set
}
