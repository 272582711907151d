//! Project-specific utilities live here.

/// Turn a URL slug such as `sports-car` back into the stored words (`sports car`).
pub fn decode_slug(slug: &str) -> String {
    slug.replace('-', " ")
}
