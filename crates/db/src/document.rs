use std::fmt;
use std::str::FromStr;

use mongodb::bson::oid::ObjectId;
use serde_json::Value;

use crate::error::StoreError;

/// A stored document as it crosses the data-access boundary.
pub type Document = serde_json::Map<String, Value>;

/// Field holding the store-assigned identifier.
pub const ID_FIELD: &str = "_id";

/// Store-assigned document identifier (a 12-byte ObjectId).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(ObjectId);

impl DocumentId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub(crate) fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl FromStr for DocumentId {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(raw)
            .map(Self)
            .map_err(|_| StoreError::InvalidIdentifier(raw.to_string()))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl From<DocumentId> for Value {
    fn from(id: DocumentId) -> Self {
        Value::String(id.to_hex())
    }
}
