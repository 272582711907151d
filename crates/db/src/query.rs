//! Store-agnostic query descriptions.
//!
//! These are plain data. Each backend translates them into its own dialect.

use serde::Deserialize;
use serde_json::Value;

/// One condition on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Field equals the value. `Value::Null` matches documents where the
    /// field is null or absent.
    Eq { field: String, value: Value },
    /// Field is a string containing `text`, ignoring case.
    ContainsIgnoreCase { field: String, text: String },
}

/// Conjunction of clauses. An empty filter matches every document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    pub fn contains_ignore_case(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::all().and_contains_ignore_case(field, text)
    }

    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn and_contains_ignore_case(
        mut self,
        field: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.clauses.push(Clause::ContainsIgnoreCase {
            field: field.into(),
            text: text.into(),
        });
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Numeric form used by document stores (`1` / `-1`).
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Fields to keep in returned documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub fields: Vec<String>,
    pub include_id: bool,
}

impl Projection {
    /// Keep only the named fields; the identifier is dropped.
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            include_id: false,
        }
    }

    pub fn with_id(mut self) -> Self {
        self.include_id = true;
        self
    }
}

/// Everything needed to run one `find`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
    pub projection: Option<Projection>,
}

impl FindQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}

/// Single-field index declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub collection: String,
    pub field: String,
    pub direction: SortDirection,
    pub name: String,
}

impl IndexSpec {
    pub fn ascending(
        collection: impl Into<String>,
        field: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            direction: SortDirection::Ascending,
            name: name.into(),
        }
    }
}
