pub mod handlers;
pub mod models;
pub mod queries;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use carzone_db::{Collection, Database, IndexSpec};
use carzone_kernel::settings::ListingSettings;
use carzone_kernel::{InitCtx, Module};
use serde_json::json;

use models::{fields, NAME_INDEX};

/// Shared state handed to every listing route
#[derive(Clone, Debug)]
pub struct CarsState {
    pub listings: Collection,
    pub settings: ListingSettings,
}

/// Toy car listings: every route maps to exactly one store operation
pub struct CarsModule {
    state: CarsState,
}

impl CarsModule {
    pub fn new(db: &Database, settings: &ListingSettings) -> Self {
        Self {
            state: CarsState {
                listings: db.collection(&settings.collection),
                settings: settings.clone(),
            },
        }
    }
}

#[async_trait]
impl Module for CarsModule {
    fn name(&self) -> &'static str {
        "cars"
    }

    fn base_path(&self) -> String {
        "/".to_string()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            collection = %self.state.listings.name(),
            missing_email = ?self.state.settings.missing_email,
            "cars module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::liveness))
            .route("/cars", get(handlers::list_cars).post(handlers::create_car))
            .route(
                "/cars/{id}",
                get(handlers::get_car)
                    .patch(handlers::update_car)
                    .delete(handlers::delete_car),
            )
            .route("/categories/{cat}", get(handlers::cars_by_category))
            .route("/my-toys", get(handlers::my_toys))
            .route("/search/{text}", get(handlers::search_cars))
            .route("/sort-car/{order}", get(handlers::sorted_my_toys))
            .route("/gallery-images", get(handlers::gallery_images))
            .with_state(self.state.clone())
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        vec![IndexSpec::ascending(
            self.state.listings.name(),
            fields::NAME,
            NAME_INDEX,
        )]
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "cars module stopped");
        Ok(())
    }
}

fn listing_array(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "array",
                    "items": { "$ref": "#/components/schemas/Listing" }
                }
            }
        }
    })
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn schema_response(description: &str, schema: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

fn path_param(name: &str, description: &str) -> serde_json::Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "description": description,
        "schema": { "type": "string" }
    })
}

fn json_body(schema: &str) -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

/// GET operation returning a listing array
fn listing_query(
    summary: &str,
    parameters: Vec<serde_json::Value>,
    description: &str,
) -> serde_json::Value {
    json!({
        "get": {
            "summary": summary,
            "tags": ["Cars"],
            "parameters": parameters,
            "responses": {
                "200": listing_array(description),
                "400": error_response("Malformed parameter or email required by configuration"),
                "500": error_response("Store failure")
            }
        }
    })
}

fn email_param() -> serde_json::Value {
    json!({
        "name": "email",
        "in": "query",
        "required": false,
        "description": "Seller email",
        "schema": { "type": "string" }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = path_param("id", "Listing identifier (24 hex characters)");
    let mut paths = serde_json::Map::new();

    paths.insert(
        "/".to_string(),
        json!({
            "get": {
                "summary": "Liveness",
                "tags": ["Cars"],
                "responses": {
                    "200": {
                        "description": "Server is running",
                        "content": { "text/plain": { "schema": { "type": "string" } } }
                    }
                }
            }
        }),
    );

    paths.insert(
        "/cars".to_string(),
        json!({
            "get": {
                "summary": "List listings (capped)",
                "tags": ["Cars"],
                "responses": {
                    "200": listing_array("Up to the configured number of listings"),
                    "500": error_response("Store failure")
                }
            },
            "post": {
                "summary": "Create a listing from the body as sent",
                "tags": ["Cars"],
                "requestBody": json_body("Listing"),
                "responses": {
                    "200": schema_response("Insert acknowledgment", "InsertAck"),
                    "500": error_response("Store failure")
                }
            }
        }),
    );

    paths.insert(
        "/cars/{id}".to_string(),
        json!({
            "get": {
                "summary": "Get one listing; null when absent",
                "tags": ["Cars"],
                "parameters": [id_param.clone()],
                "responses": {
                    "200": schema_response("Listing or null", "Listing"),
                    "400": error_response("Malformed identifier"),
                    "500": error_response("Store failure")
                }
            },
            "patch": {
                "summary": "Overwrite price, quantity and description",
                "tags": ["Cars"],
                "parameters": [id_param.clone()],
                "requestBody": json_body("PriceUpdate"),
                "responses": {
                    "200": schema_response("Update acknowledgment", "UpdateAck"),
                    "400": error_response("Malformed identifier"),
                    "500": error_response("Store failure")
                }
            },
            "delete": {
                "summary": "Delete one listing",
                "tags": ["Cars"],
                "parameters": [id_param],
                "responses": {
                    "200": schema_response("Delete acknowledgment", "DeleteAck"),
                    "400": error_response("Malformed identifier"),
                    "500": error_response("Store failure")
                }
            }
        }),
    );

    paths.insert(
        "/categories/{cat}".to_string(),
        listing_query(
            "Listings in a subcategory (hyphens read as spaces)",
            vec![path_param("cat", "Subcategory slug, e.g. sports-car")],
            "Listings in the subcategory",
        ),
    );
    paths.insert(
        "/my-toys".to_string(),
        listing_query("Listings by seller", vec![email_param()], "Seller's listings"),
    );
    paths.insert(
        "/search/{text}".to_string(),
        listing_query(
            "Case-insensitive name search",
            vec![path_param("text", "Substring of the listing name")],
            "Matching listings",
        ),
    );
    paths.insert(
        "/sort-car/{order}".to_string(),
        listing_query(
            "Seller's listings sorted by price",
            vec![
                path_param("order", "`low` for ascending price, anything else for descending"),
                email_param(),
            ],
            "Listings ordered by price",
        ),
    );

    paths.insert(
        "/gallery-images".to_string(),
        json!({
            "get": {
                "summary": "Picture references for the gallery",
                "tags": ["Cars"],
                "responses": {
                    "200": {
                        "description": "Up to the configured number of pictures",
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "array",
                                    "items": { "$ref": "#/components/schemas/GalleryImage" }
                                }
                            }
                        }
                    },
                    "500": error_response("Store failure")
                }
            }
        }),
    );

    json!({
        "paths": paths,
        "components": { "schemas": schemas() }
    })
}

fn schemas() -> serde_json::Value {
    let mut schemas = serde_json::Map::new();

    schemas.insert(
        "Listing".to_string(),
        json!({
            "type": "object",
            "additionalProperties": true,
            "properties": {
                "_id": { "type": "string", "description": "Store-assigned identifier" },
                "name": { "type": "string" },
                "subcategory": { "type": "string" },
                "sellerEmail": { "type": "string" },
                "price": { "type": "number" },
                "quantity": { "type": "number" },
                "description": { "type": "string" },
                "pictureUrl": { "type": "string" }
            }
        }),
    );
    schemas.insert(
        "GalleryImage".to_string(),
        json!({
            "type": "object",
            "properties": { "pictureUrl": { "type": "string" } }
        }),
    );
    schemas.insert(
        "PriceUpdate".to_string(),
        json!({
            "type": "object",
            "properties": {
                "price": { "type": "number" },
                "quantity": { "type": "number" },
                "description": { "type": "string" }
            }
        }),
    );
    schemas.insert(
        "InsertAck".to_string(),
        json!({
            "type": "object",
            "properties": {
                "acknowledged": { "type": "boolean" },
                "insertedId": { "type": "string" }
            },
            "required": ["acknowledged", "insertedId"]
        }),
    );
    schemas.insert(
        "UpdateAck".to_string(),
        json!({
            "type": "object",
            "properties": {
                "acknowledged": { "type": "boolean" },
                "matchedCount": { "type": "integer" },
                "modifiedCount": { "type": "integer" },
                "upsertedCount": { "type": "integer" },
                "upsertedId": { "type": "string" }
            },
            "required": ["acknowledged", "matchedCount", "modifiedCount"]
        }),
    );
    schemas.insert(
        "DeleteAck".to_string(),
        json!({
            "type": "object",
            "properties": {
                "acknowledged": { "type": "boolean" },
                "deletedCount": { "type": "integer" }
            },
            "required": ["acknowledged", "deletedCount"]
        }),
    );

    serde_json::Value::Object(schemas)
}

/// Create a new instance of the cars module
pub fn create_module(db: &Database, settings: &ListingSettings) -> Arc<dyn Module> {
    Arc::new(CarsModule::new(db, settings))
}
