use axum::{
    extract::{Path, Query, State},
    Json,
};
use carzone_db::{DeleteAck, Document, DocumentId, InsertAck, UpdateAck};
use carzone_http::error::AppError;

use super::models::{fields, OwnerQuery, PriceUpdate};
use super::{queries, CarsState};

type Listings = Result<Json<Vec<Document>>, AppError>;

/// Liveness text served at `/`
pub async fn liveness() -> &'static str {
    "Toy Car Zone server is running"
}

/// `GET /cars`
pub async fn list_cars(State(state): State<CarsState>) -> Listings {
    let cars = state
        .listings
        .find(carzone_db::Filter::all())
        .limit(state.settings.list_limit)
        .await?;
    Ok(Json(cars))
}

/// `GET /categories/{cat}`
pub async fn cars_by_category(
    State(state): State<CarsState>,
    Path(category): Path<String>,
) -> Listings {
    let cars = state.listings.find(queries::category(&category)).await?;
    Ok(Json(cars))
}

/// `GET /cars/{id}`; an unknown id answers `null`
pub async fn get_car(
    State(state): State<CarsState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Document>>, AppError> {
    let id: DocumentId = id.parse()?;
    let car = state.listings.find_one(&id).await?;
    Ok(Json(car))
}

/// `GET /my-toys?email=`
pub async fn my_toys(State(state): State<CarsState>, Query(query): Query<OwnerQuery>) -> Listings {
    let filter = queries::owner(query.email.as_deref(), state.settings.missing_email)?;
    let cars = state.listings.find(filter).await?;
    Ok(Json(cars))
}

/// `GET /search/{text}`
pub async fn search_cars(State(state): State<CarsState>, Path(text): Path<String>) -> Listings {
    let cars = state.listings.find(queries::name_search(&text)).await?;
    Ok(Json(cars))
}

/// `GET /sort-car/{order}?email=`
pub async fn sorted_my_toys(
    State(state): State<CarsState>,
    Path(order): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> Listings {
    let filter = queries::owner(query.email.as_deref(), state.settings.missing_email)?;
    let cars = state
        .listings
        .find(filter)
        .sort(fields::PRICE, queries::price_order(&order))
        .await?;
    Ok(Json(cars))
}

/// `GET /gallery-images`
pub async fn gallery_images(State(state): State<CarsState>) -> Listings {
    let pictures = state
        .listings
        .find(carzone_db::Filter::all())
        .projection(queries::gallery_projection())
        .limit(state.settings.gallery_limit)
        .await?;
    Ok(Json(pictures))
}

/// `POST /cars`; the body is stored as sent
pub async fn create_car(
    State(state): State<CarsState>,
    Json(listing): Json<Document>,
) -> Result<Json<InsertAck>, AppError> {
    let ack = state.listings.insert_one(listing).await?;
    tracing::info!(id = %ack.inserted_id, "listing created");
    Ok(Json(ack))
}

/// `PATCH /cars/{id}`
pub async fn update_car(
    State(state): State<CarsState>,
    Path(id): Path<String>,
    Json(update): Json<PriceUpdate>,
) -> Result<Json<UpdateAck>, AppError> {
    let id: DocumentId = id.parse()?;
    let ack = state
        .listings
        .update_one(&id, queries::price_update(update))
        .await?;
    Ok(Json(ack))
}

/// `DELETE /cars/{id}`
pub async fn delete_car(
    State(state): State<CarsState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    let id: DocumentId = id.parse()?;
    let ack = state.listings.delete_one(&id).await?;
    Ok(Json(ack))
}
