//! API service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::{
        BuyRequest, CreateProductRequest, CreateUserRequest, NewUsernameRequest, NotPaidResponse,
        PayRequest, StatusResponse, UpdateProductRequest,
    },
};

/// Multipart field carrying legacy export files
pub const IMPORT_FIELD: &str = "files";

type IdPath = WithRejection<axum::extract::Path<i64>, ApiError>;
type NamePath = WithRejection<axum::extract::Path<String>, ApiError>;
type JsonBody<T> = WithRejection<Json<T>, ApiError>;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let import_routes = Router::new()
        .route("/import", post(import_legacy))
        .layer(DefaultBodyLimit::max(state.upload_limit_bytes));

    Router::new()
        .route("/health", get(health_check))
        .route("/user", get(get_users).post(create_user))
        .route("/user/:id", get(get_user).delete(delete_user))
        .route("/user/byUsername/:username", get(get_user_by_username))
        .route("/username", get(get_usernames))
        .route(
            "/username/:id",
            get(get_username).post(add_username).delete(delete_username),
        )
        .route("/product", get(get_products).post(create_product))
        .route(
            "/product/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/product/byBarcode/:barcode", get(get_product_by_barcode))
        .route("/purchase", get(get_purchases).post(create_purchase))
        .route("/purchase/notPaid", get(get_not_paid))
        .route("/purchase/notPaid/:user_id", get(get_not_paid_by_user))
        .route("/purchase/id/:id", get(get_purchase))
        .route("/purchase/pay", post(pay_purchases))
        .route("/payment", get(get_payments))
        .route("/payment/:id", get(get_payment))
        .merge(import_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    common::database::health_check(&state.db_pool).await?;

    Ok(Json(json!({
        "status": "ok",
        "service": "canteen-api"
    })))
}

/// Get all enabled users
pub async fn get_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.user_repository.get_all().await?;
    Ok(Json(users))
}

/// Get an enabled user by ID
pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", id)))?;

    Ok(Json(user))
}

/// Create a new user with its aliases
pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.user_repository.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Soft-delete a user
pub async fn delete_user(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    state.user_repository.disable(id).await?;
    Ok(Json(StatusResponse::ok()))
}

/// Get the user owning an alias
pub async fn get_user_by_username(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(username), _): NamePath,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("username {} not found", username)))?;

    Ok(Json(user))
}

/// Get all aliases
pub async fn get_usernames(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let usernames = state.username_repository.get_all().await?;
    Ok(Json(usernames))
}

/// Get an alias with its owner
pub async fn get_username(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    let username = state
        .username_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("username {} not found", id)))?;

    Ok(Json(username))
}

/// Append an alias to user `:id`
pub async fn add_username(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(user_id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<NewUsernameRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".to_string()));
    }

    let username = state
        .username_repository
        .add_to_user(user_id, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(username)))
}

/// Remove an alias
pub async fn delete_username(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    state.username_repository.delete(id).await?;
    Ok(Json(StatusResponse::ok()))
}

/// Get all enabled products
pub async fn get_products(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let products = state.product_repository.get_all().await?;
    Ok(Json(products))
}

/// Get an enabled product by ID
pub async fn get_product(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    let product = state
        .product_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {} not found", id)))?;

    Ok(Json(product))
}

/// Get an enabled product by barcode
pub async fn get_product_by_barcode(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(barcode), _): NamePath,
) -> ApiResult<impl IntoResponse> {
    let product = state
        .product_repository
        .find_by_barcode(&barcode)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product with barcode {} not found", barcode)))?;

    Ok(Json(product))
}

/// Create a new product
pub async fn create_product(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<CreateProductRequest>,
) -> ApiResult<impl IntoResponse> {
    let product = state.product_repository.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update an enabled product
pub async fn update_product(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<UpdateProductRequest>,
) -> ApiResult<impl IntoResponse> {
    let product = state.product_repository.update(id, &payload).await?;
    Ok(Json(product))
}

/// Soft-delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    state.product_repository.disable(id).await?;
    Ok(Json(StatusResponse::ok()))
}

/// Get all purchases
pub async fn get_purchases(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let purchases = state.purchase_repository.get_all().await?;
    Ok(Json(purchases))
}

/// Get every unpaid purchase
pub async fn get_not_paid(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let purchases = state.purchase_repository.get_not_paid().await?;
    Ok(Json(NotPaidResponse { purchases }))
}

/// Get the unpaid purchases of one user
pub async fn get_not_paid_by_user(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(user_id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    let purchases = state
        .purchase_repository
        .get_not_paid_by_user(user_id)
        .await?;

    Ok(Json(purchases))
}

/// Get a purchase by ID
pub async fn get_purchase(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    let purchase = state
        .purchase_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("purchase {} not found", id)))?;

    Ok(Json(purchase))
}

/// Record a purchase
pub async fn create_purchase(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<BuyRequest>,
) -> ApiResult<impl IntoResponse> {
    let purchase = state.purchase_repository.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// Settle unpaid purchases with one payment
pub async fn pay_purchases(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<PayRequest>,
) -> ApiResult<impl IntoResponse> {
    let payment = state.payment_repository.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// Get all payments
pub async fn get_payments(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let payments = state.payment_repository.get_all().await?;
    Ok(Json(payments))
}

/// Get a payment by ID
pub async fn get_payment(
    State(state): State<AppState>,
    WithRejection(axum::extract::Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    let payment = state
        .payment_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("payment {} not found", id)))?;

    Ok(Json(payment))
}

/// Import legacy export files uploaded as `files` multipart fields
pub async fn import_legacy(
    State(state): State<AppState>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let mut documents = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMPORT_FIELD) {
            warn!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        documents.push(field.bytes().await?);
    }

    if documents.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "no `{}` files uploaded",
            IMPORT_FIELD
        )));
    }

    info!("Importing {} legacy documents", documents.len());
    let summary = state.importer.import_raw(documents).await?;

    Ok(Json(summary))
}
