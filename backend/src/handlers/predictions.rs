//! HTTP handlers for prediction endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use shared::{wire::parse_decimal, ProductSnapshot, ProductUpdate};

use super::ApiResponse;
use crate::error::{AppError, AppResult};
use crate::services::ingestion::{spreadsheet_extension, IngestionReport};
use crate::services::{
    IngestionService, PredictionService, ProjectionAdjustment, TransitOptions, TransitService,
};
use crate::AppState;

/// Multipart field carrying the spreadsheet
const UPLOAD_FIELD: &str = "excel";

const SPREADSHEET_MIME_TYPES: [&str; 3] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/octet-stream",
];

/// Input for adding transit units
#[derive(Debug, Deserialize)]
pub struct TransitUnitsRequest {
    pub units: Value,
    #[serde(flatten)]
    pub options: TransitOptions,
}

/// Input for changing transit days
#[derive(Debug, Deserialize)]
pub struct TransitDaysRequest {
    pub days: Value,
    #[serde(flatten)]
    pub options: TransitOptions,
}

/// Input for changing transit days from one projection period on
#[derive(Debug, Deserialize)]
pub struct ProjectionTransitDaysRequest {
    pub days: Value,
}

/// Accept JSON numbers and numeric strings. Numbers are read from their
/// literal text so `0.1` stays exactly one tenth.
fn parse_number(field: &str, value: &Value) -> AppResult<Decimal> {
    let number = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };
    number.ok_or_else(|| AppError::Validation {
        field: field.to_string(),
        message: format!("{} must be a number", field),
    })
}

fn parse_whole_number(field: &str, value: &Value) -> AppResult<i64> {
    let number = parse_number(field, value)?;
    number
        .fract()
        .is_zero()
        .then(|| number.to_i64())
        .flatten()
        .ok_or_else(|| AppError::Validation {
            field: field.to_string(),
            message: format!("{} must be a whole number", field),
        })
}

/// List every product prediction
pub async fn list_predictions(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ProductSnapshot>>>> {
    let service = PredictionService::new(state.store);
    let products = service.list().await?;
    let count = products.len();
    Ok(Json(ApiResponse::ok(products).with_count(count)))
}

/// Get one product prediction
pub async fn get_prediction(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<ProductSnapshot>>> {
    let service = PredictionService::new(state.store);
    let product = service.get(&code).await?;
    Ok(Json(ApiResponse::ok(product)))
}

/// Download the projection of one product as CSV
pub async fn export_report(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = PredictionService::new(state.store);
    let csv = service.export_csv(&code).await?;
    let disposition = format!("attachment; filename=\"proyeccion_{}.csv\"", code);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// Upload a spreadsheet and rebuild the snapshot from it
pub async fn refresh_predictions(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<IngestionReport>>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let extension = spreadsheet_extension(&file_name)
            .filter(|_| content_type.is_empty() || SPREADSHEET_MIME_TYPES.contains(&content_type.as_str()))
            .ok_or_else(|| AppError::Validation {
                field: UPLOAD_FIELD.to_string(),
                message: "Only Excel files (.xlsx, .xls) are accepted".to_string(),
            })?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Failed to read upload: {}", e)))?;
        upload = Some((bytes, extension));
        break;
    }

    let (bytes, extension) = upload.ok_or_else(|| AppError::Validation {
        field: UPLOAD_FIELD.to_string(),
        message: "No file uploaded".to_string(),
    })?;

    let service = IngestionService::new(state.store, state.config.ingestion.clone());
    let report = service.refresh(&bytes, &extension).await?;
    let count = report.products;
    Ok(Json(ApiResponse::ok(report).with_count(count)))
}

/// Add units in transit for a product
pub async fn apply_transit_units(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<TransitUnitsRequest>,
) -> AppResult<Json<ApiResponse<ProductSnapshot>>> {
    let units = parse_number("units", &input.units)?;
    let persist = input.options.persist;
    let service = TransitService::new(state.store.clone(), state.projection_context());
    let product = service.apply_transit_units(&code, units, input.options).await?;
    Ok(Json(ApiResponse::ok(product).with_persisted(persist)))
}

/// Set global transit days for a product
pub async fn apply_transit_days(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<TransitDaysRequest>,
) -> AppResult<Json<ApiResponse<ProductSnapshot>>> {
    let days = parse_whole_number("days", &input.days)?;
    let persist = input.options.persist;
    let service = TransitService::new(state.store.clone(), state.projection_context());
    let product = service.apply_transit_days(&code, days, input.options).await?;
    Ok(Json(ApiResponse::ok(product).with_persisted(persist)))
}

/// Set transit days from one projection period onwards
pub async fn apply_transit_days_to_projection(
    State(state): State<AppState>,
    Path((code, index)): Path<(String, i64)>,
    Json(input): Json<ProjectionTransitDaysRequest>,
) -> AppResult<Json<ApiResponse<ProductSnapshot>>> {
    let days = parse_whole_number("days", &input.days)?;
    let service = TransitService::new(state.store.clone(), state.projection_context());
    let ProjectionAdjustment {
        product,
        affected_projections,
    } = service
        .apply_transit_days_to_projection(&code, index, days)
        .await?;
    Ok(Json(
        ApiResponse::ok(product).with_affected_projections(affected_projections),
    ))
}

/// Merge a partial update into a product
pub async fn update_prediction(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<Json<ApiResponse<ProductSnapshot>>> {
    let update = ProductUpdate::from_json(payload)?;
    let service = TransitService::new(state.store.clone(), state.projection_context());
    let product = service.update_product(&code, update).await?;
    Ok(Json(ApiResponse::ok(product)))
}
