use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::extract::{JsonBody, QueryParams};
use crate::api::ApiState;
use crate::error::{Result, YardworkError};
use crate::jobs::{Coords, Job, JobRequest, StatusLog};
use crate::marketplace::AvailableJob;
use crate::providers::feedback::INVALID_RATING;
use crate::providers::ProviderProfile;
use crate::uploads::PresignRequest;

#[derive(Serialize)]
pub(crate) struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
pub(crate) struct CreatedResponse {
    message: &'static str,
    job_id: String,
}

#[derive(Serialize)]
pub(crate) struct StatusResponse {
    message: &'static str,
    job_status: StatusLog,
}

#[derive(Serialize)]
pub(crate) struct CompletedResponse {
    message: &'static str,
    after_photos: Vec<String>,
}

#[derive(Serialize)]
pub(crate) struct FeedbackResponse {
    message: &'static str,
    rating: u8,
    feedback: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProviderResponse {
    #[serde(flatten)]
    profile: ProviderProfile,
    average_rating: Option<f64>,
}

#[derive(Serialize)]
pub(crate) struct UploadResponse {
    url: String,
}

#[derive(Deserialize)]
pub(crate) struct AcceptRequest {
    #[serde(default)]
    job_id: String,
    #[serde(default)]
    provider_id: String,
}

#[derive(Deserialize)]
pub(crate) struct CompleteRequest {
    #[serde(default)]
    job_id: String,
    #[serde(default)]
    after_photos: Vec<String>,
}

#[derive(Deserialize)]
pub(crate) struct FeedbackRequest {
    #[serde(default)]
    job_id: String,
    rating: i64,
    feedback: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest {
    #[serde(default)]
    provider_id: String,
    #[serde(default)]
    name: String,
    coords: Option<Coords>,
    service_range_miles: Option<f64>,
}

#[derive(Deserialize)]
pub(crate) struct AvailableQuery {
    lat: Option<f64>,
    lon: Option<f64>,
    range: Option<f64>,
}

pub(crate) async fn health() -> &'static str {
    "Yardwork API is running."
}

pub(crate) async fn add_job(
    State(state): State<ApiState>,
    JsonBody(request): JsonBody<JobRequest>,
) -> Result<Json<CreatedResponse>> {
    let job_id = state.marketplace.create_job(request).await?;
    Ok(Json(CreatedResponse {
        message: "Job added successfully.",
        job_id,
    }))
}

pub(crate) async fn list_jobs(State(state): State<ApiState>) -> Json<Vec<Job>> {
    Json(state.marketplace.list_jobs(None).await)
}

pub(crate) async fn list_customer_jobs(
    State(state): State<ApiState>,
    Path(customer_id): Path<String>,
) -> Json<Vec<Job>> {
    Json(state.marketplace.list_jobs(Some(&customer_id)).await)
}

pub(crate) async fn list_provider_jobs(
    State(state): State<ApiState>,
    Path(provider_id): Path<String>,
) -> Json<Vec<Job>> {
    Json(state.marketplace.list_jobs_by_provider(&provider_id).await)
}

pub(crate) async fn list_available_jobs(
    State(state): State<ApiState>,
    QueryParams(query): QueryParams<AvailableQuery>,
) -> Result<Json<Vec<AvailableJob>>> {
    let (Some(lat), Some(lon), Some(range)) = (query.lat, query.lon, query.range) else {
        return Err(YardworkError::invalid(
            "Query parameters lat, lon and range are required.",
        ));
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) || range < 0.0 {
        return Err(YardworkError::invalid("Invalid location or range."));
    }
    Ok(Json(
        state
            .marketplace
            .list_available_jobs(Coords::new(lat, lon), range)
            .await,
    ))
}

pub(crate) async fn delete_job(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.marketplace.delete_job(&job_id).await?;
    Ok(Json(MessageResponse {
        message: "Job deleted successfully.",
    }))
}

pub(crate) async fn accept_job(
    State(state): State<ApiState>,
    JsonBody(request): JsonBody<AcceptRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .marketplace
        .accept_job(&request.job_id, &request.provider_id)
        .await?;
    Ok(Json(MessageResponse {
        message: "Job accepted successfully.",
    }))
}

pub(crate) async fn advance_status(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let job_status = state.marketplace.advance_status(&job_id).await?;
    Ok(Json(StatusResponse {
        message: "Job status updated successfully.",
        job_status,
    }))
}

pub(crate) async fn cancel_job(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let job_status = state.marketplace.cancel_job(&job_id).await?;
    Ok(Json(StatusResponse {
        message: "Job successfully canceled.",
        job_status,
    }))
}

pub(crate) async fn complete_job(
    State(state): State<ApiState>,
    JsonBody(request): JsonBody<CompleteRequest>,
) -> Result<Json<CompletedResponse>> {
    state
        .marketplace
        .complete_job(&request.job_id, request.after_photos.clone())
        .await?;
    Ok(Json(CompletedResponse {
        message: "Job completed successfully.",
        after_photos: request.after_photos,
    }))
}

pub(crate) async fn submit_feedback(
    State(state): State<ApiState>,
    JsonBody(request): JsonBody<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>> {
    let rating = u8::try_from(request.rating).map_err(|_| YardworkError::invalid(INVALID_RATING))?;
    let stored = state
        .marketplace
        .submit_feedback(&request.job_id, rating, request.feedback.as_deref())
        .await?;
    Ok(Json(FeedbackResponse {
        message: "Feedback submitted successfully.",
        rating: stored.rating,
        feedback: stored.job_value(),
    }))
}

pub(crate) async fn register_provider(
    State(state): State<ApiState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Json<MessageResponse>> {
    let mut profile = ProviderProfile::new(request.provider_id, request.name);
    if let (Some(coords), Some(range)) = (request.coords, request.service_range_miles) {
        profile = profile.with_service_area(coords, range);
    }
    state.marketplace.register_provider(profile)?;
    Ok(Json(MessageResponse {
        message: "Provider registered successfully.",
    }))
}

pub(crate) async fn provider_profile(
    State(state): State<ApiState>,
    Path(provider_id): Path<String>,
) -> Result<Json<ProviderResponse>> {
    let profile = state.marketplace.provider(&provider_id)?;
    Ok(Json(ProviderResponse {
        average_rating: profile.average_rating(),
        profile,
    }))
}

pub(crate) async fn presign_upload(
    State(state): State<ApiState>,
    JsonBody(request): JsonBody<PresignRequest>,
) -> Result<Json<UploadResponse>> {
    let presigner = state
        .presigner
        .as_ref()
        .ok_or(YardworkError::UploadsDisabled)?;
    let url = presigner.presign_photo_upload(&request, Utc::now())?;
    Ok(Json(UploadResponse { url }))
}
