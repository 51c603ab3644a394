
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use yardwork::api::router;
use yardwork::config::GuardConfig;

use test_harness::{
    empty_request, json_request, send, test_app, test_state, test_state_with_uploads,
};

fn job_body(customer_id: &str, lat: f64, lon: f64) -> Value {
    json!({
        "customer_id": customer_id,
        "job_type": "Lawn Care",
        "job_details": ["Front Only"],
        "delivery_address": "1 Beacon St, Boston, MA",
        "delivery_coords": {"lat": lat, "lon": lon},
        "scheduled_type": "ASAP",
        "size": "Small",
        "before_photos": ["https://photos.example/before_1.jpg"]
    })
}

async fn create(app: &axum::Router, body: Value) -> String {
    let (status, body) = send(app, json_request("POST", "/jobs/add", &body)).await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", body);
    body["job_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, _) = send(&app, empty_request("GET", "/")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_add_and_get_jobs() {
    let app = test_app();
    let job_id = create(&app, job_body("cust-1", 42.36, -71.06)).await;
    create(&app, job_body("cust-2", 42.36, -71.06)).await;

    let (status, body) = send(&app, empty_request("GET", "/jobs/get/cust-1")).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["job_id"], job_id);
    assert_eq!(jobs[0]["job_type"], "Lawn Care");
    assert_eq!(jobs[0]["scheduled_type"], "ASAP");
    assert_eq!(jobs[0]["provider_id"], Value::Null);
    assert_eq!(jobs[0]["after_photos"], Value::Null);
    let status_log = jobs[0]["job_status"].as_array().unwrap();
    assert_eq!(status_log.len(), 1);
    assert!(status_log[0].as_str().unwrap().starts_with("Pending: "));
    assert!(jobs[0].get("revision").is_none());

    let (_, body) = send(&app, empty_request("GET", "/jobs/get")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_invalid_job() {
    let app = test_app();
    let mut body = job_body("cust-1", 42.36, -71.06);
    body["job_type"] = json!("Ice Fishing");
    body["size"] = json!("Huge");

    let (status, body) = send(&app, json_request("POST", "/jobs/add", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.contains(&json!("Invalid job type.")));
    assert!(errors.contains(&json!("Invalid size. It must be 'Small', 'Medium', or 'Large'.")));
}

#[tokio::test]
async fn test_add_job_without_photos() {
    let app = test_app();
    let mut body = job_body("cust-1", 42.36, -71.06);
    body["before_photos"] = json!([]);

    let (status, body) = send(&app, json_request("POST", "/jobs/add", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["No photo URLs provided."]));
}

#[tokio::test]
async fn test_full_job_flow() {
    let app = test_app();
    let job_id = create(&app, job_body("cust-1", 42.36, -71.06)).await;

    let accept = json!({"job_id": job_id, "provider_id": "prov-1"});
    let (status, _) = send(&app, json_request("PUT", "/jobs/accept", &accept)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, empty_request("PUT", &format!("/jobs/update/{}", job_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job_status"].as_array().unwrap().len(), 2);
    assert!(body["job_status"][0].as_str().unwrap().starts_with("Accepted: "));

    let (_, body) = send(&app, empty_request("PUT", &format!("/jobs/update/{}", job_id))).await;
    assert!(body["job_status"][0].as_str().unwrap().starts_with("Completed: "));

    let (status, body) = send(&app, empty_request("PUT", &format!("/jobs/update/{}", job_id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Job status cannot be updated. This job is already completed."
    );

    let complete = json!({"job_id": job_id, "after_photos": ["https://photos.example/after_1.jpg"]});
    let (status, body) = send(&app, json_request("PUT", "/jobs/complete", &complete)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["after_photos"], json!(["https://photos.example/after_1.jpg"]));

    let feedback = json!({"job_id": job_id, "rating": 4, "feedback": "<b>Nice</b> and tidy"});
    let (status, body) = send(&app, json_request("PUT", "/jobs/feedback", &feedback)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 4);
    assert_eq!(body["feedback"], "4|Nice and tidy");

    let (status, body) = send(&app, json_request("PUT", "/jobs/feedback", &feedback)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        format!("Feedback for Job ID {} has already been submitted.", job_id)
    );

    let (status, body) = send(&app, empty_request("GET", "/providers/prov-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["providerId"], "prov-1");
    assert_eq!(body["ratingCount"], 2);
    assert_eq!(body["totalRating"], 9);
    assert_eq!(body["servicesCompleted"], 1);
    assert_eq!(body["averageRating"], 4.5);
    assert_eq!(body["feedback"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, empty_request("GET", "/jobs/get-by-provider/prov-1")).await;
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["feedback"], "4|Nice and tidy");
}

#[tokio::test]
async fn test_cancel_endpoint() {
    let app = test_app();
    let job_id = create(&app, job_body("cust-1", 42.36, -71.06)).await;

    let (status, _) = send(&app, empty_request("PUT", &format!("/jobs/cancel/{}", job_id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let accept = json!({"job_id": job_id, "provider_id": "prov-1"});
    send(&app, json_request("PUT", "/jobs/accept", &accept)).await;
    send(&app, empty_request("PUT", &format!("/jobs/update/{}", job_id))).await;

    let (status, body) = send(&app, empty_request("PUT", &format!("/jobs/cancel/{}", job_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Job successfully canceled.");
    assert_eq!(body["job_status"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_not_found_responses() {
    let app = test_app();
    let (status, body) =
        send(&app, empty_request("PUT", "/jobs/update/INP-9999999999999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Job with ID INP-9999999999999 not found.");

    let (status, _) = send(&app, empty_request("DELETE", "/jobs/delete/INP-9999999999999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, empty_request("GET", "/providers/nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint() {
    let app = test_app();
    let job_id = create(&app, job_body("cust-1", 42.36, -71.06)).await;

    let (status, body) = send(&app, empty_request("DELETE", &format!("/jobs/delete/{}", job_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Job deleted successfully.");

    let (_, body) = send(&app, empty_request("GET", "/jobs/get")).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_available_jobs() {
    let app = test_app();
    let near = create(&app, job_body("cust-1", 42.37, -71.06)).await;
    let far = create(&app, job_body("cust-2", 42.60, -71.06)).await;
    create(&app, job_body("cust-3", 40.71, -74.00)).await;

    let (status, body) = send(
        &app,
        empty_request("GET", "/jobs/available?lat=42.36&lon=-71.06&range=25"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["job_id"], near);
    assert_eq!(jobs[1]["job_id"], far);
    assert!(jobs[0]["distance_miles"].as_f64().unwrap() < jobs[1]["distance_miles"].as_f64().unwrap());

    let (status, _) = send(&app, empty_request("GET", "/jobs/available?lat=42.36")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_provider() {
    let app = test_app();
    let body = json!({
        "providerId": "prov-9",
        "name": "Sam",
        "coords": {"lat": 42.36, "lon": -71.06},
        "serviceRangeMiles": 15.0
    });
    let (status, _) = send(&app, json_request("POST", "/providers/register", &body)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, empty_request("GET", "/providers/prov-9")).await;
    assert_eq!(body["name"], "Sam");
    assert_eq!(body["serviceRangeMiles"], 15.0);
    assert_eq!(body["ratingCount"], 1);
    assert_eq!(body["averageRating"], 5.0);
}

#[tokio::test]
async fn test_presign_disabled_without_bucket() {
    let app = router(test_state(GuardConfig::default()));
    let body = json!({"jobId": "INP-1234567890123", "photoType": "before", "fileNumber": 1, "fileExtension": ".jpg"});
    let (status, _) = send(&app, json_request("POST", "/s3/generate-presigned-url", &body)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_presign_upload() {
    let app = router(test_state_with_uploads(GuardConfig::default()));
    let body = json!({"jobId": "INP-1234567890123", "photoType": "before", "fileNumber": 1, "fileExtension": ".jpg"});
    let (status, body) = send(&app, json_request("POST", "/s3/generate-presigned-url", &body)).await;
    assert_eq!(status, StatusCode::OK);
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with(
        "https://yardwork-photos.s3.us-east-2.amazonaws.com/INP-1234567890123_before_1.jpg?"
    ));
    assert!(url.contains("X-Amz-Signature="));

    let bad = json!({"jobId": "", "photoType": "before", "fileNumber": 1, "fileExtension": ".jpg"});
    let (status, body) = send(&app, json_request("POST", "/s3/generate-presigned-url", &bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["Invalid request parameters."]));
}

#[tokio::test]
async fn test_malformed_bodies_use_error_shape() {
    let app = test_app();

    let wrong_type = json!({"job_id": "INP-1234567890123", "rating": "5"});
    let (status, body) = send(&app, json_request("PUT", "/jobs/feedback", &wrong_type)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);

    let mut coords_as_strings = job_body("cust-1", 42.36, -71.06);
    coords_as_strings["delivery_coords"] = json!({"lat": "north", "lon": "west"});
    let (status, body) =
        send(&app, json_request("POST", "/jobs/add", &coords_as_strings)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");

    let broken = Request::builder()
        .method("PUT")
        .uri("/jobs/accept")
        .header("content-type", "application/json")
        .body(Body::from("{\"job_id\": "))
        .unwrap();
    let (status, body) = send(&app, broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");

    let (status, body) = send(
        &app,
        empty_request("GET", "/jobs/available?lat=abc&lon=-71.06&range=25"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
}
