use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use precept_core::calendar::parse_iso_date;
use precept_core::export::{ExportFormat, NO_ENTRIES};
use precept_core::models::{
    CustomPrompt, DailyEntry, Entry, HeatmapDay, MeditationLog, MeditationPoint, NewMeditation,
    NewResponse, PreceptAverage, PreceptResponse, PromptUpdate, Setting, StreakInfo,
    WeeklyReflection, WeeklySummary, validate_minutes, validate_precept_number, validate_rating,
};
use precept_core::precepts::{PRECEPTS, Precept};
use precept_core::service::JournalService;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<JournalService>>,
    api_key: Option<String>,
}

impl AppState {
    fn svc(&self) -> MutexGuard<'_, JournalService> {
        self.svc
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct RangeQuery {
    start: String,
    end: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

#[derive(Deserialize)]
struct DaysQuery {
    days: Option<u32>,
}

#[derive(Deserialize)]
struct PromptListQuery {
    precept: Option<i64>,
}

#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportQuery {
    #[serde(default = "default_format")]
    format: ExportFormat,
    start: Option<String>,
    end: Option<String>,
    #[serde(default = "default_true")]
    include_meditation: bool,
}

fn default_format() -> ExportFormat {
    ExportFormat::Markdown
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePromptRequest {
    precept_number: i64,
    prompt_text: String,
}

#[derive(Deserialize)]
struct ReflectionRequest {
    reflection: Option<String>,
}

#[derive(Deserialize)]
struct SettingRequest {
    value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RotatedPrompt {
    precept_number: i64,
    date: String,
    prompt: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                tracing::error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn bad_request(err: &anyhow::Error) -> ApiError {
    ApiError::BadRequest(format!("{err:#}"))
}

/// Reject anything that is not a real `YYYY-MM-DD` day.
fn check_date(date: &str) -> Result<(), ApiError> {
    parse_iso_date(date).map(|_| ()).map_err(|e| bad_request(&e))
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Entries ---

/// `null` when no entry exists for the date.
async fn get_entry(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Option<DailyEntry>>, ApiError> {
    check_date(&date)?;
    let entry = state.svc().get_entry(&date).context("database error")?;
    Ok(Json(entry))
}

async fn get_or_create_entry(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DailyEntry>, ApiError> {
    check_date(&date)?;
    let entry = state
        .svc()
        .get_or_create_entry(&date)
        .context("failed to create entry")?;
    Ok(Json(entry))
}

async fn list_entries(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    check_date(&range.start)?;
    check_date(&range.end)?;
    let entries = state
        .svc()
        .list_entries(&range.start, &range.end)
        .context("database error")?;
    Ok(Json(entries))
}

async fn search_entries(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest(
            "Query parameter 'q' must not be empty".to_string(),
        ));
    }
    let entries = state.svc().search_entries(query).context("database error")?;
    Ok(Json(entries))
}

// --- Responses and meditation ---

async fn upsert_response(
    State(state): State<AppState>,
    Json(req): Json<NewResponse>,
) -> Result<Json<PreceptResponse>, ApiError> {
    validate_precept_number(req.precept_number).map_err(|e| bad_request(&e))?;
    validate_rating(req.rating).map_err(|e| bad_request(&e))?;

    let mut svc = state.svc();
    svc.open()
        .context("database error")?
        .get_entry_by_id(req.entry_id)
        .map_err(|_| ApiError::BadRequest(format!("Entry {} not found", req.entry_id)))?;

    let saved = svc
        .upsert_response(&req)
        .context("failed to save response")?;
    Ok(Json(saved))
}

async fn upsert_meditation(
    State(state): State<AppState>,
    Json(req): Json<NewMeditation>,
) -> Result<Json<MeditationLog>, ApiError> {
    validate_minutes(req.minutes).map_err(|e| bad_request(&e))?;

    let mut svc = state.svc();
    svc.open()
        .context("database error")?
        .get_entry_by_id(req.entry_id)
        .map_err(|_| ApiError::BadRequest(format!("Entry {} not found", req.entry_id)))?;

    let saved = svc
        .upsert_meditation(&req)
        .context("failed to save meditation log")?;
    Ok(Json(saved))
}

// --- Weekly ---

async fn get_weekly_reflection(
    State(state): State<AppState>,
    Path(week_start): Path<String>,
) -> Result<Json<Option<WeeklyReflection>>, ApiError> {
    check_date(&week_start)?;
    let reflection = state
        .svc()
        .get_weekly_reflection(&week_start)
        .context("database error")?;
    Ok(Json(reflection))
}

async fn put_weekly_reflection(
    State(state): State<AppState>,
    Path(week_start): Path<String>,
    Json(req): Json<ReflectionRequest>,
) -> Result<Json<WeeklyReflection>, ApiError> {
    check_date(&week_start)?;
    let saved = state
        .svc()
        .upsert_weekly_reflection(&week_start, req.reflection.as_deref())
        .context("failed to save weekly reflection")?;
    Ok(Json(saved))
}

async fn get_weekly_summary(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<WeeklySummary>, ApiError> {
    check_date(&range.start)?;
    check_date(&range.end)?;
    let summary = state
        .svc()
        .weekly_summary(&range.start, &range.end)
        .context("database error")?;
    Ok(Json(summary))
}

// --- Precepts and prompts ---

async fn list_precepts() -> Json<Vec<Precept>> {
    Json(PRECEPTS.to_vec())
}

async fn get_rotated_prompt(
    State(state): State<AppState>,
    Path(number): Path<i64>,
    Query(params): Query<DateQuery>,
) -> Result<Json<RotatedPrompt>, ApiError> {
    validate_precept_number(number).map_err(|e| bad_request(&e))?;
    let date = params
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive().to_string());
    check_date(&date)?;

    let prompt = state
        .svc()
        .prompt_for(number, &date)
        .context("database error")?;
    Ok(Json(RotatedPrompt {
        precept_number: number,
        date,
        prompt,
    }))
}

async fn list_prompts(
    State(state): State<AppState>,
    Query(params): Query<PromptListQuery>,
) -> Result<Json<Vec<CustomPrompt>>, ApiError> {
    if let Some(number) = params.precept {
        validate_precept_number(number).map_err(|e| bad_request(&e))?;
    }
    let prompts = state
        .svc()
        .list_prompts(params.precept)
        .context("database error")?;
    Ok(Json(prompts))
}

async fn create_prompt(
    State(state): State<AppState>,
    Json(req): Json<CreatePromptRequest>,
) -> Result<(StatusCode, Json<CustomPrompt>), ApiError> {
    validate_precept_number(req.precept_number).map_err(|e| bad_request(&e))?;
    if req.prompt_text.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "promptText must not be empty".to_string(),
        ));
    }
    let prompt = state
        .svc()
        .create_prompt(req.precept_number, &req.prompt_text)
        .context("failed to create prompt")?;
    Ok((StatusCode::CREATED, Json(prompt)))
}

async fn update_prompt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<PromptUpdate>,
) -> Result<Json<CustomPrompt>, ApiError> {
    if req.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one field must be provided".to_string(),
        ));
    }
    if req.prompt_text.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "promptText must not be empty".to_string(),
        ));
    }

    let mut svc = state.svc();
    if svc.get_prompt(id).context("database error")?.is_none() {
        return Err(ApiError::NotFound(format!("Custom prompt {id} not found")));
    }
    let prompt = svc
        .update_prompt(id, &req)
        .context("failed to update prompt")?;
    Ok(Json(prompt))
}

async fn delete_prompt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.svc().delete_prompt(id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Custom prompt {id} not found")))
    }
}

// --- Settings ---

async fn list_settings(State(state): State<AppState>) -> Result<Json<Vec<Setting>>, ApiError> {
    let settings = state.svc().get_all_settings().context("database error")?;
    Ok(Json(settings))
}

/// The stored value as a JSON string, or `null` when the key is unset.
async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Option<String>>, ApiError> {
    let value = state.svc().get_setting(&key).context("database error")?;
    Ok(Json(value))
}

async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SettingRequest>,
) -> Result<Json<Setting>, ApiError> {
    if key.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Setting key must not be empty".to_string(),
        ));
    }
    let setting = state
        .svc()
        .set_setting(&key, &req.value)
        .context("failed to save setting")?;
    Ok(Json(setting))
}

// --- Statistics ---

async fn get_streak(State(state): State<AppState>) -> Result<Json<StreakInfo>, ApiError> {
    let streak = state.svc().get_streak().context("database error")?;
    Ok(Json(streak))
}

async fn get_meditation_trend(
    State(state): State<AppState>,
    Query(params): Query<DaysQuery>,
) -> Result<Json<Vec<MeditationPoint>>, ApiError> {
    let trend = state
        .svc()
        .get_meditation_trend(params.days.unwrap_or(30))
        .context("database error")?;
    Ok(Json(trend))
}

async fn get_completion_heatmap(
    State(state): State<AppState>,
    Query(params): Query<DaysQuery>,
) -> Result<Json<Vec<HeatmapDay>>, ApiError> {
    let heatmap = state
        .svc()
        .get_completion_heatmap(params.days.unwrap_or(90))
        .context("database error")?;
    Ok(Json(heatmap))
}

async fn get_average_ratings(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<PreceptAverage>>, ApiError> {
    check_date(&range.start)?;
    check_date(&range.end)?;
    let averages = state
        .svc()
        .get_average_ratings(&range.start, &range.end)
        .context("database error")?;
    Ok(Json(averages))
}

// --- Export ---

async fn export_journal(
    State(state): State<AppState>,
    Query(params): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let range = match (params.start.as_deref(), params.end.as_deref()) {
        (Some(start), Some(end)) => {
            check_date(start)?;
            check_date(end)?;
            Some((start, end))
        }
        (None, None) => None,
        _ => {
            return Err(ApiError::BadRequest(
                "Provide both start and end, or neither".to_string(),
            ));
        }
    };

    let rendered = state
        .svc()
        .export_journal(params.format, range, params.include_meditation)
        .map_err(|e| {
            if e.to_string() == NO_ENTRIES {
                ApiError::NotFound(NO_ENTRIES.to_string())
            } else {
                ApiError::Internal(e.context("export failed"))
            }
        })?;

    let content_type = match params.format {
        ExportFormat::Markdown => "text/markdown; charset=utf-8",
        ExportFormat::Json => "application/json",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], rendered).into_response())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/entries", get(list_entries))
        .route("/api/entries/search", get(search_entries))
        .route(
            "/api/entries/{date}",
            get(get_entry).post(get_or_create_entry),
        )
        .route("/api/responses", post(upsert_response))
        .route("/api/meditation", post(upsert_meditation))
        .route("/api/weekly/summary", get(get_weekly_summary))
        .route(
            "/api/weekly/{week_start}",
            get(get_weekly_reflection).put(put_weekly_reflection),
        )
        .route("/api/precepts", get(list_precepts))
        .route("/api/precepts/{number}/prompt", get(get_rotated_prompt))
        .route("/api/prompts", get(list_prompts).post(create_prompt))
        .route(
            "/api/prompts/{id}",
            put(update_prompt).delete(delete_prompt),
        )
        .route("/api/settings", get(list_settings))
        .route("/api/settings/{key}", get(get_setting).put(put_setting))
        .route("/api/stats/streak", get(get_streak))
        .route("/api/stats/trend", get(get_meditation_trend))
        .route("/api/stats/heatmap", get(get_completion_heatmap))
        .route("/api/stats/ratings", get(get_average_ratings))
        .route("/api/export", get(export_journal))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four characters of the key, or `****` when it is too short
/// to show any of it.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub async fn start_server(
    svc: JournalService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
    new_api_key: bool,
) -> anyhow::Result<()> {
    let svc = Arc::new(Mutex::new(svc));
    let state = AppState {
        svc: Arc::clone(&svc),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        if new_api_key {
            tracing::info!("Generated a new API key (see api_key file in data directory)");
        }
        tracing::info!(
            "API key: {} (see api_key file in data directory)",
            mask_key(key)
        );
    } else {
        tracing::warn!("Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        tracing::warn!(
            "Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    tracing::info!("Listening on http://{bind}:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {e}");
            }
        })
        .await?;

    tracing::info!("Shutting down");
    svc.lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state(api_key: Option<String>) -> AppState {
        AppState {
            svc: Arc::new(Mutex::new(JournalService::new_in_memory())),
            api_key,
        }
    }

    fn test_app(api_key: Option<String>) -> Router {
        build_router(test_state(api_key))
    }

    async fn send(app: &Router, request: axum::http::Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn create_entry(app: &Router, date: &str) -> i64 {
        let request = axum::http::Request::post(format!("/api/entries/{date}"))
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        json["entry"]["id"].as_i64().unwrap()
    }

    #[test]
    fn mask_key_handles_short_and_non_ascii_keys() {
        assert_eq!(mask_key("0123456789abcdef"), "0123...cdef");
        assert_eq!(mask_key("abc"), "****");
        assert_eq!(mask_key(""), "****");
        assert_eq!(mask_key("ééééxxxxxxxxüüüü"), "éééé...üüüü");
    }

    #[tokio::test]
    async fn auth_missing_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app.oneshot(get("/api/settings")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Invalid or missing API key");
    }

    #[tokio::test]
    async fn auth_wrong_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/settings")
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_correct_key_succeeds() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/settings")
                    .header("Authorization", "Bearer test-key-abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(None);

        let response = app.oneshot(get("/api/stats/streak")).await.unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn security_headers_on_auth_failure() {
        let app = test_app(Some("secret".to_string()));

        let response = app.oneshot(get("/api/settings")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn body_size_limit_rejects_oversized() {
        let app = test_app(None);

        let big_body = vec![0u8; BODY_LIMIT + 1];
        let response = app
            .oneshot(
                axum::http::Request::post("/api/responses")
                    .header("content-type", "application/json")
                    .body(Body::from(big_body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn internal_error_does_not_leak_details() {
        let error = ApiError::Internal(anyhow::anyhow!("secret database path /home/user/precept.db"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert!(!json["error"].as_str().unwrap().contains("secret"));
    }

    #[tokio::test]
    async fn entry_created_then_fetched() {
        let app = test_app(None);

        let response = app.clone().oneshot(get("/api/entries/2024-03-01")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"null");

        let id = create_entry(&app, "2024-03-01").await;
        assert_eq!(create_entry(&app, "2024-03-01").await, id);

        let (status, json) = send(&app, get("/api/entries/2024-03-01")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["entry"]["date"], "2024-03-01");
        assert_eq!(json["meditation"]["meditated"], false);
        assert_eq!(json["responses"].as_array().unwrap().len(), 0);

        let (status, json) = send(&app, get("/api/entries?start=2024-03-01&end=2024-03-31")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_date_returns_400() {
        let app = test_app(None);
        let (status, json) = send(&app, get("/api/entries/2024-02-30")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("Invalid date"));
    }

    #[tokio::test]
    async fn response_saved_and_searchable() {
        let app = test_app(None);
        let id = create_entry(&app, "2024-03-02").await;

        let body = serde_json::json!({
            "entryId": id,
            "preceptNumber": 10,
            "response": "Spoke plainly with a friend",
            "rating": 4,
        });
        let (status, json) = send(&app, json_request("POST", "/api/responses", &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["rating"], 4);
        assert_eq!(json["preceptNumber"], 10);

        let (status, json) = send(&app, get("/api/entries/search?q=plainly")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["date"], "2024-03-02");
    }

    #[tokio::test]
    async fn response_invalid_rating_returns_400() {
        let app = test_app(None);
        let id = create_entry(&app, "2024-03-03").await;

        let body = serde_json::json!({ "entryId": id, "preceptNumber": 1, "rating": 7 });
        let (status, _) = send(&app, json_request("POST", "/api/responses", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = serde_json::json!({ "entryId": id, "preceptNumber": 17, "rating": 3 });
        let (status, _) = send(&app, json_request("POST", "/api/responses", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn response_for_unknown_entry_returns_400() {
        let app = test_app(None);
        let body = serde_json::json!({ "entryId": 999, "preceptNumber": 1, "rating": 3 });
        let (status, json) = send(&app, json_request("POST", "/api/responses", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Entry 999 not found");
    }

    #[tokio::test]
    async fn meditation_logged_and_trended() {
        let app = test_app(None);
        let today = chrono::Utc::now().date_naive().to_string();
        let id = create_entry(&app, &today).await;

        let body = serde_json::json!({ "entryId": id, "meditated": true, "minutes": 20 });
        let (status, json) = send(&app, json_request("POST", "/api/meditation", &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["minutes"], 20);

        let bad = serde_json::json!({ "entryId": id, "meditated": true, "minutes": -5 });
        let (status, _) = send(&app, json_request("POST", "/api/meditation", &bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(&app, get("/api/stats/trend?days=7")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["date"], today.as_str());
        assert_eq!(json[0]["minutes"], 20);
    }

    #[tokio::test]
    async fn streak_on_empty_journal() {
        let app = test_app(None);
        let (status, json) = send(&app, get("/api/stats/streak")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["current"], 0);
        assert_eq!(json["longest"], 0);
        assert!(json["lastEntryDate"].is_null());
    }

    #[tokio::test]
    async fn weekly_reflection_round_trip() {
        let app = test_app(None);

        let (status, json) = send(&app, get("/api/weekly/2024-03-04")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.is_null());

        let body = serde_json::json!({ "reflection": "A steadier week." });
        let (status, _) = send(&app, json_request("PUT", "/api/weekly/2024-03-04", &body)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = send(&app, get("/api/weekly/2024-03-04")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reflection"], "A steadier week.");

        let (status, json) = send(
            &app,
            get("/api/weekly/summary?start=2024-03-04&end=2024-03-10"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["daysWithEntries"], 0);
        assert_eq!(json["reflection"]["reflection"], "A steadier week.");
    }

    #[tokio::test]
    async fn prompt_lifecycle() {
        let app = test_app(None);

        let body = serde_json::json!({ "preceptNumber": 3, "promptText": "Who did you listen to?" });
        let (status, json) = send(&app, json_request("POST", "/api/prompts", &body)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = json["id"].as_i64().unwrap();
        assert_eq!(json["isActive"], true);

        let update = serde_json::json!({ "isActive": false });
        let (status, json) =
            send(&app, json_request("PUT", &format!("/api/prompts/{id}"), &update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["isActive"], false);

        let (status, json) = send(&app, get("/api/prompts?precept=3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);

        let delete = axum::http::Request::delete(format!("/api/prompts/{id}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn missing_prompt_returns_404() {
        let app = test_app(None);

        let update = serde_json::json!({ "promptText": "anything" });
        let (status, json) = send(&app, json_request("PUT", "/api/prompts/42", &update)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Custom prompt 42 not found");

        let delete = axum::http::Request::delete("/api/prompts/42")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, delete).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rotated_prompt_comes_from_pool() {
        let app = test_app(None);
        let (status, json) = send(&app, get("/api/precepts/1/prompt?date=2024-03-05")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["preceptNumber"], 1);
        let prompt = json["prompt"].as_str().unwrap();
        let defaults = precept_core::precepts::precept(1).unwrap().default_prompts;
        assert!(defaults.iter().any(|d| *d == prompt));

        let (status, _) = send(&app, get("/api/precepts/0/prompt")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn precepts_listed() {
        let app = test_app(None);
        let (status, json) = send(&app, get("/api/precepts")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), PRECEPTS.len());
    }

    #[tokio::test]
    async fn settings_put_and_get() {
        let app = test_app(None);

        let (status, json) = send(&app, get("/api/settings/theme")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.is_null());

        let body = serde_json::json!({ "value": "dark" });
        let (status, json) = send(&app, json_request("PUT", "/api/settings/theme", &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["value"], "dark");

        let (status, json) = send(&app, get("/api/settings/theme")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, "dark");
    }

    #[tokio::test]
    async fn export_empty_journal_returns_404() {
        let app = test_app(None);
        let (status, json) = send(&app, get("/api/export")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], NO_ENTRIES);

        let (status, _) = send(&app, get("/api/export?start=2024-01-01")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn export_markdown_after_response() {
        let app = test_app(None);
        let id = create_entry(&app, "2024-03-06").await;
        let body = serde_json::json!({ "entryId": id, "preceptNumber": 1, "response": "Sat early." });
        send(&app, json_request("POST", "/api/responses", &body)).await;

        let response = app.clone().oneshot(get("/api/export")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/markdown; charset=utf-8"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("# Precept Tracker Journal"));
        assert!(text.contains("Sat early."));
    }
}
