// Copyright (C) 2025 Kevin Exton
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::auth::{AuthError, AuthService, GoogleAuth, LoginRequest, RegisterRequest};
use crate::models::{
    CurriculumPatch, NewCurriculum, NewSubject, NewTopic, NewTutor, NewVideo, PublicUser,
    SearchFilters, TopicPatch,
};
use crate::store::{Storage, StoreError};

// User-visible messages are Vietnamese and deliberately non-technical.
const MSG_REGISTERED: &str = "Đăng ký thành công";
const MSG_LOGGED_IN: &str = "Đăng nhập thành công";
const MSG_LOGGED_OUT: &str = "Đăng xuất thành công";
const MSG_USERNAME_TAKEN: &str = "Tên đăng nhập đã được sử dụng";
const MSG_EMAIL_TAKEN: &str = "Email đã được sử dụng";
const MSG_BAD_CREDENTIALS: &str = "Tên đăng nhập hoặc mật khẩu không đúng";
const MSG_UNAUTHORIZED: &str = "Vui lòng đăng nhập";
const MSG_NOT_FOUND: &str = "Không tìm thấy";
const MSG_BAD_PARAMS: &str = "Tham số không hợp lệ";
const MSG_GOOGLE_REJECTED: &str = "Đăng nhập Google thất bại";
const MSG_GOOGLE_DISABLED: &str = "Đăng nhập Google chưa được cấu hình";
const MSG_INTERNAL: &str = "Đã xảy ra lỗi, vui lòng thử lại sau";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub auth: Arc<AuthService>,
    pub google: Arc<GoogleAuth>,
}

pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/google", post(google_login))
        .route("/api/tutors", get(list_tutors).post(create_tutor))
        .route("/api/tutors/:id", get(get_tutor))
        .route("/api/videos", get(list_videos).post(create_video))
        .route("/api/subjects", get(list_subjects).post(create_subject))
        .route("/api/curriculums", get(list_curriculums).post(create_curriculum))
        .route(
            "/api/curriculums/:id",
            get(get_curriculum).put(update_curriculum).delete(delete_curriculum),
        )
        .route("/api/curriculums/:id/topics", get(list_topics))
        .route("/api/topics", post(create_topic))
        .route("/api/topics/:id", put(update_topic).delete(delete_topic))
        .with_state(state)
}

/// Terminal error shape for every handler: a status code plus the
/// localized message rendered in the standard failure envelope.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: &str) -> Self {
        ApiError {
            status,
            message: message.to_string(),
        }
    }

    fn not_found() -> Self {
        ApiError::new(StatusCode::NOT_FOUND, MSG_NOT_FOUND)
    }

    fn bad_request(message: &str) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken(_) => ApiError::bad_request(MSG_USERNAME_TAKEN),
            StoreError::EmailTaken(_) => ApiError::bad_request(MSG_EMAIL_TAKEN),
            other => {
                tracing::error!("storage failure: {other}");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::new(StatusCode::UNAUTHORIZED, MSG_BAD_CREDENTIALS)
            }
            AuthError::UsernameTaken(_) => ApiError::bad_request(MSG_USERNAME_TAKEN),
            AuthError::EmailTaken(_) => ApiError::bad_request(MSG_EMAIL_TAKEN),
            AuthError::GoogleNotConfigured => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, MSG_GOOGLE_DISABLED)
            }
            AuthError::GoogleTokenRejected => {
                ApiError::new(StatusCode::UNAUTHORIZED, MSG_GOOGLE_REJECTED)
            }
            AuthError::GoogleRequest(err) => {
                tracing::warn!("google verification round trip failed: {err}");
                ApiError::new(StatusCode::UNAUTHORIZED, MSG_GOOGLE_REJECTED)
            }
            other => {
                tracing::error!("auth failure: {other}");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
            }
        }
    }
}

#[derive(Serialize)]
struct AuthResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<PublicUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let session = state.auth.register(request).await?;
    let body = AuthResponse {
        success: true,
        message: MSG_REGISTERED.to_string(),
        user: Some(session.user),
        token: Some(session.token),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let session = state.auth.login(request).await?;
    Ok(Json(AuthResponse {
        success: true,
        message: MSG_LOGGED_IN.to_string(),
        user: Some(session.user),
        token: Some(session.token),
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token =
        bearer_token(&headers).ok_or(ApiError::new(StatusCode::UNAUTHORIZED, MSG_UNAUTHORIZED))?;
    let user = state
        .auth
        .current_user(token)
        .await?
        .ok_or(ApiError::new(StatusCode::UNAUTHORIZED, MSG_UNAUTHORIZED))?;
    Ok(Json(json!({ "user": user })))
}

/// Token issuance is stateless; the client just discards its copy.
async fn logout() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": MSG_LOGGED_OUT }))
}

#[derive(Deserialize)]
struct GoogleLoginRequest {
    token: String,
}

async fn google_login(
    State(state): State<AppState>,
    Json(request): Json<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let profile = state.google.verify(&request.token).await?;
    let session = state.auth.login_with_google(profile).await?;
    Ok(Json(AuthResponse {
        success: true,
        message: MSG_LOGGED_IN.to_string(),
        user: Some(session.user),
        token: Some(session.token),
    }))
}

/// Raw tutor query parameters; prices arrive as strings so a malformed
/// number can be reported with the localized 400 body instead of the
/// extractor's default rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TutorsQuery {
    subject: Option<String>,
    course_type: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    time_slots: Option<String>,
    keywords: Option<String>,
}

fn parse_price(raw: Option<String>) -> Result<Option<i64>, ApiError> {
    match raw {
        None => Ok(None),
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ApiError::bad_request(MSG_BAD_PARAMS))
        }
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl TutorsQuery {
    /// Validates the raw query into the filter shape. `timeSlots` is a
    /// comma-separated list; blank entries are dropped.
    fn into_filters(self) -> Result<SearchFilters, ApiError> {
        let min_price = parse_price(self.min_price)?;
        let max_price = parse_price(self.max_price)?;
        let time_slots = self
            .time_slots
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Ok(SearchFilters {
            subject: non_empty(self.subject),
            course_type: non_empty(self.course_type),
            min_price,
            max_price,
            time_slots,
            keywords: non_empty(self.keywords),
        })
    }
}

async fn list_tutors(
    State(state): State<AppState>,
    Query(query): Query<TutorsQuery>,
) -> Result<Response, ApiError> {
    let filters = query.into_filters()?;
    let tutors = state.store.get_tutors(&filters).await?;
    Ok(Json(tutors).into_response())
}

async fn get_tutor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let tutor = state.store.get_tutor(id).await?.ok_or_else(ApiError::not_found)?;
    Ok(Json(tutor).into_response())
}

async fn create_tutor(
    State(state): State<AppState>,
    Json(data): Json<NewTutor>,
) -> Result<Response, ApiError> {
    if data.price_per_hour <= 0 {
        return Err(ApiError::bad_request(MSG_BAD_PARAMS));
    }
    let tutor = state.store.create_tutor(data).await?;
    Ok((StatusCode::CREATED, Json(tutor)).into_response())
}

async fn list_videos(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(Json(state.store.get_videos().await?).into_response())
}

async fn create_video(
    State(state): State<AppState>,
    Json(data): Json<NewVideo>,
) -> Result<Response, ApiError> {
    let video = state.store.create_video(data).await?;
    Ok((StatusCode::CREATED, Json(video)).into_response())
}

async fn list_subjects(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(Json(state.store.get_subjects().await?).into_response())
}

async fn create_subject(
    State(state): State<AppState>,
    Json(data): Json<NewSubject>,
) -> Result<Response, ApiError> {
    let subject = state.store.create_subject(data).await?;
    Ok((StatusCode::CREATED, Json(subject)).into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurriculumsQuery {
    tutor_id: Option<Uuid>,
}

async fn list_curriculums(
    State(state): State<AppState>,
    Query(query): Query<CurriculumsQuery>,
) -> Result<Response, ApiError> {
    let tutor_id = query.tutor_id.ok_or_else(|| ApiError::bad_request(MSG_BAD_PARAMS))?;
    Ok(Json(state.store.get_curriculums(tutor_id).await?).into_response())
}

async fn get_curriculum(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let curriculum = state
        .store
        .get_curriculum(id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(curriculum).into_response())
}

async fn create_curriculum(
    State(state): State<AppState>,
    Json(data): Json<NewCurriculum>,
) -> Result<Response, ApiError> {
    let curriculum = state.store.create_curriculum(data).await?;
    Ok((StatusCode::CREATED, Json(curriculum)).into_response())
}

async fn update_curriculum(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CurriculumPatch>,
) -> Result<Response, ApiError> {
    let curriculum = state
        .store
        .update_curriculum(id, patch)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(curriculum).into_response())
}

async fn delete_curriculum(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    if !state.store.delete_curriculum(id).await? {
        return Err(ApiError::not_found());
    }
    Ok(Json(json!({ "success": true })).into_response())
}

async fn list_topics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(Json(state.store.get_curriculum_topics(id).await?).into_response())
}

async fn create_topic(
    State(state): State<AppState>,
    Json(data): Json<NewTopic>,
) -> Result<Response, ApiError> {
    let topic = state.store.create_curriculum_topic(data).await?;
    Ok((StatusCode::CREATED, Json(topic)).into_response())
}

async fn update_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TopicPatch>,
) -> Result<Response, ApiError> {
    let topic = state
        .store
        .update_curriculum_topic(id, patch)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(topic).into_response())
}

async fn delete_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    if !state.store.delete_curriculum_topic(id).await? {
        return Err(ApiError::not_found());
    }
    Ok(Json(json!({ "success": true })).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tutor_query_parses_into_filters() {
        let query = TutorsQuery {
            subject: Some("Toán".to_string()),
            course_type: None,
            min_price: Some("100000".to_string()),
            max_price: Some(" 200000 ".to_string()),
            time_slots: Some("cuoi-tuan, toi-t2-t6,,".to_string()),
            keywords: Some("  luyện thi ".to_string()),
        };
        let filters = query.into_filters().expect("query should validate");
        assert_eq!(filters.subject.as_deref(), Some("Toán"));
        assert_eq!(filters.min_price, Some(100_000));
        assert_eq!(filters.max_price, Some(200_000));
        assert_eq!(filters.time_slots, vec!["cuoi-tuan", "toi-t2-t6"]);
        assert_eq!(filters.keywords.as_deref(), Some("luyện thi"));
    }

    #[test]
    fn malformed_price_is_a_bad_request() {
        let query = TutorsQuery {
            min_price: Some("abc".to_string()),
            ..Default::default()
        };
        let err = query.into_filters().expect_err("non-numeric price must fail");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, MSG_BAD_PARAMS);
    }

    #[test]
    fn blank_params_collapse_to_no_filters() {
        let query = TutorsQuery {
            subject: Some("  ".to_string()),
            min_price: Some(String::new()),
            time_slots: Some(" , ".to_string()),
            ..Default::default()
        };
        let filters = query.into_filters().expect("blank params are fine");
        assert!(filters.is_empty());
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
