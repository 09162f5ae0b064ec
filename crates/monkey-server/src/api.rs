use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::Method,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use monkey_shared::constants::APP_NAME;
use monkey_shared::week;
use monkey_store::{
    Completion, Database, LeaderboardEntry, Message, NewResource, NewTask, Resource, Task,
    ToggleOutcome, User, VoteOutcome,
};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::extract::{record_id, ApiJson, ApiPath};
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            rate_limiter: RateLimiter::from_config(&config),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let api = Router::new()
        // Accounts
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/users/:username", get(get_user))
        .route("/users/:username/profile-pic", put(update_profile_pic))
        // Tasks & completions
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", delete(delete_task))
        .route("/tasks/:id/vote-delete", post(vote_delete_task))
        .route("/completions", post(toggle_completion))
        .route("/completions/:username", get(list_completions))
        // Friends & leaderboard
        .route("/friends", post(add_friend))
        .route("/friends/:username", get(list_friends))
        .route("/friends/:username/:friend_username", delete(remove_friend))
        .route("/leaderboard/:username", get(leaderboard))
        // Resources
        .route("/resources", get(list_resources).post(create_resource))
        .route("/resources/:id", delete(delete_resource))
        // Chat
        .route("/messages", get(list_messages).post(send_message))
        .route("/messages/:id", delete(delete_message))
        .route("/messages/:id/read", post(mark_message_read))
        .route("/messages/unread/:username", get(unread_count));

    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Request / response bodies ───

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    success: bool,
    username: String,
    profile_pic: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePicRequest {
    #[serde(default)]
    profile_pic: String,
}

/// Body of every request that only names the acting user.
#[derive(Deserialize)]
struct ActorRequest {
    #[serde(default)]
    username: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleRequest {
    #[serde(default)]
    username: String,
    task_id: Uuid,
    #[serde(default)]
    date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FriendRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    friend_username: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Serialize)]
struct UnreadResponse {
    count: u64,
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

// ─── Service ───

async fn banner() -> Json<Value> {
    Json(json!({
        "message": format!("{APP_NAME} Backend API"),
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── Accounts ───

async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Credentials>,
) -> Result<Json<Value>, ServerError> {
    let user = state.db.lock().await.create_user(&req.username, &req.password)?;
    Ok(Json(json!({ "success": true, "username": user.username })))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Credentials>,
) -> Result<Json<LoginResponse>, ServerError> {
    let user = state.db.lock().await.find_user(&req.username)?;

    let Some(user) = user.filter(|u| credentials_match(&u.password, &req.password)) else {
        warn!(username = %req.username, "failed login");
        return Err(ServerError::Unauthorized("Invalid credentials".into()));
    };

    Ok(Json(LoginResponse {
        success: true,
        username: user.username,
        profile_pic: user.profile_pic,
    }))
}

fn credentials_match(stored: &str, given: &str) -> bool {
    let (stored, given) = (stored.as_bytes(), given.as_bytes());
    stored.len() == given.len() && stored.ct_eq(given).unwrap_u8() == 1
}

async fn get_user(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<User>, ServerError> {
    let user = state.db.lock().await.get_user(&username)?;
    Ok(Json(user))
}

async fn update_profile_pic(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
    ApiJson(req): ApiJson<ProfilePicRequest>,
) -> Result<Json<Value>, ServerError> {
    let user = state
        .db
        .lock()
        .await
        .set_profile_pic(&username, &req.profile_pic)?;
    Ok(Json(json!({ "success": true, "profilePic": user.profile_pic })))
}

// ─── Tasks ───

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ServerError> {
    Ok(Json(state.db.lock().await.list_tasks()?))
}

async fn create_task(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewTask>,
) -> Result<Json<Task>, ServerError> {
    Ok(Json(state.db.lock().await.create_task(&req)?))
}

async fn vote_delete_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<ActorRequest>,
) -> Result<Json<VoteOutcome>, ServerError> {
    let id = record_id(&id, "Task")?;
    let outcome = state.db.lock().await.vote_delete_task(
        id,
        &req.username,
        state.config.delete_quorum,
    )?;
    Ok(Json(outcome))
}

async fn delete_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>, ServerError> {
    let id = record_id(&id, "Task")?;
    state.db.lock().await.delete_task(id)?;
    Ok(success())
}

// ─── Completions ───

async fn list_completions(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<Vec<Completion>>, ServerError> {
    Ok(Json(state.db.lock().await.list_completions(&username)?))
}

async fn toggle_completion(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ToggleRequest>,
) -> Result<Json<ToggleOutcome>, ServerError> {
    let outcome = state
        .db
        .lock()
        .await
        .toggle_completion(&req.username, req.task_id, &req.date)?;
    Ok(Json(outcome))
}

// ─── Friends & leaderboard ───

async fn list_friends(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<Vec<String>>, ServerError> {
    Ok(Json(state.db.lock().await.list_friends(&username)?))
}

async fn add_friend(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<FriendRequest>,
) -> Result<Json<Value>, ServerError> {
    state
        .db
        .lock()
        .await
        .add_friend(&req.username, &req.friend_username)?;
    Ok(success())
}

async fn remove_friend(
    State(state): State<AppState>,
    ApiPath((username, friend_username)): ApiPath<(String, String)>,
) -> Result<Json<Value>, ServerError> {
    state
        .db
        .lock()
        .await
        .remove_friend(&username, &friend_username)?;
    Ok(success())
}

async fn leaderboard(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<Vec<LeaderboardEntry>>, ServerError> {
    let week_start = week::current_week_start();
    Ok(Json(state.db.lock().await.leaderboard(&username, week_start)?))
}

// ─── Resources ───

async fn list_resources(
    State(state): State<AppState>,
) -> Result<Json<Vec<Resource>>, ServerError> {
    Ok(Json(state.db.lock().await.list_resources()?))
}

async fn create_resource(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewResource>,
) -> Result<Json<Resource>, ServerError> {
    Ok(Json(state.db.lock().await.create_resource(&req)?))
}

async fn delete_resource(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>, ServerError> {
    let id = record_id(&id, "Resource")?;
    state.db.lock().await.delete_resource(id)?;
    Ok(success())
}

// ─── Chat ───

async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<Message>>, ServerError> {
    let limit = state.config.message_list_limit;
    Ok(Json(state.db.lock().await.list_recent_messages(limit)?))
}

async fn send_message(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<Json<Message>, ServerError> {
    let message = state.db.lock().await.send_message(
        &req.username,
        &req.message,
        req.image_url.as_deref(),
    )?;
    Ok(Json(message))
}

async fn mark_message_read(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<ActorRequest>,
) -> Result<Json<Value>, ServerError> {
    let id = record_id(&id, "Message")?;
    let message = state.db.lock().await.mark_message_read(id, &req.username)?;
    Ok(Json(json!({ "success": true, "readBy": message.read_by })))
}

async fn unread_count(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<UnreadResponse>, ServerError> {
    let count = state.db.lock().await.unread_count(&username)?;
    Ok(Json(UnreadResponse { count }))
}

async fn delete_message(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>, ServerError> {
    let id = record_id(&id, "Message")?;
    state.db.lock().await.delete_message(id)?;
    Ok(success())
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
