use anyhow::Result;
use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tracing::debug;

use crate::catalog::ContentCatalog;
use crate::spotify::{bearer_token, guard_spotify_token, RefreshCoalescer, SpotifyApi};
use crate::user::auth::issue_session_token;
use crate::user::{FavoriteKind, FullUserStore, UserManager, UserSummary};
use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::{log_requests, state::*, ApiError, ServerConfig};

const SESSION_COOKIE_MAX_AGE_HOURS: i64 = 24;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_user_id: Option<usize>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct SignupBody {
    pub name: String,
    pub surname: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
struct ScheduleBody {
    pub time: String,
    pub days: Vec<u8>,
}

#[derive(Deserialize, Debug)]
struct FavoriteBody {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "contentId")]
    pub content_id: String,
    pub label: Option<String>,
}

#[derive(Deserialize, Debug)]
struct FavoriteStatusQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "contentId")]
    pub content_id: String,
}

#[derive(Deserialize, Debug)]
struct SpotifyTokenBody {
    pub code: Option<String>,
    #[serde(rename = "redirectUri")]
    pub redirect_uri: Option<String>,
}

#[derive(Deserialize, Debug)]
struct PlaylistSearchQuery {
    pub q: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SpotifyFavoriteBody {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "playlistId")]
    pub playlist_id: String,
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SpotifyFavoriteStatusQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "playlistId")]
    pub playlist_id: String,
}

#[derive(Deserialize, Debug)]
struct UserIdQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Client-supplied user ids arrive as strings.
fn parse_user_id(raw: &str) -> Result<usize, ApiError> {
    raw.parse::<usize>()
        .map_err(|_| ApiError::Validation(format!("Invalid userId {:?}", raw)))
}

fn favorite_kind(segment: &str) -> Result<FavoriteKind, ApiError> {
    FavoriteKind::from_route_segment(segment)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown favorite kind {:?}", segment)))
}

fn require_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    bearer_token(headers).ok_or_else(|| ApiError::Auth("No access token provided".to_string()))
}

fn session_cookie(config: &ServerConfig, token: String) -> Cookie<'static> {
    let builder = Cookie::build((COOKIE_SESSION_TOKEN_KEY, token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::hours(SESSION_COOKIE_MAX_AGE_HOURS));
    // Cross-origin deployments need SameSite=None, which browsers only
    // accept on secure cookies.
    if config.production {
        builder.same_site(SameSite::None).secure(true).build()
    } else {
        builder.same_site(SameSite::Lax).build()
    }
}

/// The clearing cookie carries the same attributes as the one set on login,
/// otherwise browsers treat it as a different cookie and keep the session.
fn clear_session_cookie(config: &ServerConfig) -> Cookie<'static> {
    let builder = Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .http_only(true)
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)); // Expire it in the past
    if config.production {
        builder.same_site(SameSite::None).secure(true).build()
    } else {
        builder.same_site(SameSite::Lax).build()
    }
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_user_id: session.map(|s| s.user_id),
    };
    Json(stats)
}

async fn welcome() -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Welcome to Silentmoon!" })),
    )
}

async fn signup(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<SignupBody>,
) -> Result<Response, ApiError> {
    let user_id = user_manager.lock().unwrap().register(
        &body.name,
        body.surname.as_deref(),
        &body.email,
        &body.password,
    )?;
    debug!("Signed up user {}", user_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Successfully registered!" })),
    )
        .into_response())
}

async fn login(
    State(state): State<ServerState>,
    Json(body): Json<LoginBody>,
) -> Result<Response, ApiError> {
    let user = state
        .user_manager
        .lock()
        .unwrap()
        .login(&body.email, &body.password)?;
    let token = issue_session_token(&state.config.jwt_secret, user.id)?;
    let cookie = session_cookie(&state.config, token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(UserSummary::from(&user)),
    )
        .into_response())
}

// Clears the cookie whether or not a session rides along, logging out
// twice is not an error.
async fn logout(State(config): State<ServerConfig>) -> Response {
    let cookie = clear_session_cookie(&config);

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({ "message": "Successfully logged out!" })),
    )
        .into_response()
}

async fn protected(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
) -> Result<Response, ApiError> {
    let user = user_manager.lock().unwrap().get_user(session.user_id)?;
    Ok(Json(json!({
        "message": "You are authorized!",
        "userName": user.name,
    }))
    .into_response())
}

async fn get_yoga(_session: Session, State(catalog): State<GuardedCatalog>) -> Response {
    Json(catalog.yoga()).into_response()
}

async fn get_meditation(_session: Session, State(catalog): State<GuardedCatalog>) -> Response {
    Json(catalog.meditation()).into_response()
}

async fn get_settings(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
) -> Result<Response, ApiError> {
    let (schedule, completed) = user_manager.lock().unwrap().get_schedule(session.user_id)?;
    Ok(Json(json!({
        "time": schedule.time,
        "days": schedule.days,
        "hasCompletedSettings": completed,
    }))
    .into_response())
}

fn store_settings(
    user_manager: GuardedUserManager,
    session: Session,
    body: ScheduleBody,
    mark_completed: bool,
) -> Result<(), ApiError> {
    let schedule = crate::user::ScheduleSettings {
        time: body.time,
        days: body.days,
    };
    user_manager
        .lock()
        .unwrap()
        .set_schedule(session.user_id, schedule, mark_completed)?;
    Ok(())
}

async fn create_settings(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    body: Result<Json<ScheduleBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|err| ApiError::Validation(err.body_text()))?;
    store_settings(user_manager, session, body, true)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Settings saved!" })),
    )
        .into_response())
}

async fn update_settings(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    body: Result<Json<ScheduleBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|err| ApiError::Validation(err.body_text()))?;
    store_settings(user_manager, session, body, false)?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Settings updated!" })),
    )
        .into_response())
}

async fn add_favorite(
    State(user_manager): State<GuardedUserManager>,
    Path(kind): Path<String>,
    Json(body): Json<FavoriteBody>,
) -> Result<Response, ApiError> {
    let kind = favorite_kind(&kind)?;
    let user_id = parse_user_id(&body.user_id)?;
    user_manager.lock().unwrap().add_favorite(
        user_id,
        kind,
        &body.content_id,
        body.label.as_deref(),
    )?;
    Ok(Json(json!({ "ok": true })).into_response())
}

async fn remove_favorite(
    State(user_manager): State<GuardedUserManager>,
    Path(kind): Path<String>,
    Json(body): Json<FavoriteBody>,
) -> Result<Response, ApiError> {
    let kind = favorite_kind(&kind)?;
    let user_id = parse_user_id(&body.user_id)?;
    user_manager
        .lock()
        .unwrap()
        .remove_favorite(user_id, kind, &body.content_id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn favorite_video_status(
    State(user_manager): State<GuardedUserManager>,
    Query(query): Query<FavoriteStatusQuery>,
) -> Result<Response, ApiError> {
    let user_id = parse_user_id(&query.user_id)?;
    let is_favorite =
        user_manager
            .lock()
            .unwrap()
            .is_favorite(user_id, FavoriteKind::Video, &query.content_id)?;
    Ok(Json(json!({ "isFavorite": is_favorite })).into_response())
}

async fn get_favorite_videos(
    session: Session,
    State(state): State<ServerState>,
) -> Result<Response, ApiError> {
    let favorites = state
        .user_manager
        .lock()
        .unwrap()
        .get_favorites(session.user_id, FavoriteKind::Video)?;
    let resolved = state.catalog.resolve_favorites(&favorites);
    Ok(Json(resolved).into_response())
}

async fn spotify_token(
    State(spotify): State<GuardedSpotify>,
    Json(body): Json<SpotifyTokenBody>,
) -> Result<Response, ApiError> {
    let code = body
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("code is required".to_string()))?;
    let redirect_uri = body
        .redirect_uri
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::Validation("redirectUri is required".to_string()))?;

    let tokens = spotify.exchange_code(&code, &redirect_uri).await?;
    Ok(Json(tokens).into_response())
}

async fn spotify_playlists(
    State(spotify): State<GuardedSpotify>,
    headers: HeaderMap,
    Query(query): Query<PlaylistSearchQuery>,
) -> Result<Response, ApiError> {
    let token = require_bearer(&headers)?;
    let q = query
        .q
        .filter(|q| !q.is_empty())
        .unwrap_or_else(|| "meditation".to_string());
    let playlists = spotify.search_playlists(&token, &q, 10).await?;
    Ok(Json(playlists).into_response())
}

async fn spotify_playlist_tracks(
    State(spotify): State<GuardedSpotify>,
    headers: HeaderMap,
    Path(playlist_id): Path<String>,
) -> Result<Response, ApiError> {
    let token = require_bearer(&headers)?;
    let tracks = spotify.get_playlist_tracks(&token, &playlist_id).await?;
    Ok(Json(tracks).into_response())
}

async fn add_spotify_favorite(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<SpotifyFavoriteBody>,
) -> Result<Response, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    user_manager.lock().unwrap().add_favorite(
        user_id,
        FavoriteKind::Playlist,
        &body.playlist_id,
        body.name.as_deref(),
    )?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Playlist saved!" })),
    )
        .into_response())
}

async fn remove_spotify_favorite(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<SpotifyFavoriteBody>,
) -> Result<Response, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    user_manager
        .lock()
        .unwrap()
        .remove_favorite(user_id, FavoriteKind::Playlist, &body.playlist_id)?;
    Ok(Json(json!({ "message": "Playlist removed!" })).into_response())
}

async fn spotify_favorite_status(
    State(user_manager): State<GuardedUserManager>,
    Query(query): Query<SpotifyFavoriteStatusQuery>,
) -> Result<Response, ApiError> {
    let user_id = parse_user_id(&query.user_id)?;
    let is_favorite = user_manager.lock().unwrap().is_favorite(
        user_id,
        FavoriteKind::Playlist,
        &query.playlist_id,
    )?;
    Ok(Json(json!({ "isFavorite": is_favorite })).into_response())
}

async fn spotify_favorite_details(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<UserIdQuery>,
) -> Result<Response, ApiError> {
    let token = require_bearer(&headers)?;
    let user_id = parse_user_id(&query.user_id)?;
    let favorites = state
        .user_manager
        .lock()
        .unwrap()
        .get_favorites(user_id, FavoriteKind::Playlist)?;
    if favorites.is_empty() {
        return Err(ApiError::NotFound("No favorite playlists".to_string()));
    }

    let lookups = favorites
        .iter()
        .map(|favorite| state.spotify.get_playlist(&token, &favorite.content_id));
    let playlists: Vec<Value> = futures::future::join_all(lookups)
        .await
        .into_iter()
        // Playlists deleted upstream are silently dropped
        .filter_map(|result| result.ok())
        .collect();
    Ok(Json(playlists).into_response())
}

async fn random_meditation_audio(
    State(spotify): State<GuardedSpotify>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = require_bearer(&headers)?;

    let search = spotify.search_playlists(&token, "meditation", 20).await?;
    let playlists: Vec<&Value> = search["playlists"]["items"]
        .as_array()
        .map(|items| items.iter().filter(|item| !item.is_null()).collect())
        .unwrap_or_default();
    let playlist = playlists
        .choose(&mut rand::rng())
        .ok_or_else(|| ApiError::NotFound("No playlists found".to_string()))?;
    let playlist_id = playlist["id"]
        .as_str()
        .ok_or_else(|| ApiError::NotFound("No playlists found".to_string()))?;

    let tracks = spotify.get_playlist_tracks(&token, playlist_id).await?;
    let track_items: Vec<&Value> = tracks["items"]
        .as_array()
        .map(|items| items.iter().filter(|item| !item["track"].is_null()).collect())
        .unwrap_or_default();
    let track = track_items
        .choose(&mut rand::rng())
        .ok_or_else(|| ApiError::NotFound("Playlist has no tracks".to_string()))?;

    Ok(Json(json!({
        "playlistId": playlist_id,
        "playlistName": playlist["name"],
        "track": track["track"],
    }))
    .into_response())
}

impl ServerState {
    fn new(
        config: ServerConfig,
        user_store: Arc<dyn FullUserStore>,
        catalog: ContentCatalog,
        spotify: Arc<dyn SpotifyApi>,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            user_manager: Arc::new(Mutex::new(UserManager::new(user_store))),
            catalog: Arc::new(catalog),
            spotify,
            refresh_coalescer: Arc::new(RefreshCoalescer::default()),
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    user_store: Arc<dyn FullUserStore>,
    catalog: ContentCatalog,
    spotify: Arc<dyn SpotifyApi>,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), user_store, catalog, spotify);

    let api_routes: Router = Router::new()
        .route("/", post(welcome))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/protected", get(protected))
        .route("/yoga", get(get_yoga))
        .route("/meditation", get(get_meditation))
        .route(
            "/settings",
            get(get_settings).post(create_settings).put(update_settings),
        )
        .route("/favorites/{kind}/add", post(add_favorite))
        .route("/favorites/{kind}/remove", post(remove_favorite))
        .route("/favoritevideos", get(favorite_video_status))
        .route("/favorites", get(get_favorite_videos))
        .route("/spotify/token", post(spotify_token))
        .route("/spotify/playlists/{id}/tracks", get(spotify_playlist_tracks))
        .route("/user/spotify-favorites/add", post(add_spotify_favorite))
        .route("/user/spotify-favorites/remove", post(remove_spotify_favorite))
        .route("/user/spotify-favorites/status", get(spotify_favorite_status))
        .with_state(state.clone());

    // Routes that must enter with a live Spotify access token
    let guarded_spotify_routes: Router = Router::new()
        .route("/spotify/playlists", get(spotify_playlists))
        .route(
            "/user/spotify-favorites/details",
            get(spotify_favorite_details),
        )
        .route(
            "/playlists/meditation/random-audio",
            get(random_meditation_audio),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard_spotify_token,
        ))
        .with_state(state.clone());

    let home_router: Router = match &state.config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app = home_router
        .nest("/api", api_routes.merge(guarded_spotify_routes))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    user_store: Arc<dyn FullUserStore>,
    catalog: ContentCatalog,
    spotify: Arc<dyn SpotifyApi>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, user_store, catalog, spotify)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
