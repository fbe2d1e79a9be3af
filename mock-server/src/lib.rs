use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-reqid";

pub type Metadata = BTreeMap<String, String>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    pub region: String,
    pub metadata: Metadata,
    pub deleting: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RepoList {
    pub repos: Vec<Repo>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub retention: String,
    pub metadata: Metadata,
    pub deleting: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub sql: String,
    pub retention: String,
    pub deleting: String,
}

#[derive(Deserialize)]
pub struct CreateRepo {
    pub region: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Deserialize)]
pub struct UpdateMetadata {
    pub metadata: Metadata,
}

#[derive(Deserialize)]
pub struct CreateSeries {
    pub retention: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Deserialize)]
pub struct CreateView {
    pub sql: String,
    pub retention: String,
}

#[derive(Deserialize)]
pub struct Query {
    pub sql: String,
}

#[derive(Debug, Default)]
pub struct RepoState {
    pub repo: Repo,
    pub series: BTreeMap<String, Series>,
    pub views: BTreeMap<String, View>,
    pub points: Vec<String>,
}

pub type Db = Arc<RwLock<BTreeMap<String, RepoState>>>;

/// An error reply in the service's `{"error": "..."}` shape.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(kind: &str, name: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{kind} {name} not found"))
    }

    fn conflict(kind: &str, name: &str) -> Self {
        Self::new(StatusCode::CONFLICT, format!("{kind} {name} already exists"))
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (
            self.status,
            [(REQUEST_ID_HEADER, Uuid::new_v4().to_string())],
            Json(json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(BTreeMap::new()));
    Router::new()
        .route("/v4/repos", get(list_repos))
        .route(
            "/v4/repos/{repo}",
            post(create_repo).get(get_repo).delete(delete_repo),
        )
        .route(
            "/v4/repos/{repo}/meta",
            post(update_repo_meta).delete(delete_repo_meta),
        )
        .route("/v4/repos/{repo}/series", get(list_series))
        .route(
            "/v4/repos/{repo}/series/{series}",
            post(create_series).delete(delete_series),
        )
        .route(
            "/v4/repos/{repo}/series/{series}/meta",
            post(update_series_meta).delete(delete_series_meta),
        )
        .route("/v4/repos/{repo}/views", get(list_views))
        .route(
            "/v4/repos/{repo}/views/{view}",
            post(create_view).get(get_view).delete(delete_view),
        )
        .route("/v4/repos/{repo}/query", post(query_points))
        .route("/v4/repos/{repo}/points", post(write_points))
        .layer(middleware::from_fn(require_auth))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock tsdb listening");
    }
    axum::serve(listener, app()).await
}

async fn require_auth(request: Request, next: Next) -> Response {
    if request.headers().contains_key(header::AUTHORIZATION) {
        return next.run(request).await;
    }
    ApiFailure::new(StatusCode::UNAUTHORIZED, "missing authorization").into_response()
}

fn repo_mut<'a>(
    repos: &'a mut BTreeMap<String, RepoState>,
    name: &str,
) -> Result<&'a mut RepoState, ApiFailure> {
    repos.get_mut(name).ok_or_else(|| ApiFailure::not_found("repo", name))
}

fn repo_ref<'a>(
    repos: &'a BTreeMap<String, RepoState>,
    name: &str,
) -> Result<&'a RepoState, ApiFailure> {
    repos.get(name).ok_or_else(|| ApiFailure::not_found("repo", name))
}

// --- repos ---

async fn list_repos(State(db): State<Db>) -> Json<RepoList> {
    let repos = db.read().await;
    Json(RepoList {
        repos: repos.values().map(|state| state.repo.clone()).collect(),
    })
}

async fn create_repo(
    State(db): State<Db>,
    Path(name): Path<String>,
    Json(input): Json<CreateRepo>,
) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    if repos.contains_key(&name) {
        return Err(ApiFailure::conflict("repo", &name));
    }
    tracing::debug!(repo = %name, "create repo");
    let repo = Repo {
        name: name.clone(),
        region: input.region,
        metadata: input.metadata,
        deleting: String::new(),
    };
    repos.insert(
        name,
        RepoState {
            repo,
            ..RepoState::default()
        },
    );
    Ok(StatusCode::OK)
}

async fn get_repo(State(db): State<Db>, Path(name): Path<String>) -> Result<Json<Repo>, ApiFailure> {
    let repos = db.read().await;
    Ok(Json(repo_ref(&repos, &name)?.repo.clone()))
}

async fn delete_repo(State(db): State<Db>, Path(name): Path<String>) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    repos
        .remove(&name)
        .map(|_| StatusCode::OK)
        .ok_or_else(|| ApiFailure::not_found("repo", &name))
}

async fn update_repo_meta(
    State(db): State<Db>,
    Path(name): Path<String>,
    Json(input): Json<UpdateMetadata>,
) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    repo_mut(&mut repos, &name)?.repo.metadata.extend(input.metadata);
    Ok(StatusCode::OK)
}

async fn delete_repo_meta(State(db): State<Db>, Path(name): Path<String>) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    repo_mut(&mut repos, &name)?.repo.metadata.clear();
    Ok(StatusCode::OK)
}

// --- series ---

async fn list_series(State(db): State<Db>, Path(repo): Path<String>) -> Result<Json<Vec<Series>>, ApiFailure> {
    let repos = db.read().await;
    Ok(Json(repo_ref(&repos, &repo)?.series.values().cloned().collect()))
}

async fn create_series(
    State(db): State<Db>,
    Path((repo, name)): Path<(String, String)>,
    Json(input): Json<CreateSeries>,
) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    let state = repo_mut(&mut repos, &repo)?;
    if state.series.contains_key(&name) {
        return Err(ApiFailure::conflict("series", &name));
    }
    let series = Series {
        name: name.clone(),
        retention: input.retention,
        metadata: input.metadata,
        deleting: String::new(),
    };
    state.series.insert(name, series);
    Ok(StatusCode::OK)
}

async fn delete_series(
    State(db): State<Db>,
    Path((repo, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    repo_mut(&mut repos, &repo)?
        .series
        .remove(&name)
        .map(|_| StatusCode::OK)
        .ok_or_else(|| ApiFailure::not_found("series", &name))
}

async fn update_series_meta(
    State(db): State<Db>,
    Path((repo, name)): Path<(String, String)>,
    Json(input): Json<UpdateMetadata>,
) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    let series = repo_mut(&mut repos, &repo)?
        .series
        .get_mut(&name)
        .ok_or_else(|| ApiFailure::not_found("series", &name))?;
    series.metadata.extend(input.metadata);
    Ok(StatusCode::OK)
}

async fn delete_series_meta(
    State(db): State<Db>,
    Path((repo, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    let series = repo_mut(&mut repos, &repo)?
        .series
        .get_mut(&name)
        .ok_or_else(|| ApiFailure::not_found("series", &name))?;
    series.metadata.clear();
    Ok(StatusCode::OK)
}

// --- views ---

async fn list_views(State(db): State<Db>, Path(repo): Path<String>) -> Result<Json<Vec<View>>, ApiFailure> {
    let repos = db.read().await;
    Ok(Json(repo_ref(&repos, &repo)?.views.values().cloned().collect()))
}

async fn create_view(
    State(db): State<Db>,
    Path((repo, name)): Path<(String, String)>,
    Json(input): Json<CreateView>,
) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    let state = repo_mut(&mut repos, &repo)?;
    if state.views.contains_key(&name) {
        return Err(ApiFailure::conflict("view", &name));
    }
    let view = View {
        name: name.clone(),
        sql: input.sql,
        retention: input.retention,
        deleting: String::new(),
    };
    state.views.insert(name, view);
    Ok(StatusCode::OK)
}

async fn get_view(
    State(db): State<Db>,
    Path((repo, name)): Path<(String, String)>,
) -> Result<Json<View>, ApiFailure> {
    let repos = db.read().await;
    repo_ref(&repos, &repo)?
        .views
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiFailure::not_found("view", &name))
}

async fn delete_view(
    State(db): State<Db>,
    Path((repo, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    repo_mut(&mut repos, &repo)?
        .views
        .remove(&name)
        .map(|_| StatusCode::OK)
        .ok_or_else(|| ApiFailure::not_found("view", &name))
}

// --- points ---

/// Reports how many point lines the repo holds; the SQL is not evaluated.
async fn query_points(
    State(db): State<Db>,
    Path(repo): Path<String>,
    Json(input): Json<Query>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    if input.sql.trim().is_empty() {
        return Err(ApiFailure::new(StatusCode::BAD_REQUEST, "empty sql"));
    }
    let repos = db.read().await;
    let count = repo_ref(&repos, &repo)?.points.len();
    Ok(Json(json!({
        "results": [{
            "series": [{
                "name": "points",
                "columns": ["count"],
                "values": [[count]],
            }]
        }]
    })))
}

async fn write_points(
    State(db): State<Db>,
    Path(repo): Path<String>,
    body: String,
) -> Result<StatusCode, ApiFailure> {
    let mut repos = db.write().await;
    let state = repo_mut(&mut repos, &repo)?;
    state.points.extend(
        body.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string),
    );
    Ok(StatusCode::NO_CONTENT)
}
