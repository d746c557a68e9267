use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use gitscope_core::{
    ChangedFile, DiffFilter, Error, ErrorKind, GitScope, WorktreeChanges, WorktreeDiff,
    WorktreeView,
};
use serde::{Deserialize, Serialize};

/// Hard upper bound on commit-listing page size, enforced here rather
/// than in the engine.
pub const MAX_COMMIT_LIMIT: usize = 500;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GitScope>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/projects/:id/repository", get(repository_info))
        .route("/projects/:id/commits", get(list_commits))
        .route("/projects/:id/branches", get(list_branches))
        .route("/projects/:id/tags", get(list_tags))
        .route("/projects/:id/resolve", get(resolve_ref))
        .route("/projects/:id/commits/:sha/diff", get(commit_diff))
        .route(
            "/projects/:id/commits/:sha/changed-files",
            get(commit_changed_files),
        )
        .route("/projects/:id/diff", get(range_diff))
        .route("/projects/:id/diff/changed-files", get(range_changed_files))
        .route("/projects/:id/worktree", get(worktree_view))
        .route("/projects/:id/worktree/changes", get(worktree_changes))
        .route("/projects/:id/worktree/diff", get(worktree_diff))
        .route("/projects/:id/file", get(file_at_ref))
        .with_state(state)
}

/// Map a domain error to an HTTP status per its kind.
fn error_response(err: Error) -> (StatusCode, String) {
    let status = match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[derive(Serialize)]
struct RepositoryInfo {
    is_repository: bool,
    current_branch: Option<String>,
}

async fn repository_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<RepositoryInfo> {
    // Presence is a best-effort probe: every failure collapses to false.
    let is_repository = state.engine.project_is_repository(&id);
    let current_branch = if is_repository {
        match state.engine.resolve_project(&id) {
            Ok(root) => state.engine.current_branch(&root).await,
            Err(_) => None,
        }
    } else {
        None
    };
    Json(RepositoryInfo {
        is_repository,
        current_branch,
    })
}

#[derive(Deserialize)]
struct CommitsQuery {
    #[serde(rename = "ref")]
    refname: Option<String>,
    limit: Option<usize>,
}

async fn list_commits(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CommitsQuery>,
) -> ApiResult<Json<Vec<gitscope_core::Commit>>> {
    let root = resolve(&state, &id)?;
    let limit = query.limit.map(|l| l.min(MAX_COMMIT_LIMIT));
    state
        .engine
        .list_commits(&root, query.refname.as_deref(), limit)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn list_branches(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<gitscope_core::Branch>>> {
    let root = resolve(&state, &id)?;
    state
        .engine
        .list_branches(&root)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn list_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<gitscope_core::Tag>>> {
    let root = resolve(&state, &id)?;
    state
        .engine
        .list_tags(&root)
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Deserialize)]
struct RefQuery {
    #[serde(rename = "ref")]
    refname: String,
}

#[derive(Serialize)]
struct ResolvedRef {
    sha: String,
}

async fn resolve_ref(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RefQuery>,
) -> ApiResult<Json<ResolvedRef>> {
    let root = resolve(&state, &id)?;
    state
        .engine
        .resolve_ref(&root, &query.refname)
        .await
        .map(|sha| Json(ResolvedRef { sha }))
        .map_err(error_response)
}

async fn commit_diff(
    State(state): State<AppState>,
    Path((id, sha)): Path<(String, String)>,
) -> ApiResult<String> {
    let root = resolve(&state, &id)?;
    state
        .engine
        .commit_diff(&root, &sha)
        .await
        .map_err(error_response)
}

async fn commit_changed_files(
    State(state): State<AppState>,
    Path((id, sha)): Path<(String, String)>,
) -> ApiResult<Json<Vec<ChangedFile>>> {
    let root = resolve(&state, &id)?;
    state
        .engine
        .commit_changed_files(&root, &sha)
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Deserialize)]
struct RangeQuery {
    from: String,
    to: String,
}

async fn range_diff(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<String> {
    let root = resolve(&state, &id)?;
    state
        .engine
        .range_diff(&root, &query.from, &query.to)
        .await
        .map_err(error_response)
}

async fn range_changed_files(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Vec<ChangedFile>>> {
    let root = resolve(&state, &id)?;
    state
        .engine
        .range_changed_files(&root, &query.from, &query.to)
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Deserialize)]
struct FilterQuery {
    filter: Option<String>,
}

fn parse_filter(query: &FilterQuery) -> Result<DiffFilter, (StatusCode, String)> {
    match &query.filter {
        None => Ok(DiffFilter::All),
        Some(raw) => DiffFilter::parse(raw).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("invalid filter: {raw} (expected all, staged, or unstaged)"),
            )
        }),
    }
}

async fn worktree_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<WorktreeView>> {
    let root = resolve(&state, &id)?;
    let filter = parse_filter(&query)?;
    state
        .engine
        .worktree_view(&root, filter)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn worktree_changes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<WorktreeChanges>> {
    let root = resolve(&state, &id)?;
    let filter = parse_filter(&query)?;
    state
        .engine
        .worktree_changes(&root, filter)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn worktree_diff(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<WorktreeDiff>> {
    let root = resolve(&state, &id)?;
    let filter = parse_filter(&query)?;
    state
        .engine
        .worktree_diff(&root, filter)
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Deserialize)]
struct FileQuery {
    #[serde(rename = "ref")]
    refname: String,
    path: String,
}

async fn file_at_ref(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FileQuery>,
) -> ApiResult<String> {
    let root = resolve(&state, &id)?;
    state
        .engine
        .get_file_at_ref(&root, &query.refname, std::path::Path::new(&query.path))
        .await
        .map_err(error_response)
}

/// Resolve the project root once per request; handlers thread it through
/// every engine sub-call.
fn resolve(state: &AppState, id: &str) -> Result<PathBuf, (StatusCode, String)> {
    state.engine.resolve_project(id).map_err(error_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use gitscope_core::{CommandLog, ProjectRegistry};
    use std::path::Path as FsPath;
    use std::process::Command;
    use tower::ServiceExt;

    fn git(root: &FsPath, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(root)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?}: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn init_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init"]);
        git(dir.path(), &["config", "user.email", "t@example.com"]);
        git(dir.path(), &["config", "user.name", "T"]);
        std::fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
        git(dir.path(), &["add", "-A"]);
        git(dir.path(), &["commit", "-m", "initial"]);
        dir
    }

    fn app_for(root: &FsPath) -> Router {
        let mut registry = ProjectRegistry::new();
        registry.insert("demo", root);
        create_router(AppState {
            engine: Arc::new(GitScope::new(registry)),
        })
    }

    async fn get_status(app: Router, uri: &str) -> StatusCode {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[test]
    fn test_error_mapping() {
        let (status, _) = error_response(Error::Validation("bad".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = error_response(Error::NotFound("missing".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = error_response(Error::GitCommand {
            command: "git log".into(),
            code: Some(128),
            stderr: "boom".into(),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_limit_clamped_to_hard_cap() {
        let repo = init_repo();
        let mut registry = ProjectRegistry::new();
        registry.insert("demo", repo.path());
        let log = CommandLog::new();
        let app = create_router(AppState {
            engine: Arc::new(GitScope::new(registry).with_command_log(log.clone())),
        });

        let status = get_status(app, "/projects/demo/commits?limit=9999").await;
        assert_eq!(status, StatusCode::OK);

        // The engine never sees more than the hard cap.
        assert!(log
            .commands()
            .iter()
            .any(|args| args.iter().any(|arg| arg == "--max-count=500")));
    }

    #[tokio::test]
    async fn test_commits_route_ok() {
        let repo = init_repo();
        let status = get_status(app_for(repo.path()), "/projects/demo/commits").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_project_is_404() {
        let repo = init_repo();
        let status = get_status(app_for(repo.path()), "/projects/nope/commits").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_sha_is_400() {
        let repo = init_repo();
        let status = get_status(
            app_for(repo.path()),
            "/projects/demo/commits/bad-sha%21/diff",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_filter_is_400() {
        let repo = init_repo();
        let status = get_status(
            app_for(repo.path()),
            "/projects/demo/worktree?filter=everything",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let repo = init_repo();
        let status = get_status(app_for(repo.path()), "/health").await;
        assert_eq!(status, StatusCode::OK);
    }
}
