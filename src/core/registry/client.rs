use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::model::{ModSummary, ProjectVersion, ResolvedVersion, SearchResponse};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::LoaderType;

pub const MODRINTH_API_BASE: &str = "https://api.modrinth.com/v2";

/// Default budget for a single registry round-trip.
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(5);

/// Read side of the mod registry used by the resolver.
#[async_trait]
pub trait ModRegistry: Send + Sync {
    /// Full-text search restricted to mod projects.
    async fn search(&self, query: &str) -> LauncherResult<Vec<ModSummary>>;

    /// Latest build of `project_id` for the given game version and loader.
    ///
    /// `Ok(None)` means the registry has no compatible build; that is an
    /// expected outcome, not an error.
    async fn latest_version(
        &self,
        project_id: &str,
        game_version: &str,
        loader: LoaderType,
    ) -> LauncherResult<Option<ResolvedVersion>>;
}

/// Stateless HTTPS client for the Modrinth v2 API.
#[derive(Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RegistryClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: MODRINTH_API_BASE.to_string(),
            timeout: DEFAULT_REGISTRY_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base_url` plus `segments`, each one percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> LauncherResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            LauncherError::RegistryApi(format!("invalid base url {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                LauncherError::RegistryApi(format!("base url {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> LauncherResult<T> {
        let resp = self
            .client
            .get(url.clone())
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LauncherError::RegistryApi(format!(
                "{} returned {}",
                url, status
            )));
        }

        resp.json::<T>().await.map_err(|e| {
            LauncherError::RegistryApi(format!("malformed response from {}: {}", url, e))
        })
    }
}

#[async_trait]
impl ModRegistry for RegistryClient {
    async fn search(&self, query: &str) -> LauncherResult<Vec<ModSummary>> {
        let url = self.endpoint(&["search"])?;
        let facets = serde_json::to_string(&[["project_type:mod"]])?;

        let resp: SearchResponse = self
            .get_json(url, &[("query", query.to_string()), ("facets", facets)])
            .await?;

        debug!("Search '{}' returned {} hits", query, resp.hits.len());
        Ok(resp.hits)
    }

    async fn latest_version(
        &self,
        project_id: &str,
        game_version: &str,
        loader: LoaderType,
    ) -> LauncherResult<Option<ResolvedVersion>> {
        let url = self.endpoint(&["project", project_id, "version"])?;
        let loaders = serde_json::to_string(&[loader.as_str()])?;
        let game_versions = serde_json::to_string(&[game_version])?;

        let versions: Vec<ProjectVersion> = self
            .get_json(
                url,
                &[("loaders", loaders), ("game_versions", game_versions)],
            )
            .await?;

        // Registry ordering is authoritative: newest first.
        let resolved = match versions.into_iter().next() {
            Some(latest) => latest.into_resolved(project_id)?,
            None => None,
        };

        match &resolved {
            Some(v) => debug!("Resolved {} -> {}", project_id, v.filename),
            None => debug!(
                "No {} build of {} for {}",
                loader, project_id, game_version
            ),
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::core::http::{build_http_client, APP_USER_AGENT};
    use crate::core::registry::DependencyType;
    use crate::core::test_support::TestServer;

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn sodium_versions(
        State(seen): State<Seen>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        seen.lock().unwrap().push(params);
        Json(json!([
            {
                "version_number": "mc1.20.1-0.5.3",
                "files": [
                    {"primary": true, "filename": "sodium.jar", "url": "https://cdn/sodium.jar", "hashes": {"sha1": "abc"}}
                ],
                "dependencies": [
                    {"project_id": "fabric-api", "dependency_type": "required"}
                ]
            },
            {
                "version_number": "mc1.20.1-0.5.2",
                "files": [
                    {"primary": true, "filename": "sodium-old.jar", "url": "https://cdn/old.jar", "hashes": {"sha1": "def"}}
                ],
                "dependencies": []
            }
        ]))
    }

    async fn no_versions() -> Json<Value> {
        Json(json!([]))
    }

    async fn search_hits(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<Value>, StatusCode> {
        let agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if agent != APP_USER_AGENT {
            return Err(StatusCode::FORBIDDEN);
        }
        if params.get("facets").map(String::as_str) != Some(r#"[["project_type:mod"]]"#) {
            return Err(StatusCode::BAD_REQUEST);
        }
        Ok(Json(json!({
            "hits": [
                {"project_id": "AANobbMI", "title": "Sodium", "description": "Fast", "icon_url": null, "downloads": 1500, "slug": "sodium"}
            ]
        })))
    }

    async fn unavailable() -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }

    async fn garbage() -> &'static str {
        "<html>not json</html>"
    }

    async fn server() -> (TestServer, Seen) {
        let seen: Seen = Arc::default();
        let router = Router::new()
            .route("/project/sodium/version", get(sodium_versions))
            .route("/project/legacy-mod/version", get(no_versions))
            .route("/project/broken/version", get(unavailable))
            .route("/project/garbled/version", get(garbage))
            .route("/search", get(search_hits))
            .with_state(seen.clone());
        (TestServer::new(router).await, seen)
    }

    fn client(server: &TestServer) -> RegistryClient {
        RegistryClient::new(build_http_client().unwrap()).with_base_url(server.base_url())
    }

    #[tokio::test]
    async fn latest_version_takes_first_entry_and_sends_filters() {
        let (server, seen) = server().await;
        let registry = client(&server);

        let v = registry
            .latest_version("sodium", "1.20.1", LoaderType::Fabric)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(v.project_id, "sodium");
        assert_eq!(v.filename, "sodium.jar");
        assert_eq!(v.content_hash.as_deref(), Some("abc"));
        assert_eq!(v.dependencies.len(), 1);
        assert_eq!(v.dependencies[0].dependency_type, DependencyType::Required);

        let params = seen.lock().unwrap()[0].clone();
        assert_eq!(params["loaders"], r#"["fabric"]"#);
        assert_eq!(params["game_versions"], r#"["1.20.1"]"#);
    }

    #[tokio::test]
    async fn empty_version_list_is_not_an_error() {
        let (server, _) = server().await;
        let v = client(&server)
            .latest_version("legacy-mod", "1.20.1", LoaderType::Fabric)
            .await
            .unwrap();
        assert!(v.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_a_registry_error() {
        let (server, _) = server().await;
        let err = client(&server)
            .latest_version("broken", "1.20.1", LoaderType::Fabric)
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::RegistryApi(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn malformed_body_is_a_registry_error() {
        let (server, _) = server().await;
        let err = client(&server)
            .latest_version("garbled", "1.20.1", LoaderType::Fabric)
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::RegistryApi(msg) if msg.contains("malformed")));
    }

    #[tokio::test]
    async fn search_filters_to_mods_and_identifies_client() {
        let (server, _) = server().await;
        let hits = client(&server).search("sodium").await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].project_id, "AANobbMI");
        assert_eq!(hits[0].title, "Sodium");
        assert_eq!(hits[0].downloads_label(), "1.5k downloads");
    }

    #[tokio::test]
    async fn project_id_is_sent_as_one_path_segment() {
        async fn any_project(State(seen): State<Seen>, Path(id): Path<String>) -> Json<Value> {
            seen.lock().unwrap().push(HashMap::from([("id".to_string(), id)]));
            Json(json!([]))
        }
        let seen: Seen = Arc::default();
        let router = Router::new()
            .route("/v2/project/{id}/version", get(any_project))
            .with_state(seen.clone());
        let server = TestServer::new(router).await;
        let registry = RegistryClient::new(build_http_client().unwrap())
            .with_base_url(server.url("/v2/"));

        let v = registry
            .latest_version("odd/id?x=1#frag", "1.20.1", LoaderType::Fabric)
            .await
            .unwrap();

        assert!(v.is_none());
        assert_eq!(seen.lock().unwrap()[0]["id"], "odd/id?x=1#frag");
    }

    #[tokio::test]
    async fn unsafe_artifact_filename_is_a_registry_failure() {
        async fn hostile() -> Json<Value> {
            Json(json!([{
                "files": [{"primary": true, "filename": "../../escaped.jar", "url": "https://cdn/e.jar"}]
            }]))
        }
        let server =
            TestServer::new(Router::new().route("/project/evil/version", get(hostile))).await;

        let err = client(&server)
            .latest_version("evil", "1.20.1", LoaderType::Fabric)
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::UnsafeFileName(_)));
    }

    #[tokio::test]
    async fn slow_registry_times_out() {
        async fn stall() -> Json<Value> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!([]))
        }
        let server = TestServer::new(Router::new().route("/project/slow/version", get(stall))).await;
        let registry = client(&server).with_timeout(Duration::from_millis(100));

        let err = registry
            .latest_version("slow", "1.20.1", LoaderType::Fabric)
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Http(e) if e.is_timeout()));
    }
}
