pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::cms::handlers as cms;
use crate::players::handlers as players;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/system/connections",
            get(health::handle_connections),
        )
        // Analysis
        .route("/api/v1/analyze", post(analysis::handle_analyze))
        .route("/api/v1/analyze/demo", post(analysis::handle_analyze_demo))
        .route(
            "/api/v1/webhook/analysis-complete",
            post(analysis::handle_analysis_complete),
        )
        // Players
        .route(
            "/api/v1/players/:id/analyses",
            get(players::handle_list_analyses),
        )
        // CMS
        .route("/api/v1/cms/webflow-sync", post(cms::handle_webflow_sync))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::players::store::memory::MemoryPlayerStore;
    use crate::state::testing::fallback_state;

    fn router() -> (Router, Arc<MemoryPlayerStore>) {
        let store = Arc::new(MemoryPlayerStore::default());
        (build_router(fallback_state(store.clone())), store)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = router();
        let (status, body) = send(router, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "footpulse-api");
    }

    #[tokio::test]
    async fn test_connections_reports_each_dependency() {
        let (router, _) = router();
        let (status, body) = send(router, get("/api/v1/system/connections")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"]["success"], true);
        // Fallback mode runs without a completion backend
        assert_eq!(body["llm"]["success"], false);
    }

    #[tokio::test]
    async fn test_analyze_then_list_analyses() {
        let (router, store) = router();
        let (status, body) = send(
            router.clone(),
            post_json(
                "/api/v1/analyze",
                json!({
                    "name": "Inès Benali",
                    "position": "Milieu offensif",
                    "age": 19,
                    "club": "Olympique Lyonnais",
                    "email": "ines@example.com"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["source"], "fallback");
        for key in ["globalScore", "vitesse", "physique", "tactique", "positionAnalysis"] {
            assert!(body["analysis"].get(key).is_some(), "missing {key}");
        }

        let player_id = store.players()[0].id;
        let (status, list) = send(router, get(&format!("/api/v1/players/{player_id}/analyses"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], body["analysisId"]);
    }

    #[tokio::test]
    async fn test_invalid_profile_is_bad_request() {
        let (router, _) = router();
        let (status, body) = send(
            router,
            post_json("/api/v1/analyze", json!({ "name": "Old Timer", "age": 99 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PROFILE");
    }

    #[tokio::test]
    async fn test_unknown_player_analyses_is_not_found() {
        let (router, _) = router();
        let (status, body) = send(
            router,
            get(&format!("/api/v1/players/{}/analyses", Uuid::new_v4())),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_demo_without_email_is_bad_request() {
        let (router, _) = router();
        let (status, _) = send(router, post_json("/api/v1/analyze/demo", json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webflow_sync_without_config_is_unavailable() {
        let (router, _) = router();
        let (status, _) = send(
            router,
            post_json(
                "/api/v1/cms/webflow-sync",
                json!({ "action": "add_video_analysis", "playerId": "rec1", "data": {} }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
