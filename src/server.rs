//! Read-only HTTP API over the catalog.
//!
//! The catalog is built once at startup and shared immutably across
//! handlers. Every endpoint is a `GET` that answers from memory.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version and item count) |
//! | `GET`  | `/items` | All items in collection order (`?limit=`) |
//! | `GET`  | `/items/{id}` | Item detail with related lists |
//! | `GET`  | `/items/{id}/similar` | Similar items with shared-tag scores |
//! | `GET`  | `/items/{id}/popular` | Popular items other than this one |
//! | `GET`  | `/facets/{kind}` | Facet entries for `performer` or `category` |
//! | `GET`  | `/facets/{kind}/{name}` | One facet value and its items |
//! | `GET`  | `/views/{view}` | A fixed view such as `sale` or `newest` |
//! | `GET`  | `/search` | Faceted search over the compact index |
//! | `GET`  | `/search-index` | The compact index itself |
//! | `GET`  | `/tags/popular` | Most frequent categories |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "item not found: abc" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a static front end on
//! another origin can call the API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use catalog_core::query::tag_frequencies;
use catalog_core::{
    Catalog, FacetEntry, FacetKind, Item, PerformerCountFilter, QueryParams, SearchIndexEntry,
    SortOrder,
};

use crate::config::Config;
use crate::facets::{facet_list, facet_page, FacetPage};
use crate::get::{get_item_detail, ItemDetail};
use crate::search::search;
use crate::views::{select_view, View};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    catalog: Arc<Catalog>,
    config: Arc<Config>,
    /// Projected once at startup; the catalog never changes.
    index: Arc<Vec<SearchIndexEntry>>,
}

impl AppState {
    pub fn new(catalog: Catalog, config: Config) -> Self {
        let index = catalog.search_index();
        Self {
            catalog: Arc::new(catalog),
            config: Arc::new(config),
            index: Arc::new(index),
        }
    }
}

/// Build the router. Split out from [`run_server`] so tests can drive it
/// without binding a socket.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/items", get(handle_items))
        .route("/items/{id}", get(handle_item))
        .route("/items/{id}/similar", get(handle_similar))
        .route("/items/{id}/popular", get(handle_popular))
        .route("/facets/{kind}", get(handle_facets))
        .route("/facets/{kind}/{name}", get(handle_facet_page))
        .route("/views/{view}", get(handle_view))
        .route("/search", get(handle_search))
        .route("/search-index", get(handle_search_index))
        .route("/tags/popular", get(handle_popular_tags))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until terminated.
pub async fn run_server(catalog: Catalog, config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let items = catalog.len();
    let app = router(AppState::new(catalog, config.clone()));

    info!(items, "catalog server listening on http://{}", bind_addr);
    println!("Catalog server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (`"bad_request"` or `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn parse_kind(kind: &str) -> Result<FacetKind, AppError> {
    kind.parse().map_err(|e: catalog_core::ParseParamError| not_found(e.to_string()))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    items: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        items: state.catalog.len(),
    })
}

// ============ Items ============

#[derive(Debug, Default, Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

async fn handle_items(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<Vec<Item>> {
    let items = state.catalog.items();
    let limit = params.limit.unwrap_or(items.len()).min(items.len());
    Json(items[..limit].to_vec())
}

async fn handle_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Response, AppError> {
    let limit = params.limit.unwrap_or(state.config.catalog.related_limit);
    let detail: ItemDetail<'_> =
        get_item_detail(&state.catalog, &id, limit).map_err(|e| not_found(e.to_string()))?;
    Ok(Json(detail).into_response())
}

#[derive(Serialize)]
struct ScoredItem<'a> {
    score: usize,
    item: &'a Item,
}

async fn handle_similar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Response, AppError> {
    let reference = state
        .catalog
        .item_by_id(&id)
        .ok_or_else(|| not_found(format!("item not found: {}", id)))?;
    let limit = params.limit.unwrap_or(state.config.catalog.related_limit);
    let scored: Vec<ScoredItem<'_>> = state
        .catalog
        .similar_scored(reference, limit)
        .into_iter()
        .map(|s| ScoredItem {
            score: s.score,
            item: s.item,
        })
        .collect();
    Ok(Json(scored).into_response())
}

async fn handle_popular(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Response, AppError> {
    if state.catalog.item_by_id(&id).is_none() {
        return Err(not_found(format!("item not found: {}", id)));
    }
    let limit = params.limit.unwrap_or(state.config.catalog.related_limit);
    Ok(Json(state.catalog.popular_fallback(&id, limit)).into_response())
}

// ============ Facets ============

async fn handle_facets(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<FacetEntry>>, AppError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(facet_list(&state.catalog, kind, params.limit).to_vec()))
}

async fn handle_facet_page(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
    Query(params): Query<LimitParams>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&kind)?;
    let page: FacetPage<'_> = facet_page(&state.catalog, kind, &name, params.limit)
        .map_err(|e| not_found(e.to_string()))?;
    Ok(Json(page).into_response())
}

// ============ Views ============

async fn handle_view(
    State(state): State<AppState>,
    Path(view): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Response, AppError> {
    let view: View = view.parse().map_err(|e: anyhow::Error| not_found(e.to_string()))?;
    let items = select_view(&state.catalog, view, &state.config.catalog, params.limit);
    Ok(Json(items).into_response())
}

// ============ Search ============

/// Query string for `GET /search`. Every field is optional.
///
/// `tags` is a comma-separated list; every tag must match.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchParams {
    q: String,
    sale: bool,
    performers: Option<String>,
    max_price: Option<u32>,
    tags: Option<String>,
    sort: Option<String>,
    limit: Option<usize>,
}

impl SearchParams {
    fn into_query(self) -> Result<(QueryParams, Option<usize>), AppError> {
        let performer_count = match self.performers.as_deref() {
            Some(s) => s
                .parse::<PerformerCountFilter>()
                .map_err(|e| bad_request(e.to_string()))?,
            None => PerformerCountFilter::All,
        };
        let sort = match self.sort.as_deref() {
            Some(s) => s.parse::<SortOrder>().map_err(|e| bad_request(e.to_string()))?,
            None => SortOrder::New,
        };
        let required_tags = self
            .tags
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let params = QueryParams {
            text: self.q,
            on_sale_only: self.sale,
            performer_count,
            max_price: self.max_price,
            required_tags,
            sort,
        };
        Ok((params, self.limit))
    }
}

#[derive(Serialize)]
struct SearchResponse {
    total: usize,
    results: Vec<SearchIndexEntry>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let (params, limit) = params.into_query()?;
    let mut results = search(&state.index, &params, None);
    let total = results.len();
    if let Some(limit) = limit {
        results.truncate(limit);
    }
    Ok(Json(SearchResponse { total, results }))
}

async fn handle_search_index(State(state): State<AppState>) -> Json<Vec<SearchIndexEntry>> {
    Json(state.index.as_ref().clone())
}

#[derive(Serialize)]
struct TagCount {
    tag: String,
    count: usize,
}

async fn handle_popular_tags(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<Vec<TagCount>> {
    let limit = params
        .limit
        .unwrap_or(state.config.catalog.popular_tags_limit);
    Json(
        tag_frequencies(&state.index, limit)
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use catalog_core::{Normalizer, RawRecord};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let rows = RawRecord::many_from_value(json!([
            {
                "fanza_product_id": "x",
                "title": "Beach Day",
                "genres": ["A", "B", "C"],
                "actress_names": ["Aoi"],
                "price": 2000,
                "sale_price": 1000,
                "ranking_position": 5,
                "release_date": "2024-01-01"
            },
            {
                "fanza_product_id": "y",
                "title": "Beach Night",
                "genres": ["A", "B"],
                "actress_names": ["Aoi", "Mei"],
                "price": 400,
                "ranking_position": 1,
                "release_date": "2024-02-01"
            },
            {
                "fanza_product_id": "z",
                "title": "Office",
                "genres": ["D"],
                "price": 900,
                "rating": 4.7
            }
        ]));
        let catalog = Catalog::from_records(&rows, &Normalizer::new());
        router(AppState::new(catalog, Config::minimal()))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn ids(value: &Value) -> Vec<String> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["items"], 3);
    }

    #[tokio::test]
    async fn test_item_detail_and_not_found() {
        let (status, body) = get_json(app(), "/items/x").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["item"]["id"], "x");
        assert_eq!(body["item"]["discountPercent"], 50);
        assert_eq!(body["relatedSource"], "similar");
        assert_eq!(ids(&body["related"]), vec!["y"]);

        let (status, body) = get_json(app(), "/items/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_similar_scores() {
        let (status, body) = get_json(app(), "/items/x/similar").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["item"]["id"], "y");
        assert_eq!(body[0]["score"], 2);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_popular_excludes_item() {
        let (_, body) = get_json(app(), "/items/y/popular").await;
        assert_eq!(ids(&body), vec!["x", "z"]);
    }

    #[tokio::test]
    async fn test_facets() {
        let (status, body) = get_json(app(), "/facets/performer").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Aoi");
        assert_eq!(body[0]["itemCount"], 2);

        let (status, body) = get_json(app(), "/facets/category/A?limit=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entry"]["itemCount"], 2);
        assert_eq!(ids(&body["items"]), vec!["x"]);

        let (status, _) = get_json(app(), "/facets/studio").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_views() {
        let (_, body) = get_json(app(), "/views/ranked").await;
        assert_eq!(ids(&body), vec!["y", "x"]);
        let (_, body) = get_json(app(), "/views/bargain").await;
        assert_eq!(ids(&body), vec!["y"]);
        let (status, _) = get_json(app(), "/views/cheapest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search() {
        let (status, body) = get_json(app(), "/search?q=beach&sort=rank").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(ids(&body["results"]), vec!["y", "x"]);

        let (_, body) = get_json(app(), "/search?performers=multi").await;
        assert_eq!(ids(&body["results"]), vec!["y"]);

        let (_, body) = get_json(app(), "/search?tags=A,C&sale=true").await;
        assert_eq!(ids(&body["results"]), vec!["x"]);

        let (_, body) = get_json(app(), "/search?max_price=900&limit=1").await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["results"].as_array().unwrap().len(), 1);

        let (status, body) = get_json(app(), "/search?sort=cheapest").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_search_index_and_tags() {
        let (_, body) = get_json(app(), "/search-index").await;
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["t"], "Beach Day");

        let (_, body) = get_json(app(), "/tags/popular?limit=2").await;
        assert_eq!(body[0]["tag"], "A");
        assert_eq!(body[0]["count"], 2);
        assert_eq!(body[1]["tag"], "B");
    }
}
