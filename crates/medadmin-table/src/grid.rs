//! Grid binding and live grid handle

use parking_lot::Mutex;
use std::sync::Arc;

use medadmin_http::{AuthenticatedClient, FALLBACK_MESSAGE};
use medadmin_ui::Severity;

use crate::column::ColumnSpec;
use crate::error::TableError;
use crate::language::GridLanguage;
use crate::query::{SortDirection, SortSpec, TableQuery};
use crate::response::TablePage;
use crate::Result;

pub const DEFAULT_PAGE_LENGTH: usize = 20;
pub const PAGE_LENGTH_OPTIONS: [usize; 4] = [10, 20, 50, 100];

/// Options applied to every grid a binding initializes
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub processing: bool,
    pub server_side: bool,
    pub page_length: usize,
    pub length_menu: Vec<usize>,
    pub language: GridLanguage,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            processing: true,
            server_side: true,
            page_length: DEFAULT_PAGE_LENGTH,
            length_menu: PAGE_LENGTH_OPTIONS.to_vec(),
            language: GridLanguage::default(),
        }
    }
}

impl TableConfig {
    /// Set the initial page length; it is added to the menu if missing
    pub fn with_page_length(mut self, page_length: usize) -> Self {
        let page_length = page_length.max(1);
        if !self.length_menu.contains(&page_length) {
            self.length_menu.push(page_length);
            self.length_menu.sort_unstable();
        }
        self.page_length = page_length;
        self
    }
}

/// Creates grids whose fetches share the client's token and 401 handling
#[derive(Clone)]
pub struct TableBinding {
    client: AuthenticatedClient,
    config: TableConfig,
}

impl TableBinding {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self::with_config(client, TableConfig::default())
    }

    pub fn with_config(client: AuthenticatedClient, config: TableConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Bind a grid to `endpoint`. No rows are fetched until the first
    /// [`GridHandle::draw`].
    pub fn initialize(
        &self,
        table_id: &str,
        columns: Vec<ColumnSpec>,
        endpoint: &str,
    ) -> Result<GridHandle> {
        let table_id = table_id.trim();
        if table_id.is_empty() {
            return Err(TableError::EmptyTableId);
        }
        if columns.is_empty() {
            return Err(TableError::NoColumns);
        }
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(TableError::EmptyEndpoint);
        }

        tracing::info!(
            table = %table_id,
            endpoint = %endpoint,
            columns = columns.len(),
            page_length = self.config.page_length,
            "Initializing table"
        );

        Ok(GridHandle {
            inner: Arc::new(GridInner {
                table_id: table_id.to_string(),
                endpoint: endpoint.to_string(),
                columns,
                config: self.config.clone(),
                client: self.client.clone(),
                state: Mutex::new(GridState {
                    draw: 0,
                    start: 0,
                    length: self.config.page_length,
                    search: String::new(),
                    order: Vec::new(),
                    page: None,
                    page_start: 0,
                    processing: false,
                }),
            }),
        })
    }
}

struct GridState {
    /// Last issued draw
    draw: u64,
    start: usize,
    length: usize,
    search: String,
    order: Vec<SortSpec>,
    /// Last page that was applied and the offset it was fetched at
    page: Option<TablePage>,
    page_start: usize,
    processing: bool,
}

struct GridInner {
    table_id: String,
    endpoint: String,
    columns: Vec<ColumnSpec>,
    config: TableConfig,
    client: AuthenticatedClient,
    state: Mutex<GridState>,
}

#[derive(Clone)]
pub struct GridHandle {
    inner: Arc<GridInner>,
}

impl GridHandle {
    pub fn table_id(&self) -> &str {
        &self.inner.table_id
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.inner.columns
    }

    pub fn config(&self) -> &TableConfig {
        &self.inner.config
    }

    /// Fetch the page described by the current paging, search and order.
    ///
    /// On failure the previous rows stay. Failures other than 401 are shown
    /// as a danger alert; a 401 has already torn the session down. A fetch
    /// overtaken by a newer one returns `TableError::Stale` and changes nothing.
    pub async fn draw(&self) -> Result<TablePage> {
        let query = {
            let mut state = self.inner.state.lock();
            state.draw += 1;
            state.processing = self.inner.config.processing;
            TableQuery {
                draw: state.draw,
                start: state.start,
                length: state.length,
                search: state.search.clone(),
                order: state.order.clone(),
            }
        };

        let params = query.to_params(&self.inner.columns);
        let outcome = self
            .inner
            .client
            .get_with_query(&self.inner.endpoint, &params)
            .await;

        let mut state = self.inner.state.lock();
        if state.draw != query.draw {
            tracing::debug!(
                table = %self.inner.table_id,
                draw = query.draw,
                latest = state.draw,
                "Discarding stale table response"
            );
            return Err(TableError::Stale(query.draw));
        }
        state.processing = false;

        let body = match outcome {
            Ok(body) => body,
            Err(e) => {
                drop(state);
                if !e.is_terminal() {
                    tracing::warn!(table = %self.inner.table_id, error = %e, "Table fetch failed");
                    self.inner
                        .client
                        .notifier()
                        .show(&e.user_message(), Severity::Danger);
                }
                return Err(e.into());
            }
        };

        match TablePage::from_response(&body, query.draw) {
            Ok(page) => {
                tracing::debug!(
                    table = %self.inner.table_id,
                    draw = query.draw,
                    rows = page.rows.len(),
                    total = page.records_total,
                    "Table page loaded"
                );
                state.page = Some(page.clone());
                state.page_start = query.start;
                Ok(page)
            }
            Err(e) => {
                drop(state);
                tracing::warn!(table = %self.inner.table_id, error = %e, "Unusable table response");
                self.inner
                    .client
                    .notifier()
                    .show(FALLBACK_MESSAGE, Severity::Danger);
                Err(e)
            }
        }
    }

    /// Redraw, optionally going back to the first page
    pub async fn reload(&self, reset_paging: bool) -> Result<TablePage> {
        if reset_paging {
            self.inner.state.lock().start = 0;
        }
        self.draw().await
    }

    /// Jump to the zero-based page `index`
    pub async fn page(&self, index: usize) -> Result<TablePage> {
        self.select_page(index)?;
        self.draw().await
    }

    /// Change the page length and return to the first page
    pub async fn set_page_length(&self, length: usize) -> Result<TablePage> {
        self.select_page_length(length)?;
        self.draw().await
    }

    /// Filter by `term` starting from the first page
    pub async fn search(&self, term: &str) -> Result<TablePage> {
        self.select_search(term);
        self.draw().await
    }

    /// Sort by a single column
    pub async fn order(&self, column: usize, direction: SortDirection) -> Result<TablePage> {
        self.select_order(column, direction)?;
        self.draw().await
    }

    // The `select_*` setters change what the next `draw` fetches without
    // fetching. Apply paging last; length and search go back to page 0.

    pub fn select_page(&self, index: usize) -> Result<()> {
        let mut state = self.inner.state.lock();
        let start = index
            .checked_mul(state.length)
            .filter(|start| start.checked_add(state.length).is_some())
            .ok_or(TableError::PageOutOfRange(index))?;
        state.start = start;
        Ok(())
    }

    pub fn select_page_length(&self, length: usize) -> Result<()> {
        if !self.inner.config.length_menu.contains(&length) {
            return Err(TableError::UnknownPageLength(length));
        }
        let mut state = self.inner.state.lock();
        state.length = length;
        state.start = 0;
        Ok(())
    }

    pub fn select_search(&self, term: &str) {
        let mut state = self.inner.state.lock();
        state.search = term.trim().to_string();
        state.start = 0;
    }

    pub fn select_order(&self, column: usize, direction: SortDirection) -> Result<()> {
        let spec = self
            .inner
            .columns
            .get(column)
            .ok_or(TableError::ColumnOutOfRange(column))?;
        if !spec.orderable {
            return Err(TableError::ColumnNotOrderable(column));
        }

        self.inner.state.lock().order = vec![SortSpec { column, direction }];
        Ok(())
    }

    /// Raw rows of the last applied page
    pub fn rows(&self) -> Vec<serde_json::Value> {
        self.inner
            .state
            .lock()
            .page
            .as_ref()
            .map(|page| page.rows.clone())
            .unwrap_or_default()
    }

    /// Rows as cell markup, one string per column
    pub fn rendered_rows(&self) -> Vec<Vec<String>> {
        let state = self.inner.state.lock();
        let Some(page) = state.page.as_ref() else {
            return Vec::new();
        };

        page.rows
            .iter()
            .map(|row| self.inner.columns.iter().map(|c| c.cell(row)).collect())
            .collect()
    }

    pub fn info(&self) -> String {
        let state = self.inner.state.lock();
        let language = &self.inner.config.language;
        match state.page.as_ref() {
            Some(page) => language.info_text(
                state.page_start as u64,
                page.rows.len() as u64,
                page.records_filtered,
                page.records_total,
            ),
            None => language.info_empty.clone(),
        }
    }

    pub fn page_count(&self) -> usize {
        let state = self.inner.state.lock();
        match state.page.as_ref() {
            Some(page) if state.length > 0 => {
                (page.records_filtered as usize).div_ceil(state.length)
            }
            _ => 0,
        }
    }

    /// Zero-based index of the current page
    pub fn current_page(&self) -> usize {
        let state = self.inner.state.lock();
        if state.length == 0 {
            0
        } else {
            state.start / state.length
        }
    }

    pub fn page_length(&self) -> usize {
        self.inner.state.lock().length
    }

    pub fn is_processing(&self) -> bool {
        self.inner.state.lock().processing
    }
}

impl std::fmt::Debug for GridHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridHandle")
            .field("table_id", &self.inner.table_id)
            .field("endpoint", &self.inner.endpoint)
            .field("columns", &self.inner.columns.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use medadmin_http::ApiError;
    use medadmin_session::{
        AdminUser, PersistentSessionStore, Session, SessionManager, SessionStore, TOKEN_KEY,
    };
    use medadmin_storage::Database;
    use medadmin_ui::{AlertCenter, Location, Navigator};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::time::Duration;
    use url::Url;

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    struct Harness {
        binding: TableBinding,
        location: Location,
        alerts: AlertCenter,
        db: Database,
        seen: Seen,
    }

    fn users() -> Vec<Value> {
        (1..=45)
            .map(|id| {
                json!({
                    "id": id,
                    "username": if id % 10 == 0 {
                        format!("张{}", id)
                    } else {
                        format!("user{}", id)
                    },
                    "created_at": "2024-03-15T08:05:00",
                    "balance": id as f64 * 1000.5,
                })
            })
            .collect()
    }

    async fn list_users(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        let mut recorded = params.clone();
        if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            recorded.insert("authorization".to_string(), value.to_string());
        }
        seen.lock().push(recorded);

        let search = params.get("search[value]").cloned().unwrap_or_default();
        if search == "slow" {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let page_size: usize = params
            .get("page_size")
            .and_then(|p| p.parse().ok())
            .unwrap_or(20);

        let mut items: Vec<Value> = users()
            .into_iter()
            .filter(|u| {
                search.is_empty()
                    || search == "slow"
                    || u["username"].as_str().unwrap().contains(&search)
            })
            .collect();
        if params.get("order[0][dir]").map(String::as_str) == Some("desc") {
            items.reverse();
        }

        let total = items.len();
        let items: Vec<Value> = items
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        Json(json!({
            "success": true,
            "message": "Users retrieved successfully",
            "data": {
                "items": items,
                "total": total,
                "page": page,
                "page_size": page_size,
                "total_pages": total.div_ceil(page_size),
            }
        }))
        .into_response()
    }

    fn api(seen: Seen) -> Router {
        Router::new()
            .route("/api/users", get(list_users))
            .route(
                "/api/expired",
                get(|| async {
                    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token has expired"})))
                }),
            )
            .route(
                "/api/broken",
                get(|| async {
                    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "数据库错误"})))
                }),
            )
            .route("/api/odd", get(|| async { Json(json!({"foo": 1})) }))
            .with_state(seen)
    }

    async fn harness() -> Harness {
        let seen = Seen::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = api(Arc::clone(&seen));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let base = Url::parse(&format!("http://{}/", addr)).unwrap();

        let db = Database::open_in_memory().unwrap();
        let store = PersistentSessionStore::new(db.clone());
        store
            .set(&Session::new("grid-token", AdminUser::new("admin", "super_admin")))
            .unwrap();

        let location = Location::new("/admin/users");
        let sessions = SessionManager::new(Arc::new(store), Arc::new(location.clone()));
        let alerts = AlertCenter::new();
        let client = AuthenticatedClient::builder(sessions)
            .base_url(base)
            .notifier(Arc::new(alerts.clone()))
            .build()
            .unwrap();

        Harness {
            binding: TableBinding::new(client),
            location,
            alerts,
            db,
            seen,
        }
    }

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("id", "ID"),
            ColumnSpec::new("username", "用户名"),
            ColumnSpec::date("created_at", "注册时间"),
            ColumnSpec::number("balance", "余额").unorderable(),
            ColumnSpec::action("操作", |_, row| format!("<a href=\"#{}\">编辑</a>", row["id"])),
        ]
    }

    #[tokio::test]
    async fn test_initialize_validates_arguments() {
        let h = harness().await;

        assert!(matches!(
            h.binding.initialize(" ", columns(), "/api/users"),
            Err(TableError::EmptyTableId)
        ));
        assert!(matches!(
            h.binding.initialize("usersTable", Vec::new(), "/api/users"),
            Err(TableError::NoColumns)
        ));
        assert!(matches!(
            h.binding.initialize("usersTable", columns(), ""),
            Err(TableError::EmptyEndpoint)
        ));

        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();
        assert_eq!(grid.page_length(), DEFAULT_PAGE_LENGTH);
        assert!(grid.rows().is_empty());
        assert_eq!(grid.info(), "没有记录");
        assert!(h.seen.lock().is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = TableConfig::default();
        assert!(config.server_side);
        assert!(config.processing);
        assert_eq!(config.length_menu, vec![10, 20, 50, 100]);
        assert!(config.length_menu.contains(&config.page_length));

        let custom = TableConfig::default().with_page_length(25);
        assert_eq!(custom.page_length, 25);
        assert_eq!(custom.length_menu, vec![10, 20, 25, 50, 100]);
    }

    #[tokio::test]
    async fn test_first_draw_and_paging() {
        let h = harness().await;
        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();

        let page = grid.draw().await.unwrap();
        assert_eq!(page.draw, 1);
        assert_eq!(page.records_total, 45);
        assert_eq!(grid.rows().len(), 20);
        assert_eq!(grid.page_count(), 3);
        assert_eq!(grid.info(), "显示第 1 至 20 条记录，共 45 条");

        grid.page(2).await.unwrap();
        assert_eq!(grid.rows().len(), 5);
        assert_eq!(grid.current_page(), 2);
        assert_eq!(grid.info(), "显示第 41 至 45 条记录，共 45 条");

        let seen = h.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1]["draw"], "2");
        assert_eq!(seen[1]["start"], "40");
        assert_eq!(seen[1]["length"], "20");
        assert_eq!(seen[1]["page"], "3");
        assert_eq!(seen[1]["columns[0][data]"], "id");
    }

    #[tokio::test]
    async fn test_unreachable_page_is_rejected_without_fetching() {
        let h = harness().await;
        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();

        assert!(matches!(
            grid.page(usize::MAX / 10).await,
            Err(TableError::PageOutOfRange(_))
        ));
        assert!(matches!(
            grid.page(usize::MAX / DEFAULT_PAGE_LENGTH).await,
            Err(TableError::PageOutOfRange(_))
        ));
        assert!(h.seen.lock().is_empty());
        assert_eq!(grid.current_page(), 0);

        grid.page(1).await.unwrap();
        assert_eq!(grid.current_page(), 1);
    }

    #[tokio::test]
    async fn test_selections_apply_in_one_fetch() {
        let h = harness().await;
        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();

        grid.select_page_length(10).unwrap();
        grid.select_search(" user ");
        grid.select_order(0, SortDirection::Desc).unwrap();
        grid.select_page(1).unwrap();
        assert!(matches!(
            grid.select_page_length(30),
            Err(TableError::UnknownPageLength(30))
        ));
        assert!(matches!(
            grid.select_order(3, SortDirection::Asc),
            Err(TableError::ColumnNotOrderable(3))
        ));
        assert!(h.seen.lock().is_empty());

        grid.draw().await.unwrap();
        assert_eq!(grid.current_page(), 1);
        assert_eq!(grid.rows().len(), 10);

        let seen = h.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["draw"], "1");
        assert_eq!(seen[0]["start"], "10");
        assert_eq!(seen[0]["length"], "10");
        assert_eq!(seen[0]["search[value]"], "user");
        assert_eq!(seen[0]["order[0][column]"], "0");
        assert_eq!(seen[0]["order[0][dir]"], "desc");
    }

    #[tokio::test]
    async fn test_rendered_rows_use_column_renderers() {
        let h = harness().await;
        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();
        grid.draw().await.unwrap();

        let rendered = grid.rendered_rows();
        assert_eq!(
            rendered[0],
            vec![
                "1".to_string(),
                "user1".to_string(),
                "2024/03/15 08:05".to_string(),
                "1,000.50".to_string(),
                "<a href=\"#1\">编辑</a>".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_resets_to_first_page() {
        let h = harness().await;
        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();
        grid.page(1).await.unwrap();

        grid.search("张").await.unwrap();
        assert_eq!(grid.current_page(), 0);
        assert_eq!(grid.rows().len(), 4);
        assert_eq!(grid.info(), "显示第 1 至 4 条记录，共 4 条");

        let seen = h.seen.lock();
        let last = seen.last().unwrap();
        assert_eq!(last["start"], "0");
        assert_eq!(last["search[value]"], "张");
        assert_eq!(last["search"], "张");
    }

    #[tokio::test]
    async fn test_page_length_must_be_in_menu() {
        let h = harness().await;
        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();

        assert!(matches!(
            grid.set_page_length(30).await,
            Err(TableError::UnknownPageLength(30))
        ));
        assert!(h.seen.lock().is_empty());

        grid.set_page_length(50).await.unwrap();
        assert_eq!(grid.rows().len(), 45);
        assert_eq!(grid.page_count(), 1);
    }

    #[tokio::test]
    async fn test_order_only_orderable_columns() {
        let h = harness().await;
        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();

        assert!(matches!(
            grid.order(3, SortDirection::Asc).await,
            Err(TableError::ColumnNotOrderable(3))
        ));
        assert!(matches!(
            grid.order(9, SortDirection::Asc).await,
            Err(TableError::ColumnOutOfRange(9))
        ));

        grid.order(0, SortDirection::Desc).await.unwrap();
        assert_eq!(grid.rows()[0]["id"], 45);

        let seen = h.seen.lock();
        assert_eq!(seen[0]["order[0][column]"], "0");
        assert_eq!(seen[0]["order[0][dir]"], "desc");
    }

    #[tokio::test]
    async fn test_fetch_reads_token_each_time() {
        let h = harness().await;
        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();
        grid.draw().await.unwrap();

        h.db.remove_item(TOKEN_KEY).unwrap();
        grid.reload(false).await.unwrap();

        let seen = h.seen.lock();
        assert_eq!(seen[0]["authorization"], "Bearer grid-token");
        assert_eq!(seen[1]["authorization"].trim_end(), "Bearer");
    }

    #[tokio::test]
    async fn test_unauthorized_page_fetch_tears_down_session() {
        let h = harness().await;
        let grid = h.binding.initialize("expiredTable", columns(), "/api/expired").unwrap();

        let result = grid.draw().await;
        assert!(matches!(result, Err(TableError::Api(ApiError::Unauthorized))));
        assert_eq!(h.location.current_path(), "/admin/login");
        assert_eq!(h.db.get_item("admin_token").unwrap(), None);
        assert_eq!(h.db.get_item("admin_user").unwrap(), None);
        assert!(h.alerts.current().is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_rows_and_alerts() {
        let h = harness().await;
        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();
        grid.draw().await.unwrap();

        let broken = h.binding.initialize("brokenTable", columns(), "/api/broken").unwrap();
        assert!(matches!(broken.draw().await, Err(TableError::Api(_))));
        let alert = h.alerts.current().unwrap();
        assert_eq!(alert.message, "数据库错误");
        assert_eq!(alert.severity, Severity::Danger);
        assert!(broken.rows().is_empty());
        assert!(!broken.is_processing());

        assert_eq!(grid.rows().len(), 20);
    }

    #[tokio::test]
    async fn test_malformed_response_shows_fallback() {
        let h = harness().await;
        let grid = h.binding.initialize("oddTable", columns(), "/api/odd").unwrap();

        assert!(matches!(grid.draw().await, Err(TableError::MalformedResponse(_))));
        assert_eq!(h.alerts.current().unwrap().message, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_stale_draw_is_discarded() {
        let h = harness().await;
        let grid = h.binding.initialize("usersTable", columns(), "/api/users").unwrap();

        let slow = {
            let grid = grid.clone();
            tokio::spawn(async move { grid.search("slow").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fresh = grid.search("张").await.unwrap();

        assert!(matches!(slow.await.unwrap(), Err(TableError::Stale(1))));
        assert_eq!(fresh.draw, 2);
        assert_eq!(grid.rows().len(), 4);
        assert!(!grid.is_processing());
    }
}
