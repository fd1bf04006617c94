//! Freshdesk API v2 client
//!
//! Listings are paged with `page`/`per_page`; a page shorter than `per_page`
//! is the last one.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as Json;
use std::time::Duration;

use crate::config::FreshdeskConfig;
use crate::error::{AppError, AppResult};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ticket as returned by `GET /tickets`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TicketPayload {
    pub id: i64,
    pub attachments: Option<Json>,
    pub cc_emails: Option<Json>,
    pub created_at: Option<DateTime<Utc>>,
    pub custom_fields: Option<Json>,
    pub deleted: Option<bool>,
    pub description: Option<String>,
    pub description_text: Option<String>,
    pub due_by: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub fr_due_by: Option<DateTime<Utc>>,
    pub fr_escalated: Option<bool>,
    pub fwd_emails: Option<Json>,
    pub group_id: Option<i64>,
    pub is_escalated: Option<bool>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub priority: Option<i32>,
    pub reply_cc_emails: Option<Json>,
    pub requester_id: Option<i64>,
    pub responder_id: Option<i64>,
    pub source: Option<i32>,
    pub spam: Option<bool>,
    pub status: Option<i32>,
    pub subject: Option<String>,
    pub tags: Option<Json>,
    pub to_emails: Option<Json>,
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Contact as returned by `GET /contacts`, also nested inside agents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactPayload {
    pub id: i64,
    pub active: Option<bool>,
    pub address: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub custom_fields: Option<Json>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub language: Option<String>,
    pub mobile: Option<String>,
    pub name: Option<String>,
    pub other_emails: Option<Json>,
    pub phone: Option<String>,
    pub tags: Option<Json>,
    pub time_zone: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Agent as returned by `GET /agents`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentPayload {
    pub id: i64,
    pub contact: ContactPayload,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Reply or note as returned by `GET /tickets/:id/conversations`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConversationPayload {
    pub id: i64,
    pub attachments: Option<Json>,
    pub body: Option<String>,
    pub body_text: Option<String>,
    pub cc_emails: Option<Json>,
    pub created_at: Option<DateTime<Utc>>,
    pub from_email: Option<String>,
    pub incoming: Option<bool>,
    pub private: Option<bool>,
    pub source: Option<i32>,
    pub ticket_id: i64,
    pub to_emails: Option<Json>,
    pub updated_at: Option<DateTime<Utc>>,
    pub user_id: i64,
}

/// The helpdesk listings the sync job consumes
#[async_trait]
pub trait HelpdeskApi: Send + Sync {
    async fn list_tickets(&self, updated_since: Option<DateTime<Utc>>) -> AppResult<Vec<TicketPayload>>;

    async fn list_contacts(&self) -> AppResult<Vec<ContactPayload>>;

    async fn list_agents(&self) -> AppResult<Vec<AgentPayload>>;

    async fn list_conversations(&self, ticket_id: i64) -> AppResult<Vec<ConversationPayload>>;
}

#[derive(Debug, Clone)]
pub struct FreshdeskClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    per_page: u32,
    max_pages: u32,
}

impl FreshdeskClient {
    pub fn new(cfg: &FreshdeskConfig) -> AppResult<Self> {
        Self::with_base_url(cfg, format!("https://{}/api/v2", cfg.domain))
    }

    /// Client against an explicit API root (no trailing slash)
    pub fn with_base_url(cfg: &FreshdeskConfig, base_url: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!(base_url = %base_url, "Freshdesk client initialized");

        Ok(Self {
            client,
            base_url,
            api_key: cfg.api_key.clone(),
            per_page: cfg.per_page.max(1),
            max_pages: cfg.max_pages.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Fetch every page of a listing
    async fn get_paged<T>(&self, path: &str, params: &[(&str, String)]) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut out = Vec::new();

        for page in 1..=self.max_pages {
            let resp = self
                .client
                .get(&url)
                .basic_auth(&self.api_key, Some("X"))
                .query(params)
                .query(&[("page", page), ("per_page", self.per_page)])
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(AppError::Upstream(format!(
                    "GET {} page {} returned {}: {}",
                    path, page, status, body
                )));
            }

            let items: Vec<T> = resp.json().await?;
            let count = items.len();
            out.extend(items);
            tracing::debug!("GET {} page {}: {} records", path, page, count);

            if count < self.per_page as usize {
                break;
            }
            if page == self.max_pages {
                tracing::warn!("GET {} stopped at the {} page limit", path, self.max_pages);
            }
        }

        Ok(out)
    }
}

#[async_trait]
impl HelpdeskApi for FreshdeskClient {
    async fn list_tickets(&self, updated_since: Option<DateTime<Utc>>) -> AppResult<Vec<TicketPayload>> {
        let mut params = vec![
            ("order_by", "updated_at".to_string()),
            ("order_type", "asc".to_string()),
        ];
        if let Some(since) = updated_since {
            params.push(("updated_since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        self.get_paged("tickets", &params).await
    }

    async fn list_contacts(&self) -> AppResult<Vec<ContactPayload>> {
        self.get_paged("contacts", &[]).await
    }

    async fn list_agents(&self) -> AppResult<Vec<AgentPayload>> {
        self.get_paged("agents", &[]).await
    }

    async fn list_conversations(&self, ticket_id: i64) -> AppResult<Vec<ConversationPayload>> {
        self.get_paged(&format!("tickets/{}/conversations", ticket_id), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json as AxumJson, Router};
    use std::collections::HashMap;

    fn config(per_page: u32) -> FreshdeskConfig {
        FreshdeskConfig {
            domain: "dept.freshdesk.com".to_string(),
            api_key: "secret".to_string(),
            per_page,
            ..Default::default()
        }
    }

    /// Serves five contacts, two per page; rejects requests without the API key.
    async fn contacts(
        headers: HeaderMap,
        Query(q): Query<HashMap<String, String>>,
    ) -> Result<AxumJson<Json>, StatusCode> {
        // base64("secret:X")
        let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
        if auth != Some("Basic c2VjcmV0Olg=") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        let page: usize = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let per_page: usize = q.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(30);
        let all: Vec<Json> = (1..=5)
            .map(|i| serde_json::json!({"id": i, "email": format!("c{}@example.com", i)}))
            .collect();
        let start = (page - 1) * per_page;
        let items = all.into_iter().skip(start).take(per_page).collect();
        Ok(AxumJson(Json::Array(items)))
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/v2", addr)
    }

    #[test]
    fn test_default_base_url() {
        let client = FreshdeskClient::new(&config(100)).unwrap();
        assert_eq!(client.url("tickets"), "https://dept.freshdesk.com/api/v2/tickets");
    }

    #[tokio::test]
    async fn test_paging_stops_on_short_page() {
        let base = serve(Router::new().route("/api/v2/contacts", get(contacts))).await;
        let client = FreshdeskClient::with_base_url(&config(2), base).unwrap();
        let items = client.list_contacts().await.unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[4].email.as_deref(), Some("c5@example.com"));
    }

    #[tokio::test]
    async fn test_paging_respects_max_pages() {
        let base = serve(Router::new().route("/api/v2/contacts", get(contacts))).await;
        let mut cfg = config(2);
        cfg.max_pages = 2;
        let client = FreshdeskClient::with_base_url(&cfg, base).unwrap();
        assert_eq!(client.list_contacts().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let base = serve(Router::new().route("/api/v2/contacts", get(contacts))).await;
        let mut cfg = config(2);
        cfg.api_key = "wrong".to_string();
        let client = FreshdeskClient::with_base_url(&cfg, base).unwrap();
        let err = client.list_contacts().await.unwrap_err();
        match err {
            AppError::Upstream(msg) => assert!(msg.contains("401")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_ticket_payload_parses_type_field() {
        let payload: TicketPayload = serde_json::from_value(serde_json::json!({
            "id": 42,
            "type": "Incident",
            "status": 2,
            "custom_fields": {"support_category": "Applications"},
            "created_at": "2017-05-01T01:02:03Z",
        }))
        .unwrap();
        assert_eq!(payload.ticket_type.as_deref(), Some("Incident"));
        assert_eq!(payload.status, Some(2));
        assert!(payload.created_at.is_some());
    }
}
