//! Freshdesk handlers
//!
//! Read access to the cached tickets and a manual sync trigger

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};

use crate::entity::{freshdesk_contact, freshdesk_conversation, freshdesk_ticket};
use crate::error::{AppError, AppResult, OptionExt};
use crate::freshdesk::SyncReport;
use crate::middleware::DbConn;
use crate::routes::ApiResponse;
use crate::state::AppState;

const DEFAULT_TICKET_LIMIT: u64 = 100;

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub status: Option<i32>,
    pub it_system_id: Option<i32>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    #[serde(flatten)]
    pub ticket: freshdesk_ticket::Model,
    pub source_display: Option<&'static str>,
    pub status_display: Option<&'static str>,
    pub priority_display: Option<&'static str>,
}

impl From<freshdesk_ticket::Model> for TicketResponse {
    fn from(ticket: freshdesk_ticket::Model) -> Self {
        Self {
            source_display: ticket.source_display(),
            status_display: ticket.status_display(),
            priority_display: ticket.priority_display(),
            ticket,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    pub requester: Option<freshdesk_contact::Model>,
    pub responder: Option<freshdesk_contact::Model>,
    pub conversations: Vec<freshdesk_conversation::Model>,
}

/// GET /api/freshdesk/tickets
pub async fn list_tickets(
    Extension(db): Extension<DbConn>,
    Query(q): Query<TicketQuery>,
) -> AppResult<Json<ApiResponse<Vec<TicketResponse>>>> {
    let mut select = freshdesk_ticket::Entity::find();
    if let Some(status) = q.status {
        select = select.filter(freshdesk_ticket::Column::Status.eq(status));
    }
    if let Some(system) = q.it_system_id {
        select = select.filter(freshdesk_ticket::Column::ItSystemId.eq(system));
    }

    let tickets = select
        .order_by_desc(freshdesk_ticket::Column::TicketId)
        .limit(q.limit.unwrap_or(DEFAULT_TICKET_LIMIT))
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(
        tickets.into_iter().map(TicketResponse::from).collect(),
    )))
}

/// GET /api/freshdesk/tickets/:id
pub async fn get_ticket(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<TicketDetail>>> {
    let ticket = freshdesk_ticket::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found(format!("Ticket {} not found", id))?;

    let requester = match ticket.freshdesk_requester_id {
        Some(cid) => freshdesk_contact::Entity::find_by_id(cid).one(&*db).await?,
        None => None,
    };
    let responder = match ticket.freshdesk_responder_id {
        Some(cid) => freshdesk_contact::Entity::find_by_id(cid).one(&*db).await?,
        None => None,
    };
    let conversations = freshdesk_conversation::Entity::find()
        .filter(freshdesk_conversation::Column::FreshdeskTicketId.eq(ticket.id))
        .order_by_asc(freshdesk_conversation::Column::CreatedAt)
        .order_by_asc(freshdesk_conversation::Column::ConversationId)
        .all(&*db)
        .await?;

    Ok(Json(ApiResponse::success(TicketDetail {
        ticket: ticket.into(),
        requester,
        responder,
        conversations,
    })))
}

/// POST /api/freshdesk/sync
pub async fn trigger_sync(State(state): State<AppState>) -> AppResult<Json<ApiResponse<SyncReport>>> {
    let Some(sync) = state.sync.as_ref() else {
        return Err(AppError::BadRequest("Freshdesk is not configured".to_string()));
    };
    let report = sync.run_once().await?;
    Ok(Json(ApiResponse::success(report)))
}

#[cfg(test)]
mod tests {
    use crate::entity::{freshdesk_conversation, freshdesk_ticket};
    use crate::routes::testing::test_app;
    use axum::http::StatusCode;
    use sea_orm::{ActiveModelTrait, Set};
    use serde_json::json;

    async fn ticket(app: &crate::routes::testing::TestApp, ticket_id: i64, status: i32) -> freshdesk_ticket::Model {
        freshdesk_ticket::ActiveModel {
            ticket_id: Set(ticket_id),
            status: Set(Some(status)),
            source: Set(Some(2)),
            priority: Set(Some(0)),
            deleted: Set(false),
            fr_escalated: Set(false),
            is_escalated: Set(false),
            spam: Set(false),
            ..Default::default()
        }
        .insert(&app.db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_ticket_listing_with_labels() {
        let app = test_app().await;
        ticket(&app, 1, 2).await;
        ticket(&app, 2, 5).await;

        let (status, body) = app.get("/api/freshdesk/tickets?status=2").await;
        assert_eq!(status, StatusCode::OK);
        let list = body["data"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["status_display"], "Open");
        assert_eq!(list[0]["source_display"], "Portal");
        assert!(list[0]["priority_display"].is_null());
    }

    #[tokio::test]
    async fn test_ticket_detail_includes_conversations() {
        let app = test_app().await;
        let t = ticket(&app, 10, 3).await;
        freshdesk_conversation::ActiveModel {
            conversation_id: Set(77),
            ticket_id: Set(10),
            user_id: Set(1),
            incoming: Set(true),
            private: Set(false),
            freshdesk_ticket_id: Set(Some(t.id)),
            body_text: Set(Some("Hello".into())),
            ..Default::default()
        }
        .insert(&app.db)
        .await
        .unwrap();

        let (status, body) = app.get(&format!("/api/freshdesk/tickets/{}", t.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status_display"], "Pending");
        assert_eq!(body["data"]["conversations"][0]["body_text"], "Hello");
        assert!(body["data"]["requester"].is_null());
    }

    #[tokio::test]
    async fn test_sync_without_helpdesk_is_400() {
        let app = test_app().await;
        let (status, _) = app.post_json("/api/freshdesk/sync", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
