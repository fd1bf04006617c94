//! Copy Freshdesk contacts, agents, tickets and conversations into the local cache

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set, TryIntoModel,
};
use serde::Serialize;
use tracing::{info, warn};

use super::client::{AgentPayload, ContactPayload, ConversationPayload, HelpdeskApi, TicketPayload};
use super::model::{match_dept_user, match_it_system};
use crate::entity::{freshdesk_contact, freshdesk_conversation, freshdesk_ticket};
use crate::error::AppResult;

/// Records written by one sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub contacts: usize,
    pub agents: usize,
    pub tickets: usize,
    pub conversations: usize,
}

async fn find_contact<C>(db: &C, contact_id: i64) -> Result<Option<freshdesk_contact::Model>, DbErr>
where
    C: ConnectionTrait,
{
    freshdesk_contact::Entity::find()
        .filter(freshdesk_contact::Column::ContactId.eq(contact_id))
        .one(db)
        .await
}

/// Store a contact under the given Freshdesk id. A row already holding the
/// same email is reused so the unique email column never clashes; that row
/// keeps the id it was first stored under.
async fn store_contact<C>(
    db: &C,
    contact_id: i64,
    payload: &ContactPayload,
) -> Result<freshdesk_contact::Model, DbErr>
where
    C: ConnectionTrait,
{
    let mut existing = find_contact(db, contact_id).await?;
    if existing.is_none() {
        if let Some(email) = payload.email.as_deref().filter(|e| !e.is_empty()) {
            existing = freshdesk_contact::Entity::find()
                .filter(freshdesk_contact::Column::Email.eq(email))
                .one(db)
                .await?;
        }
    }

    let mut am = match existing {
        Some(model) => {
            if model.contact_id != contact_id {
                warn!(
                    "Freshdesk id {} shares an email with contact {}, keeping {}",
                    contact_id, model.contact_id, model.contact_id
                );
            }
            model.into_active_model()
        }
        None => freshdesk_contact::ActiveModel {
            contact_id: Set(contact_id),
            ..Default::default()
        },
    };
    am.active = Set(payload.active.unwrap_or(false));
    am.address = Set(payload.address.clone());
    am.created_at = Set(payload.created_at);
    am.custom_fields = Set(payload.custom_fields.clone());
    am.description = Set(payload.description.clone());
    am.email = Set(payload.email.clone().filter(|e| !e.is_empty()));
    am.job_title = Set(payload.job_title.clone());
    am.language = Set(payload.language.clone());
    am.mobile = Set(payload.mobile.clone());
    am.name = Set(payload.name.clone());
    am.other_emails = Set(payload.other_emails.clone());
    am.phone = Set(payload.phone.clone());
    am.tags = Set(payload.tags.clone());
    am.time_zone = Set(payload.time_zone.clone());
    am.updated_at = Set(payload.updated_at);

    let contact = am.save(db).await?.try_into_model()?;
    match_dept_user(db, contact).await
}

pub async fn upsert_contact<C>(db: &C, payload: &ContactPayload) -> Result<freshdesk_contact::Model, DbErr>
where
    C: ConnectionTrait,
{
    store_contact(db, payload.id, payload).await
}

/// Agents are cached as contacts keyed by the agent id
pub async fn upsert_agent<C>(db: &C, payload: &AgentPayload) -> Result<freshdesk_contact::Model, DbErr>
where
    C: ConnectionTrait,
{
    let mut contact = payload.contact.clone();
    contact.created_at = contact.created_at.or(payload.created_at);
    contact.updated_at = contact.updated_at.or(payload.updated_at);
    store_contact(db, payload.id, &contact).await
}

pub async fn upsert_ticket<C>(db: &C, payload: &TicketPayload) -> Result<freshdesk_ticket::Model, DbErr>
where
    C: ConnectionTrait,
{
    let existing = freshdesk_ticket::Entity::find()
        .filter(freshdesk_ticket::Column::TicketId.eq(payload.id))
        .one(db)
        .await?;

    let mut am = match existing {
        Some(model) => model.into_active_model(),
        None => <freshdesk_ticket::ActiveModel as Default>::default(),
    };
    am.ticket_id = Set(payload.id);
    am.attachments = Set(payload.attachments.clone());
    am.cc_emails = Set(payload.cc_emails.clone());
    am.created_at = Set(payload.created_at);
    am.custom_fields = Set(payload.custom_fields.clone());
    am.deleted = Set(payload.deleted.unwrap_or(false));
    am.description = Set(payload.description.clone());
    am.description_text = Set(payload.description_text.clone());
    am.due_by = Set(payload.due_by);
    am.email = Set(payload.email.clone());
    am.fr_due_by = Set(payload.fr_due_by);
    am.fr_escalated = Set(payload.fr_escalated.unwrap_or(false));
    am.fwd_emails = Set(payload.fwd_emails.clone());
    am.group_id = Set(payload.group_id);
    am.is_escalated = Set(payload.is_escalated.unwrap_or(false));
    am.name = Set(payload.name.clone());
    am.phone = Set(payload.phone.clone());
    am.priority = Set(payload.priority);
    am.reply_cc_emails = Set(payload.reply_cc_emails.clone());
    am.requester_id = Set(payload.requester_id);
    am.responder_id = Set(payload.responder_id);
    am.source = Set(payload.source);
    am.spam = Set(payload.spam.unwrap_or(false));
    am.status = Set(payload.status);
    am.subject = Set(payload.subject.clone());
    am.tags = Set(payload.tags.clone());
    am.to_emails = Set(payload.to_emails.clone());
    am.ticket_type = Set(payload.ticket_type.clone());
    am.updated_at = Set(payload.updated_at);

    let requester = match payload.requester_id {
        Some(id) => find_contact(db, id).await?,
        None => None,
    };
    am.freshdesk_requester_id = Set(requester.as_ref().map(|c| c.id));
    am.du_requester_id = Set(requester.and_then(|c| c.du_user_id));

    let responder = match payload.responder_id {
        Some(id) => find_contact(db, id).await?,
        None => None,
    };
    am.freshdesk_responder_id = Set(responder.as_ref().map(|c| c.id));
    am.du_responder_id = Set(responder.and_then(|c| c.du_user_id));

    let ticket = am.save(db).await?.try_into_model()?;
    match_it_system(db, ticket).await
}

pub async fn upsert_conversation<C>(
    db: &C,
    ticket: &freshdesk_ticket::Model,
    payload: &ConversationPayload,
) -> Result<freshdesk_conversation::Model, DbErr>
where
    C: ConnectionTrait,
{
    let existing = freshdesk_conversation::Entity::find()
        .filter(freshdesk_conversation::Column::ConversationId.eq(payload.id))
        .one(db)
        .await?;

    let mut am = match existing {
        Some(model) => model.into_active_model(),
        None => <freshdesk_conversation::ActiveModel as Default>::default(),
    };
    am.conversation_id = Set(payload.id);
    am.attachments = Set(payload.attachments.clone());
    am.body = Set(payload.body.clone());
    am.body_text = Set(payload.body_text.clone());
    am.cc_emails = Set(payload.cc_emails.clone());
    am.created_at = Set(payload.created_at);
    am.from_email = Set(payload.from_email.clone());
    am.incoming = Set(payload.incoming.unwrap_or(false));
    am.private = Set(payload.private.unwrap_or(false));
    am.source = Set(payload.source);
    am.ticket_id = Set(ticket.ticket_id);
    am.to_emails = Set(payload.to_emails.clone());
    am.updated_at = Set(payload.updated_at);
    am.user_id = Set(payload.user_id);
    am.freshdesk_ticket_id = Set(Some(ticket.id));

    let contact = find_contact(db, payload.user_id).await?;
    am.freshdesk_contact_id = Set(contact.as_ref().map(|c| c.id));
    am.du_user_id = Set(contact.and_then(|c| c.du_user_id));

    am.save(db).await?.try_into_model()
}

/// Contacts, then agents, then tickets updated since `updated_since` with
/// their conversations. Requesters and responders must be cached before the
/// tickets that refer to them.
pub async fn run_sync<C>(
    db: &C,
    api: &dyn HelpdeskApi,
    updated_since: Option<DateTime<Utc>>,
) -> AppResult<SyncReport>
where
    C: ConnectionTrait,
{
    let mut report = SyncReport::default();

    for contact in api.list_contacts().await? {
        upsert_contact(db, &contact).await?;
        report.contacts += 1;
    }
    info!("Freshdesk sync: {} contacts", report.contacts);

    for agent in api.list_agents().await? {
        upsert_agent(db, &agent).await?;
        report.agents += 1;
    }
    info!("Freshdesk sync: {} agents", report.agents);

    for payload in api.list_tickets(updated_since).await? {
        let ticket = upsert_ticket(db, &payload).await?;
        report.tickets += 1;
        for conversation in api.list_conversations(ticket.ticket_id).await? {
            upsert_conversation(db, &ticket, &conversation).await?;
            report.conversations += 1;
        }
    }
    info!(
        "Freshdesk sync: {} tickets, {} conversations",
        report.tickets, report.conversations
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_database;
    use crate::entity::{department_user, it_system};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeHelpdesk {
        contacts: Vec<ContactPayload>,
        agents: Vec<AgentPayload>,
        tickets: Vec<TicketPayload>,
        conversations: HashMap<i64, Vec<ConversationPayload>>,
    }

    #[async_trait]
    impl HelpdeskApi for FakeHelpdesk {
        async fn list_tickets(&self, updated_since: Option<DateTime<Utc>>) -> AppResult<Vec<TicketPayload>> {
            Ok(self
                .tickets
                .iter()
                .filter(|t| match (updated_since, t.updated_at) {
                    (Some(since), Some(updated)) => updated >= since,
                    _ => true,
                })
                .cloned()
                .collect())
        }

        async fn list_contacts(&self) -> AppResult<Vec<ContactPayload>> {
            Ok(self.contacts.clone())
        }

        async fn list_agents(&self) -> AppResult<Vec<AgentPayload>> {
            Ok(self.agents.clone())
        }

        async fn list_conversations(&self, ticket_id: i64) -> AppResult<Vec<ConversationPayload>> {
            Ok(self.conversations.get(&ticket_id).cloned().unwrap_or_default())
        }
    }

    fn contact(id: i64, email: &str) -> ContactPayload {
        ContactPayload {
            id,
            active: Some(true),
            email: Some(email.to_string()),
            name: Some(email.to_string()),
            ..Default::default()
        }
    }

    fn helpdesk() -> FakeHelpdesk {
        let mut conversations = HashMap::new();
        conversations.insert(
            900,
            vec![ConversationPayload {
                id: 5000,
                ticket_id: 900,
                user_id: 2,
                body_text: Some("Looking into it".to_string()),
                private: Some(true),
                ..Default::default()
            }],
        );

        FakeHelpdesk {
            contacts: vec![contact(1, "requester@example.com")],
            agents: vec![AgentPayload {
                id: 2,
                contact: ContactPayload {
                    email: Some("Agent@Example.com".to_string()),
                    name: Some("Agent".to_string()),
                    active: Some(true),
                    ..Default::default()
                },
                ..Default::default()
            }],
            tickets: vec![TicketPayload {
                id: 900,
                requester_id: Some(1),
                responder_id: Some(2),
                status: Some(2),
                subject: Some("Cannot log in".to_string()),
                custom_fields: Some(json!({
                    "support_category": "Applications",
                    "support_subcategory": "Leave Booking \u{2013} Access",
                })),
                ..Default::default()
            }],
            conversations,
        }
    }

    #[tokio::test]
    async fn test_run_sync_links_everything() {
        let db = memory_database().await;
        let requester = department_user::ActiveModel {
            email: Set("requester@example.com".to_string()),
            name: Set("Requester".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let agent = department_user::ActiveModel {
            email: Set("agent@example.com".to_string()),
            name: Set("Agent".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let system = it_system::ActiveModel {
            system_id: Set("S100".to_string()),
            name: Set("Leave Booking".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let report = run_sync(&db, &helpdesk(), None).await.unwrap();
        assert_eq!(
            report,
            SyncReport {
                contacts: 1,
                agents: 1,
                tickets: 1,
                conversations: 1
            }
        );

        let ticket = freshdesk_ticket::Entity::find()
            .filter(freshdesk_ticket::Column::TicketId.eq(900))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticket.du_requester_id, Some(requester.id));
        assert_eq!(ticket.du_responder_id, Some(agent.id));
        assert_eq!(ticket.it_system_id, Some(system.id));
        assert_eq!(ticket.status_display(), Some("Open"));

        let conversation = freshdesk_conversation::Entity::find()
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.freshdesk_ticket_id, Some(ticket.id));
        assert_eq!(conversation.du_user_id, Some(agent.id));
        assert!(conversation.private);
    }

    #[tokio::test]
    async fn test_resync_updates_in_place() {
        let db = memory_database().await;
        let mut api = helpdesk();
        run_sync(&db, &api, None).await.unwrap();

        api.tickets[0].status = Some(4);
        api.contacts[0].name = Some("Renamed".to_string());
        run_sync(&db, &api, None).await.unwrap();

        let tickets = freshdesk_ticket::Entity::find().all(&db).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].status_display(), Some("Resolved"));

        let contacts = freshdesk_contact::Entity::find().all(&db).await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert!(contacts.iter().any(|c| c.name.as_deref() == Some("Renamed")));
        assert_eq!(freshdesk_conversation::Entity::find().all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_contact_with_known_email_is_reused() {
        let db = memory_database().await;
        upsert_contact(&db, &contact(10, "shared@example.com")).await.unwrap();
        let agent = AgentPayload {
            id: 11,
            contact: ContactPayload {
                email: Some("shared@example.com".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let stored = upsert_agent(&db, &agent).await.unwrap();
        assert_eq!(stored.contact_id, 10);
        assert_eq!(freshdesk_contact::Entity::find().all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shared_email_does_not_flip_contact_id() {
        let db = memory_database().await;
        let api = FakeHelpdesk {
            contacts: vec![contact(10, "shared@example.com")],
            agents: vec![AgentPayload {
                id: 11,
                contact: ContactPayload {
                    email: Some("shared@example.com".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            }],
            tickets: vec![TicketPayload {
                id: 700,
                requester_id: Some(10),
                ..Default::default()
            }],
            ..Default::default()
        };

        run_sync(&db, &api, None).await.unwrap();
        run_sync(&db, &api, None).await.unwrap();

        let contacts = freshdesk_contact::Entity::find().all(&db).await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].contact_id, 10);
        let ticket = freshdesk_ticket::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(ticket.freshdesk_requester_id, Some(contacts[0].id));
    }
}
