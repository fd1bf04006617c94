//! FreshdeskConversation entity - cached reply or note on a Freshdesk ticket
//!
//! Table: tracking_freshdeskconversation

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracking_freshdeskconversation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub attachments: Option<Json>,

    /// HTML content
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub body_text: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub cc_emails: Option<Json>,

    pub created_at: Option<DateTimeUtc>,

    /// Conversation ID in Freshdesk
    #[sea_orm(unique)]
    pub conversation_id: i64,

    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub from_email: Option<String>,

    /// Shown as created from outside
    pub incoming: bool,

    /// Private note
    pub private: bool,

    pub source: Option<i32>,

    /// Freshdesk ID of the parent ticket
    pub ticket_id: i64,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub to_emails: Option<Json>,

    pub updated_at: Option<DateTimeUtc>,

    /// Freshdesk ID of the agent/user adding the conversation
    pub user_id: i64,

    pub freshdesk_ticket_id: Option<i32>,
    pub freshdesk_contact_id: Option<i32>,

    /// Department user adding to the conversation
    pub du_user_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Freshdesk conversation ID {}", self.conversation_id)
    }
}
