//! FreshdeskTicket entity - cached copy of a Freshdesk (API v2) ticket
//!
//! Table: tracking_freshdeskticket

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::Choice;

/// Channel through which the ticket was created
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketSource {
    Email,
    Portal,
    Phone,
    Chat,
    Mobihelp,
    FeedbackWidget,
    OutboundEmail,
}

impl Choice for TicketSource {
    const ALL: &'static [Self] = &[
        TicketSource::Email,
        TicketSource::Portal,
        TicketSource::Phone,
        TicketSource::Chat,
        TicketSource::Mobihelp,
        TicketSource::FeedbackWidget,
        TicketSource::OutboundEmail,
    ];

    fn code(self) -> i32 {
        match self {
            TicketSource::Email => 1,
            TicketSource::Portal => 2,
            TicketSource::Phone => 3,
            TicketSource::Chat => 7,
            TicketSource::Mobihelp => 8,
            TicketSource::FeedbackWidget => 9,
            TicketSource::OutboundEmail => 10,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TicketSource::Email => "Email",
            TicketSource::Portal => "Portal",
            TicketSource::Phone => "Phone",
            TicketSource::Chat => "Chat",
            TicketSource::Mobihelp => "Mobihelp",
            TicketSource::FeedbackWidget => "Feedback Widget",
            TicketSource::OutboundEmail => "Outbound Email",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    Pending,
    Resolved,
    Closed,
}

impl Choice for TicketStatus {
    const ALL: &'static [Self] = &[
        TicketStatus::Open,
        TicketStatus::Pending,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    fn code(self) -> i32 {
        match self {
            TicketStatus::Open => 2,
            TicketStatus::Pending => 3,
            TicketStatus::Resolved => 4,
            TicketStatus::Closed => 5,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Pending => "Pending",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Choice for TicketPriority {
    const ALL: &'static [Self] = &[
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
        TicketPriority::Urgent,
    ];

    fn code(self) -> i32 {
        match self {
            TicketPriority::Low => 1,
            TicketPriority::Medium => 2,
            TicketPriority::High => 3,
            TicketPriority::Urgent => 4,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
            TicketPriority::Urgent => "Urgent",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracking_freshdeskticket")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Array of attachment objects
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub attachments: Option<Json>,

    /// Addresses in the "cc" field of the incoming email
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub cc_emails: Option<Json>,

    pub created_at: Option<DateTimeUtc>,

    /// Names and values of custom fields
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub custom_fields: Option<Json>,

    /// Ticket has been deleted/trashed
    pub deleted: bool,

    /// HTML content
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description_text: Option<String>,

    /// When the ticket is due to be resolved
    pub due_by: Option<DateTimeUtc>,

    /// Requester email
    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub email: Option<String>,

    /// When the first response is due
    pub fr_due_by: Option<DateTimeUtc>,

    /// Escalated because the first response time was breached
    pub fr_escalated: bool,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub fwd_emails: Option<Json>,

    pub group_id: Option<i64>,

    pub is_escalated: bool,

    /// Requester name
    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub name: Option<String>,

    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub phone: Option<String>,

    /// See [`TicketPriority`]
    pub priority: Option<i32>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub reply_cc_emails: Option<Json>,

    pub requester_id: Option<i64>,

    /// Agent the ticket is assigned to
    pub responder_id: Option<i64>,

    /// See [`TicketSource`]
    pub source: Option<i32>,

    pub spam: bool,

    /// See [`TicketStatus`]
    pub status: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub subject: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub tags: Option<Json>,

    /// Ticket ID in Freshdesk
    #[sea_orm(unique)]
    pub ticket_id: i64,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub to_emails: Option<Json>,

    #[sea_orm(column_name = "type", column_type = "String(Some(256))", nullable)]
    pub ticket_type: Option<String>,

    pub updated_at: Option<DateTimeUtc>,

    pub freshdesk_requester_id: Option<i32>,
    pub freshdesk_responder_id: Option<i32>,

    /// Department user who raised the ticket
    pub du_requester_id: Option<i32>,

    /// Department user the ticket is assigned to
    pub du_responder_id: Option<i32>,

    /// IT system this ticket relates to
    pub it_system_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Label for an optional choice code: None when unset or zero.
fn display<T: Choice>(code: Option<i32>) -> Option<&'static str> {
    code.filter(|c| *c != 0).map(T::label_for)
}

impl Model {
    pub fn source_display(&self) -> Option<&'static str> {
        display::<TicketSource>(self.source)
    }

    pub fn status_display(&self) -> Option<&'static str> {
        display::<TicketStatus>(self.status)
    }

    pub fn priority_display(&self) -> Option<&'static str> {
        display::<TicketPriority>(self.priority)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Freshdesk ticket ID {}", self.ticket_id)
    }
}
