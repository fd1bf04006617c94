//! FreshdeskContact entity - cached Freshdesk contact or agent
//!
//! Table: tracking_freshdeskcontact

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracking_freshdeskcontact")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Contact has been verified
    pub active: bool,

    #[sea_orm(column_type = "String(Some(512))", nullable)]
    pub address: Option<String>,

    /// Contact (or agent) ID in Freshdesk
    #[sea_orm(unique)]
    pub contact_id: i64,

    pub created_at: Option<DateTimeUtc>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub custom_fields: Option<Json>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "String(Some(256))", nullable, unique)]
    pub email: Option<String>,

    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub job_title: Option<String>,

    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub language: Option<String>,

    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub mobile: Option<String>,

    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub name: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub other_emails: Option<Json>,

    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub phone: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub tags: Option<Json>,

    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub time_zone: Option<String>,

    pub updated_at: Option<DateTimeUtc>,

    /// Department user this contact represents
    pub du_user_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({})",
            self.name.as_deref().unwrap_or_default(),
            self.email.as_deref().unwrap_or_default()
        )
    }
}
