//! ITSystem entity - register of corporate IT systems
//!
//! Table: registers_itsystem

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use super::default_if_unset;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registers_itsystem")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,

    /// Register identifier, e.g. "S017"
    #[sea_orm(column_type = "String(Some(16))", unique)]
    pub system_id: String,

    #[sea_orm(column_type = "String(Some(128))", unique)]
    pub name: String,

    #[sea_orm(column_type = "String(Some(16))", nullable)]
    pub acronym: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// System owner (department user)
    pub owner_id: Option<i32>,

    pub cost_centre_id: Option<i32>,

    pub org_unit_id: Option<i32>,

    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        if insert {
            default_if_unset(&mut self.date_created, now);
            default_if_unset(&mut self.active, true);
        }
        self.date_updated = Set(now);
        Ok(self)
    }
}
