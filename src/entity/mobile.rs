//! Mobile entity - mobile device registered through Exchange
//!
//! Table: tracking_mobile

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use super::{default_if_unset, reconcile_common};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracking_mobile")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,
    pub org_unit_id: Option<i32>,
    pub cost_centre_id: Option<i32>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub extra_data: Option<Json>,

    #[sea_orm(column_type = "String(Some(48))", nullable, unique)]
    pub ad_guid: Option<String>,

    #[sea_orm(column_type = "String(Some(512))", nullable, unique)]
    pub ad_dn: Option<String>,

    pub registered_to_id: Option<i32>,

    #[sea_orm(column_type = "String(Some(64))", nullable)]
    pub asset_id: Option<String>,

    #[sea_orm(column_type = "String(Some(64))", nullable)]
    pub finance_asset_id: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub model: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub os_name: Option<String>,

    /// Exchange GUID
    #[sea_orm(column_type = "String(Some(512))", nullable, unique)]
    pub identity: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub serial_number: Option<String>,

    #[sea_orm(column_type = "String(Some(64))", nullable)]
    pub imei: Option<String>,

    pub last_sync: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        if insert {
            default_if_unset(&mut self.date_created, now);
        }
        self.date_updated = Set(now);
        reconcile_common(db, &self.cost_centre_id, &mut self.org_unit_id).await?;
        Ok(self)
    }
}
