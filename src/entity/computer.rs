//! Computer entity - non-mobile computing device, mirrored from AD and inventory tools
//!
//! Table: tracking_computer

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use super::{default_if_unset, reconcile_common};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracking_computer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,
    pub org_unit_id: Option<i32>,
    pub cost_centre_id: Option<i32>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub extra_data: Option<Json>,

    #[sea_orm(column_type = "String(Some(32))", nullable, unique)]
    pub sam_account_name: Option<String>,

    #[sea_orm(column_type = "String(Some(2048))")]
    pub hostname: String,

    pub domain_bound: bool,

    #[sea_orm(column_type = "String(Some(48))", nullable, unique)]
    pub ad_guid: Option<String>,

    #[sea_orm(column_type = "String(Some(512))", nullable, unique)]
    pub ad_dn: Option<String>,

    #[sea_orm(nullable, unique)]
    pub pdq_id: Option<i32>,

    #[sea_orm(column_type = "String(Some(64))", nullable, unique)]
    pub sophos_id: Option<String>,

    /// OIM asset ID
    #[sea_orm(column_type = "String(Some(64))", nullable)]
    pub asset_id: Option<String>,

    /// Finance asset ID
    #[sea_orm(column_type = "String(Some(64))", nullable)]
    pub finance_asset_id: Option<String>,

    #[sea_orm(column_type = "String(Some(128))")]
    pub manufacturer: String,
    #[sea_orm(column_type = "String(Some(128))")]
    pub model: String,
    #[sea_orm(column_type = "String(Some(128))")]
    pub chassis: String,
    #[sea_orm(column_type = "String(Some(128))")]
    pub serial_number: String,
    #[sea_orm(column_type = "String(Some(128))")]
    pub os_name: String,
    #[sea_orm(column_type = "String(Some(128))")]
    pub os_version: String,
    #[sea_orm(column_type = "String(Some(128))")]
    pub os_service_pack: String,
    #[sea_orm(column_type = "String(Some(128))")]
    pub os_arch: String,
    #[sea_orm(column_type = "String(Some(128))")]
    pub cpu: String,

    pub cpu_count: i32,
    pub cpu_cores: i32,
    /// Bytes
    pub memory: i64,

    /// Automatically-generated "most probable" device owner
    pub probable_owner_id: Option<i32>,

    /// Official owner/manager as set in AD
    pub managed_by_id: Option<i32>,

    pub date_pdq_updated: Option<DateTimeUtc>,
    pub date_nmap_updated: Option<DateTimeUtc>,
    pub date_sophos_updated: Option<DateTimeUtc>,
    pub date_ad_updated: Option<DateTimeUtc>,
    pub date_dhcp_updated: Option<DateTimeUtc>,

    /// Validation results from synchronising local property registers
    #[sea_orm(column_type = "Text", nullable)]
    pub validation_notes: Option<String>,
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
            default_if_unset(&mut self.domain_bound, false);
            default_if_unset(&mut self.cpu_count, 0);
            default_if_unset(&mut self.cpu_cores, 0);
            default_if_unset(&mut self.memory, 0);
            for field in [
                &mut self.manufacturer,
                &mut self.model,
                &mut self.chassis,
                &mut self.serial_number,
                &mut self.os_name,
                &mut self.os_version,
                &mut self.os_service_pack,
                &mut self.os_arch,
                &mut self.cpu,
            ] {
                default_if_unset(field, String::new());
            }
        }
        self.date_updated = Set(now);
        reconcile_common(db, &self.cost_centre_id, &mut self.org_unit_id).await?;
        Ok(self)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sam_account_name.as_deref().unwrap_or(&self.hostname))
    }
}
