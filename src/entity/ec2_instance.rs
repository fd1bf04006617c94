//! EC2Instance entity - Amazon EC2 instance
//!
//! Table: tracking_ec2instance

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use super::{default_if_unset, reconcile_common};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracking_ec2instance")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,
    pub org_unit_id: Option<i32>,
    pub cost_centre_id: Option<i32>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub extra_data: Option<Json>,

    /// Instance Name
    #[sea_orm(column_type = "String(Some(200))")]
    pub name: String,

    /// EC2 Instance ID
    #[sea_orm(column_type = "String(Some(200))", unique)]
    pub ec2id: String,

    pub launch_time: Option<DateTimeUtc>,

    /// Desired power state: true is on
    pub next_state: bool,

    pub running: bool,
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
            default_if_unset(&mut self.next_state, true);
            default_if_unset(&mut self.running, true);
        }
        self.date_updated = Set(now);
        reconcile_common(db, &self.cost_centre_id, &mut self.org_unit_id).await?;
        Ok(self)
    }
}
