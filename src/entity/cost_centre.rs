//! CostCentre entity - finance cost centre, optionally pinned to an org unit
//!
//! Table: organisation_costcentre

use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use super::org_unit::{self, UnitType};
use super::{current, current_opt, default_if_unset, Choice};
use crate::org::tree;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organisation_costcentre")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name, defaults to the code
    #[sea_orm(column_type = "String(Some(128))", unique)]
    pub name: String,

    #[sea_orm(column_type = "String(Some(16))", unique)]
    pub code: String,

    /// Chart of accounts name
    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub chart_acct_name: Option<String>,

    pub active: bool,

    /// Org unit this cost centre is attached to
    #[sea_orm(unique)]
    pub org_position_id: Option<i32>,

    /// Tier two division above `org_position_id` (derived on save)
    pub division_id: Option<i32>,

    pub manager_id: Option<i32>,

    /// Business Manager
    pub business_manager_id: Option<i32>,

    /// Administration Officer
    pub admin_id: Option<i32>,

    /// Technical Contact
    pub tech_contact_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            default_if_unset(&mut self.active, true);
        }

        let name_missing = current(&self.name).map_or(true, |n| n.trim().is_empty());
        if name_missing {
            if let Some(code) = current(&self.code) {
                self.name = Set(code.clone());
            }
        }

        let division = match current_opt(&self.org_position_id) {
            Some(position) => tree::ancestors::<org_unit::Entity, _>(db, position, true)
                .await?
                .into_iter()
                .find(|u| u.unit_type == UnitType::DivisionTierTwo.code())
                .map(|u| u.id),
            None => None,
        };
        self.division_id = Set(division);
        Ok(self)
    }
}
