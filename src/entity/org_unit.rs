//! OrgUnit entity - node of the organisational hierarchy
//!
//! Table: organisation_orgunit

use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use super::{current, current_opt, default_if_unset, Choice};
use crate::org::tree::{self, Hierarchy};

/// Tier of an organisational unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitType {
    Department,
    DivisionTierTwo,
    Division,
    Group,
    Branch,
    Section,
    Region,
    District,
    Unit,
    Office,
    WorkCentre,
}

impl Choice for UnitType {
    const ALL: &'static [Self] = &[
        UnitType::Department,
        UnitType::DivisionTierTwo,
        UnitType::Division,
        UnitType::Group,
        UnitType::Branch,
        UnitType::Section,
        UnitType::Region,
        UnitType::District,
        UnitType::Unit,
        UnitType::Office,
        UnitType::WorkCentre,
    ];

    fn code(self) -> i32 {
        match self {
            UnitType::Department => 0,
            UnitType::DivisionTierTwo => 1,
            UnitType::Division => 11,
            UnitType::Group => 9,
            UnitType::Branch => 2,
            UnitType::Section => 7,
            UnitType::Region => 3,
            UnitType::District => 6,
            UnitType::Unit => 8,
            UnitType::Office => 5,
            UnitType::WorkCentre => 10,
        }
    }

    fn label(self) -> &'static str {
        match self {
            UnitType::Department => "Department (Tier one)",
            UnitType::DivisionTierTwo => "Division (Tier two)",
            UnitType::Division => "Division",
            UnitType::Group => "Group",
            UnitType::Branch => "Branch",
            UnitType::Section => "Section",
            UnitType::Region => "Region",
            UnitType::District => "District",
            UnitType::Unit => "Unit",
            UnitType::Office => "Office",
            UnitType::WorkCentre => "Work centre",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organisation_orgunit")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// See [`UnitType`]
    pub unit_type: i32,

    #[sea_orm(column_type = "String(Some(48))", nullable, unique)]
    pub ad_guid: Option<String>,

    #[sea_orm(column_type = "String(Some(512))", nullable, unique)]
    pub ad_dn: Option<String>,

    #[sea_orm(column_type = "String(Some(256))", unique)]
    pub name: String,

    #[sea_orm(column_type = "String(Some(16))", nullable)]
    pub acronym: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub details: Option<Json>,

    /// Sync this to O365 (creates a security group)
    pub sync_o365: bool,

    pub active: bool,

    pub location_id: Option<i32>,

    pub secondary_location_id: Option<i32>,

    pub manager_id: Option<i32>,

    /// Parent unit, NULL for a tree root
    pub parent_id: Option<i32>,

    /// Depth below the root (derived on save)
    pub level: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Self-reference is walked through org::tree

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            default_if_unset(&mut self.sync_o365, true);
            default_if_unset(&mut self.active, true);
        }

        let parent = current_opt(&self.parent_id);
        if let (Some(id), Some(parent)) = (current(&self.id).copied(), parent) {
            tree::check_parent::<Entity, _>(db, id, parent).await?;
        }

        let level = match parent {
            Some(parent_id) => {
                let parent = Entity::find_by_id(parent_id).one(db).await?.ok_or_else(|| {
                    DbErr::Custom(format!("Parent org unit {} does not exist", parent_id))
                })?;
                parent.level + 1
            }
            None => 0,
        };
        self.level = Set(level);
        Ok(self)
    }

    async fn after_save<C>(model: Model, db: &C, _insert: bool) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        // Re-saving a child recomputes its level, which cascades down the subtree.
        let stale = Entity::find()
            .filter(Column::ParentId.eq(model.id))
            .filter(Column::Level.ne(model.level + 1))
            .all(db)
            .await?;
        for child in stale {
            let mut child: ActiveModel = child.into();
            child.level = Set(model.level + 1);
            child.update(db).await?;
        }
        Ok(model)
    }
}

impl Hierarchy for Entity {
    fn id_column() -> Column {
        Column::Id
    }

    fn parent_column() -> Column {
        Column::ParentId
    }

    fn order_column() -> Column {
        Column::Name
    }

    fn node_id(model: &Model) -> i32 {
        model.id
    }

    fn node_parent(model: &Model) -> Option<i32> {
        model.parent_id
    }
}

impl Model {
    pub fn unit_type_display(&self) -> &'static str {
        UnitType::label_for(self.unit_type)
    }
}

/// Org unit tree node (used for API responses)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrgUnitTree {
    pub id: i32,
    pub name: String,
    pub acronym: Option<String>,
    pub unit_type: String,
    pub level: i32,
    pub parent_id: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OrgUnitTree>,
}

impl From<Model> for OrgUnitTree {
    fn from(model: Model) -> Self {
        Self {
            unit_type: model.unit_type_display().to_string(),
            id: model.id,
            name: model.name,
            acronym: model.acronym,
            level: model.level,
            parent_id: model.parent_id,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_type_codes() {
        assert_eq!(UnitType::from_code(11), Some(UnitType::Division));
        assert_eq!(UnitType::label_for(1), "Division (Tier two)");
        assert_eq!(UnitType::label_for(10), "Work centre");
        assert_eq!(UnitType::label_for(4), "Unknown");
    }
}
