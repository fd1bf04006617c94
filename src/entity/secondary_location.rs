//! SecondaryLocation entity - a named place within a location (floor, building)
//!
//! Table: organisation_secondarylocation

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organisation_secondarylocation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "String(Some(256))", unique)]
    pub name: String,

    pub location_id: i32,

    pub manager_id: Option<i32>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub phone: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub fax: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub email: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn as_dict(&self) -> Json {
        let mut card = Map::new();
        card.insert("id".into(), json!(self.id));
        card.insert("name".into(), json!(self.name));
        card.insert("location_id".into(), json!(self.location_id));
        for (key, value) in [("phone", &self.phone), ("fax", &self.fax), ("email", &self.email)] {
            if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
                card.insert(key.into(), json!(v));
            }
        }
        Json::Object(card)
    }
}
