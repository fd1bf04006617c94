//! Additional locations a department user works from
//!
//! Table: organisation_departmentuser_secondary_locations

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organisation_departmentuser_secondary_locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub department_user_id: i32,

    pub location_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
