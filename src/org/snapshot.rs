//! Denormalised organisation snapshot stored on department users (`org_data`)
//!
//! Keeps a copy of the user's org unit path, site and cost centre contacts so
//! that downstream consumers do not need to walk the hierarchy themselves.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde_json::{json, Map, Value as Json};

use super::tree;
use crate::entity::{cost_centre, department_user, location, org_unit, secondary_location};

/// One entry of `org_data.units`
pub async fn unit_row<C>(db: &C, unit: &org_unit::Model) -> Result<Json, DbErr>
where
    C: ConnectionTrait,
{
    let cc = cost_centre::Entity::find()
        .filter(cost_centre::Column::OrgPositionId.eq(unit.id))
        .one(db)
        .await?;
    let site = match unit.location_id {
        Some(id) => location::Entity::find_by_id(id).one(db).await?,
        None => None,
    };

    Ok(json!({
        "id": unit.id,
        "name": unit.name,
        "acronym": unit.acronym,
        "unit_type": unit.unit_type_display(),
        "costcentre__code": cc.as_ref().map(|c| c.code.clone()),
        "costcentre__name": cc.as_ref().map(|c| c.name.clone()),
        "location__name": site.map(|l| l.name),
    }))
}

async fn email_of<C>(db: &C, user_id: Option<i32>) -> Result<Json, DbErr>
where
    C: ConnectionTrait,
{
    let Some(id) = user_id else {
        return Ok(Json::Null);
    };
    Ok(department_user::Entity::find_by_id(id)
        .one(db)
        .await?
        .map_or(Json::Null, |u| Json::String(u.email)))
}

/// Rebuild the organisation keys of `existing`, leaving any other keys alone.
///
/// Returns `existing` unchanged when the org unit no longer exists.
pub async fn build_org_data<C>(
    db: &C,
    existing: Option<Json>,
    org_unit_id: i32,
    cc: &cost_centre::Model,
) -> Result<Option<Json>, DbErr>
where
    C: ConnectionTrait,
{
    let units = tree::ancestors::<org_unit::Entity, _>(db, org_unit_id, true).await?;
    let Some(unit) = units.last() else {
        return Ok(existing);
    };

    let mut data = match existing {
        Some(Json::Object(map)) => map,
        _ => Map::new(),
    };

    let mut rows = Vec::with_capacity(units.len());
    for u in &units {
        rows.push(unit_row(db, u).await?);
    }
    data.insert("unit".into(), rows.last().cloned().unwrap_or(Json::Null));
    data.insert("units".into(), Json::Array(rows));

    let site = match unit.location_id {
        Some(id) => location::Entity::find_by_id(id).one(db).await?,
        None => None,
    };
    match site {
        Some(site) => data.insert("location".into(), site.as_dict()),
        None => data.remove("location"),
    };

    let secondary = match unit.secondary_location_id {
        Some(id) => secondary_location::Entity::find_by_id(id).one(db).await?,
        None => None,
    };
    match secondary {
        Some(secondary) => data.insert("secondary_location".into(), secondary.as_dict()),
        None => data.remove("secondary_location"),
    };

    data.insert(
        "cost_centre".into(),
        json!({
            "name": unit.name,
            "code": cc.code,
            "cost_centre_manager": email_of(db, cc.manager_id).await?,
            "business_manager": email_of(db, cc.business_manager_id).await?,
            "admin": email_of(db, cc.admin_id).await?,
            "tech_contact": email_of(db, cc.tech_contact_id).await?,
        }),
    );

    Ok(Some(Json::Object(data)))
}
