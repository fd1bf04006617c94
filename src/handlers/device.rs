//! Device handlers
//!
//! Computers, mobiles and EC2 instances. Their cost centre and org unit are
//! reconciled by the entity save hooks.

use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Select,
    Set,
};
use serde::Deserialize;

use crate::entity::{computer, ec2_instance, mobile};
use crate::error::{AppError, AppResult, OptionExt};
use crate::handlers::nullable;
use crate::middleware::DbConn;
use crate::pretty::pretty_field;
use crate::routes::ApiResponse;

#[derive(Debug, Default, Deserialize)]
pub struct DeviceQuery {
    pub org_unit_id: Option<i32>,
    pub cost_centre_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateComputerRequest {
    pub id: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub cost_centre_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub org_unit_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub probable_owner_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub managed_by_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub asset_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub finance_asset_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub validation_notes: Option<Option<String>>,
}

fn scoped<E>(select: Select<E>, org_unit: E::Column, cost_centre: E::Column, q: &DeviceQuery) -> Select<E>
where
    E: sea_orm::EntityTrait,
{
    let mut select = select;
    if let Some(unit) = q.org_unit_id {
        select = select.filter(org_unit.eq(unit));
    }
    if let Some(cc) = q.cost_centre_id {
        select = select.filter(cost_centre.eq(cc));
    }
    select
}

/// GET /api/computers
pub async fn list_computers(
    Extension(db): Extension<DbConn>,
    Query(q): Query<DeviceQuery>,
) -> AppResult<Json<ApiResponse<Vec<computer::Model>>>> {
    let list = scoped(
        computer::Entity::find(),
        computer::Column::OrgUnitId,
        computer::Column::CostCentreId,
        &q,
    )
    .order_by_asc(computer::Column::Hostname)
    .all(&*db)
    .await?;
    Ok(Json(ApiResponse::success(list)))
}

/// POST /api/computers/update
pub async fn update_computer(
    Extension(db): Extension<DbConn>,
    Json(req): Json<UpdateComputerRequest>,
) -> AppResult<Json<ApiResponse<computer::Model>>> {
    let mut am = computer::Entity::find_by_id(req.id)
        .one(&*db)
        .await?
        .ok_or_not_found(format!("Computer {} not found", req.id))?
        .into_active_model();

    if let Some(cc) = req.cost_centre_id {
        am.cost_centre_id = Set(cc);
    }
    if let Some(unit) = req.org_unit_id {
        am.org_unit_id = Set(unit);
    }
    if let Some(owner) = req.probable_owner_id {
        am.probable_owner_id = Set(owner);
    }
    if let Some(manager) = req.managed_by_id {
        am.managed_by_id = Set(manager);
    }
    if let Some(asset) = req.asset_id {
        am.asset_id = Set(asset);
    }
    if let Some(asset) = req.finance_asset_id {
        am.finance_asset_id = Set(asset);
    }
    if let Some(notes) = req.validation_notes {
        am.validation_notes = Set(notes);
    }

    let computer = am.update(&*db).await?;
    tracing::info!("Updated computer {}", computer);
    Ok(Json(ApiResponse::success(computer)))
}

/// GET /api/mobiles
pub async fn list_mobiles(
    Extension(db): Extension<DbConn>,
    Query(q): Query<DeviceQuery>,
) -> AppResult<Json<ApiResponse<Vec<mobile::Model>>>> {
    let list = scoped(
        mobile::Entity::find(),
        mobile::Column::OrgUnitId,
        mobile::Column::CostCentreId,
        &q,
    )
    .order_by_asc(mobile::Column::Id)
    .all(&*db)
    .await?;
    Ok(Json(ApiResponse::success(list)))
}

/// GET /api/ec2_instances
pub async fn list_ec2_instances(
    Extension(db): Extension<DbConn>,
    Query(q): Query<DeviceQuery>,
) -> AppResult<Json<ApiResponse<Vec<ec2_instance::Model>>>> {
    let list = scoped(
        ec2_instance::Entity::find(),
        ec2_instance::Column::OrgUnitId,
        ec2_instance::Column::CostCentreId,
        &q,
    )
    .order_by_asc(ec2_instance::Column::Name)
    .all(&*db)
    .await?;
    Ok(Json(ApiResponse::success(list)))
}

/// GET /api/devices/:kind/:id/extra_data
///
/// `kind` is `computers`, `mobiles` or `ec2_instances`.
pub async fn get_extra_data(
    Extension(db): Extension<DbConn>,
    Path((kind, id)): Path<(String, i32)>,
) -> AppResult<Json<ApiResponse<Option<String>>>> {
    let extra = match kind.as_str() {
        "computers" => computer::Entity::find_by_id(id).one(&*db).await?.map(|d| d.extra_data),
        "mobiles" => mobile::Entity::find_by_id(id).one(&*db).await?.map(|d| d.extra_data),
        "ec2_instances" => ec2_instance::Entity::find_by_id(id)
            .one(&*db)
            .await?
            .map(|d| d.extra_data),
        other => return Err(AppError::BadRequest(format!("Unknown device kind: {}", other))),
    }
    .ok_or_not_found(format!("{} {} not found", kind, id))?;

    Ok(Json(ApiResponse::success(pretty_field(extra.as_ref()))))
}
