//! Organisation handlers
//!
//! Org unit tree, cost centres, locations and the IT system register

use axum::{extract::Path, response::Json, Extension};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryOrder, Set};
use serde::Deserialize;
use serde_json::Value;

use crate::entity::{cost_centre, it_system, location, org_unit, Choice};
use crate::error::{AppError, AppResult, OptionExt};
use crate::handlers::{ensure_unique, nullable};
use crate::middleware::DbConn;
use crate::org::{tree, unit_forest};
use crate::routes::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct AddOrgUnitRequest {
    pub name: String,
    pub unit_type: i32,
    pub acronym: Option<String>,
    pub parent_id: Option<i32>,
    pub location_id: Option<i32>,
    pub secondary_location_id: Option<i32>,
    pub manager_id: Option<i32>,
    pub details: Option<Value>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrgUnitRequest {
    pub id: i32,
    pub name: Option<String>,
    pub unit_type: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub acronym: Option<Option<String>>,
    /// Moves the unit (and its subtree) under another parent; `null` makes it a root
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub secondary_location_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub manager_id: Option<Option<i32>>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AddCostCentreRequest {
    pub code: String,
    pub name: Option<String>,
    pub chart_acct_name: Option<String>,
    pub org_position_id: Option<i32>,
    pub manager_id: Option<i32>,
    pub business_manager_id: Option<i32>,
    pub admin_id: Option<i32>,
    pub tech_contact_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AddLocationRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub pobox: String,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub url: Option<String>,
    pub bandwidth_url: Option<String>,
    pub manager_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AddItSystemRequest {
    pub system_id: String,
    pub name: String,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub owner_id: Option<i32>,
    pub cost_centre_id: Option<i32>,
    pub org_unit_id: Option<i32>,
}

fn check_unit_type(code: i32) -> AppResult<()> {
    match org_unit::UnitType::from_code(code) {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!("Unknown unit type {}", code))),
    }
}

/// GET /api/org_units
pub async fn get_org_tree(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<org_unit::OrgUnitTree>>>> {
    let forest = unit_forest(&*db).await?;
    Ok(Json(ApiResponse::success(forest)))
}

/// GET /api/org_units/:id/ancestors (root first, including the unit itself)
pub async fn get_ancestors(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<org_unit::Model>>>> {
    org_unit::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found(format!("Org unit {} not found", id))?;
    let path = tree::ancestors::<org_unit::Entity, _>(&*db, id, true).await?;
    Ok(Json(ApiResponse::success(path)))
}

/// GET /api/org_units/:id/descendants (breadth first, excluding the unit)
pub async fn get_descendants(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<org_unit::Model>>>> {
    org_unit::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found(format!("Org unit {} not found", id))?;
    let below = tree::descendants::<org_unit::Entity, _>(&*db, id, false).await?;
    Ok(Json(ApiResponse::success(below)))
}

/// POST /api/org_units/add
pub async fn add_org_unit(
    Extension(db): Extension<DbConn>,
    Json(req): Json<AddOrgUnitRequest>,
) -> AppResult<Json<ApiResponse<org_unit::Model>>> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    check_unit_type(req.unit_type)?;
    ensure_unique::<org_unit::Entity, _>(&*db, org_unit::Column::Name, &req.name, None).await?;

    let mut am = org_unit::ActiveModel {
        name: Set(req.name),
        unit_type: Set(req.unit_type),
        acronym: Set(req.acronym),
        parent_id: Set(req.parent_id),
        location_id: Set(req.location_id),
        secondary_location_id: Set(req.secondary_location_id),
        manager_id: Set(req.manager_id),
        details: Set(req.details),
        ..Default::default()
    };
    if let Some(active) = req.active {
        am.active = Set(active);
    }
    let unit = am.insert(&*db).await?;
    tracing::info!("Created org unit {} ({})", unit.name, unit.id);
    Ok(Json(ApiResponse::success(unit)))
}

/// POST /api/org_units/update
pub async fn update_org_unit(
    Extension(db): Extension<DbConn>,
    Json(req): Json<UpdateOrgUnitRequest>,
) -> AppResult<Json<ApiResponse<org_unit::Model>>> {
    let unit = org_unit::Entity::find_by_id(req.id)
        .one(&*db)
        .await?
        .ok_or_not_found(format!("Org unit {} not found", req.id))?;

    if let Some(name) = req.name.as_deref() {
        ensure_unique::<org_unit::Entity, _>(
            &*db,
            org_unit::Column::Name,
            name,
            Some((org_unit::Column::Id, req.id)),
        )
        .await?;
    }

    let mut am = unit.into_active_model();
    if let Some(name) = req.name {
        am.name = Set(name);
    }
    if let Some(unit_type) = req.unit_type {
        check_unit_type(unit_type)?;
        am.unit_type = Set(unit_type);
    }
    if let Some(acronym) = req.acronym {
        am.acronym = Set(acronym);
    }
    if let Some(parent) = req.parent_id {
        am.parent_id = Set(parent);
    }
    if let Some(location) = req.location_id {
        am.location_id = Set(location);
    }
    if let Some(secondary) = req.secondary_location_id {
        am.secondary_location_id = Set(secondary);
    }
    if let Some(manager) = req.manager_id {
        am.manager_id = Set(manager);
    }
    if let Some(active) = req.active {
        am.active = Set(active);
    }

    let unit = am.update(&*db).await?;
    Ok(Json(ApiResponse::success(unit)))
}

/// GET /api/cost_centres
pub async fn list_cost_centres(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<cost_centre::Model>>>> {
    let list = cost_centre::Entity::find()
        .order_by_asc(cost_centre::Column::Code)
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(list)))
}

/// POST /api/cost_centres/add
pub async fn add_cost_centre(
    Extension(db): Extension<DbConn>,
    Json(req): Json<AddCostCentreRequest>,
) -> AppResult<Json<ApiResponse<cost_centre::Model>>> {
    let code = req.code.trim().to_string();
    if code.is_empty() {
        return Err(AppError::Validation("code is required".to_string()));
    }
    ensure_unique::<cost_centre::Entity, _>(&*db, cost_centre::Column::Code, &code, None).await?;

    let mut am = cost_centre::ActiveModel {
        code: Set(code),
        chart_acct_name: Set(req.chart_acct_name),
        org_position_id: Set(req.org_position_id),
        manager_id: Set(req.manager_id),
        business_manager_id: Set(req.business_manager_id),
        admin_id: Set(req.admin_id),
        tech_contact_id: Set(req.tech_contact_id),
        ..Default::default()
    };
    if let Some(name) = req.name {
        am.name = Set(name);
    }
    let cc = am.insert(&*db).await?;
    Ok(Json(ApiResponse::success(cc)))
}

/// GET /api/locations
pub async fn list_locations(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<Value>>>> {
    let list = location::Entity::find()
        .order_by_asc(location::Column::Name)
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(
        list.iter().map(location::Model::as_dict).collect(),
    )))
}

/// POST /api/locations/add
pub async fn add_location(
    Extension(db): Extension<DbConn>,
    Json(req): Json<AddLocationRequest>,
) -> AppResult<Json<ApiResponse<location::Model>>> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    ensure_unique::<location::Entity, _>(&*db, location::Column::Name, &req.name, None).await?;
    let loc = location::ActiveModel {
        name: Set(req.name),
        address: Set(req.address),
        pobox: Set(req.pobox),
        phone: Set(req.phone),
        fax: Set(req.fax),
        email: Set(req.email),
        latitude: Set(req.latitude),
        longitude: Set(req.longitude),
        url: Set(req.url),
        bandwidth_url: Set(req.bandwidth_url),
        manager_id: Set(req.manager_id),
        active: Set(true),
        ..Default::default()
    }
    .insert(&*db)
    .await?;
    Ok(Json(ApiResponse::success(loc)))
}

/// GET /api/it_systems
pub async fn list_it_systems(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<it_system::Model>>>> {
    let list = it_system::Entity::find()
        .order_by_asc(it_system::Column::SystemId)
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(list)))
}

/// POST /api/it_systems/add
pub async fn add_it_system(
    Extension(db): Extension<DbConn>,
    Json(req): Json<AddItSystemRequest>,
) -> AppResult<Json<ApiResponse<it_system::Model>>> {
    if req.system_id.trim().is_empty() || req.name.trim().is_empty() {
        return Err(AppError::Validation("system_id and name are required".to_string()));
    }
    ensure_unique::<it_system::Entity, _>(&*db, it_system::Column::SystemId, &req.system_id, None)
        .await?;
    ensure_unique::<it_system::Entity, _>(&*db, it_system::Column::Name, &req.name, None).await?;
    let system = it_system::ActiveModel {
        system_id: Set(req.system_id),
        name: Set(req.name),
        acronym: Set(req.acronym),
        description: Set(req.description),
        owner_id: Set(req.owner_id),
        cost_centre_id: Set(req.cost_centre_id),
        org_unit_id: Set(req.org_unit_id),
        ..Default::default()
    }
    .insert(&*db)
    .await?;
    Ok(Json(ApiResponse::success(system)))
}
