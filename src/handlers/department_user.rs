//! Department user handlers
//!
//! CRUD on staff records plus their photos and the HTML views of their JSON data

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entity::{
    computer, cost_centre, department_user, department_user_cost_centre, department_user_location,
    department_user_org_unit, freshdesk_contact, freshdesk_conversation, freshdesk_ticket,
    it_system, location, mobile, org_unit, secondary_location,
};
use crate::error::{AppError, AppResult, OptionExt};
use crate::handlers::{clear_reference, ensure_unique, nullable};
use crate::middleware::DbConn;
use crate::org::tree;
use crate::photo::{PhotoFormat, PhotoStore};
use crate::pretty::{alesco_table, pretty_field};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Department user with the derived display values
#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: department_user::Model,
    pub display_name: String,
    pub password_age_days: Option<i64>,
    pub account_type_display: Option<&'static str>,
    pub position_type_display: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SecondaryLinks>,
}

impl From<department_user::Model> for UserResponse {
    fn from(user: department_user::Model) -> Self {
        Self {
            display_name: user.display_name().to_string(),
            password_age_days: user.password_age_days(Utc::now()),
            account_type_display: user.account_type_display(),
            position_type_display: user.position_type_display(),
            secondary: None,
            user,
        }
    }
}

/// Additional cost centres, org units and locations a user is attached to
#[derive(Debug, Default, Serialize)]
pub struct SecondaryLinks {
    pub cost_centres: Vec<i32>,
    pub org_units: Vec<i32>,
    pub locations: Vec<i32>,
}

/// Replacement link sets from a request; `None` leaves a set untouched
#[derive(Debug, Default)]
struct SecondaryLinkUpdate {
    cost_centres: Option<Vec<i32>>,
    org_units: Option<Vec<i32>>,
    locations: Option<Vec<i32>>,
}

async fn load_links<C>(db: &C, user_id: i32) -> Result<SecondaryLinks, DbErr>
where
    C: ConnectionTrait,
{
    let cost_centres = department_user_cost_centre::Entity::find()
        .filter(department_user_cost_centre::Column::DepartmentUserId.eq(user_id))
        .order_by_asc(department_user_cost_centre::Column::CostCentreId)
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.cost_centre_id)
        .collect();
    let org_units = department_user_org_unit::Entity::find()
        .filter(department_user_org_unit::Column::DepartmentUserId.eq(user_id))
        .order_by_asc(department_user_org_unit::Column::OrgUnitId)
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.org_unit_id)
        .collect();
    let locations = department_user_location::Entity::find()
        .filter(department_user_location::Column::DepartmentUserId.eq(user_id))
        .order_by_asc(department_user_location::Column::LocationId)
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.location_id)
        .collect();
    Ok(SecondaryLinks {
        cost_centres,
        org_units,
        locations,
    })
}

fn distinct(mut ids: Vec<i32>) -> Vec<i32> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn replace_links<C>(db: &C, user_id: i32, update: SecondaryLinkUpdate) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if let Some(ids) = update.cost_centres.map(distinct) {
        department_user_cost_centre::Entity::delete_many()
            .filter(department_user_cost_centre::Column::DepartmentUserId.eq(user_id))
            .exec(db)
            .await?;
        for cost_centre_id in ids {
            department_user_cost_centre::ActiveModel {
                department_user_id: Set(user_id),
                cost_centre_id: Set(cost_centre_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }
    if let Some(ids) = update.org_units.map(distinct) {
        department_user_org_unit::Entity::delete_many()
            .filter(department_user_org_unit::Column::DepartmentUserId.eq(user_id))
            .exec(db)
            .await?;
        for org_unit_id in ids {
            department_user_org_unit::ActiveModel {
                department_user_id: Set(user_id),
                org_unit_id: Set(org_unit_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }
    if let Some(ids) = update.locations.map(distinct) {
        department_user_location::Entity::delete_many()
            .filter(department_user_location::Column::DepartmentUserId.eq(user_id))
            .exec(db)
            .await?;
        for location_id in ids {
            department_user_location::ActiveModel {
                department_user_id: Set(user_id),
                location_id: Set(location_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

/// Null every column that points at a department user, so that the user can
/// be deleted without leaving dangling ids behind.
async fn clear_user_references<C>(db: &C, user_id: i32) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    clear_reference::<department_user::Entity, _>(db, department_user::Column::ParentId, user_id).await?;
    for column in [
        cost_centre::Column::ManagerId,
        cost_centre::Column::BusinessManagerId,
        cost_centre::Column::AdminId,
        cost_centre::Column::TechContactId,
    ] {
        clear_reference::<cost_centre::Entity, _>(db, column, user_id).await?;
    }
    clear_reference::<org_unit::Entity, _>(db, org_unit::Column::ManagerId, user_id).await?;
    clear_reference::<location::Entity, _>(db, location::Column::ManagerId, user_id).await?;
    clear_reference::<secondary_location::Entity, _>(db, secondary_location::Column::ManagerId, user_id)
        .await?;
    clear_reference::<it_system::Entity, _>(db, it_system::Column::OwnerId, user_id).await?;
    clear_reference::<computer::Entity, _>(db, computer::Column::ProbableOwnerId, user_id).await?;
    clear_reference::<computer::Entity, _>(db, computer::Column::ManagedById, user_id).await?;
    clear_reference::<mobile::Entity, _>(db, mobile::Column::RegisteredToId, user_id).await?;
    clear_reference::<freshdesk_contact::Entity, _>(db, freshdesk_contact::Column::DuUserId, user_id)
        .await?;
    clear_reference::<freshdesk_conversation::Entity, _>(
        db,
        freshdesk_conversation::Column::DuUserId,
        user_id,
    )
    .await?;
    for column in [
        freshdesk_ticket::Column::DuRequesterId,
        freshdesk_ticket::Column::DuResponderId,
    ] {
        clear_reference::<freshdesk_ticket::Entity, _>(db, column, user_id).await?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub active_only: bool,
    pub org_unit_id: Option<i32>,
    pub cost_centre_id: Option<i32>,
}

/// Editable fields; absent fields are left untouched and `null` clears a
/// nullable column
#[derive(Debug, Default, Deserialize)]
pub struct UserFields {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub username: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub given_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub surname: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub preferred_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub name_update_reference: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub employee_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub cost_centre_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub org_unit_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub account_type: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub position_type: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub expiry_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub telephone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub mobile_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub extension: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub home_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub other_phone: Option<Option<String>>,
    pub active: Option<bool>,
    pub vip: Option<bool>,
    pub executive: Option<bool>,
    pub contractor: Option<bool>,
    pub security_clearance: Option<bool>,
    pub populate_primary_group: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub o365_licence: Option<Option<bool>>,
    #[serde(default, deserialize_with = "nullable")]
    pub working_hours: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub extra_data: Option<Option<serde_json::Value>>,
    pub secondary_cost_centres: Option<Vec<i32>>,
    pub secondary_org_units: Option<Vec<i32>>,
    pub secondary_locations: Option<Vec<i32>>,
}

macro_rules! patch {
    ($am:ident, $fields:ident, [$($field:ident),* $(,)?]) => {
        $(if let Some(v) = $fields.$field { $am.$field = Set(v); })*
    };
}

impl UserFields {
    fn apply(self, am: &mut department_user::ActiveModel) -> SecondaryLinkUpdate {
        let fields = self;
        patch!(
            am,
            fields,
            [
                email,
                name,
                active,
                vip,
                executive,
                contractor,
                security_clearance,
                populate_primary_group,
                username,
                given_name,
                surname,
                preferred_name,
                name_update_reference,
                title,
                employee_id,
                cost_centre_id,
                org_unit_id,
                parent_id,
                account_type,
                position_type,
                expiry_date,
                telephone,
                mobile_phone,
                extension,
                home_phone,
                other_phone,
                o365_licence,
                working_hours,
                notes,
                extra_data,
            ]
        );
        SecondaryLinkUpdate {
            cost_centres: fields.secondary_cost_centres,
            org_units: fields.secondary_org_units,
            locations: fields.secondary_locations,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub id: i32,
    #[serde(flatten)]
    pub fields: UserFields,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i32,
}

async fn find_user(db: &DbConn, id: i32) -> AppResult<department_user::Model> {
    department_user::Entity::find_by_id(id)
        .one(&**db)
        .await?
        .ok_or_not_found(format!("Department user {} not found", id))
}

/// GET /api/users
pub async fn list_users(
    Extension(db): Extension<DbConn>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<Vec<UserResponse>>>> {
    let mut select = department_user::Entity::find();
    if query.active_only {
        select = select.filter(department_user::active_filter());
    }
    if let Some(unit) = query.org_unit_id {
        select = select.filter(department_user::Column::OrgUnitId.eq(unit));
    }
    if let Some(cc) = query.cost_centre_id {
        select = select.filter(department_user::Column::CostCentreId.eq(cc));
    }

    let users = select
        .order_by_asc(department_user::Column::Name)
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserResponse::from).collect(),
    )))
}

/// GET /api/users/:id
pub async fn get_user(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = find_user(&db, id).await?;
    let secondary = load_links(&*db, user.id).await?;
    let mut resp = UserResponse::from(user);
    resp.secondary = Some(secondary);
    Ok(Json(ApiResponse::success(resp)))
}

/// POST /api/users/add
pub async fn add_user(
    Extension(db): Extension<DbConn>,
    Json(fields): Json<UserFields>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let email = fields.email.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    ensure_unique::<department_user::Entity, _>(&*db, department_user::Column::Email, email, None)
        .await?;
    if fields.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let mut am = <department_user::ActiveModel as Default>::default();
    let links = fields.apply(&mut am);
    let user = am.insert(&*db).await?;
    replace_links(&*db, user.id, links).await?;
    tracing::info!("Created department user {}", user);
    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /api/users/update
pub async fn update_user(
    Extension(db): Extension<DbConn>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let mut am = find_user(&db, req.id).await?.into_active_model();
    if let Some(email) = req.fields.email.as_deref() {
        ensure_unique::<department_user::Entity, _>(
            &*db,
            department_user::Column::Email,
            email.trim(),
            Some((department_user::Column::Id, req.id)),
        )
        .await?;
    }
    let links = req.fields.apply(&mut am);
    let user = am.update(&*db).await?;
    replace_links(&*db, user.id, links).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /api/users/delete?id=
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Query(query): Query<IdQuery>,
) -> AppResult<Json<ApiResponse<()>>> {
    let user = find_user(&db, query.id).await?;

    let user_id = user.id;
    (&*db)
        .transaction::<_, (), DbErr>(|txn| {
            Box::pin(async move {
                clear_user_references(txn, user_id).await?;
                replace_links(
                    txn,
                    user_id,
                    SecondaryLinkUpdate {
                        cost_centres: Some(Vec::new()),
                        org_units: Some(Vec::new()),
                        locations: Some(Vec::new()),
                    },
                )
                .await?;
                department_user::Entity::delete_by_id(user_id).exec(txn).await?;
                Ok(())
            })
        })
        .await?;

    for path in [user.photo.as_deref(), user.photo_ad.as_deref()].into_iter().flatten() {
        state.photos.delete(path).await?;
    }

    tracing::info!("Deleted department user {}", user);
    Ok(Json(ApiResponse::success_msg("success")))
}

/// GET /api/users/:id/reports
pub async fn get_reports(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<UserResponse>>>> {
    find_user(&db, id).await?;
    let reports = tree::children::<department_user::Entity, _>(&*db, id).await?;
    Ok(Json(ApiResponse::success(
        reports.into_iter().map(UserResponse::from).collect(),
    )))
}

/// GET /api/users/:id/pretty/:field
///
/// `field` is one of `org_data`, `ad_data`, `extra_data` or `alesco_data`.
pub async fn get_pretty_field(
    Extension(db): Extension<DbConn>,
    Path((id, field)): Path<(i32, String)>,
) -> AppResult<Json<ApiResponse<Option<String>>>> {
    let user = find_user(&db, id).await?;
    let html = match field.as_str() {
        "org_data" => pretty_field(user.org_data.as_ref()),
        "ad_data" => pretty_field(user.ad_data.as_ref()),
        "extra_data" => pretty_field(user.extra_data.as_ref()),
        "alesco_data" => alesco_table(user.alesco_data.as_ref()),
        other => return Err(AppError::BadRequest(format!("Unknown field: {}", other))),
    };
    Ok(Json(ApiResponse::success(html)))
}

/// POST /api/users/:id/photo (multipart, file field `photo`)
///
/// Stores the photo and regenerates the directory thumbnail.
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = find_user(&db, id).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("photo") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((content_type, bytes));
        break;
    }
    let Some((content_type, bytes)) = upload else {
        return Err(AppError::BadRequest("Missing photo field".to_string()));
    };

    let format = PhotoFormat::from_content_type(content_type.as_deref()).ok_or_else(|| {
        AppError::BadRequest("Photo must be a JPEG or PNG image".to_string())
    })?;
    // Reject undecodable uploads before anything is written
    image::load_from_memory(&bytes)?;

    let photo_path = PhotoStore::photo_path(user.id, format);
    if let Some(old) = user.photo.as_deref().filter(|old| *old != photo_path) {
        state.photos.delete(old).await?;
    }
    state.photos.write(&photo_path, &bytes).await?;

    let mut stored = user.clone();
    stored.photo = Some(photo_path.clone());
    let photo_ad = state
        .photos
        .refresh_photo_ad(&stored, Some(format.content_type()), &state.config.photo)
        .await?;

    let mut am = user.into_active_model();
    am.photo = Set(Some(photo_path));
    am.photo_ad = Set(photo_ad);
    let user = am.update(&*db).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /api/users/:id/photo/delete
///
/// Removes the stored photo; the thumbnail goes with it.
pub async fn delete_photo(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = find_user(&db, id).await?;
    if let Some(old) = user.photo.as_deref() {
        state.photos.delete(old).await?;
    }

    let mut stored = user.clone();
    stored.photo = None;
    let photo_ad = state
        .photos
        .refresh_photo_ad(&stored, None, &state.config.photo)
        .await?;

    let mut am = user.into_active_model();
    am.photo = Set(None);
    am.photo_ad = Set(photo_ad);
    let user = am.update(&*db).await?;
    tracing::info!("Removed photo of department user {}", user);
    Ok(Json(ApiResponse::success(user.into())))
}

/// GET /api/users/:id/photo_ad
pub async fn get_photo_ad(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let user = find_user(&db, id).await?;
    let path = user
        .photo_ad
        .ok_or_not_found(format!("Department user {} has no thumbnail", id))?;
    let content_type = PhotoFormat::from_path(&path)
        .unwrap_or(PhotoFormat::Jpeg)
        .content_type();
    let bytes = state.photos.read(&path).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
