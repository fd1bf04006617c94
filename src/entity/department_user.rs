//! DepartmentUser entity - a member of staff, mirrored from Active Directory
//!
//! Table: organisation_departmentuser
//!
//! Users also form a reporting tree through `parent_id` ("reports to").

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use super::{cost_centre, current, current_opt, default_if_unset, Choice};
use crate::org::snapshot;
use crate::org::tree::{self, Hierarchy};

/// Employee account status (should match Alesco status)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Permanent,
    AgencyContract,
    FixedTermContract,
    Seasonal,
    Vendor,
    Volunteer,
    OtherAlumni,
    RoomMailbox,
    EquipmentMailbox,
    ServiceAccount,
    SharedMailbox,
    RoleAccount,
    Terminated,
    UnknownDisabled,
    CleanupPermanent,
    UnknownActive,
}

impl Choice for AccountType {
    const ALL: &'static [Self] = &[
        AccountType::Permanent,
        AccountType::AgencyContract,
        AccountType::FixedTermContract,
        AccountType::Seasonal,
        AccountType::Vendor,
        AccountType::Volunteer,
        AccountType::OtherAlumni,
        AccountType::RoomMailbox,
        AccountType::EquipmentMailbox,
        AccountType::ServiceAccount,
        AccountType::SharedMailbox,
        AccountType::RoleAccount,
        AccountType::Terminated,
        AccountType::UnknownDisabled,
        AccountType::CleanupPermanent,
        AccountType::UnknownActive,
    ];

    fn code(self) -> i32 {
        match self {
            AccountType::Permanent => 2,
            AccountType::AgencyContract => 3,
            AccountType::FixedTermContract => 0,
            AccountType::Seasonal => 8,
            AccountType::Vendor => 6,
            AccountType::Volunteer => 7,
            AccountType::OtherAlumni => 1,
            AccountType::RoomMailbox => 11,
            AccountType::EquipmentMailbox => 12,
            AccountType::ServiceAccount => 10,
            AccountType::SharedMailbox => 5,
            AccountType::RoleAccount => 9,
            AccountType::Terminated => 4,
            AccountType::UnknownDisabled => 14,
            AccountType::CleanupPermanent => 15,
            AccountType::UnknownActive => 16,
        }
    }

    fn label(self) -> &'static str {
        match self {
            AccountType::Permanent => "L1 User Account - Permanent",
            AccountType::AgencyContract => "L1 User Account - Agency contract",
            AccountType::FixedTermContract => "L1 User Account - Department fixed-term contract",
            AccountType::Seasonal => "L1 User Account - Seasonal",
            AccountType::Vendor => "L1 User Account - Vendor",
            AccountType::Volunteer => "L1 User Account - Volunteer",
            AccountType::OtherAlumni => "L1 User Account - Other/Alumni",
            AccountType::RoomMailbox => "L1 User Account - RoomMailbox",
            AccountType::EquipmentMailbox => "L1 User Account - EquipmentMailbox",
            AccountType::ServiceAccount => "L2 Service Account - System",
            AccountType::SharedMailbox => "L1 Group (shared) Mailbox - Shared account",
            AccountType::RoleAccount => "L1 Role Account - Role-based account",
            AccountType::Terminated => "Terminated",
            AccountType::UnknownDisabled => "Unknown - AD disabled",
            AccountType::CleanupPermanent => "Cleanup - Permanent",
            AccountType::UnknownActive => "Unknown - AD active",
        }
    }
}

impl AccountType {
    /// Accounts that are not tied to one person
    pub fn is_shared(self) -> bool {
        matches!(
            self,
            AccountType::SharedMailbox
                | AccountType::RoleAccount
                | AccountType::ServiceAccount
                | AccountType::RoomMailbox
                | AccountType::EquipmentMailbox
        )
    }
}

/// Employee position working arrangement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionType {
    FullTime,
    PartTime,
    Casual,
    Other,
}

impl Choice for PositionType {
    const ALL: &'static [Self] = &[
        PositionType::FullTime,
        PositionType::PartTime,
        PositionType::Casual,
        PositionType::Other,
    ];

    fn code(self) -> i32 {
        match self {
            PositionType::FullTime => 0,
            PositionType::PartTime => 1,
            PositionType::Casual => 2,
            PositionType::Other => 3,
        }
    }

    fn label(self) -> &'static str {
        match self {
            PositionType::FullTime => "Full time",
            PositionType::PartTime => "Part time",
            PositionType::Casual => "Casual",
            PositionType::Other => "Other",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organisation_departmentuser")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,

    pub cost_centre_id: Option<i32>,

    /// Org unit for the user's primary physical location
    pub org_unit_id: Option<i32>,

    /// Reports to
    pub parent_id: Option<i32>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub extra_data: Option<Json>,

    /// Must match the GUID of the AD object for sync to succeed
    #[sea_orm(column_type = "String(Some(48))", nullable, unique)]
    pub ad_guid: Option<String>,

    #[sea_orm(column_type = "String(Some(48))", nullable, unique)]
    pub azure_guid: Option<String>,

    /// AD DistinguishedName
    #[sea_orm(column_type = "String(Some(512))", nullable, unique)]
    pub ad_dn: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub ad_data: Option<Json>,

    /// Organisation snapshot, rebuilt on save
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub org_data: Option<Json>,

    /// HR employee ID, six digits
    #[sea_orm(column_type = "String(Some(128))", nullable, unique)]
    pub employee_id: Option<String>,

    #[sea_orm(column_type = "String(Some(254))", unique)]
    pub email: String,

    /// Pre-Windows 2000 login username
    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub username: Option<String>,

    /// Format: [Given name] [Surname]
    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub given_name: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub surname: Option<String>,

    /// Reference for name/CC change request
    #[sea_orm(column_type = "String(Some(512))", nullable)]
    pub name_update_reference: Option<String>,

    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub preferred_name: Option<String>,

    /// Occupation position title
    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub title: Option<String>,

    /// See [`PositionType`]
    pub position_type: Option<i32>,

    /// Date that the AD account is set to expire
    pub expiry_date: Option<DateTimeUtc>,

    pub date_ad_updated: Option<DateTimeUtc>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub telephone: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub mobile_phone: Option<String>,

    /// VoIP extension
    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub extension: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub home_phone: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub other_phone: Option<String>,

    /// Account is active within Active Directory
    pub active: bool,

    pub ad_deleted: bool,

    /// Derived: data has been synchronised from AD
    pub in_sync: bool,

    pub vip: bool,

    pub executive: bool,

    /// External contractor (not agency contract staff)
    pub contractor: bool,

    /// Uploaded photo, relative to the media root
    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub photo: Option<String>,

    /// Thumbnail generated from `photo`
    #[sea_orm(column_type = "String(Some(256))", nullable)]
    pub photo_ad: Option<String>,

    /// Groups/roles separated by semicolon
    #[sea_orm(column_type = "Text", nullable)]
    pub sso_roles: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub working_hours: Option<String>,

    /// If false the user is left out of the primary group email
    pub populate_primary_group: bool,

    /// See [`AccountType`]
    pub account_type: Option<i32>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub alesco_data: Option<Json>,

    pub security_clearance: bool,

    /// Account consumes an Office 365 licence
    pub o365_licence: Option<bool>,

    /// Derived from `account_type`
    pub shared_account: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// Blank, "n/a" and numeric IDs are accepted; numbers are zero padded to six digits.
pub fn normalize_employee_id(raw: Option<&str>) -> Result<Option<String>, String> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("n/a") {
        return Ok(None);
    }
    if !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "Employee ID must be numeric or \"n/a\", got {:?}",
            raw
        ));
    }
    Ok(Some(format!("{:0>6}", raw.trim_start_matches('0'))))
}

/// Active Directory FILETIME (100ns ticks since 1601-01-01) to UTC.
pub fn convert_ad_timestamp(ticks: i64) -> Option<DateTime<Utc>> {
    const EPOCH_OFFSET_SECS: i64 = 11_644_473_600;
    if ticks <= 0 {
        return None;
    }
    let secs = ticks / 10_000_000 - EPOCH_OFFSET_SECS;
    let nanos = (ticks % 10_000_000) as u32 * 100;
    DateTime::from_timestamp(secs, nanos)
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        if insert {
            default_if_unset(&mut self.date_created, now);
            default_if_unset(&mut self.active, true);
            default_if_unset(&mut self.ad_deleted, false);
            default_if_unset(&mut self.vip, false);
            default_if_unset(&mut self.executive, false);
            default_if_unset(&mut self.contractor, false);
            default_if_unset(&mut self.populate_primary_group, true);
            default_if_unset(&mut self.security_clearance, false);
            default_if_unset(&mut self.working_hours, Some("N/A".to_string()));
            default_if_unset(&mut self.position_type, Some(PositionType::FullTime.code()));
        }
        self.date_updated = Set(now);

        let employee_id = current_opt(&self.employee_id);
        let normalized = normalize_employee_id(employee_id.as_deref()).map_err(DbErr::Custom)?;
        if normalized != employee_id {
            self.employee_id = Set(normalized);
        }

        self.in_sync = Set(current_opt(&self.date_ad_updated).is_some());
        self.shared_account = Set(current_opt(&self.account_type)
            .and_then(AccountType::from_code)
            .is_some_and(AccountType::is_shared));

        if let (Some(id), Some(parent)) = (current(&self.id).copied(), current_opt(&self.parent_id)) {
            tree::check_parent::<Entity, _>(db, id, parent).await?;
        }

        let cc = match current_opt(&self.cost_centre_id) {
            Some(cc_id) => cost_centre::Entity::find_by_id(cc_id).one(db).await?,
            None => None,
        };
        if let Some(cc) = cc {
            if current_opt(&self.org_unit_id).is_none() && cc.org_position_id.is_some() {
                self.org_unit_id = Set(cc.org_position_id);
            }
            if let Some(unit_id) = current_opt(&self.org_unit_id) {
                let existing = current_opt(&self.org_data);
                let rebuilt = snapshot::build_org_data(db, existing.clone(), unit_id, &cc).await?;
                if rebuilt != existing {
                    self.org_data = Set(rebuilt);
                }
            }
        }

        Ok(self)
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

/// Current staff: active, with an email and cost centre, and not a contractor.
pub fn active_filter() -> Condition {
    Condition::all()
        .add(Column::Active.eq(true))
        .add(Column::Email.ne(""))
        .add(Column::CostCentreId.is_not_null())
        .add(Column::Contractor.eq(false))
}

impl Model {
    pub fn display_name(&self) -> &str {
        self.preferred_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.name)
    }

    /// Days since the AD password was last set, from `ad_data.pwdLastSet`.
    pub fn password_age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        let raw = self.ad_data.as_ref()?.get("pwdLastSet")?;
        let ticks = match raw {
            Json::Number(n) => n.as_i64()?,
            Json::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        let set_at = convert_ad_timestamp(ticks)?;
        Some((now - set_at).num_days())
    }

    pub fn account_type_display(&self) -> Option<&'static str> {
        self.account_type.map(AccountType::label_for)
    }

    pub fn position_type_display(&self) -> Option<&'static str> {
        self.position_type.map(PositionType::label_for)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_database;
    use crate::entity::{location, org_unit};
    use chrono::TimeZone;
    use sea_orm::ActiveModelTrait;
    use serde_json::json;

    #[test]
    fn test_normalize_employee_id() {
        assert_eq!(normalize_employee_id(None), Ok(None));
        assert_eq!(normalize_employee_id(Some("")), Ok(None));
        assert_eq!(normalize_employee_id(Some(" N/A ")), Ok(None));
        assert_eq!(normalize_employee_id(Some("1234")), Ok(Some("001234".into())));
        assert_eq!(normalize_employee_id(Some("0001234")), Ok(Some("001234".into())));
        assert_eq!(normalize_employee_id(Some("12345678")), Ok(Some("12345678".into())));
        assert_eq!(normalize_employee_id(Some("0")), Ok(Some("000000".into())));
        assert!(normalize_employee_id(Some("E1234")).is_err());
    }

    #[test]
    fn test_convert_ad_timestamp() {
        // 2017-01-01T00:00:00Z
        let ts = convert_ad_timestamp(131_277_024_000_000_000).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(convert_ad_timestamp(0), None);
    }

    #[test]
    fn test_account_type_shared() {
        assert!(AccountType::SharedMailbox.is_shared());
        assert!(AccountType::from_code(10).unwrap().is_shared());
        assert!(!AccountType::from_code(2).unwrap().is_shared());
        assert_eq!(AccountType::label_for(13), "Unknown");
        assert_eq!(PositionType::label_for(2), "Casual");
    }

    fn new_user(email: &str, name: &str) -> ActiveModel {
        ActiveModel {
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_defaults_and_derived_flags() {
        let db = memory_database().await;
        let mut am = new_user("jane.doe@example.com", "Jane Doe");
        am.employee_id = Set(Some("4321".into()));
        am.account_type = Set(Some(5));
        am.date_ad_updated = Set(Some(Utc::now()));
        let user = am.insert(&db).await.unwrap();

        assert!(user.active);
        assert!(user.populate_primary_group);
        assert!(!user.contractor);
        assert!(user.in_sync);
        assert!(user.shared_account);
        assert_eq!(user.employee_id.as_deref(), Some("004321"));
        assert_eq!(user.working_hours.as_deref(), Some("N/A"));
        assert_eq!(user.position_type_display(), Some("Full time"));
        assert_eq!(user.to_string(), "jane.doe@example.com");

        let mut am: ActiveModel = user.into();
        am.employee_id = Set(Some("n/a".into()));
        am.account_type = Set(Some(2));
        am.date_ad_updated = Set(None);
        let user = am.update(&db).await.unwrap();
        assert_eq!(user.employee_id, None);
        assert!(!user.shared_account);
        assert!(!user.in_sync);

        let mut am: ActiveModel = user.into();
        am.employee_id = Set(Some("X99".into()));
        assert!(matches!(am.update(&db).await, Err(DbErr::Custom(_))));
    }

    #[tokio::test]
    async fn test_reports_to_cycle_rejected() {
        let db = memory_database().await;
        let boss = new_user("boss@example.com", "Boss").insert(&db).await.unwrap();
        let mut am = new_user("staff@example.com", "Staff");
        am.parent_id = Set(Some(boss.id));
        let staff = am.insert(&db).await.unwrap();

        let mut am: ActiveModel = boss.into();
        am.parent_id = Set(Some(staff.id));
        assert!(matches!(am.update(&db).await, Err(DbErr::Custom(_))));
    }

    #[tokio::test]
    async fn test_org_data_snapshot() {
        let db = memory_database().await;

        let site = location::ActiveModel {
            name: Set("Kensington".into()),
            address: Set("17 Dick Perry Avenue".into()),
            pobox: Set(String::new()),
            active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let dept = org_unit::ActiveModel {
            name: Set("Department".into()),
            unit_type: Set(0),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let branch = org_unit::ActiveModel {
            name: Set("Fire Branch".into()),
            acronym: Set(Some("FMB".into())),
            unit_type: Set(2),
            parent_id: Set(Some(dept.id)),
            location_id: Set(Some(site.id)),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let manager = new_user("manager@example.com", "Manager").insert(&db).await.unwrap();
        let cc = cost_centre::ActiveModel {
            code: Set("042".into()),
            org_position_id: Set(Some(branch.id)),
            manager_id: Set(Some(manager.id)),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let mut am = new_user("ranger@example.com", "Ranger");
        am.cost_centre_id = Set(Some(cc.id));
        am.org_data = Set(Some(json!({"legacy": 1})));
        let user = am.insert(&db).await.unwrap();

        assert_eq!(user.org_unit_id, Some(branch.id));
        let data = user.org_data.expect("org data");
        assert_eq!(data["legacy"], 1);
        assert_eq!(data["units"].as_array().unwrap().len(), 2);
        assert_eq!(data["units"][0]["name"], "Department");
        assert_eq!(data["units"][0]["unit_type"], "Department (Tier one)");
        assert_eq!(data["unit"]["name"], "Fire Branch");
        assert_eq!(data["unit"]["acronym"], "FMB");
        assert_eq!(data["unit"]["costcentre__code"], "042");
        assert_eq!(data["unit"]["location__name"], "Kensington");
        assert_eq!(data["location"]["name"], "Kensington");
        assert!(data.get("secondary_location").is_none());
        assert_eq!(data["cost_centre"]["name"], "Fire Branch");
        assert_eq!(data["cost_centre"]["code"], "042");
        assert_eq!(data["cost_centre"]["cost_centre_manager"], "manager@example.com");
        assert_eq!(data["cost_centre"]["admin"], Json::Null);
    }

    #[test]
    fn test_password_age_days() {
        let now = Utc.with_ymd_and_hms(2017, 1, 31, 12, 0, 0).unwrap();
        let mut user = Model {
            id: 1,
            date_created: now,
            date_updated: now,
            cost_centre_id: None,
            org_unit_id: None,
            parent_id: None,
            extra_data: None,
            ad_guid: None,
            azure_guid: None,
            ad_dn: None,
            ad_data: Some(json!({"pwdLastSet": "131277024000000000"})),
            org_data: None,
            employee_id: None,
            email: "a@example.com".into(),
            username: None,
            name: "A Person".into(),
            given_name: None,
            surname: None,
            name_update_reference: None,
            preferred_name: Some("Al".into()),
            title: None,
            position_type: None,
            expiry_date: None,
            date_ad_updated: None,
            telephone: None,
            mobile_phone: None,
            extension: None,
            home_phone: None,
            other_phone: None,
            active: true,
            ad_deleted: false,
            in_sync: false,
            vip: false,
            executive: false,
            contractor: false,
            photo: None,
            photo_ad: None,
            sso_roles: None,
            notes: None,
            working_hours: None,
            populate_primary_group: true,
            account_type: None,
            alesco_data: None,
            security_clearance: false,
            o365_licence: None,
            shared_account: false,
        };
        assert_eq!(user.password_age_days(now), Some(30));
        assert_eq!(user.display_name(), "Al");

        user.ad_data = Some(json!({"pwdLastSet": 0}));
        assert_eq!(user.password_age_days(now), None);
        user.ad_data = Some(json!({"pwdLastSet": "never"}));
        assert_eq!(user.password_age_days(now), None);
        user.ad_data = None;
        assert_eq!(user.password_age_days(now), None);
    }
}
