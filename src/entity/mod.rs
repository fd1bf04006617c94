//! Entity module - SeaORM entity definitions
//!
//! One module per table. Foreign keys are plain id columns; relationships are
//! resolved with manual queries, as the organisation and people tables refer to
//! each other in both directions.

pub mod computer;
pub mod cost_centre;
pub mod department_user;
pub mod department_user_cost_centre;
pub mod department_user_location;
pub mod department_user_org_unit;
pub mod ec2_instance;
pub mod freshdesk_contact;
pub mod freshdesk_conversation;
pub mod freshdesk_ticket;
pub mod it_system;
pub mod location;
pub mod mobile;
pub mod org_unit;
pub mod secondary_location;

use sea_orm::{ActiveValue, ConnectionTrait, DbErr, Value};

/// Current value of an active model field, whether freshly set or loaded.
pub(crate) fn current<V>(value: &ActiveValue<V>) -> Option<&V>
where
    V: Into<Value>,
{
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v),
        ActiveValue::NotSet => None,
    }
}

/// Flattened `Option` column read: NotSet and NULL both give `None`.
pub(crate) fn current_opt<V>(value: &ActiveValue<Option<V>>) -> Option<V>
where
    V: Clone,
    Option<V>: Into<Value>,
{
    current(value).cloned().flatten()
}

/// Set a field only when the caller left it untouched.
pub(crate) fn default_if_unset<V>(value: &mut ActiveValue<V>, default: V)
where
    V: Into<Value>,
{
    if value.is_not_set() {
        *value = ActiveValue::Set(default);
    }
}

/// Save hook shared by the device tables (computers, mobiles, EC2 instances):
/// keeps the org unit consistent with the cost centre.
pub(crate) async fn reconcile_common<C>(
    db: &C,
    cost_centre_id: &ActiveValue<Option<i32>>,
    org_unit_id: &mut ActiveValue<Option<i32>>,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let current_unit = current_opt(org_unit_id);
    let resolved =
        crate::org::reconcile_org_unit(db, current_opt(cost_centre_id), current_unit).await?;
    if resolved != current_unit {
        *org_unit_id = ActiveValue::Set(resolved);
    }
    Ok(())
}

/// Human readable labels for small-integer choice columns.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn code(self) -> i32;

    fn label(self) -> &'static str;

    fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Label for a stored code, "Unknown" for codes outside the list.
    fn label_for(code: i32) -> &'static str {
        Self::from_code(code).map(Self::label).unwrap_or("Unknown")
    }
}
