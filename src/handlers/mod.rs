//! Request handlers module

pub mod config;
pub mod department_user;
pub mod device;
pub mod freshdesk;
pub mod organisation;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};

/// Conflict when a row other than `except` already holds `value` in a unique column.
pub(crate) async fn ensure_unique<E, C>(
    db: &C,
    column: E::Column,
    value: &str,
    except: Option<(E::Column, i32)>,
) -> AppResult<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut select = E::find().filter(column.eq(value));
    if let Some((id_column, id)) = except {
        select = select.filter(id_column.ne(id));
    }
    match select.one(db).await? {
        Some(_) => Err(AppError::Conflict(format!("{} already exists", value))),
        None => Ok(()),
    }
}

/// Null `column` on every row of `E` that points at `id`.
pub(crate) async fn clear_reference<E, C>(db: &C, column: E::Column, id: i32) -> Result<(), DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    E::update_many()
        .col_expr(column, sea_orm::sea_query::Expr::value(Option::<i32>::None))
        .filter(column.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

/// Deserializer for nullable update fields.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: an absent key stays `None`, `null` becomes
/// `Some(None)` and a value becomes `Some(Some(v))`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
