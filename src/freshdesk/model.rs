//! Linking cached Freshdesk records to local IT systems and department users

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, QueryFilter,
    QuerySelect, Set,
};
use serde_json::Value as Json;

use crate::entity::{department_user, freshdesk_contact, freshdesk_ticket, it_system};

/// Ticket category whose subcategory names an IT system
pub const APPLICATIONS_CATEGORY: &str = "Applications";

/// Subcategories look like "Name – detail" (en dash)
const SUBCATEGORY_SEPARATOR: char = '\u{2013}';

pub fn is_support_category(custom_fields: Option<&Json>, category: &str) -> bool {
    custom_fields
        .and_then(|f| f.get("support_category"))
        .and_then(Json::as_str)
        == Some(category)
}

/// IT system name prefix encoded in an Applications ticket's subcategory
pub fn support_subcategory_system_name(custom_fields: Option<&Json>) -> Option<String> {
    if !is_support_category(custom_fields, APPLICATIONS_CATEGORY) {
        return None;
    }
    let sub = custom_fields?.get("support_subcategory")?.as_str()?;
    match sub.find(SUBCATEGORY_SEPARATOR) {
        Some(pos) if pos > 0 => Some(sub[..pos].trim().to_string()),
        _ => None,
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Link the ticket to the one IT system whose name starts with the
/// subcategory prefix. Zero or several candidates leave the ticket alone.
pub async fn match_it_system<C>(
    db: &C,
    ticket: freshdesk_ticket::Model,
) -> Result<freshdesk_ticket::Model, DbErr>
where
    C: ConnectionTrait,
{
    let Some(name) = support_subcategory_system_name(ticket.custom_fields.as_ref()) else {
        return Ok(ticket);
    };
    if name.is_empty() {
        return Ok(ticket);
    }

    let pattern = format!("{}%", escape_like(&name.to_lowercase()));
    let candidates = it_system::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(it_system::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        )
        .limit(2)
        .all(db)
        .await?;

    match candidates.as_slice() {
        [system] if ticket.it_system_id != Some(system.id) => {
            tracing::debug!("{} matched IT system {}", ticket, system.name);
            let mut am = ticket.into_active_model();
            am.it_system_id = Set(Some(system.id));
            am.update(db).await
        }
        _ => Ok(ticket),
    }
}

/// Link the contact to the department user with the same email, ignoring case.
pub async fn match_dept_user<C>(
    db: &C,
    contact: freshdesk_contact::Model,
) -> Result<freshdesk_contact::Model, DbErr>
where
    C: ConnectionTrait,
{
    let Some(email) = contact.email.as_deref().filter(|e| !e.is_empty()) else {
        return Ok(contact);
    };

    let user = department_user::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(department_user::Column::Email)))
                .eq(email.to_lowercase()),
        )
        .one(db)
        .await?;

    match user {
        Some(user) if contact.du_user_id != Some(user.id) => {
            let mut am = contact.into_active_model();
            am.du_user_id = Set(Some(user.id));
            am.update(db).await
        }
        _ => Ok(contact),
    }
}
