//! Parent-linked hierarchies (org units, reporting lines)
//!
//! Nodes only store their parent id. Ancestors are found by walking parent
//! links, descendants breadth first; siblings are always ordered by name.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use std::collections::{HashSet, VecDeque};

/// An entity whose rows form a forest through a nullable parent column.
pub trait Hierarchy: EntityTrait {
    fn id_column() -> Self::Column;

    fn parent_column() -> Self::Column;

    /// Sibling ordering
    fn order_column() -> Self::Column;

    fn node_id(model: &Self::Model) -> i32;

    fn node_parent(model: &Self::Model) -> Option<i32>;
}

async fn find_node<E, C>(db: &C, id: i32) -> Result<Option<E::Model>, DbErr>
where
    E: Hierarchy,
    C: ConnectionTrait,
{
    E::find().filter(E::id_column().eq(id)).one(db).await
}

/// Path from the root down to `id`. Empty when `id` does not exist.
pub async fn ancestors<E, C>(db: &C, id: i32, include_self: bool) -> Result<Vec<E::Model>, DbErr>
where
    E: Hierarchy,
    C: ConnectionTrait,
{
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut next = Some(id);

    while let Some(node_id) = next {
        if !seen.insert(node_id) {
            return Err(DbErr::Custom(format!(
                "Hierarchy cycle detected at node {}",
                node_id
            )));
        }
        let Some(node) = find_node::<E, C>(db, node_id).await? else {
            break;
        };
        next = E::node_parent(&node);
        chain.push(node);
    }

    if !include_self && !chain.is_empty() {
        chain.remove(0);
    }
    chain.reverse();
    Ok(chain)
}

/// Direct children of `id`, ordered by name
pub async fn children<E, C>(db: &C, id: i32) -> Result<Vec<E::Model>, DbErr>
where
    E: Hierarchy,
    C: ConnectionTrait,
{
    E::find()
        .filter(E::parent_column().eq(id))
        .order_by_asc(E::order_column())
        .all(db)
        .await
}

/// Whole subtree under `id`, level by level
pub async fn descendants<E, C>(db: &C, id: i32, include_self: bool) -> Result<Vec<E::Model>, DbErr>
where
    E: Hierarchy,
    C: ConnectionTrait,
{
    let mut out = Vec::new();
    if include_self {
        match find_node::<E, C>(db, id).await? {
            Some(node) => out.push(node),
            None => return Ok(out),
        }
    }

    let mut seen = HashSet::from([id]);
    let mut queue = VecDeque::from([id]);
    while let Some(parent) = queue.pop_front() {
        for child in children::<E, C>(db, parent).await? {
            let child_id = E::node_id(&child);
            if seen.insert(child_id) {
                queue.push_back(child_id);
                out.push(child);
            }
        }
    }
    Ok(out)
}

/// True when `node` is `root` or sits anywhere below it.
pub async fn is_within<E, C>(db: &C, node: i32, root: i32) -> Result<bool, DbErr>
where
    E: Hierarchy,
    C: ConnectionTrait,
{
    if node == root {
        return Ok(true);
    }
    let path = ancestors::<E, C>(db, node, false).await?;
    Ok(path.iter().any(|n| E::node_id(n) == root))
}

/// Refuse a move that would put a node under itself.
pub async fn check_parent<E, C>(db: &C, id: i32, parent: i32) -> Result<(), DbErr>
where
    E: Hierarchy,
    C: ConnectionTrait,
{
    if is_within::<E, C>(db, parent, id).await? {
        return Err(DbErr::Custom(format!(
            "Node {} cannot be placed under itself or one of its descendants ({})",
            id, parent
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_database;
    use crate::entity::org_unit;
    use sea_orm::{ActiveModelTrait, Set};

    async fn unit(db: &sea_orm::DatabaseConnection, name: &str, parent: Option<i32>) -> i32 {
        org_unit::ActiveModel {
            name: Set(name.to_string()),
            unit_type: Set(2),
            parent_id: Set(parent),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    fn names(units: &[org_unit::Model]) -> Vec<&str> {
        units.iter().map(|u| u.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_ancestors_and_descendants() {
        let db = memory_database().await;
        let dept = unit(&db, "Department", None).await;
        let div = unit(&db, "Parks Division", Some(dept)).await;
        let zeta = unit(&db, "Zeta Branch", Some(div)).await;
        let alpha = unit(&db, "Alpha Branch", Some(div)).await;
        let section = unit(&db, "Fire Section", Some(alpha)).await;

        let path = ancestors::<org_unit::Entity, _>(&db, section, true).await.unwrap();
        assert_eq!(names(&path), vec!["Department", "Parks Division", "Alpha Branch", "Fire Section"]);
        assert_eq!(path.iter().map(|u| u.level).collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        let path = ancestors::<org_unit::Entity, _>(&db, section, false).await.unwrap();
        assert_eq!(names(&path), vec!["Department", "Parks Division", "Alpha Branch"]);

        let below = descendants::<org_unit::Entity, _>(&db, div, false).await.unwrap();
        assert_eq!(names(&below), vec!["Alpha Branch", "Zeta Branch", "Fire Section"]);

        assert!(is_within::<org_unit::Entity, _>(&db, section, dept).await.unwrap());
        assert!(is_within::<org_unit::Entity, _>(&db, zeta, zeta).await.unwrap());
        assert!(!is_within::<org_unit::Entity, _>(&db, zeta, alpha).await.unwrap());

        let missing = ancestors::<org_unit::Entity, _>(&db, 999, true).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_reparent_rejects_cycles_and_cascades_levels() {
        let db = memory_database().await;
        let dept = unit(&db, "Department", None).await;
        let div = unit(&db, "Division", Some(dept)).await;
        let branch = unit(&db, "Branch", Some(div)).await;

        let err = check_parent::<org_unit::Entity, _>(&db, div, branch).await;
        assert!(err.is_err());

        let model = org_unit::Entity::find_by_id(dept).one(&db).await.unwrap().unwrap();
        let mut am: org_unit::ActiveModel = model.into();
        am.parent_id = Set(Some(branch));
        assert!(matches!(am.update(&db).await, Err(DbErr::Custom(_))));

        // Move the division under a new root: its subtree levels follow.
        let agency = unit(&db, "Agency", None).await;
        let top = unit(&db, "Top", Some(agency)).await;
        let model = org_unit::Entity::find_by_id(div).one(&db).await.unwrap().unwrap();
        let mut am: org_unit::ActiveModel = model.into();
        am.parent_id = Set(Some(top));
        let moved = am.update(&db).await.unwrap();
        assert_eq!(moved.level, 2);

        let branch = org_unit::Entity::find_by_id(branch).one(&db).await.unwrap().unwrap();
        assert_eq!(branch.level, 3);
    }

    #[tokio::test]
    async fn test_corrupt_parent_loop_is_reported() {
        use sea_orm::sea_query::Expr;

        let db = memory_database().await;
        let a = unit(&db, "Loop A", None).await;
        let b = unit(&db, "Loop B", Some(a)).await;
        // Write the loop directly so that the save hooks cannot refuse it
        org_unit::Entity::update_many()
            .col_expr(org_unit::Column::ParentId, Expr::value(b))
            .filter(org_unit::Column::Id.eq(a))
            .exec(&db)
            .await
            .unwrap();

        let err = ancestors::<org_unit::Entity, _>(&db, b, true).await;
        assert!(matches!(err, Err(DbErr::Custom(msg)) if msg.contains("cycle")));
        assert!(is_within::<org_unit::Entity, _>(&db, a, 999).await.is_err());
    }
}
