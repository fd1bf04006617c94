//! Organisation structure: the org unit hierarchy and the data derived from it

pub mod snapshot;
pub mod tree;

use sea_orm::{ConnectionTrait, DbErr, EntityTrait};
use std::collections::HashMap;

use crate::entity::{cost_centre, org_unit};

/// Org unit a record should carry given its cost centre.
///
/// A cost centre pinned to an org unit fills in a missing unit, and replaces a
/// unit that sits outside the cost centre's part of the tree.
pub async fn reconcile_org_unit<C>(
    db: &C,
    cost_centre_id: Option<i32>,
    org_unit_id: Option<i32>,
) -> Result<Option<i32>, DbErr>
where
    C: ConnectionTrait,
{
    let Some(cc_id) = cost_centre_id else {
        return Ok(org_unit_id);
    };
    let Some(cc) = cost_centre::Entity::find_by_id(cc_id).one(db).await? else {
        return Ok(org_unit_id);
    };
    let Some(position) = cc.org_position_id else {
        return Ok(org_unit_id);
    };

    match org_unit_id {
        None => Ok(Some(position)),
        Some(unit) if tree::is_within::<org_unit::Entity, _>(db, unit, position).await? => {
            Ok(Some(unit))
        }
        Some(_) => Ok(Some(position)),
    }
}

/// All org units assembled into name-ordered trees.
pub async fn unit_forest<C>(db: &C) -> Result<Vec<org_unit::OrgUnitTree>, DbErr>
where
    C: ConnectionTrait,
{
    use sea_orm::QueryOrder;

    let units = org_unit::Entity::find()
        .order_by_asc(org_unit::Column::Name)
        .all(db)
        .await?;

    let mut by_parent: HashMap<Option<i32>, Vec<org_unit::Model>> = HashMap::new();
    for unit in units {
        by_parent.entry(unit.parent_id).or_default().push(unit);
    }

    fn attach(
        parent: Option<i32>,
        by_parent: &mut HashMap<Option<i32>, Vec<org_unit::Model>>,
    ) -> Vec<org_unit::OrgUnitTree> {
        let Some(units) = by_parent.remove(&parent) else {
            return Vec::new();
        };
        units
            .into_iter()
            .map(|unit| {
                let id = unit.id;
                let mut node = org_unit::OrgUnitTree::from(unit);
                node.children = attach(Some(id), by_parent);
                node
            })
            .collect()
    }

    Ok(attach(None, &mut by_parent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_database;
    use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

    async fn unit(db: &DatabaseConnection, name: &str, unit_type: i32, parent: Option<i32>) -> i32 {
        org_unit::ActiveModel {
            name: Set(name.to_string()),
            unit_type: Set(unit_type),
            parent_id: Set(parent),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn cost_centre(db: &DatabaseConnection, code: &str, position: Option<i32>) -> cost_centre::Model {
        cost_centre::ActiveModel {
            code: Set(code.to_string()),
            org_position_id: Set(position),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_reconcile_org_unit() {
        let db = memory_database().await;
        let dept = unit(&db, "Department", 0, None).await;
        let div = unit(&db, "Regional Division", 1, Some(dept)).await;
        let region = unit(&db, "Pilbara Region", 3, Some(div)).await;
        let other = unit(&db, "Corporate Division", 1, Some(dept)).await;

        let cc = cost_centre(&db, "101", Some(div)).await;
        let bare = cost_centre(&db, "999", None).await;

        // No cost centre, or one without a position: unit untouched
        assert_eq!(reconcile_org_unit(&db, None, Some(other)).await.unwrap(), Some(other));
        assert_eq!(reconcile_org_unit(&db, Some(bare.id), None).await.unwrap(), None);

        // Missing unit filled in, unit inside the subtree kept, outside replaced
        assert_eq!(reconcile_org_unit(&db, Some(cc.id), None).await.unwrap(), Some(div));
        assert_eq!(reconcile_org_unit(&db, Some(cc.id), Some(region)).await.unwrap(), Some(region));
        assert_eq!(reconcile_org_unit(&db, Some(cc.id), Some(other)).await.unwrap(), Some(div));
    }

    #[tokio::test]
    async fn test_cost_centre_derives_name_and_division() {
        let db = memory_database().await;
        let dept = unit(&db, "Department", 0, None).await;
        let div = unit(&db, "Regional Division", 1, Some(dept)).await;
        let region = unit(&db, "Pilbara Region", 3, Some(div)).await;

        let cc = cost_centre(&db, "451", Some(region)).await;
        assert_eq!(cc.name, "451");
        assert_eq!(cc.division_id, Some(div));
        assert!(cc.active);

        let top = cost_centre(&db, "001", Some(dept)).await;
        assert_eq!(top.division_id, None);
    }

    #[tokio::test]
    async fn test_unit_forest() {
        let db = memory_database().await;
        let dept = unit(&db, "Department", 0, None).await;
        unit(&db, "Zoo Division", 1, Some(dept)).await;
        let parks = unit(&db, "Parks Division", 1, Some(dept)).await;
        unit(&db, "Fire Branch", 2, Some(parks)).await;
        unit(&db, "Agency", 0, None).await;

        let forest = unit_forest(&db).await.unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "Agency");
        let department = &forest[1];
        assert_eq!(department.unit_type, "Department (Tier one)");
        let names: Vec<_> = department.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Parks Division", "Zoo Division"]);
        assert_eq!(department.children[0].children[0].name, "Fire Branch");
    }
}
