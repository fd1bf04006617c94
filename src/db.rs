use sea_orm::sea_query::{Index, TableCreateStatement};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, EntityName,
    EntityTrait, Schema, Statement,
};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::{
    computer, cost_centre, department_user, department_user_cost_centre, department_user_location,
    department_user_org_unit, ec2_instance, freshdesk_contact, freshdesk_conversation,
    freshdesk_ticket, it_system, location, mobile, org_unit, secondary_location,
};

/// Initialize database connection and auto-migrate tables
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let database_url = config.connection_url();

    info!("Connecting to database: {}:{}/{}", config.host, config.port, config.name);

    let mut opt = ConnectOptions::new(&database_url);
    opt.max_connections(config.max_connections)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug)
        .set_schema_search_path("public");

    let db = Database::connect(opt).await?;
    info!("Database connection established");

    auto_migrate(&db).await?;

    Ok(db)
}

/// Create every table that does not exist yet
pub async fn auto_migrate<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Running auto-migration for all entities...");

    // 1. Organisation
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(location::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(secondary_location::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(org_unit::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(cost_centre::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(department_user::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(department_user_cost_centre::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(department_user_org_unit::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(department_user_location::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(it_system::Entity)).await?;
    create_pair_index(
        db,
        backend,
        department_user_cost_centre::Entity,
        department_user_cost_centre::Column::DepartmentUserId,
        department_user_cost_centre::Column::CostCentreId,
    )
    .await?;
    create_pair_index(
        db,
        backend,
        department_user_org_unit::Entity,
        department_user_org_unit::Column::DepartmentUserId,
        department_user_org_unit::Column::OrgUnitId,
    )
    .await?;
    create_pair_index(
        db,
        backend,
        department_user_location::Entity,
        department_user_location::Column::DepartmentUserId,
        department_user_location::Column::LocationId,
    )
    .await?;

    // 2. Devices
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(computer::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(mobile::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(ec2_instance::Entity)).await?;

    // 3. Helpdesk cache
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(freshdesk_contact::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(freshdesk_ticket::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(freshdesk_conversation::Entity)).await?;

    info!("Auto-migration completed successfully");
    Ok(())
}

/// Create a table if it doesn't exist
async fn create_table_if_not_exists<C>(
    db: &C,
    backend: DbBackend,
    mut stmt: TableCreateStatement,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    stmt.if_not_exists();

    let sql = backend.build(&stmt);

    db.execute(Statement::from_string(backend, sql.to_string())).await?;

    Ok(())
}

/// Unique index over a link table's two id columns
async fn create_pair_index<C, E>(
    db: &C,
    backend: DbBackend,
    entity: E,
    left: E::Column,
    right: E::Column,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait + 'static,
{
    let stmt = Index::create()
        .name(format!("idx_{}_pair", entity.table_name()))
        .table(entity)
        .col(left)
        .col(right)
        .unique()
        .if_not_exists()
        .to_owned();

    let sql = backend.build(&stmt);
    db.execute(Statement::from_string(backend, sql.to_string())).await?;
    Ok(())
}

/// Fresh in-memory SQLite database with the full schema
#[cfg(test)]
pub(crate) async fn memory_database() -> DatabaseConnection {
    // One connection: every pooled connection would otherwise get its own database.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect sqlite");
    auto_migrate(&db).await.expect("migrate");
    db
}
