//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated with `Schema::create_table_from_entity` so the schema always
//! matches the entity definitions without hand-written SQL.

use crate::entities::{
    AccountabilityMapping, Application, ApplicationData, Center, CenterStatsData, Course,
    CourseData, GlobalReport, GlobalReportLink, ProgramLeader, Quarter, Setting, StatsReport,
    SubmissionData, TeamMember, TeamMemberData,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/center_stats.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(&get_database_url())
        .await
        .map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// Parent tables are created before the tables that reference them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Center).await?;
    create_table(db, &schema, Quarter).await?;
    create_table(db, &schema, StatsReport).await?;
    create_table(db, &schema, GlobalReport).await?;
    create_table(db, &schema, GlobalReportLink).await?;
    create_table(db, &schema, CenterStatsData).await?;
    create_table(db, &schema, TeamMember).await?;
    create_table(db, &schema, TeamMemberData).await?;
    create_table(db, &schema, Application).await?;
    create_table(db, &schema, ApplicationData).await?;
    create_table(db, &schema, Course).await?;
    create_table(db, &schema, CourseData).await?;
    create_table(db, &schema, ProgramLeader).await?;
    create_table(db, &schema, AccountabilityMapping).await?;
    create_table(db, &schema, SubmissionData).await?;
    create_table(db, &schema, Setting).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{StatsReportModel, SubmissionDataModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<StatsReportModel> = StatsReport::find().limit(1).all(&db).await?;
        let _: Vec<SubmissionDataModel> = SubmissionData::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
