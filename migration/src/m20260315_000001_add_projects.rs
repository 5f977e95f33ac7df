use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let create_projects_sql = r#"
            CREATE TABLE IF NOT EXISTS projects (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                name VARCHAR(255) NOT NULL,
                description TEXT,
                status VARCHAR(32) NOT NULL DEFAULT 'active',
                user_session_id VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_projects_sql)
            .await?;

        // Deleting a project keeps its files, ungrouped
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE files
                    ADD CONSTRAINT files_project_id_fkey
                    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE SET NULL",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("projects_user_session_id_created_at")
                    .table(Alias::new("projects"))
                    .col(Alias::new("user_session_id"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("files_project_id")
                    .table(Alias::new("files"))
                    .col(Alias::new("project_id"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS files_project_id")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("ALTER TABLE files DROP CONSTRAINT IF EXISTS files_project_id_fkey")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS projects")
            .await?;

        Ok(())
    }
}
