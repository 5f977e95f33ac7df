use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Uploaded media, owned by an anonymous browser session
        let create_files_sql = r#"
            CREATE TABLE IF NOT EXISTS files (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                original_name VARCHAR(512) NOT NULL,
                storage_path TEXT NOT NULL,
                file_size BIGINT NOT NULL,
                mime_type VARCHAR(255) NOT NULL,
                user_session_id VARCHAR(255) NOT NULL,
                project_id UUID,
                uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_files_sql)
            .await?;

        // Status and provider are stored as plain strings so conditional updates
        // compare against literals without enum casts
        let create_tasks_sql = r#"
            CREATE TABLE IF NOT EXISTS transcription_tasks (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                file_id UUID NOT NULL
                    REFERENCES files(id) ON DELETE CASCADE,
                status VARCHAR(32) NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'in_progress', 'done', 'error')),
                provider VARCHAR(32),
                language VARCHAR(16),
                transcript_text TEXT,
                speaker_data TEXT,
                error_message TEXT,
                processing_time_seconds INTEGER,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                started_at TIMESTAMPTZ,
                completed_at TIMESTAMPTZ
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_tasks_sql)
            .await?;

        let create_segments_sql = r#"
            CREATE TABLE IF NOT EXISTS transcription_segments (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                task_id UUID NOT NULL
                    REFERENCES transcription_tasks(id) ON DELETE CASCADE,
                speaker_id VARCHAR(64),
                speaker_name VARCHAR(255),
                start_time_ms BIGINT NOT NULL,
                end_time_ms BIGINT NOT NULL,
                text TEXT NOT NULL,
                has_fillers BOOLEAN NOT NULL DEFAULT FALSE,
                is_corrected BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_segments_sql)
            .await?;

        // The worker polls pending tasks oldest first
        manager
            .create_index(
                Index::create()
                    .name("transcription_tasks_status_created_at")
                    .table(Alias::new("transcription_tasks"))
                    .col(Alias::new("status"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("transcription_tasks_file_id")
                    .table(Alias::new("transcription_tasks"))
                    .col(Alias::new("file_id"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("transcription_segments_task_id_start")
                    .table(Alias::new("transcription_segments"))
                    .col(Alias::new("task_id"))
                    .col(Alias::new("start_time_ms"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("files_user_session_id")
                    .table(Alias::new("files"))
                    .col(Alias::new("user_session_id"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order of creation to respect foreign keys
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS transcription_segments")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS transcription_tasks")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS files")
            .await?;

        Ok(())
    }
}
