//! Registration of an uploaded media file and its transcription task.

use crate::error::Error;
use crate::{files, transcription_tasks};
use entity_api::file::NewFile;
use log::*;
use sea_orm::{DatabaseConnection, TransactionTrait};

/// Inserts the file and its `pending` task together so the worker never sees one without
/// the other. A requested project must belong to the uploading session.
pub async fn register(
    db: &DatabaseConnection,
    new_file: NewFile,
    language: Option<String>,
) -> Result<(files::Model, transcription_tasks::Model), Error> {
    let txn = db.begin().await.map_err(Error::db_transaction)?;

    if let Some(project_id) = new_file.project_id {
        entity_api::project::find_by_id_for_session(&txn, project_id, &new_file.user_session_id)
            .await?;
    }
    let file = entity_api::file::create(&txn, new_file).await?;
    let task = entity_api::transcription_task::create(&txn, file.id, language).await?;

    txn.commit().await.map_err(Error::db_transaction)?;

    info!(
        "Registered upload {} as file {} with task {}",
        file.original_name, file.id, task.id
    );
    Ok((file, task))
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use crate::task_status::TaskStatus;
    use crate::{projects, Id};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn register_creates_a_pending_task_for_the_file() -> Result<(), Error> {
        let file = files::Model {
            id: Id::new_v4(),
            original_name: "meeting.mp4".to_string(),
            storage_path: "/data/uploads/meeting.mp4".to_string(),
            file_size: 10_000,
            mime_type: "video/mp4".to_string(),
            user_session_id: "session".to_string(),
            project_id: None,
            uploaded_at: chrono::Utc::now().into(),
        };
        let task = transcription_tasks::Model {
            id: Id::new_v4(),
            file_id: file.id,
            status: TaskStatus::Pending,
            provider: None,
            language: None,
            transcript_text: None,
            speaker_data: None,
            error_message: None,
            processing_time_seconds: None,
            created_at: chrono::Utc::now().into(),
            started_at: None,
            completed_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![file.clone()]])
            .append_query_results(vec![vec![task.clone()]])
            .into_connection();

        let (created_file, created_task) = register(
            &db,
            NewFile {
                original_name: file.original_name.clone(),
                storage_path: file.storage_path.clone(),
                file_size: file.file_size,
                mime_type: file.mime_type.clone(),
                user_session_id: "session".to_string(),
                project_id: None,
            },
            None,
        )
        .await?;

        assert_eq!(created_task.file_id, created_file.id);
        assert_eq!(created_task.status, TaskStatus::Pending);
        Ok(())
    }

    #[tokio::test]
    async fn register_into_another_sessions_project_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<projects::Model>::new()])
            .into_connection();

        let err = register(
            &db,
            NewFile {
                original_name: "meeting.mp4".to_string(),
                storage_path: "/data/uploads/meeting.mp4".to_string(),
                file_size: 10_000,
                mime_type: "video/mp4".to_string(),
                user_session_id: "intruder".to_string(),
                project_id: Some(Id::new_v4()),
            },
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
        );
    }
}
