//! CRUD operations for files table.

use super::error::Error;
use entity::files::{ActiveModel, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Set, ConnectionTrait};

/// Input for registering an uploaded file
#[derive(Debug, Clone)]
pub struct NewFile {
    pub original_name: String,
    pub storage_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub user_session_id: String,
    pub project_id: Option<Id>,
}

/// Creates a new file record
pub async fn create<C: ConnectionTrait>(db: &C, input: NewFile) -> Result<Model, Error> {
    debug!(
        "Creating file record for upload {} ({} bytes)",
        input.original_name, input.file_size
    );

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        original_name: Set(input.original_name),
        storage_path: Set(input.storage_path),
        file_size: Set(input.file_size),
        mime_type: Set(input.mime_type),
        user_session_id: Set(input.user_session_id),
        project_id: Set(input.project_id),
        uploaded_at: Set(chrono::Utc::now().into()),
    };

    Ok(active_model.insert(db).await?)
}

/// Finds a file by ID
pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Finds every file owned by a session
pub async fn find_by_session_id<C: ConnectionTrait>(
    db: &C,
    user_session_id: &str,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(entity::files::Column::UserSessionId.eq(user_session_id))
        .all(db)
        .await?)
}

/// Deletes a file owned by the given session. Tasks and segments go with it.
pub async fn delete_for_session<C: ConnectionTrait>(
    db: &C,
    id: Id,
    user_session_id: &str,
) -> Result<(), Error> {
    let result = Entity::delete_many()
        .filter(entity::files::Column::Id.eq(id))
        .filter(entity::files::Column::UserSessionId.eq(user_session_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        debug!("File {id} not found for session");
        return Err(Error::not_found());
    }
    Ok(())
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn file_model(session: &str) -> Model {
        Model {
            id: Id::new_v4(),
            original_name: "interview.mp3".to_string(),
            storage_path: "/data/uploads/abc.mp3".to_string(),
            file_size: 1024,
            mime_type: "audio/mpeg".to_string(),
            user_session_id: session.to_string(),
            project_id: None,
            uploaded_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn create_returns_the_inserted_file() -> Result<(), Error> {
        let expected = file_model("session-1");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![expected.clone()]])
            .into_connection();

        let created = create(
            &db,
            NewFile {
                original_name: expected.original_name.clone(),
                storage_path: expected.storage_path.clone(),
                file_size: expected.file_size,
                mime_type: expected.mime_type.clone(),
                user_session_id: "session-1".to_string(),
                project_id: None,
            },
        )
        .await?;

        assert_eq!(created.original_name, "interview.mp3");
        assert_eq!(created.user_session_id, "session-1");
        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_returns_not_found_for_missing_file() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<Model>::new()])
            .into_connection();

        let err = find_by_id(&db, Id::new_v4()).await.unwrap_err();
        assert_eq!(err.error_kind, EntityApiErrorKind::RecordNotFound);
    }

    #[tokio::test]
    async fn delete_for_session_rejects_files_of_other_sessions() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = delete_for_session(&db, Id::new_v4(), "someone-else")
            .await
            .unwrap_err();
        assert_eq!(err.error_kind, EntityApiErrorKind::RecordNotFound);
    }
}
