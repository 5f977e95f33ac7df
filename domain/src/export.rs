//! Transcript export for download.

use crate::error::{EntityErrorKind, Error};
use crate::task_status::TaskStatus;
use crate::{files, transcription_tasks, Id};
use sea_orm::DatabaseConnection;

/// A downloadable plain-text transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainTextExport {
    pub file_name: String,
    pub content: String,
}

/// Exports a session's finished transcript as UTF-8 text.
pub async fn plain_text(
    db: &DatabaseConnection,
    task_id: Id,
    user_session_id: &str,
) -> Result<PlainTextExport, Error> {
    let (task, file) =
        entity_api::transcription_task::find_by_id_for_session(db, task_id, user_session_id)
            .await?;
    build_plain_text(&task, &file)
}

/// Only `done` tasks with a transcript can be exported.
pub fn build_plain_text(
    task: &transcription_tasks::Model,
    file: &files::Model,
) -> Result<PlainTextExport, Error> {
    match (&task.status, &task.transcript_text) {
        (TaskStatus::Done, Some(transcript)) => Ok(PlainTextExport {
            file_name: format!("{}.txt", sanitize_download_name(&file.original_name)),
            content: transcript.clone(),
        }),
        _ => Err(Error::entity(EntityErrorKind::NotReady)),
    }
}

/// Strips the extension and keeps only `[A-Za-z0-9_-]`, mapping everything else to `_`.
pub fn sanitize_download_name(original_name: &str) -> String {
    let base = match original_name.rfind('.') {
        Some(idx) if !original_name[idx..].contains('/') => &original_name[..idx],
        _ => original_name,
    };

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "transcript".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn file(name: &str) -> files::Model {
        files::Model {
            id: Id::new_v4(),
            original_name: name.to_string(),
            storage_path: "/data/uploads/x".to_string(),
            file_size: 1,
            mime_type: "audio/mpeg".to_string(),
            user_session_id: "s".to_string(),
            project_id: None,
            uploaded_at: Utc::now().into(),
        }
    }

    fn task(status: TaskStatus, transcript: Option<&str>) -> transcription_tasks::Model {
        transcription_tasks::Model {
            id: Id::new_v4(),
            file_id: Id::new_v4(),
            status,
            provider: None,
            language: None,
            transcript_text: transcript.map(str::to_string),
            speaker_data: None,
            error_message: None,
            processing_time_seconds: None,
            created_at: Utc::now().into(),
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn sanitize_replaces_spaces_and_symbols() {
        assert_eq!(sanitize_download_name("Team sync (v2).mp3"), "Team_sync__v2_");
        assert_eq!(sanitize_download_name("report-final_1.wav"), "report-final_1");
    }

    #[test]
    fn sanitize_maps_each_non_ascii_char_to_one_underscore() {
        assert_eq!(sanitize_download_name("Запись.ogg"), "______");
    }

    #[test]
    fn sanitize_falls_back_when_nothing_is_left() {
        assert_eq!(sanitize_download_name(".ogg"), "transcript");
        assert_eq!(sanitize_download_name(""), "transcript");
    }

    #[test]
    fn export_of_done_task_uses_sanitized_txt_name() {
        let export =
            build_plain_text(&task(TaskStatus::Done, Some("hello world")), &file("My Call.m4a"))
                .unwrap();

        assert_eq!(export.file_name, "My_Call.txt");
        assert_eq!(export.content, "hello world");
    }

    #[test]
    fn export_before_completion_is_not_ready() {
        for (status, transcript) in [
            (TaskStatus::Pending, None),
            (TaskStatus::InProgress, None),
            (TaskStatus::Error, None),
            (TaskStatus::Done, None),
        ] {
            let err = build_plain_text(&task(status, transcript), &file("a.mp3")).unwrap_err();
            assert_eq!(
                err.error_kind,
                crate::error::DomainErrorKind::Internal(crate::error::InternalErrorKind::Entity(
                    EntityErrorKind::NotReady
                ))
            );
        }
    }
}
