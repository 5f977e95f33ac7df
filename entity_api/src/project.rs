//! Operations for projects table.

use super::error::Error;
use chrono::Utc;
use entity::projects::{ActiveModel, Column, Entity, Model};
use entity::{files, transcription_tasks, Id};
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Set, ConnectionTrait, QueryOrder};
use std::collections::HashMap;

const ACTIVE: &str = "active";

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub user_session_id: String,
}

/// A project with the number of files grouped under it
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub project: Model,
    pub file_count: u64,
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewProject) -> Result<Model, Error> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(Error::validation());
    }

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        name: Set(name.to_string()),
        description: Set(input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())),
        status: Set(ACTIVE.to_string()),
        user_session_id: Set(input.user_session_id),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    };

    Ok(active_model.insert(db).await?)
}

/// Finds a project only if the session owns it
pub async fn find_by_id_for_session<C: ConnectionTrait>(
    db: &C,
    id: Id,
    user_session_id: &str,
) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .filter(Column::UserSessionId.eq(user_session_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            debug!("Project {id} not found for session");
            Error::not_found()
        })
}

/// Lists a session's projects newest first, each with its file count
pub async fn find_by_session_id<C: ConnectionTrait>(
    db: &C,
    user_session_id: &str,
) -> Result<Vec<ProjectSummary>, Error> {
    let projects = Entity::find()
        .filter(Column::UserSessionId.eq(user_session_id))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?;

    if projects.is_empty() {
        return Ok(Vec::new());
    }

    let counts = file_counts(db, projects.iter().map(|p| p.id).collect()).await?;

    Ok(projects
        .into_iter()
        .map(|project| ProjectSummary {
            file_count: counts.get(&project.id).copied().unwrap_or(0),
            project,
        })
        .collect())
}

async fn file_counts<C: ConnectionTrait>(
    db: &C,
    project_ids: Vec<Id>,
) -> Result<HashMap<Id, u64>, Error> {
    let grouped = files::Entity::find()
        .filter(files::Column::ProjectId.is_in(project_ids))
        .all(db)
        .await?;

    let mut counts = HashMap::new();
    for project_id in grouped.iter().filter_map(|file| file.project_id) {
        *counts.entry(project_id).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Lists the files of a session's project newest first, each with its task if one exists
pub async fn find_files_for_session<C: ConnectionTrait>(
    db: &C,
    project_id: Id,
    user_session_id: &str,
) -> Result<Vec<(files::Model, Option<transcription_tasks::Model>)>, Error> {
    find_by_id_for_session(db, project_id, user_session_id).await?;

    let project_files = files::Entity::find()
        .filter(files::Column::ProjectId.eq(project_id))
        .order_by_desc(files::Column::UploadedAt)
        .all(db)
        .await?;

    if project_files.is_empty() {
        return Ok(Vec::new());
    }

    let mut tasks: HashMap<Id, transcription_tasks::Model> = transcription_tasks::Entity::find()
        .filter(
            transcription_tasks::Column::FileId
                .is_in(project_files.iter().map(|f| f.id).collect::<Vec<_>>()),
        )
        .all(db)
        .await?
        .into_iter()
        .map(|task| (task.file_id, task))
        .collect();

    Ok(project_files
        .into_iter()
        .map(|file| {
            let task = tasks.remove(&file.id);
            (file, task)
        })
        .collect())
}

/// Moves a session's file into one of its projects, or out of any project with `None`
pub async fn assign_file<C: ConnectionTrait>(
    db: &C,
    file_id: Id,
    project_id: Option<Id>,
    user_session_id: &str,
) -> Result<files::Model, Error> {
    if let Some(project_id) = project_id {
        find_by_id_for_session(db, project_id, user_session_id).await?;
    }

    let file = files::Entity::find_by_id(file_id)
        .filter(files::Column::UserSessionId.eq(user_session_id))
        .one(db)
        .await?
        .ok_or_else(Error::not_found)?;

    let mut active_model: files::ActiveModel = file.into();
    active_model.project_id = Set(project_id);

    Ok(active_model.update(db).await?)
}

/// Deletes a session's project. Its files stay, ungrouped.
pub async fn delete_for_session<C: ConnectionTrait>(
    db: &C,
    id: Id,
    user_session_id: &str,
) -> Result<(), Error> {
    let result = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserSessionId.eq(user_session_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        debug!("Project {id} not found for session");
        return Err(Error::not_found());
    }
    Ok(())
}
