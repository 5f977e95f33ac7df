pub use entity_api::project::{
    assign_file, create, delete_for_session, find_by_id_for_session, find_by_session_id,
    find_files_for_session, NewProject, ProjectSummary,
};
