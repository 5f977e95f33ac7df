pub use entity_api::transcription_task::{
    create, find_by_id, find_by_id_for_session, find_history_for_session, PendingTask,
    TaskSuccess,
};
