pub use entity_api::file::{delete_for_session, find_by_id, find_by_session_id, NewFile};
