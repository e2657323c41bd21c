mod editor_state;
pub mod persistence;

pub use editor_state::EditorState;
pub use persistence::{
    PersistenceError,
    PersistenceResult,
    ProjectSnapshot,
    StatePersistence,
    load_document,
    save_document,
};
