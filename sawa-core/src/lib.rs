pub mod events;
pub mod identity;
pub mod store;

pub use events::{EventPublisher, NoopPublisher};
pub use identity::{Role, RoleType, User, Viewer};
pub use store::{Collection, Document, DocumentStore, Filter, Op, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Event publishing failed: {0}")]
    PublishError(String),
}
