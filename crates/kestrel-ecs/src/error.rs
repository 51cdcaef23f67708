use thiserror::Error;

/// Errors raised while setting up or feeding an [`EntityWorld`](crate::EntityWorld).
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("no entity template registered as '{0}'")]
    UnknownTemplate(String),
}
