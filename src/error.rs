use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),
    #[error("Unrenderable ground program: {0}")]
    Unrenderable(String),
    #[error("Parse error at offset {offset}: {message}")]
    Parse { message: String, offset: usize },
    #[error("Engine error: {0}")]
    Engine(String),
    /// An engine error raised while adding a parsed statement.
    #[error("{source}\n  in statement: {statement}")]
    Statement { statement: String, source: Box<Error> },
}

pub type Result<T> = std::result::Result<T, Error>;
