pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed syntax tree: {message}")]
    MalformedSyntaxTree { message: String },
}
