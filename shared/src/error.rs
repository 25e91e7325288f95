use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoardError {
    #[error("unsupported media kind: {0}")]
    UnsupportedMediaKind(String),
    #[error("media payload is not a data URL")]
    InvalidDataUrl,
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid board config: {0}")]
    InvalidConfig(String),
}
