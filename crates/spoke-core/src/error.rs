use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpokeError {
    #[error("TELEGRAM_BOT_TOKEN is not set\nexample: export TELEGRAM_BOT_TOKEN='your-bot-token-here'")]
    MissingToken,

    #[error("column mismatch in {path}: expected [{expected}], found [{found}]")]
    ColumnMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SpokeError>;
