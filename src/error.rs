/// Errors that abort the conversion of a single chunk.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    #[error("Nibble layer must be 2048 bytes, got {0}")]
    NibbleLength(usize),
    #[error("Blocks array must be 4096 bytes, got {0}")]
    BlocksLength(usize),
    #[error("Field {0} has an unexpected tag type")]
    FieldType(&'static str),
    #[error("Section Y {0} is outside 0..16")]
    SectionOutOfRange(i32),
    #[error("Section {0} was written before it was upgraded")]
    SectionNotUpgraded(i32),
    #[error("Chunk has no Level compound")]
    MissingLevel,
    #[error("Invalid block state: {0:?}")]
    InvalidBlockState(String),
    #[error("Invalid legacy code: {0:?}")]
    InvalidLegacyCode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, UpgradeError>;
