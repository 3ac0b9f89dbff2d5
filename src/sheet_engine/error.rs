use thiserror::Error;

/// Everything that can abort the generation of an exercise.
///
/// Configuration errors come from authoring mistakes in the sheet
/// description and are never retried. `Infeasible` is raised when a pool
/// still has no matching row after its reset. Storage errors come from the
/// persistent pool backing.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("malformed question spec `{line}`: {reason}")]
    MalformedSpec { line: String, reason: String },

    #[error("unknown subkind `{0}`")]
    UnknownSubkind(String),

    #[error("unknown number source `{0}`")]
    UnknownSource(String),

    #[error("no `{source_tag}` entry for `{key}`")]
    MissingUnpackEntry { source_tag: String, key: String },

    #[error("question `{question}` cannot be paired with number source `{source_tag}`")]
    IncompatiblePair { question: String, source_tag: String },

    #[error("unknown question `{0}` in mix section")]
    UnknownMixQuestion(String),

    #[error("mix section has {sources} number sources for {questions} questions")]
    MixTooFewSources { questions: usize, sources: usize },

    #[error("choice block asks for {requested} questions but only {available} are available")]
    BlockTooSmall { requested: usize, available: usize },

    #[error("cannot merge {0}")]
    Merge(String),

    #[error("unknown pool field `{field}` for pool `{pool}`")]
    UnknownField { pool: String, field: String },

    #[error("pool `{pool}` has no row matching {constraint} even after reset")]
    Infeasible { pool: String, constraint: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl SheetError {
    /// True for authoring mistakes in the sheet description or the engine
    /// configuration. These are never worth retrying.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SheetError::MalformedSpec { .. }
                | SheetError::UnknownSubkind(_)
                | SheetError::UnknownSource(_)
                | SheetError::MissingUnpackEntry { .. }
                | SheetError::IncompatiblePair { .. }
                | SheetError::UnknownMixQuestion(_)
                | SheetError::MixTooFewSources { .. }
                | SheetError::BlockTooSmall { .. }
                | SheetError::Merge(_)
                | SheetError::UnknownField { .. }
                | SheetError::Config(_)
                | SheetError::ConfigParse(_)
        )
    }

    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        SheetError::MalformedSpec { line: line.trim().to_string(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
