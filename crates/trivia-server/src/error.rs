use std::io;
use std::path::PathBuf;

use crate::config::ConfigError;
use crate::question::QuestionError;

/// Exit code base for question file errors; the failing question's index is added.
const FILE_ERROR_BASE: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid File")]
    Questions {
        path: PathBuf,
        #[source]
        source: QuestionError,
    },
    #[error("Bad Listen")]
    Listen {
        port: u16,
        #[source]
        source: io::Error,
    },
}

impl ServerError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ServerError::Config(e) => e.exit_code(),
            ServerError::Questions { source, .. } => {
                (FILE_ERROR_BASE + source.index()).min(u8::MAX as usize) as u8
            }
            ServerError::Listen { .. } => 6,
        }
    }
}
