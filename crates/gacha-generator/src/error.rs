use assistant_driver::DriverError;
use gacha_core::GachaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("unknown generator type '{name}'; valid: {valid}")]
    UnknownGeneratorType { name: String, valid: String },

    #[error("{variant} generation failed")]
    GenerationFailed {
        variant: String,
        #[source]
        cause: DriverError,
    },

    #[error(transparent)]
    Core(#[from] GachaError),
}

impl GenerateError {
    /// The driver failure behind a `GenerationFailed`, if any.
    pub fn cause(&self) -> Option<&DriverError> {
        match self {
            GenerateError::GenerationFailed { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// The full error chain on one line, for reports and logs.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(e) = source {
            out.push_str(": ");
            out.push_str(&e.to_string());
            source = e.source();
        }
        out
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;
