use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,

    #[error("syntax error at offset {offset}: unexpected '{found}'")]
    Syntax { offset: usize, found: String },

    #[error("unknown name '{0}'")]
    UnknownName(String),

    #[error("line {line}: {message}")]
    Document { line: usize, message: String },
}

impl ParseError {
    /// Attach a document line to an expression error.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            ParseError::Document { .. } => self,
            other => ParseError::Document {
                line,
                message: other.to_string(),
            },
        }
    }
}
