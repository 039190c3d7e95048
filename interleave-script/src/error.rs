use thiserror::Error;

/// Failure to compile or run a snippet.
///
/// Messages follow the JavaScript convention of prefixing the error kind, so
/// they can be shown to a user unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq, Hash)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("ReferenceError: {0}")]
    Reference(String),
    #[error("TypeError: {0}")]
    Type(String),
    /// A value raised by `throw`, in its serialized form.
    #[error("Uncaught {0}")]
    Thrown(String),
    #[error("RangeError: {0}")]
    Range(String),
    #[error("RangeError: step limit of {0} exceeded")]
    StepLimit(u64),
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Hash)]
#[error("SyntaxError: {msg} (line {line})")]
pub struct SyntaxError {
    pub msg: String,
    pub line: u32,
}

impl SyntaxError {
    #[inline]
    pub fn new<S: Into<String>>(msg: S, line: u32) -> Self {
        SyntaxError {
            msg: msg.into(),
            line,
        }
    }
}

impl Error {
    #[inline]
    pub(crate) fn not_defined(name: &str) -> Self {
        Error::Reference(format!("{name} is not defined"))
    }

    #[inline]
    pub(crate) fn too_deep() -> Self {
        Error::Range("Maximum call stack size exceeded".to_owned())
    }
}
