//! Errors shared by the assembler and the VM translator.
//!
//! Every error aborts the current run. None of them are recovered from.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to access `{}`: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("syntax error on line {line}: `{text}`")]
    Parse { line: usize, text: String },

    #[error("invalid {kind} mnemonic `{mnemonic}`")]
    InvalidMnemonic { kind: &'static str, mnemonic: String },

    #[error("address {address} on line {line} does not fit in 15 bits")]
    AddressOverflow { line: usize, address: String },

    #[error("undefined symbol `{0}`")]
    UndefinedSymbol(String),

    #[error("unknown segment `{segment}` on line {line}")]
    UnknownSegment { line: usize, segment: String },

    #[error("unknown command `{command}` on line {line}")]
    UnknownCommand { line: usize, command: String },

    #[error("`{name}` on line {line} is reserved and cannot name a function")]
    ReservedName { line: usize, name: String },

    #[error("`{0}` is not a valid unit name")]
    UnitName(String),

    #[error("index {index} is out of range for segment `{segment}` on line {line}")]
    SegmentIndex {
        line: usize,
        segment: String,
        index: u16,
    },
}

impl Error {
    pub fn parse(line: usize, text: &str) -> Self {
        Error::Parse {
            line,
            text: text.to_owned(),
        }
    }

    /// Wraps an I/O failure on `path`.
    pub fn file_access<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Error::FileAccess {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::parse(3, "D=X").to_string(),
            "syntax error on line 3: `D=X`"
        );
        assert_eq!(
            Error::UndefinedSymbol("LOOP".to_owned()).to_string(),
            "undefined symbol `LOOP`"
        );
        let err = Error::file_access(
            "missing.asm",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(err.to_string(), "unable to access `missing.asm`: not found");
        assert_eq!(
            Error::UnitName("my-prog".to_owned()).to_string(),
            "`my-prog` is not a valid unit name"
        );
    }
}
