//! Binary Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("could not open the registry")]
    Storage,
    #[display("registry operation failed")]
    Registry,
    #[display("no changes given; pass at least one field to update")]
    NothingToUpdate,
    #[display("no pack with slug {_0}")]
    NotFound(#[error(not(source))] String),
    /// Reading or writing a file named on the command line failed.
    #[display("could not access {}", _0.display())]
    File(#[error(not(source))] PathBuf),
}
