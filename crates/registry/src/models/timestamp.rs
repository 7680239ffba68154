//! Serde adapter for the `uploaded` timestamp.
//!
//! Written as RFC 3339. Sidecars from the previous deployment separate date
//! and time with a space instead of `T`, so that is accepted on read.

use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub(crate) fn serialize<S: Serializer>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    let formatted = value.format(&Rfc3339).map_err(S::Error::custom)?;
    serializer.serialize_str(&formatted)
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(D::Error::custom)
}

fn parse(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(raw, &Rfc3339).or_else(|err| match raw.split_once(' ') {
        Some((date, time)) => OffsetDateTime::parse(&format!("{date}T{time}"), &Rfc3339),
        None => Err(err),
    })
}
