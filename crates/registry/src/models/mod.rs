mod changes;
mod pack;
mod range;
mod timestamp;

pub use self::changes::PackChanges;
pub use self::pack::Pack;
pub use self::range::VersionRange;

pub(crate) fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
