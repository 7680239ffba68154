use sha1::{Digest, Sha1};

/// Lowercase hex SHA-1 of an artifact, as stored in [`Pack::sha1`](crate::Pack::sha1).
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}
