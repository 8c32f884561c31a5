mod checksum;

pub use checksum::{
    is_sha256_hex, sha256_file, sha256_hex, sha256_matches, HashingWriter,
};
