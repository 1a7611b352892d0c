pub mod sha3;
pub mod blake3;

pub use self::blake3::BLAKE3Hash;
pub use self::sha3::Sha3Hash256;
