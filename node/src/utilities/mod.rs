pub mod crypto;
pub mod encoding;
pub mod hash;
pub mod time;
