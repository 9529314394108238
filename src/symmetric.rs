pub mod errors;
pub mod systems;
pub mod traits;

pub use errors::BlockCipherError;
pub use systems::{Aes256Cbc, CbcSystem, SerpentCbc, TwofishCbc};
pub use traits::BlockCipherSystem;
