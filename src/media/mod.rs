pub mod decoder;

pub use decoder::FileDecoder;
