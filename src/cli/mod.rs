pub mod config;
pub mod envelope;
pub mod init;
pub mod play;
