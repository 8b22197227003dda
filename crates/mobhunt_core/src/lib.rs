pub mod init;
pub mod trace;
