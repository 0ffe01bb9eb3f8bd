pub mod context;
pub mod copy;
pub mod group;
pub mod init;
pub mod stats;
