pub mod codec;
pub mod directory;
pub mod file_lock;
