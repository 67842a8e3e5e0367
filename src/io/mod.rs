pub mod backup;
pub mod config_io;
pub mod file_db;
pub mod lock;
pub mod outline_io;
