pub mod archive;
pub mod backup_config;
pub mod result_error;
pub mod validate;
pub mod zip;
