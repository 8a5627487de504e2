pub mod backend;
pub mod db;
pub mod file;

pub use backend::BackendClient;
pub use db::DbStorage;
pub use file::FileStorage;
