pub mod app_config;
pub mod database;
pub mod appointment_repo;
pub mod order_repo;
pub mod booking_repo;
pub mod change_request_repo;
pub mod memory;

pub use database::DbClient;
pub use memory::MemoryStore;
