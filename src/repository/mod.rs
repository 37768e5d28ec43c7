//! Database repository layer

pub mod account_repo;
pub mod memory;

pub use account_repo::{AccountRepository, PgAccountRepository};
pub use memory::InMemoryAccountRepository;
