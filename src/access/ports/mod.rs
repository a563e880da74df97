//! Port contracts for access-control persistence.

mod repository;

pub use repository::{
    AccessRepositoryError, AccessRepositoryResult, AccessStore, AdminUserRepository,
    ClientRepository, ServerConfigRepository,
};
