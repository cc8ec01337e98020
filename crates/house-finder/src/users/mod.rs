//! Accounts and credential checks.

pub mod domain;
pub mod password;
pub mod repository;
pub mod router;
pub mod service;
pub mod sqlite;

pub use domain::{Credentials, NewUser, Registration, StoredUser, User, UserId, UserValidationError};
pub use repository::UserRepository;
pub use router::{user_router, UserRoutes};
pub use service::{UserService, UserServiceError};
pub use sqlite::SqliteUserRepository;
