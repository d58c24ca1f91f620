pub mod config;
pub mod db;
pub mod error;
pub mod service;
pub mod types;

pub use config::Config;
pub use db::{Address, NewAddress, NewUser, Role, User, UserStore};
pub use error::{ConstraintKind, ErrorBody, Outcome, UserError};
pub use service::user_ops::UserOps;
pub use service::validation::{Violation, ViolationList, parse_create_user, validate_create_user};
pub use types::user::{CreateAddress, CreateUser};
