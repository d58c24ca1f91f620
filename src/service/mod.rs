pub mod user_ops;
pub mod validation;
