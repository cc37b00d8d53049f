//! zine-storage: content-addressed retrieval via an OpenDAL HTTP gateway

pub mod fetch;
pub mod health;
pub mod operator;

pub use fetch::ContentStore;
pub use health::check_health;
pub use operator::{build_from_config, build_operator};
