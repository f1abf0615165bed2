// Public endpoints: reachable without a credential
pub mod health;
pub mod root;

pub use health::health;
pub use root::root;
