pub mod attendance;
pub mod envelope;
pub mod health;
