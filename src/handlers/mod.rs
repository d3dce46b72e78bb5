pub mod health;
pub mod visions;
