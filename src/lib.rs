pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod types;

pub use db::{NewVision, SchemaManager, Vision, VisionRepository, VisionUpdate};
pub use error::VisionError;
pub use router::{VisionsState, visions_router};
