pub mod json;
pub mod vision_id;

pub use json::VisionJson;
pub use vision_id::VisionId;
