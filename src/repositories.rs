pub mod notion;
pub mod posts;
pub mod redis;
