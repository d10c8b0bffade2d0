pub mod blocks;
pub mod jobs;
pub mod notion;
pub mod posts;
