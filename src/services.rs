pub mod blocks;
pub mod document;
pub mod rich_text;
pub mod sync;
pub mod tags;
