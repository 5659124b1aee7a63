pub mod ai;
pub mod config;
pub mod drafts;
pub mod license;
pub mod post;
pub mod preview;
pub mod reader;
pub mod transcribe;
pub mod vault;
