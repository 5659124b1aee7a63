pub mod annotate;
pub mod archive;
pub mod comments;
pub mod doctor;
pub mod draft;
pub mod init;
pub mod license;
pub mod preview;
pub mod transcribe;
