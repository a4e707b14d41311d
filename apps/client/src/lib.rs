pub mod animator;
pub mod api_client;
pub mod config;
pub mod errors;
pub mod models;
pub mod session;
pub mod shell;
pub mod storage;
pub mod view;

pub use api_client::{Backend, HttpBackend, ResumeFile};
pub use errors::ClientError;
pub use shell::{AppStatus, Screen, Shell};
