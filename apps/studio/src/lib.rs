//! Folio studio: the resume editing core.
//!
//! `models` holds the document schema, `editor` the completion estimator and
//! form wizard, `render` the template renderer. With the `export` feature the
//! crate also produces thumbnails and PDFs, and with `http` it talks to the
//! resume store over HTTP.

pub mod config;
pub mod editor;
#[cfg(feature = "export")]
pub mod export;
pub mod gateway;
pub mod models;
pub mod render;
pub mod session;

pub use config::StudioConfig;
pub use editor::completion::estimate;
pub use editor::ResumeEditor;
pub use models::resume::Document;
pub use session::{Session, SessionStatus};
