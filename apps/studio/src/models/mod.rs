pub mod record;
pub mod resume;
pub mod user;

pub use record::{NewResume, ResumePatch, StoredResume, UploadedImage};
pub use resume::{Document, EditError, Entry, FieldValue, Level, Section};
pub use user::{AuthGrant, LoginRequest, RegisterRequest, StoredCredential, UserProfile};
