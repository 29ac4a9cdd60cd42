mod auth;
mod serde_api;
mod transport;

pub use auth::{AZURE_DEFAULT_API_VERSION, BackendAuth, OPENAI_BASE_URL};
pub use transport::OpenAiHttpTransport;
