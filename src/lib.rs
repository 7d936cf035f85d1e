pub mod analytics;
pub mod auth;
pub mod constants;
pub mod llm;
pub mod log_store;
pub mod session;
pub mod web_server;

pub use analytics::{Granularity, LengthBin, TimeBucket, WordCount};
pub use auth::{Authenticator, Credentials, StaticAuthenticator};
pub use llm::GeminiClient;
pub use log_store::{LogRecord, LogStore, StoreError};
pub use session::{ChatMessage, Role, SessionContext};
pub use web_server::{build_router, start_web_server, AppState};
