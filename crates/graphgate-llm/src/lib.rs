//! Text-generation client abstraction for graphgate.
//!
//! The gateway talks to a language model twice per grounded request: once to
//! turn a question into Cypher and once to phrase an answer from graph data.
//! Both go through the [`LlmBackend`] trait.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  LlmBackend trait                       │
//! │  - complete() -> CompletionResponse     │
//! └─────────────────────────────────────────┘
//!            │                 │
//!            ▼                 ▼
//!     ┌─────────────┐   ┌─────────────┐
//!     │ OpenAiBackend│   │ MockBackend │ (feature = "testing")
//!     └─────────────┘   └─────────────┘
//! ```

pub mod backend;
pub mod error;
pub mod openai;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub use backend::MockBackend;
pub use backend::{LlmBackend, SharedBackend};
pub use error::{LlmError, Result};
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};
