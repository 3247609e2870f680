//! # Gomodoro Client Library
//!
//! Client-side core for the Gomodoro desktop app. The timer itself lives in
//! an external GraphQL server (the `gomodoro` binary); this crate only
//! talks to it and never advances timer state locally.
//!
//! ## Architecture
//!
//! - **Transport**: HTTP POST for queries/mutations, one shared
//!   `graphql-transport-ws` socket for subscriptions, plus a bounded
//!   health-check/backoff used at startup
//! - **Service**: typed facade mapping each remote operation into local
//!   value types
//! - **Backend**: supervisor for the fallback server process spawned when
//!   the configured endpoint is unreachable
//!
//! ## Key Components
//!
//! - [`GraphqlClient`]: transport client
//! - [`PomodoroService`]: domain service
//! - [`BackendProcess`]: fallback backend supervisor
//! - [`ClientConfig`]: environment-driven configuration

pub mod backend;
pub mod config;
pub mod error;
pub mod graphql;
pub mod service;
pub mod transport;
pub mod types;

pub use backend::{BackendProcess, BackendStatus};
pub use config::{ClientConfig, RunMode};
pub use error::{BackendError, ServiceError, TransportError};
pub use service::PomodoroService;
pub use transport::{GraphqlClient, Subscription};
pub use types::{
    EventCategory, EventEnvelope, EventPayload, EventType, Pomodoro, PomodoroPhase,
    PomodoroState, StartPomodoroInput, Task,
};
