//! # Leakhound
//!
//! **Secret inspection pipeline for decrypted proxy response traffic.**
//!
//! Leakhound sits behind an intercepting proxy and scans already-decoded HTTP
//! response bodies for embedded secrets (API keys, tokens, credentials). The
//! interception engine itself — certificate issuance, CONNECT hijacking, HTTP
//! transport — is an external collaborator; this crate only receives response
//! metadata and bytes and keeps inspection off the proxy's hot path.
//!
//! ## Architecture
//!
//! - **[`pipeline`]** — admission filter, bounded ingestion queue, and the
//!   single inspection worker that drains it
//! - **[`scan`]** — concurrent regex pattern engine and the exact-literal
//!   multi-pattern automaton, plus the built-in secret patterns
//! - **[`artifact`]** — content-hash deduplicated artifact writes
//! - **[`error`]** — unified error types using `thiserror`
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use leakhound::pipeline::{InspectionJob, Inspector, LogSink};
//! use leakhound::scan::{patterns, RegexEngine};
//!
//! # async fn run() {
//! let engine = Arc::new(RegexEngine::new());
//! for pattern in patterns::SECRET_PATTERNS {
//!     if let Err(e) = engine.add_pattern(pattern).await {
//!         tracing::error!("skipping pattern: {e}");
//!     }
//! }
//!
//! let inspector = Inspector::new(engine, Arc::new(LogSink));
//! inspector.inspect(
//!     "api.example.com:443",
//!     "application/json",
//!     InspectionJob {
//!         method: "GET".to_string(),
//!         url: "https://api.example.com/v1/session".to_string(),
//!         status_code: 200,
//!         body: Arc::from(&b"{\"token\":\"sk-test\"}"[..]),
//!     },
//! );
//! inspector.shutdown().await;
//! # }
//! ```

pub mod artifact;
pub mod error;
pub mod pipeline;
pub mod scan;
