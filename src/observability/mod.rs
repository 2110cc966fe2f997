//! Observability subsystem for eavsearch
//!
//! Structured JSON logging plus the typed event catalogue of the engine.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use eavsearch::observability::{Logger, SearchEvent};
//!
//! SearchEvent::UnknownSchema.log(&[("schema", "bogus")]);
//! Logger::info("CUSTOM_EVENT", &[("rows", "42")]);
//! ```

mod events;
mod logger;

pub use events::SearchEvent;
pub use logger::{Logger, Severity};
