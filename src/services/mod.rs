//! Exchange services driven by the chat controller.
//!
//! ARCHITECTURE
//! ============
//! `exchange` owns the submit → stream → complete flow and composes the
//! rest: `ingest` turns body chunks into text patches, `scroll` throttles
//! scroll-to-latest requests, `window` decides which messages the view
//! materializes, and `metrics` keeps per-exchange timing samples.

pub mod exchange;
pub mod ingest;
pub mod metrics;
pub mod scroll;
pub mod window;
