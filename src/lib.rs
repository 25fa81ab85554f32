//! DialerCore - Rust implementation of the Dialer application core.
//!
//! This library provides the data layer behind the phone dialer screens:
//! - Data models (Contact, CallRecord)
//! - Contact store: sorted, searchable, persisted as one JSON array
//! - Call history store: newest first, relative time formatting
//! - Phone number formatting and keypad input
//! - Call prompt catalog
//! - Configuration management
//!
//! Both stores sit on a [`KeyValuePersistence`] backend. Reads never fail
//! (a fault reads as an empty collection); writes propagate their errors.
//!
//! # Feature Flags
//!
//! - `desktop`: Default config directory detection.

pub mod call_history;
pub mod clock;
pub mod collection;
pub mod config;
pub mod contacts;
pub mod dialer;
pub mod error;
pub mod models;
pub mod persistence;
pub mod phone;
pub mod prompts;
pub mod validation;

// Re-export commonly used types
pub use call_history::{format_relative_time, CallHistoryStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use contacts::ContactStore;
pub use dialer::Dialer;
pub use error::{DialerError, DialerResult, PersistenceError};
pub use models::{CallRecord, CallType, Contact, NewCallRecord, NewContact};
pub use persistence::{FilePersistence, KeyValuePersistence, LoadOutcome, MemoryPersistence};
pub use phone::format_phone_number;
pub use prompts::PromptCatalog;
