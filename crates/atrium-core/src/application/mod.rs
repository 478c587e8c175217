//! Application layer for Atrium.
//!
//! The application layer sits between the pure domain and whatever stores the
//! configuration document.  It depends on the [`persistence::PersistenceBackend`]
//! trait only, so the same code runs against the HTTP store, a local file, or
//! an in-memory backend in tests.
//!
//! # Sub-modules
//!
//! - **`persistence`** – The backend port, its error type, and an in-memory
//!   implementation.
//!
//! - **`repository`** – [`repository::ConfigRepository`]: load with fallback to
//!   defaults, and save / reset / import that report success as a boolean.
//!   No backend error crosses this boundary.
//!
//! - **`store`** – [`store::DashboardStore`]: the single owner of the
//!   in-memory configuration.  Applies an edit, then persists the whole
//!   document before the next edit can start.

pub mod persistence;
pub mod repository;
pub mod store;
