//! pastegrab - clipboard capture through a hidden Chromium window
//!
//! Reads the system clipboard without any OS clipboard API: a Chromium
//! instance is driven over the DevTools protocol, a paste listener is armed
//! in its page, the paste chord is injected, and the listener reports what
//! the resulting paste event carried.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Capture requests, snapshots, outcomes, configuration, and errors
//! - **Application**: Session lifecycle, capture engine, and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (Chrome launcher, DevTools client, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
