//! Library crate for roster-manager.
//!
//! This crate exposes the building blocks of the tool:
//! - Member/group roster with the bidirectional membership relation (`roster`)
//! - Bonus policies and salary raises (`payroll`)
//! - Roster files on disk (`store`)
//! - Error and result types (`error`)
//! - In-memory search helpers (`search`)
//! - Application state and update loop (`app`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `roster-manager` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod app;
pub mod error;
pub mod payroll;
pub mod roster;
pub mod search;
pub mod store;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
pub use roster::{Group, GroupId, Member, MemberId, Roster, RosterError};
