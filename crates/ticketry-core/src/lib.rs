//! Core types and field resolution for the ticketry issue tracker.
//!
//! An [`issue::Issue`] stores its custom fields as raw string rows. The
//! project's [`workflow::WorkflowSpec`] says which fields exist, how they are
//! typed, and which apply in each state; [`resolver`] combines the two into
//! the effective field view.

pub mod enums;
pub mod field;
pub mod issue;
pub mod resolver;
pub mod validation;
pub mod workflow;
