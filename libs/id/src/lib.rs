//! # rescue-id
//!
//! Typed identifiers for the evacuation service.
//!
//! Two families of IDs live here:
//!
//! - **Keys** (`ZoneId`, `VehicleId`): chosen by the caller when a zone or
//!   vehicle is registered, e.g. `Z1` or `bus-042`. They are opaque strings
//!   with light validation so that they can be used as storage keys and
//!   log fields.
//! - **Generated IDs** (`RequestId`): system-generated, prefixed ULIDs such
//!   as `req_01HV4Z2WQXKJNM8GPQY6VBKC3D`.
//!
//! Keeping them as distinct types stops a vehicle id from being passed
//! where a zone id is expected.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
