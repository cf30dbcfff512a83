//! Typed ID definitions.

use crate::{define_id, define_key};

/// Maximum length in bytes of a caller-chosen key.
pub const MAX_KEY_LEN: usize = 128;

// =============================================================================
// Caller-chosen keys
// =============================================================================

define_key!(ZoneId);
define_key!(VehicleId);

// =============================================================================
// Requests
// =============================================================================

define_id!(RequestId, "req");

// =============================================================================
// Tests
// =============================================================================
