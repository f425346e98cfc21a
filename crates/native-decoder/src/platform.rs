//! Injected platform descriptors

use serde::{Deserialize, Serialize};

/// Platform API levels referenced by the selection policy.
pub mod sdk {
    pub const KITKAT: u32 = 19;
    pub const LOLLIPOP: u32 = 21;
    pub const M: u32 = 23;
}

/// Version information about the running platform.
///
/// Passed into the selector rather than read from the environment so a
/// caller (or a test) decides which OS version is being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub sdk_version: u32,
}

impl PlatformInfo {
    pub fn new(sdk_version: u32) -> Self {
        Self { sdk_version }
    }

    pub fn at_least(self, version: u32) -> bool {
        self.sdk_version >= version
    }
}

/// Opaque token for a shared rendering context.
///
/// Hardware decoders created with one can render into surfaces owned by
/// that context. Without one, surface-backed output is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedContext(u64);

impl SharedContext {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}
