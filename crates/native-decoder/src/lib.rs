//! Hardware video decoder selection
//!
//! This crate decides which codec device should decode a stream. It probes an
//! injected platform codec registry, filters devices through vendor and
//! platform-version tables, checks for a usable output color format, and falls
//! back to a software decoder factory when no hardware device qualifies.
//!
//! The decoding itself lives in the native engine; the types here describe
//! what that engine should open.

use std::fmt;
use thiserror::Error;

mod codec;
mod color;
mod factory;
mod platform;
mod policy;
mod registry;
mod selector;
mod software;

pub use codec::{
    codec_properties, CodecType, VideoCodecInfo, H264_CONSTRAINED_BASELINE_3_1,
    H264_CONSTRAINED_HIGH_3_1, H264_LEVEL_ASYMMETRY_ALLOWED, H264_PACKETIZATION_MODE,
    H264_PROFILE_LEVEL_ID,
};
pub use color::{select_color_format, ColorFormat, DECODER_COLOR_FORMATS};
pub use factory::{HardwareVideoDecoder, HardwareVideoDecoderFactory, VideoDecoderFactory};
pub use platform::{sdk, PlatformInfo, SharedContext};
pub use policy::{
    HighProfileGate, SelectionPolicy, VendorGate, EXYNOS_PREFIX, INTEL_PREFIX, NVIDIA_PREFIX,
    QCOM_PREFIX,
};
pub use registry::{
    CodecRegistry, DeviceDescriptor, RegistryError, SnapshotEntry, SnapshotRegistry,
    TypeCapabilities,
};
pub use selector::{DecoderSelection, DecoderSelector, DeviceVerdict, Rejection};
pub use software::{BuiltinSoftwareDecoderFactory, SoftwareDecoderFactory, SoftwareVideoDecoder};

#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("unknown codec type: {0}")]
    UnknownCodec(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

pub type Result<T, E = DecoderError> = std::result::Result<T, E>;

/// A decoder instance handed back by a factory.
pub trait VideoDecoder: Send + Sync + fmt::Debug {
    /// Device or library name backing this decoder
    fn implementation_name(&self) -> &str;

    fn codec_type(&self) -> CodecType;

    /// True for decoders running on a hardware codec device.
    fn is_hardware(&self) -> bool;
}

/// Decoder factory configuration
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Use the software factory when no hardware device matches
    pub fallback_to_software: bool,
    /// Vendor, version and color-format tables
    pub policy: SelectionPolicy,
    /// Rendering context for surface output; `None` disables surface support
    pub shared_context: Option<SharedContext>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            fallback_to_software: true,
            policy: SelectionPolicy::default(),
            shared_context: None,
        }
    }
}
