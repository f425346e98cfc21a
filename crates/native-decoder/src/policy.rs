//! Vendor and platform support tables consulted during selection.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::codec::CodecType;
use crate::color::{ColorFormat, DECODER_COLOR_FORMATS};
use crate::platform::{sdk, PlatformInfo};
use crate::DecoderError;

pub const QCOM_PREFIX: &str = "OMX.qcom.";
pub const INTEL_PREFIX: &str = "OMX.Intel.";
pub const EXYNOS_PREFIX: &str = "OMX.Exynos.";
pub const NVIDIA_PREFIX: &str = "OMX.Nvidia.";

/// Which device names may serve a codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorGate {
    AllowAll,
    Prefixes(Vec<String>),
}

impl VendorGate {
    pub fn prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Prefixes(prefixes.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, device_name: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::Prefixes(prefixes) => prefixes.iter().any(|p| device_name.starts_with(p)),
        }
    }
}

/// H264 high profile is advertised for devices matching `prefix` from
/// `min_sdk_version` on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighProfileGate {
    pub prefix: String,
    pub min_sdk_version: u32,
}

impl HighProfileGate {
    pub fn new(prefix: impl Into<String>, min_sdk_version: u32) -> Self {
        Self {
            prefix: prefix.into(),
            min_sdk_version,
        }
    }
}

/// Capability tables for the decoder selector.
///
/// Missing fields in a JSON policy file take their values from
/// [`SelectionPolicy::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    /// Hardware decoding is never attempted below this platform version.
    pub min_sdk_version: u32,
    /// Accepted decoder output formats, in preference order.
    pub color_formats: Vec<ColorFormat>,
    pub h264: VendorGate,
    pub vp8: VendorGate,
    pub vp9: VendorGate,
    pub h264_high_profile: Vec<HighProfileGate>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            min_sdk_version: sdk::KITKAT,
            color_formats: DECODER_COLOR_FORMATS.to_vec(),
            // Any H264 decoder is trusted; see `strict_h264` for the vendor list.
            h264: VendorGate::AllowAll,
            vp8: VendorGate::prefixes([QCOM_PREFIX, INTEL_PREFIX, EXYNOS_PREFIX, NVIDIA_PREFIX]),
            vp9: VendorGate::prefixes([QCOM_PREFIX, EXYNOS_PREFIX]),
            h264_high_profile: vec![
                HighProfileGate::new(QCOM_PREFIX, sdk::LOLLIPOP),
                HighProfileGate::new(EXYNOS_PREFIX, sdk::M),
            ],
        }
    }
}

impl SelectionPolicy {
    /// Default policy with H264 limited to QCOM, Intel and Exynos decoders.
    pub fn strict_h264() -> Self {
        Self {
            h264: VendorGate::prefixes([QCOM_PREFIX, INTEL_PREFIX, EXYNOS_PREFIX]),
            ..Self::default()
        }
    }

    pub fn vendor_gate(&self, codec: CodecType) -> &VendorGate {
        match codec {
            CodecType::H264 => &self.h264,
            CodecType::Vp8 => &self.vp8,
            CodecType::Vp9 => &self.vp9,
        }
    }

    pub fn hardware_decode_supported(&self, platform: PlatformInfo) -> bool {
        platform.at_least(self.min_sdk_version)
    }

    pub fn high_profile_supported(&self, device_name: &str, platform: PlatformInfo) -> bool {
        self.h264_high_profile
            .iter()
            .any(|gate| {
                platform.at_least(gate.min_sdk_version) && device_name.starts_with(&gate.prefix)
            })
    }

    pub fn from_json(json: &str) -> Result<Self, DecoderError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read selection policy {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("parse selection policy {}", path.display()))
    }
}
