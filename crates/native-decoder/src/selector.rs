//! Hardware decoder device selection
//!
//! Walks the injected [`CodecRegistry`] in registry order and returns the
//! first decoder that advertises the codec's MIME type, outputs an
//! allow-listed color format, and passes the vendor gate. Nothing is
//! cached: every call re-reads the registry.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::{CodecType, VideoCodecInfo};
use crate::color::{select_color_format, ColorFormat};
use crate::platform::PlatformInfo;
use crate::policy::SelectionPolicy;
use crate::registry::{CodecRegistry, DeviceDescriptor, RegistryError};

/// Why a device was not chosen for a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("device is an encoder")]
    Encoder,
    #[error("codec MIME type not advertised")]
    MimeUnsupported,
    #[error("no supported decoder color format")]
    NoColorFormat,
    #[error("vendor not allowed for this codec")]
    VendorNotAllowed,
}

/// Per-entry outcome reported by [`DecoderSelector::explain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceVerdict {
    Unreadable {
        index: usize,
        error: RegistryError,
    },
    Rejected {
        index: usize,
        name: String,
        reason: Rejection,
    },
    Accepted {
        index: usize,
        name: String,
        color_format: ColorFormat,
    },
}

/// A device chosen for a codec together with the output format to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderSelection {
    pub device: DeviceDescriptor,
    pub codec: CodecType,
    pub color_format: ColorFormat,
}

pub struct DecoderSelector {
    registry: Arc<dyn CodecRegistry>,
    platform: PlatformInfo,
    policy: SelectionPolicy,
}

impl DecoderSelector {
    pub fn new(registry: Arc<dyn CodecRegistry>, platform: PlatformInfo) -> Self {
        Self {
            registry,
            platform,
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    pub fn platform(&self) -> PlatformInfo {
        self.platform
    }

    pub fn hardware_decode_available(&self) -> bool {
        self.policy.hardware_decode_supported(self.platform)
    }

    /// Check one device against the policy for `codec`.
    ///
    /// On success returns the color format the decoder should output.
    pub fn evaluate(
        &self,
        device: &DeviceDescriptor,
        codec: CodecType,
    ) -> Result<ColorFormat, Rejection> {
        if device.is_encoder {
            return Err(Rejection::Encoder);
        }
        let formats = device
            .color_formats_for(codec.mime_type())
            .ok_or(Rejection::MimeUnsupported)?;
        let color_format = select_color_format(&self.policy.color_formats, formats)
            .ok_or(Rejection::NoColorFormat)?;
        if !self.policy.vendor_gate(codec).allows(&device.name) {
            return Err(Rejection::VendorNotAllowed);
        }
        Ok(color_format)
    }

    /// First matching hardware decoder for `codec`, or `None` when the
    /// caller should fall back to software.
    pub fn select_decoder(&self, codec: CodecType) -> Option<DeviceDescriptor> {
        self.find(codec).map(|selection| selection.device)
    }

    /// Like [`select_decoder`](Self::select_decoder) but keeps the chosen
    /// color format.
    pub fn find(&self, codec: CodecType) -> Option<DecoderSelection> {
        if !self.hardware_decode_available() {
            debug!(
                sdk = self.platform.sdk_version,
                min_sdk = self.policy.min_sdk_version,
                "hardware decoding unavailable on this platform version"
            );
            return None;
        }

        for index in 0..self.registry.codec_count() {
            let device = match self.registry.codec_info_at(index) {
                Ok(device) => device,
                Err(err) => {
                    warn!(index, error = %err, "cannot retrieve decoder codec info");
                    continue;
                }
            };
            match self.evaluate(&device, codec) {
                Ok(color_format) => {
                    info!(
                        codec = %codec,
                        device = %device.name,
                        color_format = %color_format,
                        "hardware decoder selected"
                    );
                    return Some(DecoderSelection {
                        device,
                        codec,
                        color_format,
                    });
                }
                Err(reason) => {
                    debug!(codec = %codec, device = %device.name, %reason, "skipping codec device");
                }
            }
        }

        debug!(codec = %codec, "no hardware decoder found");
        None
    }

    /// Verdict for every registry entry, in registry order.
    pub fn explain(&self, codec: CodecType) -> Vec<DeviceVerdict> {
        (0..self.registry.codec_count())
            .map(|index| match self.registry.codec_info_at(index) {
                Err(error) => DeviceVerdict::Unreadable { index, error },
                Ok(device) => match self.evaluate(&device, codec) {
                    Ok(color_format) => DeviceVerdict::Accepted {
                        index,
                        name: device.name,
                        color_format,
                    },
                    Err(reason) => DeviceVerdict::Rejected {
                        index,
                        name: device.name,
                        reason,
                    },
                },
            })
            .collect()
    }

    /// Capability records backed by hardware, in preference order.
    ///
    /// For H264 the high-profile record precedes baseline when the
    /// matched device passes the high-profile gate.
    pub fn hardware_codecs(&self) -> Vec<VideoCodecInfo> {
        let mut infos = Vec::new();
        for codec in CodecType::PREFERENCE_ORDER {
            let Some(device) = self.select_decoder(codec) else {
                continue;
            };
            if codec == CodecType::H264
                && self.policy.high_profile_supported(&device.name, self.platform)
            {
                infos.push(VideoCodecInfo::for_codec(codec, true));
            }
            infos.push(VideoCodecInfo::for_codec(codec, false));
        }
        infos
    }
}
