//! Platform codec registry access
//!
//! The selector never talks to the platform directly; it walks a
//! [`CodecRegistry`] index by index. [`SnapshotRegistry`] is the JSON-backed
//! implementation used by the CLI and by tests.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::color::ColorFormat;
use crate::platform::PlatformInfo;
use crate::DecoderError;

/// Capabilities a device advertises for one MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCapabilities {
    pub mime_type: String,
    #[serde(default)]
    pub color_formats: Vec<ColorFormat>,
}

/// Snapshot of one codec device as reported by the platform registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    #[serde(default)]
    pub is_encoder: bool,
    #[serde(default)]
    pub types: Vec<TypeCapabilities>,
}

impl DeviceDescriptor {
    pub fn decoder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_encoder: false,
            types: Vec::new(),
        }
    }

    pub fn encoder(name: impl Into<String>) -> Self {
        Self {
            is_encoder: true,
            ..Self::decoder(name)
        }
    }

    /// Add an advertised MIME type with its color formats.
    pub fn with_type(
        mut self,
        mime_type: impl Into<String>,
        color_formats: impl IntoIterator<Item = ColorFormat>,
    ) -> Self {
        self.types.push(TypeCapabilities {
            mime_type: mime_type.into(),
            color_formats: color_formats.into_iter().collect(),
        });
        self
    }

    pub fn supported_types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.mime_type.as_str())
    }

    pub fn supports_type(&self, mime_type: &str) -> bool {
        self.supported_types().any(|t| t == mime_type)
    }

    /// Color formats advertised for `mime_type`, if the type is supported.
    pub fn color_formats_for(&self, mime_type: &str) -> Option<&[ColorFormat]> {
        self.types
            .iter()
            .find(|t| t.mime_type == mime_type)
            .map(|t| t.color_formats.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("codec index {index} out of range (registry holds {count})")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("codec info at index {index} unreadable: {reason}")]
    Unreadable { index: usize, reason: String },
}

/// Read access to the platform's list of codec devices.
///
/// Implementations report the current platform state on every call and
/// must not cache across calls.
pub trait CodecRegistry: Send + Sync {
    fn codec_count(&self) -> usize;

    fn codec_info_at(&self, index: usize) -> Result<DeviceDescriptor, RegistryError>;
}

/// One entry of a registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotEntry {
    Device(DeviceDescriptor),
    /// An entry the platform failed to describe.
    Unreadable { error: String },
}

/// A codec registry captured as data.
///
/// ```json
/// {
///   "sdk_version": 23,
///   "codecs": [
///     { "name": "OMX.qcom.video.decoder.vp8",
///       "types": [{ "mime_type": "video/x-vnd.on2.vp8", "color_formats": [21] }] },
///     { "error": "codec info unavailable" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRegistry {
    #[serde(default)]
    pub sdk_version: Option<u32>,
    #[serde(default)]
    pub codecs: Vec<SnapshotEntry>,
}

impl SnapshotRegistry {
    pub fn new(codecs: Vec<SnapshotEntry>) -> Self {
        Self {
            sdk_version: None,
            codecs,
        }
    }

    pub fn from_devices(devices: impl IntoIterator<Item = DeviceDescriptor>) -> Self {
        Self::new(devices.into_iter().map(SnapshotEntry::Device).collect())
    }

    pub fn from_json(json: &str) -> Result<Self, DecoderError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read codec snapshot {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parse codec snapshot {}", path.display()))
    }

    /// Platform version recorded alongside the snapshot, if any.
    pub fn platform(&self) -> Option<PlatformInfo> {
        self.sdk_version.map(PlatformInfo::new)
    }
}

impl CodecRegistry for SnapshotRegistry {
    fn codec_count(&self) -> usize {
        self.codecs.len()
    }

    fn codec_info_at(&self, index: usize) -> Result<DeviceDescriptor, RegistryError> {
        match self.codecs.get(index) {
            Some(SnapshotEntry::Device(device)) => Ok(device.clone()),
            Some(SnapshotEntry::Unreadable { error }) => Err(RegistryError::Unreadable {
                index,
                reason: error.clone(),
            }),
            None => Err(RegistryError::IndexOutOfRange {
                index,
                count: self.codecs.len(),
            }),
        }
    }
}
