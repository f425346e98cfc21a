//! Codec identifiers and the capability records advertised to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::DecoderError;

pub const H264_PROFILE_LEVEL_ID: &str = "profile-level-id";
pub const H264_LEVEL_ASYMMETRY_ALLOWED: &str = "level-asymmetry-allowed";
pub const H264_PACKETIZATION_MODE: &str = "packetization-mode";

/// Constrained high profile, level 3.1.
pub const H264_CONSTRAINED_HIGH_3_1: &str = "640c1f";
/// Constrained baseline profile, level 3.1.
pub const H264_CONSTRAINED_BASELINE_3_1: &str = "42e01f";

/// Video compression formats this layer knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CodecType {
    #[serde(rename = "H264")]
    H264,
    #[serde(rename = "VP8")]
    Vp8,
    #[serde(rename = "VP9")]
    Vp9,
}

impl CodecType {
    /// Preference order used when advertising supported codecs.
    pub const PREFERENCE_ORDER: [CodecType; 3] = [CodecType::H264, CodecType::Vp8, CodecType::Vp9];

    /// Canonical name, as used in codec negotiation.
    pub fn name(self) -> &'static str {
        match self {
            Self::H264 => "H264",
            Self::Vp8 => "VP8",
            Self::Vp9 => "VP9",
        }
    }

    /// MIME type the platform codec registry advertises for this codec.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::H264 => "video/avc",
            Self::Vp8 => "video/x-vnd.on2.vp8",
            Self::Vp9 => "video/x-vnd.on2.vp9",
        }
    }

    /// Position in [`CodecType::PREFERENCE_ORDER`]; lower is preferred.
    pub fn rank(self) -> usize {
        match self {
            Self::H264 => 0,
            Self::Vp8 => 1,
            Self::Vp9 => 2,
        }
    }
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodecType {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H264" => Ok(Self::H264),
            "VP8" => Ok(Self::Vp8),
            "VP9" => Ok(Self::Vp9),
            other => Err(DecoderError::UnknownCodec(other.to_string())),
        }
    }
}

/// SDP-style format parameters for a codec.
///
/// VP8 and VP9 carry none. H264 parameters encode the profile, so the
/// high and baseline variants compare unequal.
pub fn codec_properties(codec: CodecType, high_profile: bool) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    if codec == CodecType::H264 {
        params.insert(H264_LEVEL_ASYMMETRY_ALLOWED.to_string(), "1".to_string());
        params.insert(H264_PACKETIZATION_MODE.to_string(), "1".to_string());
        let profile = if high_profile {
            H264_CONSTRAINED_HIGH_3_1
        } else {
            H264_CONSTRAINED_BASELINE_3_1
        };
        params.insert(H264_PROFILE_LEVEL_ID.to_string(), profile.to_string());
    }
    params
}

/// One advertised codec configuration.
///
/// Equality is structural over name and parameters, which is what the
/// hardware/software union in `supported_codecs` relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoCodecInfo {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl VideoCodecInfo {
    pub fn new(name: impl Into<String>, params: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn for_codec(codec: CodecType, high_profile: bool) -> Self {
        Self::new(codec.name(), codec_properties(codec, high_profile))
    }

    /// Codec type named by this record, if it is one we know.
    pub fn codec_type(&self) -> Option<CodecType> {
        self.name.parse().ok()
    }

    pub fn is_high_profile(&self) -> bool {
        self.params
            .get(H264_PROFILE_LEVEL_ID)
            .is_some_and(|p| p == H264_CONSTRAINED_HIGH_3_1)
    }
}

impl fmt::Display for VideoCodecInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.params.is_empty() {
            let joined: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, " [{}]", joined.join(";"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names_only() {
        assert_eq!("VP8".parse::<CodecType>().unwrap(), CodecType::Vp8);
        assert_eq!("H264".parse::<CodecType>().unwrap(), CodecType::H264);
        assert!(matches!(
            "vp8".parse::<CodecType>(),
            Err(DecoderError::UnknownCodec(name)) if name == "vp8"
        ));
        assert!("AV1".parse::<CodecType>().is_err());
    }

    #[test]
    fn preference_order_matches_rank() {
        for (i, codec) in CodecType::PREFERENCE_ORDER.iter().enumerate() {
            assert_eq!(codec.rank(), i);
        }
    }

    #[test]
    fn h264_profiles_are_distinct_records() {
        let high = VideoCodecInfo::for_codec(CodecType::H264, true);
        let base = VideoCodecInfo::for_codec(CodecType::H264, false);
        assert_ne!(high, base);
        assert!(high.is_high_profile());
        assert!(!base.is_high_profile());
        assert_eq!(base.params.get(H264_PACKETIZATION_MODE).map(String::as_str), Some("1"));
    }

    #[test]
    fn vp_codecs_ignore_profile_flag() {
        assert_eq!(
            VideoCodecInfo::for_codec(CodecType::Vp9, true),
            VideoCodecInfo::for_codec(CodecType::Vp9, false)
        );
        assert!(codec_properties(CodecType::Vp8, false).is_empty());
    }

    #[test]
    fn display_lists_params() {
        let base = VideoCodecInfo::for_codec(CodecType::H264, false);
        assert_eq!(
            base.to_string(),
            "H264 [level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42e01f]"
        );
        assert_eq!(VideoCodecInfo::for_codec(CodecType::Vp8, false).to_string(), "VP8");
    }
}
