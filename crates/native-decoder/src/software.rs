//! Software decoder fallback
//!
//! Used when no hardware device matches a requested codec and the
//! hardware factory was configured to fall back.

use super::*;
use tracing::{debug, info};

/// Source of CPU decoders.
pub trait SoftwareDecoderFactory: Send + Sync {
    /// Codecs this factory can decode, in preference order.
    fn supported_codecs(&self) -> Vec<VideoCodecInfo>;

    /// Name of the implementation that would decode `codec`, without
    /// creating a decoder.
    fn implementation_name(&self, codec: CodecType) -> Option<&str>;

    /// Create a decoder for the named codec, or `None` if unsupported.
    fn create_decoder(&self, codec_name: &str) -> Option<Box<dyn VideoDecoder>>;
}

fn builtin_implementation(codec: CodecType) -> &'static str {
    match codec {
        CodecType::H264 => "libavcodec-h264",
        CodecType::Vp8 => "libvpx-vp8",
        CodecType::Vp9 => "libvpx-vp9",
    }
}

/// A CPU decoder instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareVideoDecoder {
    codec: CodecType,
    implementation: &'static str,
}

impl SoftwareVideoDecoder {
    pub fn new(codec: CodecType) -> Self {
        Self {
            codec,
            implementation: builtin_implementation(codec),
        }
    }
}

impl VideoDecoder for SoftwareVideoDecoder {
    fn implementation_name(&self) -> &str {
        self.implementation
    }

    fn codec_type(&self) -> CodecType {
        self.codec
    }

    fn is_hardware(&self) -> bool {
        false
    }
}

/// Built-in software decoders: VP8 and VP9, plus H264 baseline when enabled.
#[derive(Debug, Clone, Default)]
pub struct BuiltinSoftwareDecoderFactory {
    h264: bool,
}

impl BuiltinSoftwareDecoderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_h264(mut self, enabled: bool) -> Self {
        self.h264 = enabled;
        self
    }

    fn supports(&self, codec: CodecType) -> bool {
        codec != CodecType::H264 || self.h264
    }
}

impl SoftwareDecoderFactory for BuiltinSoftwareDecoderFactory {
    fn supported_codecs(&self) -> Vec<VideoCodecInfo> {
        let mut infos = vec![
            VideoCodecInfo::for_codec(CodecType::Vp8, false),
            VideoCodecInfo::for_codec(CodecType::Vp9, false),
        ];
        if self.h264 {
            infos.push(VideoCodecInfo::for_codec(CodecType::H264, false));
        }
        infos
    }

    fn implementation_name(&self, codec: CodecType) -> Option<&str> {
        self.supports(codec).then(|| builtin_implementation(codec))
    }

    fn create_decoder(&self, codec_name: &str) -> Option<Box<dyn VideoDecoder>> {
        let codec = match codec_name.parse::<CodecType>() {
            Ok(codec) if self.supports(codec) => codec,
            _ => {
                debug!(codec = codec_name, "no software decoder for codec");
                return None;
            }
        };
        let decoder = SoftwareVideoDecoder::new(codec);
        info!(
            codec = %codec,
            implementation = decoder.implementation_name(),
            "native decoder: software fallback initialized"
        );
        Some(Box::new(decoder))
    }
}
