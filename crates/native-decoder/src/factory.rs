//! Hardware decoder factory with software fallback

use std::sync::Arc;
use tracing::{debug, info};

use super::*;

/// A decoder bound to a specific hardware codec device.
///
/// Decoding itself happens in the native engine; this records what the
/// engine should open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareVideoDecoder {
    device_name: String,
    codec: CodecType,
    color_format: ColorFormat,
    shared_context: Option<SharedContext>,
}

impl HardwareVideoDecoder {
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn color_format(&self) -> ColorFormat {
        self.color_format
    }

    pub fn shared_context(&self) -> Option<SharedContext> {
        self.shared_context
    }

    /// Whether output can go to surfaces of the shared rendering context.
    pub fn supports_surface_rendering(&self) -> bool {
        self.shared_context.is_some()
    }
}

impl VideoDecoder for HardwareVideoDecoder {
    fn implementation_name(&self) -> &str {
        &self.device_name
    }

    fn codec_type(&self) -> CodecType {
        self.codec
    }

    fn is_hardware(&self) -> bool {
        true
    }
}

/// Creates decoders and advertises the codecs they cover.
pub trait VideoDecoderFactory {
    /// Create a decoder for a codec name such as `"VP8"`.
    ///
    /// `Ok(None)` means no decoder is available for a known codec.
    fn create_decoder(&self, codec_name: &str) -> Result<Option<Box<dyn VideoDecoder>>>;

    /// Supported codec configurations in preference order.
    fn supported_codecs(&self) -> Vec<VideoCodecInfo>;
}

pub struct HardwareVideoDecoderFactory {
    selector: DecoderSelector,
    shared_context: Option<SharedContext>,
    fallback: Option<Arc<dyn SoftwareDecoderFactory>>,
}

impl HardwareVideoDecoderFactory {
    /// Factory with the default policy, no shared context and software fallback.
    pub fn new(registry: Arc<dyn CodecRegistry>, platform: PlatformInfo) -> Self {
        Self::with_config(registry, platform, DecoderConfig::default())
    }

    pub fn with_config(
        registry: Arc<dyn CodecRegistry>,
        platform: PlatformInfo,
        config: DecoderConfig,
    ) -> Self {
        let fallback: Option<Arc<dyn SoftwareDecoderFactory>> = if config.fallback_to_software {
            Some(Arc::new(BuiltinSoftwareDecoderFactory::new()))
        } else {
            None
        };
        Self {
            selector: DecoderSelector::new(registry, platform).with_policy(config.policy),
            shared_context: config.shared_context,
            fallback,
        }
    }

    /// Replace the software fallback factory. Enables fallback.
    pub fn with_software_factory(mut self, factory: Arc<dyn SoftwareDecoderFactory>) -> Self {
        self.fallback = Some(factory);
        self
    }

    pub fn selector(&self) -> &DecoderSelector {
        &self.selector
    }

    pub fn fallback_enabled(&self) -> bool {
        self.fallback.is_some()
    }

    /// One-line description of the decoder `codec` would get right now.
    pub fn describe_decoder(&self, codec: CodecType) -> String {
        if let Some(selection) = self.selector.find(codec) {
            return format!(
                "{} ({}, hardware acceleration, {})",
                selection.device.name, codec, selection.color_format
            );
        }
        match self
            .fallback
            .as_ref()
            .and_then(|f| f.implementation_name(codec))
        {
            Some(name) => format!("{} ({}, software fallback)", name, codec),
            None => "none".to_string(),
        }
    }
}

impl VideoDecoderFactory for HardwareVideoDecoderFactory {
    fn create_decoder(&self, codec_name: &str) -> Result<Option<Box<dyn VideoDecoder>>> {
        let codec: CodecType = codec_name.parse()?;

        let Some(selection) = self.selector.find(codec) else {
            return Ok(match &self.fallback {
                Some(fallback) => {
                    debug!(codec = %codec, "no hardware decoder, trying software fallback");
                    fallback.create_decoder(codec_name)
                }
                None => {
                    debug!(codec = %codec, "no hardware decoder and fallback disabled");
                    None
                }
            });
        };

        info!(
            codec = %codec,
            device = %selection.device.name,
            surface = self.shared_context.is_some(),
            "native decoder: hardware decoder created"
        );
        Ok(Some(Box::new(HardwareVideoDecoder {
            device_name: selection.device.name,
            codec,
            color_format: selection.color_format,
            shared_context: self.shared_context,
        })))
    }

    fn supported_codecs(&self) -> Vec<VideoCodecInfo> {
        let mut infos = self.selector.hardware_codecs();
        if let Some(fallback) = &self.fallback {
            for info in fallback.supported_codecs() {
                if !infos.contains(&info) {
                    infos.push(info);
                }
            }
        }
        infos
    }
}
