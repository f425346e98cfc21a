//! Decoder output color formats

use serde::{Deserialize, Serialize};
use std::fmt;

/// A platform color-format constant, as advertised by a codec device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorFormat(pub u32);

impl ColorFormat {
    pub const YUV420_PLANAR: Self = Self(19);
    pub const YUV420_SEMI_PLANAR: Self = Self(21);
    pub const QCOM_YUV420_SEMI_PLANAR: Self = Self(0x7FA3_0C00);
    pub const QCOM_YVU420_PACKED_SEMI_PLANAR_32M4KA: Self = Self(0x7FA3_0C01);
    pub const QCOM_YVU420_PACKED_SEMI_PLANAR_16M4KA: Self = Self(0x7FA3_0C02);
    pub const QCOM_YVU420_PACKED_SEMI_PLANAR_64X32_TILE_2M8KA: Self = Self(0x7FA3_0C03);
    pub const QCOM_YUV420_PACKED_SEMI_PLANAR_32M: Self = Self(0x7FA3_0C04);

    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::YUV420_PLANAR => "YUV420Planar",
            Self::YUV420_SEMI_PLANAR => "YUV420SemiPlanar",
            Self::QCOM_YUV420_SEMI_PLANAR => "QCOM_YUV420SemiPlanar",
            Self::QCOM_YVU420_PACKED_SEMI_PLANAR_32M4KA => "QCOM_YVU420PackedSemiPlanar32m4ka",
            Self::QCOM_YVU420_PACKED_SEMI_PLANAR_16M4KA => "QCOM_YVU420PackedSemiPlanar16m4ka",
            Self::QCOM_YVU420_PACKED_SEMI_PLANAR_64X32_TILE_2M8KA => {
                "QCOM_YVU420PackedSemiPlanar64x32Tile2m8ka"
            }
            Self::QCOM_YUV420_PACKED_SEMI_PLANAR_32M => "QCOM_YUV420PackedSemiPlanar32m",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

/// Color formats a hardware decoder may output for us to accept it, in
/// order of preference.
pub const DECODER_COLOR_FORMATS: [ColorFormat; 7] = [
    ColorFormat::YUV420_PLANAR,
    ColorFormat::YUV420_SEMI_PLANAR,
    ColorFormat::QCOM_YUV420_SEMI_PLANAR,
    ColorFormat::QCOM_YVU420_PACKED_SEMI_PLANAR_32M4KA,
    ColorFormat::QCOM_YVU420_PACKED_SEMI_PLANAR_16M4KA,
    ColorFormat::QCOM_YVU420_PACKED_SEMI_PLANAR_64X32_TILE_2M8KA,
    ColorFormat::QCOM_YUV420_PACKED_SEMI_PLANAR_32M,
];

/// Pick the first allow-listed format the device advertises.
///
/// Allow-list order wins over the device's own ordering.
pub fn select_color_format(
    allow_list: &[ColorFormat],
    advertised: &[ColorFormat],
) -> Option<ColorFormat> {
    allow_list
        .iter()
        .copied()
        .find(|wanted| advertised.contains(wanted))
}
