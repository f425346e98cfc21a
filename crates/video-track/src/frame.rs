use std::sync::Arc;

/// Pixel layout of a delivered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    I420,
    Nv12,
}

impl PixelFormat {
    /// Bytes needed for a `width` x `height` 4:2:0 frame.
    pub fn buffer_size(self, width: u32, height: u32) -> usize {
        let luma = width as usize * height as usize;
        let chroma_w = (width as usize).div_ceil(2);
        let chroma_h = (height as usize).div_ceil(2);
        luma + 2 * chroma_w * chroma_h
    }
}

/// A decoded frame handed to sinks.
///
/// The pixel buffer is shared, so cloning a frame for fan-out is cheap.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Clockwise rotation in degrees (0, 90, 180, 270)
    pub rotation: u32,
    pub timestamp_ns: i64,
    pub data: Arc<[u8]>,
}

impl VideoFrame {
    pub fn new(
        format: PixelFormat,
        width: u32,
        height: u32,
        timestamp_ns: i64,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            format,
            width,
            height,
            rotation: 0,
            timestamp_ns,
            data: data.into(),
        }
    }

    /// Mid-grey frame of the right buffer size.
    pub fn blank(format: PixelFormat, width: u32, height: u32, timestamp_ns: i64) -> Self {
        let data = vec![128u8; format.buffer_size(width, height)];
        Self::new(format, width, height, timestamp_ns, data)
    }

    pub fn with_rotation(mut self, rotation: u32) -> Self {
        self.rotation = rotation % 360;
        self
    }

    /// Width after applying rotation
    pub fn rotated_width(&self) -> u32 {
        if self.rotation % 180 == 0 {
            self.width
        } else {
            self.height
        }
    }

    /// Height after applying rotation
    pub fn rotated_height(&self) -> u32 {
        if self.rotation % 180 == 0 {
            self.height
        } else {
            self.width
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_frame_sizes_chroma_for_odd_dimensions() {
        let frame = VideoFrame::blank(PixelFormat::I420, 3, 3, 0);
        assert_eq!(frame.data.len(), 9 + 2 * 2 * 2);
        assert!(frame.data.iter().all(|&b| b == 128));
    }

    #[test]
    fn rotation_swaps_dimensions() {
        let frame = VideoFrame::blank(PixelFormat::Nv12, 640, 480, 0).with_rotation(450);
        assert_eq!(frame.rotation, 90);
        assert_eq!(frame.rotated_width(), 480);
        assert_eq!(frame.rotated_height(), 640);
    }
}
