//! In-memory 8-bit pixel buffers and the plane that carries the payload.

use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, ImageFormat};
use thiserror::Error;

use crate::config::ChannelPolicy;
use crate::transform::Block;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("unsupported or undecodable image: {0}")]
    Unsupported(String),
    #[error("image has no pixels")]
    Empty,
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Input containers accepted as cover or stego images.
const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Bmp,
];

/// An interleaved 8-bit image with 1 (L), 2 (LA), 3 (RGB) or 4 (RGBA) channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Decode image bytes. Deeper or float layouts are narrowed to 8 bits,
    /// keeping the gray/colour and alpha structure.
    pub fn decode(bytes: &[u8]) -> Result<Self, RasterError> {
        let format =
            image::guess_format(bytes).map_err(|e| RasterError::Unsupported(e.to_string()))?;
        if !ACCEPTED_FORMATS.contains(&format) {
            return Err(RasterError::Unsupported(format!("{:?} images are not accepted", format)));
        }
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| RasterError::Unsupported(e.to_string()))?;
        Self::from_dynamic(decoded)
    }

    pub fn from_dynamic(image: DynamicImage) -> Result<Self, RasterError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(RasterError::Empty);
        }
        let (channels, data) = match image {
            DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
            other => {
                let color = other.color();
                match (color.has_color(), color.has_alpha()) {
                    (false, false) => (1, other.to_luma8().into_raw()),
                    (false, true) => (2, other.to_luma_alpha8().into_raw()),
                    (true, false) => (3, other.to_rgb8().into_raw()),
                    (true, true) => (4, other.to_rgba8().into_raw()),
                }
            }
        };
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Wrap raw interleaved pixels. Returns `None` on a size mismatch.
    #[cfg(test)]
    pub fn from_raw(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Option<Self> {
        let valid = (1..=4).contains(&channels)
            && width > 0
            && height > 0
            && data.len() == width as usize * height as usize * channels;
        valid.then_some(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    #[cfg(test)]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn color_type(&self) -> ColorType {
        match self.channels {
            1 => ColorType::L8,
            2 => ColorType::La8,
            3 => ColorType::Rgb8,
            _ => ColorType::Rgba8,
        }
    }

    /// Losslessly encode as PNG with the raster's own channel layout.
    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&self.data, self.width, self.height, self.color_type())
            .map_err(|e| RasterError::Encode(e.to_string()))?;
        Ok(out)
    }

    /// Copy the `size`x`size` block whose top-left pixel is `origin`.
    /// The block must lie entirely inside the image.
    pub fn read_block(&self, origin: (usize, usize), size: usize) -> PixelBlock {
        let (x0, y0) = origin;
        let stride = self.width as usize * self.channels;
        let row_len = size * self.channels;
        let mut data = Vec::with_capacity(size * row_len);
        for row in 0..size {
            let offset = (y0 + row) * stride + x0 * self.channels;
            data.extend_from_slice(&self.data[offset..offset + row_len]);
        }
        PixelBlock {
            origin,
            size,
            channels: self.channels,
            data,
        }
    }

    /// Write a block back at its origin.
    pub fn write_block(&mut self, block: &PixelBlock) {
        let (x0, y0) = block.origin;
        let stride = self.width as usize * self.channels;
        let row_len = block.size * self.channels;
        for row in 0..block.size {
            let offset = (y0 + row) * stride + x0 * self.channels;
            self.data[offset..offset + row_len]
                .copy_from_slice(&block.data[row * row_len..(row + 1) * row_len]);
        }
    }
}

/// The plane of a pixel that carries payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    /// A single channel, written directly.
    Channel(usize),
    /// Integer luma of an RGB(A) pixel; writes shift R, G and B together.
    Luma,
}

impl Carrier {
    pub fn resolve(channels: usize, policy: ChannelPolicy) -> Self {
        if channels < 3 {
            return Carrier::Channel(0);
        }
        match policy {
            ChannelPolicy::Luma => Carrier::Luma,
            ChannelPolicy::Blue => Carrier::Channel(2),
        }
    }

    pub fn read(&self, pixel: &[u8]) -> u8 {
        match *self {
            Carrier::Channel(c) => pixel[c],
            Carrier::Luma => luma(pixel),
        }
    }

    /// Set the carried value, clamping each touched channel to 0..=255.
    pub fn write(&self, pixel: &mut [u8], value: i32) {
        match *self {
            Carrier::Channel(c) => pixel[c] = value.clamp(0, 255) as u8,
            Carrier::Luma => {
                let delta = value - luma(pixel) as i32;
                for channel in &mut pixel[..3] {
                    *channel = (*channel as i32 + delta).clamp(0, 255) as u8;
                }
            }
        }
    }

    /// Compress the carried channels linearly into `[headroom, 255 - headroom]`.
    pub fn squeeze(&self, pixel: &mut [u8], headroom: u8) {
        let channels = match *self {
            Carrier::Channel(c) => c..c + 1,
            Carrier::Luma => 0..3,
        };
        let h = headroom.min(127) as u32;
        for channel in &mut pixel[channels] {
            *channel = (h + (*channel as u32 * (255 - 2 * h) + 127) / 255) as u8;
        }
    }
}

/// Integer luma; adding `d` to R, G and B adds exactly `d` here.
fn luma(pixel: &[u8]) -> u8 {
    let (r, g, b) = (pixel[0] as u32, pixel[1] as u32, pixel[2] as u32);
    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
}

/// An owned copy of one square block of pixels, all channels interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBlock {
    origin: (usize, usize),
    size: usize,
    channels: usize,
    data: Vec<u8>,
}

impl PixelBlock {
    pub fn origin(&self) -> (usize, usize) {
        self.origin
    }

    /// The carrier plane of this block as transform input.
    pub fn plane(&self, carrier: Carrier) -> Block {
        let values = self
            .data
            .chunks_exact(self.channels)
            .map(|pixel| carrier.read(pixel) as f64)
            .collect();
        Block::from_values(self.size, values)
    }

    /// Round `plane` to integers and write it through the carrier.
    pub fn set_plane(&mut self, carrier: Carrier, plane: &Block) {
        for (pixel, &value) in self.data.chunks_exact_mut(self.channels).zip(plane.values()) {
            carrier.write(pixel, value.round() as i32);
        }
    }

    pub fn squeeze(&mut self, carrier: Carrier, headroom: u8) {
        for pixel in self.data.chunks_exact_mut(self.channels) {
            carrier.squeeze(pixel, headroom);
        }
    }
}
