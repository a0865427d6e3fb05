// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metadata and preview helpers built on the pipeline.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use enhancer_core::config::{EnhancementConfig, SuperResolution};
use enhancer_core::error::{EnhancerError, Result};
use enhancer_core::types::{ImageInfo, PreviewImages};
use image::{ColorType, ImageDecoder, ImageFormat, ImageReader};
use tracing::{error, instrument};

use crate::pipeline::enhancer::Enhancer;
use crate::raster::ImageProcessor;

/// Read width, height, container format and channel layout from the image
/// header without decoding pixel data.
///
/// Any failure is logged and reported as `None`.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn image_info(data: &[u8]) -> Option<ImageInfo> {
    match read_header(data) {
        Ok(info) => Some(info),
        Err(err) => {
            error!(error = %err, "Could not read image header");
            None
        }
    }
}

fn read_header(data: &[u8]) -> Result<ImageInfo> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let format = reader
        .format()
        .ok_or_else(|| EnhancerError::Decode("unrecognised image format".into()))?;
    let decoder = reader
        .into_decoder()
        .map_err(|err| EnhancerError::Decode(err.to_string()))?;
    let (width, height) = decoder.dimensions();

    Ok(ImageInfo {
        width,
        height,
        format: format_name(format),
        mode: mode_name(decoder.color_type()),
        size_bytes: data.len(),
    })
}

/// Upper-case container name, e.g. `PNG` or `JPEG`.
pub fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Pnm => "PPM".to_string(),
        ImageFormat::OpenExr => "EXR".to_string(),
        other => format!("{other:?}").to_uppercase(),
    }
}

/// Channel layout name, e.g. `RGB`, `LA` or `I;16`.
pub fn mode_name(color: ColorType) -> String {
    let name = match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        other => return format!("{other:?}"),
    };
    name.to_string()
}

/// `data:image/png;base64,...` URI for PNG bytes.
pub fn data_uri(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png)
    )
}

impl Enhancer {
    /// Header metadata for `data`. See [`image_info`].
    pub fn image_info(&self, data: &[u8]) -> Option<ImageInfo> {
        image_info(data)
    }

    /// Original, enhanced, and enhanced-at-2x renditions as PNG data URIs.
    ///
    /// The 2x rendition uses `config` with the upscale factor forced to 2.
    #[instrument(skip(self, data, config), fields(data_len = data.len()))]
    pub fn preview(&self, data: &[u8], config: &EnhancementConfig) -> Result<PreviewImages> {
        let original = ImageProcessor::from_bytes(data)?.to_png_bytes()?;
        let enhanced = self.enhance(data, config)?;
        let doubled = config.with_super_resolution(SuperResolution::X2);
        let enhanced_2x = self.enhance(data, &doubled)?;

        Ok(PreviewImages {
            original: data_uri(&original),
            enhanced: data_uri(&enhanced),
            enhanced_2x: data_uri(&enhanced_2x),
        })
    }
}
