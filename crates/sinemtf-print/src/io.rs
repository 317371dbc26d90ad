//! Writing charts to disk: 8-bit grayscale PNG plus the JSON description.

use crate::{ChartLayout, PrintError};
use sinemtf_core::{GrayImage, MM_PER_INCH};
use std::{fs::File, io::BufWriter, io::Write, path::Path};

/// Encode `image` as an 8-bit grayscale PNG.
///
/// With `dpi` set, the physical resolution is stored in the `pHYs` chunk so
/// printing software reproduces the designed size.
pub fn write_png<W: Write>(out: W, image: &GrayImage, dpi: Option<f64>) -> Result<(), PrintError> {
    let mut encoder = png::Encoder::new(out, image.width as u32, image.height as u32);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    if let Some(dpi) = dpi {
        let ppm = (dpi * 1000.0 / MM_PER_INCH).round() as u32;
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
    }
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.data)?;
    writer.finish()?;
    Ok(())
}

pub fn save_png(path: impl AsRef<Path>, image: &GrayImage, dpi: Option<f64>) -> Result<(), PrintError> {
    let file = File::create(path)?;
    write_png(BufWriter::new(file), image, dpi)
}

impl ChartLayout {
    /// Write the chart bitmap and its description.
    pub fn write(
        &self,
        png_path: impl AsRef<Path>,
        json_path: impl AsRef<Path>,
    ) -> Result<(), PrintError> {
        save_png(png_path, &self.image, self.description.dpi)?;
        self.description.write_json(json_path)?;
        Ok(())
    }
}
