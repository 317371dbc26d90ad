//! Description captions and the text-rendering capability.

use sinemtf_core::GrayImage;

/// Draws a single line of caption text.
pub trait TextRenderer {
    /// Draw `text` in black on a white `width × height` tile.
    fn render_line(&self, text: &str, width: usize, height: usize) -> GrayImage;
}

/// Leaves captions blank; charts stay measurable without a font.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlankText;

impl TextRenderer for BlankText {
    fn render_line(&self, _text: &str, width: usize, height: usize) -> GrayImage {
        GrayImage::filled(width, height, 255)
    }
}

/// `"Tile freqs (lp/mm): 5.00, 10.00"`.
pub fn sine_block_caption(frequencies_lpmm: &[f64]) -> String {
    let list: Vec<String> = frequencies_lpmm.iter().map(|f| format!("{f:.2}")).collect();
    format!("Tile freqs (lp/mm): {}", list.join(", "))
}

/// `"DICT_4X4_50; Index 3; 20mm x 20mm"`.
pub fn fiducial_caption(dictionary: &str, id: u32, side_mm: f64) -> String {
    format!("{dictionary}; Index {id}; {side_mm}mm x {side_mm}mm")
}
