//! Chart composition.
//!
//! ```text
//! +------------------+-----+----------+
//! | sine block       | gap | fiducial |   top row
//! | (rotated 90° CCW)|     |          |
//! +------------------+-----+----------+
//! | captions         |                |   middle row
//! +------------------+----------------+
//! | black | ramp | white              |   reference strip
//! +-----------------------------------+
//! ```

use crate::text::{fiducial_caption, sine_block_caption, TextRenderer};
use crate::tiles::{draw_reference_strip, draw_sine_block, period_px, rotate_ccw};
use crate::{ChartSpec, PrintError};
use sinemtf_aruco::MarkerRenderer;
use sinemtf_core::{
    mm_to_pixels, pixels_to_mm, ChartDescription, ConfigurationError, FiducialRegion, GrayImage,
    ReferenceStrip, SineBlock, SizeMm, SizePx, Xywhr,
};
use std::f64::consts::FRAC_PI_2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A rendered chart and its geometric description.
#[derive(Clone, Debug)]
pub struct ChartLayout {
    pub image: GrayImage,
    pub description: ChartDescription,
}

fn px(what: &'static str, mm: f64, dpi: f64) -> Result<usize, ConfigurationError> {
    let p = mm_to_pixels(mm, dpi);
    if p < 1 {
        return Err(ConfigurationError::InvalidDimension { what, value: mm });
    }
    Ok(p as usize)
}

fn warn_on_sampling(spec: &ChartSpec) {
    let sine = &spec.sine;
    if sine.subpixel_samples > 1 && sine.subpixel_samples % 2 == 0 {
        log::warn!(
            "subpixel sample count {} is even; an odd count keeps the pixel center sampled",
            sine.subpixel_samples
        );
    }
    for &lpmm in &sine.frequencies_lpmm {
        let period_mm = 1.0 / lpmm;
        if sine.length_mm < 10.0 * period_mm {
            log::warn!("{lpmm} lp/mm: tile length is less than 10 periods");
        }
        if sine.tile_height_mm < 2.0 * period_mm {
            log::warn!("{lpmm} lp/mm: tile height is less than 2 periods");
        }
        let period = period_px(lpmm, spec.dpi);
        if period < 2.0 {
            log::warn!(
                "{lpmm} lp/mm: period {period:.3} px is below 2 px at {} dpi and cannot be printed",
                spec.dpi
            );
        }
    }
}

/// Render the chart described by `spec`.
///
/// The marker bitmap comes from `marker`, captions from `text`. The
/// returned description matches the bitmap pixel for pixel.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(spec, marker, text), fields(dpi = spec.dpi)))]
pub fn generate_chart(
    spec: &ChartSpec,
    marker: &dyn MarkerRenderer,
    text: &dyn TextRenderer,
) -> Result<ChartLayout, PrintError> {
    spec.validate()?;
    warn_on_sampling(spec);

    let dpi = spec.dpi;
    let freqs = &spec.sine.frequencies_lpmm;
    let n = freqs.len();

    let m = px("fiducial side", spec.fiducial.side_mm, dpi)?;
    let fiducial = marker.render(spec.fiducial.id, m)?;
    let length = px("sine tile length", spec.sine.length_mm, dpi)?;
    let tile_h = px("sine tile height", spec.sine.tile_height_mm, dpi)?;
    let strip_h = px("reference strip height", spec.reference.height_mm, dpi)?;

    let block = rotate_ccw(&draw_sine_block(
        freqs,
        length,
        tile_h,
        dpi,
        spec.sine.subpixel_samples,
    ));
    let block_w = block.width; // n * tile_h

    let gap = ((m as f64 / marker.modules_per_side() as f64).round() as usize).max(1);
    let width = block_w + gap + m;
    let top_h = length.max(m);

    let sine_text_h = (spec.text_height_ratio * block_w as f64).round() as usize;
    let fid_text_h = (spec.text_height_ratio * m as f64).round() as usize;
    let mid_h = gap.max(sine_text_h + fid_text_h);
    let height = top_h + mid_h + strip_h;

    log::debug!(
        "chart layout: {width}x{height} px, block {block_w}x{length}, marker {m}, gap {gap}, captions {sine_text_h}+{fid_text_h}"
    );

    let mut canvas = GrayImage::filled(width, height, 255);
    canvas.paste(&block, 0, 0);
    canvas.paste(&fiducial, block_w + gap, 0);

    let captions_bottom = top_h + mid_h;
    if sine_text_h > 0 {
        let tile = text.render_line(&sine_block_caption(freqs), block_w, sine_text_h);
        canvas.paste(&tile, 0, captions_bottom - fid_text_h - sine_text_h);
    }
    if fid_text_h > 0 {
        let caption = fiducial_caption(marker.name(), spec.fiducial.id, spec.fiducial.side_mm);
        let tile = text.render_line(&caption, block_w, fid_text_h);
        canvas.paste(&tile, 0, captions_bottom - fid_text_h);
    }
    canvas.paste(&draw_reference_strip(width, strip_h), 0, top_h + mid_h);

    let description = ChartDescription {
        total_size_px: SizePx {
            h: height,
            w: width,
        },
        total_size_mm: SizeMm {
            h: pixels_to_mm(height as f64, dpi),
            w: pixels_to_mm(width as f64, dpi),
        },
        fiducial: FiducialRegion {
            id: spec.fiducial.id,
            xywhr: Xywhr::axis_aligned((block_w + gap) as f64, 0.0, m as f64, m as f64),
            physical_width_mm: pixels_to_mm(m as f64, dpi),
        },
        sine_block: SineBlock {
            xywhr: Xywhr::new(
                0.0,
                length as f64,
                length as f64,
                (n * tile_h) as f64,
                -FRAC_PI_2,
            ),
            frequencies_lpmm: freqs.clone(),
        },
        reference_strip: ReferenceStrip {
            xywhr: Xywhr::axis_aligned(0.0, (top_h + mid_h) as f64, width as f64, strip_h as f64),
        },
        dpi: Some(dpi),
        dictionary: Some(marker.name().to_string()),
    };
    description.validate()?;

    Ok(ChartLayout {
        image: canvas,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{FiducialSpec, ReferenceSpec, SineSpec};
    use crate::text::BlankText;
    use crate::tiles::{draw_sine_tile, sine_profile};
    use sinemtf_aruco::builtins::DICT_4X4_50;
    use sinemtf_core::rect_to_corners;
    use std::cell::RefCell;

    fn spec() -> ChartSpec {
        ChartSpec {
            dpi: 600.0,
            fiducial: FiducialSpec {
                id: 3,
                side_mm: 5.08, // 120 px
            },
            sine: SineSpec {
                frequencies_lpmm: vec![0.5, 1.0, 2.0],
                length_mm: 10.16,     // 240 px
                tile_height_mm: 1.27, // 30 px
                subpixel_samples: 11,
            },
            reference: ReferenceSpec {
                height_mm: 0.846_666, // 20 px
            },
            text_height_ratio: 0.06,
        }
    }

    #[test]
    fn geometry_matches_bitmap() {
        let s = spec();
        let chart = generate_chart(&s, &DICT_4X4_50, &BlankText).expect("chart");
        let d = &chart.description;

        // 90 block + 20 gap + 120 marker; 240 top + max(20, 5 + 7) + 20 strip
        assert_eq!(d.total_size_px, SizePx { h: 280, w: 230 });
        assert_eq!((chart.image.width, chart.image.height), (230, 280));
        assert_eq!(d.fiducial.xywhr, Xywhr::axis_aligned(110.0, 0.0, 120.0, 120.0));
        assert!((d.fiducial.physical_width_mm - 5.08).abs() < 1e-9);
        assert_eq!(d.reference_strip.xywhr, Xywhr::axis_aligned(0.0, 260.0, 230.0, 20.0));
        assert_eq!(d.sine_block.xywhr, Xywhr::new(0.0, 240.0, 240.0, 90.0, -FRAC_PI_2));
        assert_eq!(d.dictionary.as_deref(), Some("DICT_4X4_50"));

        // fiducial pixels are exactly the rendered marker
        let marker = DICT_4X4_50.render(3, 120).expect("marker");
        assert_eq!(chart.image.crop(110, 0, 120, 120), marker);
        // gap column and the area below the marker are white
        assert!((0..240).all(|y| chart.image.get(100, y) == 255));
        assert!(chart.image.crop(110, 120, 120, 140).data.iter().all(|&v| v == 255));

        // reference strip
        let strip = chart.image.crop(0, 260, 230, 20);
        assert_eq!(strip, crate::tiles::draw_reference_strip(230, 20));
    }

    #[test]
    fn sine_tiles_run_upwards_from_block_origin() {
        let s = spec();
        let chart = generate_chart(&s, &DICT_4X4_50, &BlankText).expect("chart");
        let tiles = chart.description.sine_block.tiles();
        for (a, (lpmm, rect)) in tiles.iter().enumerate() {
            let profile = sine_profile(*lpmm, 240, 600.0, 11);
            // the tile's local x axis points up the chart
            let c = rect_to_corners(rect);
            assert!((c[0].x - (a * 30) as f64).abs() < 1e-9);
            assert!((c[1].y - 0.0).abs() < 1e-9);
            for (k, &want) in profile.iter().enumerate() {
                let row = 239 - k;
                for col in a * 30..(a + 1) * 30 {
                    assert_eq!(chart.image.get(col, row), want, "tile {a} k {k}");
                }
            }
        }
        // tile a is the rotated unstacked tile
        let t = draw_sine_tile(1.0, 240, 30, 600.0, 11);
        assert_eq!(chart.image.crop(30, 0, 30, 240), rotate_ccw(&t));
    }

    struct RecordingText(RefCell<Vec<(String, usize, usize)>>);

    impl TextRenderer for RecordingText {
        fn render_line(&self, text: &str, width: usize, height: usize) -> GrayImage {
            self.0.borrow_mut().push((text.to_string(), width, height));
            GrayImage::filled(width, height, 128)
        }
    }

    #[test]
    fn captions_sit_bottom_aligned_in_middle_row() {
        let text = RecordingText(RefCell::new(Vec::new()));
        let chart = generate_chart(&spec(), &DICT_4X4_50, &text).expect("chart");
        let calls = text.0.borrow();
        assert_eq!(
            *calls,
            vec![
                ("Tile freqs (lp/mm): 0.50, 1.00, 2.00".to_string(), 90, 5),
                ("DICT_4X4_50; Index 3; 5.08mm x 5.08mm".to_string(), 90, 7),
            ]
        );
        // middle row spans 240..260; captions fill 248..260
        assert_eq!(chart.image.get(0, 247), 255);
        assert_eq!(chart.image.get(0, 248), 128);
        assert_eq!(chart.image.get(89, 259), 128);
        assert_eq!(chart.image.get(90, 250), 255);
    }

    #[test]
    fn tall_captions_grow_the_middle_row() {
        let mut s = spec();
        s.text_height_ratio = 0.2; // 18 + 24 px > 20 px gap
        let chart = generate_chart(&s, &DICT_4X4_50, &BlankText).expect("chart");
        assert_eq!(chart.description.reference_strip.xywhr.y, 240.0 + 42.0);
    }

    #[test]
    fn marker_taller_than_tiles_sets_top_row() {
        let mut s = spec();
        s.sine.length_mm = 2.54; // 60 px < 120 px marker
        let chart = generate_chart(&s, &DICT_4X4_50, &BlankText).expect("chart");
        assert_eq!(chart.description.sine_block.xywhr.y, 60.0);
        assert_eq!(chart.description.reference_strip.xywhr.y, 140.0);
        assert!((0..90).all(|x| chart.image.get(x, 100) == 255));
    }

    #[test]
    fn sizes_that_round_to_zero_are_rejected() {
        let mut s = spec();
        s.sine.tile_height_mm = 0.01;
        assert!(matches!(
            generate_chart(&s, &DICT_4X4_50, &BlankText),
            Err(PrintError::Configuration(ConfigurationError::InvalidDimension {
                what: "sine tile height",
                ..
            }))
        ));
        let mut s = spec();
        s.fiducial.id = 77;
        assert!(matches!(
            generate_chart(&s, &DICT_4X4_50, &BlankText),
            Err(PrintError::Marker(_))
        ));
    }

    #[test]
    fn dictionary_wider_than_64_bits_is_an_error() {
        let wide: sinemtf_aruco::Dictionary =
            serde_json::from_str(r#"{ "name": "wide", "marker_size": 9, "codes": [1, 2, 3, 4] }"#)
                .expect("parse");
        assert!(matches!(
            generate_chart(&spec(), &wide, &BlankText),
            Err(PrintError::Marker(sinemtf_aruco::MarkerError::TooManyBits { bits: 81, .. }))
        ));
    }
}
