use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;

use crate::analysis::error::AnalysisError;
use crate::analysis::fft::SpectralProfile;
use crate::analysis::rank::CrossBinAggregate;
use crate::analysis::series::{BinKey, BinnedSeries};

/// Largest accepted chart width or height, in pixels.
pub const MAX_PLOT_DIMENSION: u32 = 8192;

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
    /// Draw caption, mesh and axis labels. Without it nothing needs a font.
    pub annotate: bool,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 768,
            height: 768,
            background: RGBColor(10, 10, 10),
            palette: vec![CYAN, YELLOW, MAGENTA, GREEN, RED, BLUE, WHITE],
            annotate: true,
        }
    }
}
impl PlotStyle {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
    fn color(&self, idx: usize) -> RGBColor {
        if self.palette.is_empty() {
            return WHITE;
        }
        self.palette[idx % self.palette.len()]
    }
}

/// One histogram bar spanning `[start, end)` on the x axis.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bar {
    start: f64,
    end: f64,
    height: f64,
}

/// Mean irradiance per wavelength bin, bars spanning each bin's interval.
pub fn render_bin_means_png(
    binned: &BinnedSeries,
    style: &PlotStyle,
) -> Result<Vec<u8>, AnalysisError> {
    let bins: Vec<_> = binned.iter().map(|(_, bin)| bin).collect();
    let bars: Vec<Bar> = bins
        .iter()
        .enumerate()
        .map(|(idx, bin)| {
            // coarse keys carry no upper bound; run up to the next bin
            let end = match bin.key.max_wavelength {
                Some(max) => max,
                None => bins
                    .get(idx + 1)
                    .map(|next| next.key.min_wavelength)
                    .unwrap_or(bin.key.min_wavelength + 1.0),
            };
            Bar {
                start: bin.key.min_wavelength,
                end,
                height: bin.mean_irradiance(),
            }
        })
        .collect();
    render_bars("Spectrum", &bars, style, 0)
}

pub fn render_profile_png(
    key: &BinKey,
    profile: &SpectralProfile,
    style: &PlotStyle,
) -> Result<Vec<u8>, AnalysisError> {
    let title = format!("Frequency {key}");
    render_bars(&title, &frequency_bars(&profile.magnitudes), style, 1)
}

pub fn render_mean_spectrum_png(
    aggregate: &CrossBinAggregate,
    style: &PlotStyle,
) -> Result<Vec<u8>, AnalysisError> {
    render_bars(
        "Mean Frequency Magnitude",
        &frequency_bars(&aggregate.mean_spectrum()),
        style,
        2,
    )
}

pub fn render_average_rank_png(
    aggregate: &CrossBinAggregate,
    style: &PlotStyle,
) -> Result<Vec<u8>, AnalysisError> {
    if aggregate.average_rank.is_empty() {
        return Err(AnalysisError::Plot("average rank profile is empty".into()));
    }
    let points: Vec<(f64, f64)> = aggregate
        .average_rank
        .iter()
        .enumerate()
        .map(|(f, &rank)| (f as f64, rank))
        .collect();
    let (x_min, x_max) = padded_range(0.0, (points.len() - 1) as f64);
    let (y_min, y_max) = padded_range(
        0.0,
        points.iter().map(|p| p.1).fold(0.0f64, f64::max),
    );
    let color = style.color(3);
    let mut buffer = pixel_buffer(style)?;
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.annotate {
            builder
                .caption(
                    "Average Frequency Rank",
                    ("sans-serif", 20).into_font().color(&WHITE),
                )
                .set_label_area_size(LabelAreaPosition::Left, 45)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        if style.annotate {
            chart
                .configure_mesh()
                .light_line_style(&WHITE.mix(0.1))
                .draw()?;
        }
        chart.draw_series(LineSeries::new(points, &color))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

fn frequency_bars(magnitudes: &[f64]) -> Vec<Bar> {
    magnitudes
        .iter()
        .enumerate()
        .map(|(f, &height)| Bar {
            start: f as f64,
            end: f as f64 + 1.0,
            height,
        })
        .collect()
}

fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON || !(hi - lo).is_finite() {
        (lo, lo + 1.0)
    } else {
        (lo, hi)
    }
}

fn render_bars(
    title: &str,
    bars: &[Bar],
    style: &PlotStyle,
    color_idx: usize,
) -> Result<Vec<u8>, AnalysisError> {
    if bars.is_empty() {
        return Err(AnalysisError::Plot(format!("{title}: nothing to draw")));
    }
    let (x_min, x_max) = padded_range(
        bars.iter().map(|b| b.start).fold(f64::INFINITY, f64::min),
        bars.iter().map(|b| b.end).fold(f64::NEG_INFINITY, f64::max),
    );
    let (y_min, y_max) = padded_range(
        bars.iter().map(|b| b.height).fold(0.0f64, f64::min),
        bars.iter().map(|b| b.height).fold(0.0f64, f64::max),
    );
    let color = style.color(color_idx);
    let mut buffer = pixel_buffer(style)?;
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.annotate {
            builder
                .caption(title, ("sans-serif", 20).into_font().color(&WHITE))
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        if style.annotate {
            chart
                .configure_mesh()
                .light_line_style(&WHITE.mix(0.1))
                .draw()?;
        }
        chart.draw_series(
            bars.iter()
                .map(|b| Rectangle::new([(b.start, 0.0), (b.end, b.height)], color.filled())),
        )?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

/// Zeroed RGB buffer for the style's canvas.
fn pixel_buffer(style: &PlotStyle) -> Result<Vec<u8>, AnalysisError> {
    if style.width == 0
        || style.height == 0
        || style.width > MAX_PLOT_DIMENSION
        || style.height > MAX_PLOT_DIMENSION
    {
        return Err(AnalysisError::Plot(format!(
            "canvas {}x{} outside 1..={MAX_PLOT_DIMENSION}",
            style.width, style.height
        )));
    }
    let len = (style.width as usize)
        .checked_mul(style.height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| AnalysisError::Plot("canvas size overflows".into()))?;
    Ok(vec![0u8; len])
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, AnalysisError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| AnalysisError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
