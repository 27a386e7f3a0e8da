//! FFmpeg filter-graph derivation for still-image renders.
//!
//! The graph is a pure function of the job and the options: the same inputs
//! always produce a byte-identical filter string.

use std::fmt;

use zclip_models::encoding::{DEFAULT_PIXEL_FORMAT, MAX_ZOOM_FACTOR, MIN_ZOOM_FACTOR};
use zclip_models::{zoom_rate, RenderJob};

/// Options that shape the graph independently of the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// Pixel format every frame is normalized to
    pub pixel_format: String,
    /// Whether the zoom fragment is appended to the graph
    pub apply_zoom: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            apply_zoom: false,
        }
    }
}

/// A single stage of the filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterStage {
    /// Pixel-format normalization
    Format(String),
    /// Centered crop-to-fill
    Crop {
        width: i64,
        height: i64,
        x: i64,
        y: i64,
    },
    /// Fit inside the box, then letterbox to its exact size
    Pad { width: i64, height: i64 },
    /// Progressive centered zoom, one output frame per input frame
    Zoom {
        rate: f64,
        width: i64,
        height: i64,
        fps: u32,
    },
    /// Exact final resize
    Scale { width: i64, height: i64 },
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStage::Format(pix_fmt) => write!(f, "format={}", pix_fmt),
            FilterStage::Crop { width, height, x, y } => {
                write!(f, "crop={}:{}:{}:{}", width, height, x, y)
            }
            FilterStage::Pad { width, height } => write!(
                f,
                "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
                w = width,
                h = height
            ),
            FilterStage::Zoom {
                rate,
                width,
                height,
                fps,
            } => {
                let z = if *rate >= 0.0 {
                    format!("min(pzoom+{},{})", format_rate(*rate), MAX_ZOOM_FACTOR)
                } else {
                    format!("max(pzoom-{},{})", format_rate(rate.abs()), MIN_ZOOM_FACTOR)
                };
                write!(
                    f,
                    "zoompan=z='{}':d=1:x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={}x{}:fps={}",
                    z, width, height, fps
                )
            }
            FilterStage::Scale { width, height } => write!(f, "scale={}:{}", width, height),
        }
    }
}

/// Ordered filter chain for one render job.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    stages: Vec<FilterStage>,
}

impl FilterGraph {
    /// Derive the chain: format, then crop or pad, then zoom (if enabled), then scale.
    pub fn build(job: &RenderJob, options: &FilterOptions) -> Self {
        let mut stages = vec![FilterStage::Format(options.pixel_format.clone())];

        if let Some(stage) = crop_or_pad_fragment(job) {
            stages.push(stage);
        }

        if options.apply_zoom {
            if let Some(stage) = zoom_fragment(job) {
                stages.push(stage);
            }
        }

        stages.push(scale_fragment(job));

        Self { stages }
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    /// Render the `-vf` argument.
    pub fn to_filter_string(&self) -> String {
        self.stages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_filter_string())
    }
}

/// Crop when enabled, pad otherwise; nothing when the sizes already match.
pub fn crop_or_pad_fragment(job: &RenderJob) -> Option<FilterStage> {
    if job.dimensions_match() {
        return None;
    }

    if job.crop_enabled {
        let width = job.input_width.min(job.output_width);
        let height = job.input_height.min(job.output_height);
        Some(FilterStage::Crop {
            width,
            height,
            x: (job.input_width - width) / 2,
            y: (job.input_height - height) / 2,
        })
    } else {
        Some(FilterStage::Pad {
            width: job.output_width,
            height: job.output_height,
        })
    }
}

/// Zoom stage for a non-zero zoom percentage.
pub fn zoom_fragment(job: &RenderJob) -> Option<FilterStage> {
    if job.zoom_percent == 0 {
        return None;
    }
    Some(FilterStage::Zoom {
        rate: zoom_rate(job.zoom_percent),
        width: job.output_width,
        height: job.output_height,
        fps: job.framerate,
    })
}

pub fn scale_fragment(job: &RenderJob) -> FilterStage {
    FilterStage::Scale {
        width: job.output_width,
        height: job.output_height,
    }
}

/// Fixed-precision rate without float noise (0.1 * 0.03 prints as 0.003).
fn format_rate(rate: f64) -> String {
    let formatted = format!("{:.6}", rate);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
