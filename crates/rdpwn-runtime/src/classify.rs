use rdpwn_gfx::{Canvas, Rgb};
use serde::Serialize;

pub const PROMPT_RATIO_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorCounts {
    pub dark: usize,
    pub light: usize,
}

impl ColorCounts {
    pub fn of(canvas: &Canvas) -> Self {
        Self {
            dark: canvas.count_color(Rgb::BLACK),
            light: canvas.count_color(Rgb::WHITE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub before: ColorCounts,
    pub after: ColorCounts,
    pub ratio: f64,
    pub target_reached: bool,
}

pub fn classify(before: &Canvas, after: &Canvas) -> Classification {
    classify_counts(ColorCounts::of(before), ColorCounts::of(after))
}

pub fn classify_counts(before: ColorCounts, after: ColorCounts) -> Classification {
    let dark_delta = after.dark as f64 - before.dark as f64;
    let denominator = if after.light != before.light {
        after.light as f64 - before.light as f64
    } else {
        after.light as f64
    };
    // Zero only when both canvases lack white entirely.
    let denominator = if denominator == 0.0 { 1.0 } else { denominator };
    let ratio = dark_delta / denominator;
    Classification {
        before,
        after,
        ratio,
        target_reached: ratio > PROMPT_RATIO_THRESHOLD,
    }
}
