use image::{ImageFormat, RgbImage};
use rdpwn_runtime::{Canvas, ReplayReport};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub const INITIAL_IMAGE: &str = "initial.bmp";
pub const FINAL_IMAGE: &str = "final.bmp";
pub const RUN_REPORT: &str = "run.json";
const REPORT_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RunArtifact {
    pub role: String,
    pub path: String,
    pub sha256: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct TargetInfo {
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub schema_version: &'static str,
    pub target: TargetInfo,
    pub trace: String,
    #[serde(flatten)]
    pub replay: &'a ReplayReport,
    pub artifacts: Vec<RunArtifact>,
}

impl<'a> RunReport<'a> {
    pub fn new(target: TargetInfo, trace: &Path, replay: &'a ReplayReport) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            target,
            trace: trace.display().to_string(),
            replay,
            artifacts: Vec::new(),
        }
    }
}

pub fn save_canvas(canvas: &Canvas, path: &Path, role: &str) -> Result<RunArtifact, String> {
    let image = RgbImage::from_raw(canvas.width(), canvas.height(), canvas.to_rgb_bytes())
        .ok_or_else(|| format!("canvas buffer does not match {}x{}", canvas.width(), canvas.height()))?;
    image
        .save_with_format(path, ImageFormat::Bmp)
        .map_err(|err| format!("write {}: {err}", path.display()))?;
    describe_artifact(path, role)
}

/// Saves whichever canvases the session kept. `final.bmp` only exists when a
/// method was classified.
pub fn save_canvases(report: &ReplayReport, out_dir: &Path) -> Result<Vec<RunArtifact>, String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("create output dir {}: {err}", out_dir.display()))?;
    let mut artifacts = Vec::new();
    if let Some(initial) = &report.initial {
        artifacts.push(save_canvas(initial, &out_dir.join(INITIAL_IMAGE), "initial")?);
    }
    if let Some(final_canvas) = &report.final_canvas {
        artifacts.push(save_canvas(final_canvas, &out_dir.join(FINAL_IMAGE), "final")?);
    }
    Ok(artifacts)
}

pub fn write_run_report(report: &RunReport<'_>, out_dir: &Path) -> Result<PathBuf, String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("create output dir {}: {err}", out_dir.display()))?;
    let path = out_dir.join(RUN_REPORT);
    let json = serde_json::to_string_pretty(report).map_err(|err| err.to_string())?;
    fs::write(&path, json).map_err(|err| format!("write {}: {err}", path.display()))?;
    Ok(path)
}

fn describe_artifact(path: &Path, role: &str) -> Result<RunArtifact, String> {
    let bytes = fs::read(path).map_err(|err| format!("read {}: {err}", path.display()))?;
    Ok(RunArtifact {
        role: role.to_string(),
        path: path.display().to_string(),
        sha256: sha256_hex(&bytes),
        size: bytes.len() as u64,
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    format!("{:x}", digest)
}
