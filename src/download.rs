// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose model download.
//!
//! When the default pose model is missing it is fetched from the Ultralytics
//! asset releases, streamed to a `.part` file and renamed into place.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{Result, RigError};

/// Default pose model file name.
pub const DEFAULT_POSE_MODEL: &str = "yolo11n-pose.onnx";

const DEFAULT_POSE_MODEL_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v8.3.0/yolo11n-pose.onnx";

const CONNECT_TIMEOUT: u64 = 30;
const READ_TIMEOUT: u64 = 300;
const BAR_WIDTH: usize = 12;
const MIN_UPDATE_INTERVAL: f64 = 0.1;

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1}GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1}KB", bytes / KB)
    } else {
        format!("{bytes:.0}B")
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn generate_bar(progress: f64, width: usize) -> String {
    let filled = ((progress * width as f64) as usize).min(width);
    let partial = progress * width as f64 - filled as f64;

    let mut bar = "━".repeat(filled);
    if filled < width {
        if partial > 0.5 {
            bar.push('╸');
            bar.push_str(&"─".repeat(width - filled - 1));
        } else {
            bar.push_str(&"─".repeat(width - filled));
        }
    }
    bar
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn print_progress(desc: &str, downloaded: u64, total: u64, elapsed: f64, done: bool) {
    let rate = if elapsed > 0.0 { downloaded as f64 / elapsed } else { 0.0 };
    let rate = format_bytes(rate as u64);
    let line = if total > 0 {
        let progress = (downloaded as f64 / total as f64).min(1.0);
        format!(
            "{desc}: {}% {} {}/{} {rate}/s {elapsed:.1}s",
            (progress * 100.0) as u8,
            generate_bar(progress, BAR_WIDTH),
            format_bytes(downloaded),
            format_bytes(total)
        )
    } else {
        format!("{desc}: {} {rate}/s {elapsed:.1}s", format_bytes(downloaded))
    };
    if done {
        eprintln!("\r\x1b[K{line}");
    } else {
        eprint!("\r\x1b[K{line}");
        std::io::stderr().flush().ok();
    }
}

fn download_file(url: &str, dest: &Path) -> Result<()> {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(Duration::from_secs(CONNECT_TIMEOUT)))
        .timeout_recv_body(Some(Duration::from_secs(READ_TIMEOUT)))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let response = agent.get(url).call().map_err(|e| {
        let msg = match &e {
            ureq::Error::Timeout(_) => format!("Connection timed out while downloading {url}"),
            ureq::Error::Io(io_err) => format!("Network error downloading {url}: {io_err}"),
            _ => format!("Failed to download {url}: {e}"),
        };
        RigError::ModelLoadError(msg)
    })?;

    let total: u64 = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let mut temp = dest.as_os_str().to_owned();
    temp.push(".part");
    let temp_path = PathBuf::from(temp);
    let _ = fs::remove_file(&temp_path);

    let desc = format!("Downloading {url} to '{}'", dest.display());
    let start = Instant::now();

    let streamed = (|| -> Result<u64> {
        let file = File::create(&temp_path).map_err(|e| {
            RigError::ModelLoadError(format!("Failed to create temp file {}: {e}", temp_path.display()))
        })?;
        let mut writer = BufWriter::new(file);
        let mut reader = response.into_body().into_reader();
        let mut buffer = [0u8; 65536];
        let mut downloaded: u64 = 0;
        let mut last_update = Instant::now();

        loop {
            let n = reader
                .read(&mut buffer)
                .map_err(|e| RigError::ModelLoadError(format!("Failed to read from network: {e}")))?;
            if n == 0 {
                break;
            }
            writer
                .write_all(&buffer[..n])
                .map_err(|e| RigError::ModelLoadError(format!("Failed to write to temp file: {e}")))?;
            downloaded += n as u64;

            if last_update.elapsed().as_secs_f64() >= MIN_UPDATE_INTERVAL {
                last_update = Instant::now();
                print_progress(&desc, downloaded, total, start.elapsed().as_secs_f64(), false);
            }
        }
        writer
            .flush()
            .map_err(|e| RigError::ModelLoadError(format!("Failed to flush temp file: {e}")))?;
        Ok(downloaded)
    })();

    let downloaded = match streamed {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
    };
    print_progress(&desc, downloaded, total, start.elapsed().as_secs_f64(), true);

    fs::rename(&temp_path, dest).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        RigError::ModelLoadError(format!("Failed to move downloaded file to {}: {e}", dest.display()))
    })
}

/// Download the model at `model_path` if it is the default pose model.
///
/// # Errors
///
/// Returns [`RigError::ModelLoadError`] for any other file name or when the
/// download fails.
pub fn try_download_model<P: AsRef<Path>>(model_path: P) -> Result<PathBuf> {
    let path = model_path.as_ref();
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if filename != DEFAULT_POSE_MODEL {
        return Err(RigError::ModelLoadError(format!(
            "Model file not found: {}. Auto-download is only supported for {DEFAULT_POSE_MODEL}",
            path.display(),
        )));
    }

    download_file(DEFAULT_POSE_MODEL_URL, path)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_returns_error() {
        let err = try_download_model("unknown_model.onnx").unwrap_err().to_string();
        assert!(err.contains("Auto-download is only supported"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500B");
        assert_eq!(format_bytes(1024), "1.0KB");
        assert_eq!(format_bytes(1_048_576), "1.0MB");
    }

    #[test]
    fn test_generate_bar() {
        assert_eq!(generate_bar(0.0, 10), "──────────");
        assert_eq!(generate_bar(1.0, 10), "━━━━━━━━━━");
        assert_eq!(generate_bar(0.5, 10), "━━━━━─────");
    }
}
