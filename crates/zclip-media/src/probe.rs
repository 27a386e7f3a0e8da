//! FFprobe image information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Pixel dimensions of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: i64,
    pub height: i64,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<i64>,
    height: Option<i64>,
}

/// Probe the width and height of an image (or the first frame of a video).
pub async fn probe_dimensions(ffprobe_bin: &str, path: impl AsRef<Path>) -> MediaResult<ImageDimensions> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let binary =
        which::which(ffprobe_bin).map_err(|_| MediaError::FfprobeNotFound(ffprobe_bin.to_string()))?;

    let output = Command::new(binary)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_dimensions(&output.stdout)
}

/// Extract dimensions from ffprobe's JSON output.
fn parse_dimensions(stdout: &[u8]) -> MediaResult<ImageDimensions> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| MediaError::InvalidImage("No video stream found".to_string()))?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => Ok(ImageDimensions { width, height }),
        _ => Err(MediaError::InvalidImage(
            "Stream has no usable width/height".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        let json = br#"{"programs": [], "streams": [{"width": 1920, "height": 1080}]}"#;
        assert_eq!(
            parse_dimensions(json).unwrap(),
            ImageDimensions {
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn test_parse_dimensions_no_stream() {
        let err = parse_dimensions(br#"{"streams": []}"#).unwrap_err();
        assert!(matches!(err, MediaError::InvalidImage(_)));
        let err = parse_dimensions(br#"{}"#).unwrap_err();
        assert!(matches!(err, MediaError::InvalidImage(_)));
    }

    #[test]
    fn test_parse_dimensions_bad_json() {
        assert!(matches!(
            parse_dimensions(b"not json").unwrap_err(),
            MediaError::JsonParse(_)
        ));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_dimensions("ffprobe", "/nonexistent/zclip.png").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
