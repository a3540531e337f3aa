// Ce module utilise ffmpeg via subprocess (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
//   - `query_video`       : interroge ffprobe pour width/height/fps/nb_frames/rotation
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGB24 sur stdout, taille forcée
//   - `VideoSource`       : lit une frame à la fois depuis le pipe

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use cg_core::error::TileError;
use cg_core::frame::{Channels, RawFrame, TimedFrame};
use cg_core::traits::FrameSource;

/// Extensions vidéo reconnues.
pub const VIDEO_EXTS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm"];

/// Métadonnées extraites via ffprobe.
///
/// `width`/`height` are the display size: coded dimensions swapped when the
/// stream carries a ±90° rotation, matching what ffmpeg's autorotate emits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Rotation in degrees from the stream metadata, normalised to `0..360`.
    pub rotation: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
    /// Stream frame count, when the container records it.
    pub frame_count: Option<usize>,
}

impl VideoInfo {
    /// Display time of one frame, rounded to whole milliseconds.
    #[must_use]
    pub fn frame_duration_ms(&self) -> u32 {
        (1000.0 / self.fps).round().max(1.0) as u32
    }
}

/// Parse `ffprobe -of default=noprint_wrappers=1` output.
///
/// Returns `None` if width or height is missing or zero.
fn parse_stream_info(text: &str) -> Option<VideoInfo> {
    let mut width: u32 = 0;
    let mut height: u32 = 0;
    let mut fps: f64 = 30.0;
    let mut frame_count = None;
    let mut rotation: i64 = 0;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        } else if let Some(val) = line.strip_prefix("nb_frames=") {
            frame_count = val.trim().parse().ok().filter(|&n: &usize| n > 0);
        } else if let Some(val) = line
            .strip_prefix("rotation=")
            .or_else(|| line.strip_prefix("TAG:rotate="))
        {
            // Display matrix (side data) ou ancien tag `rotate`, souvent négatif.
            if let Ok(deg) = val.trim().parse::<f64>() {
                rotation = deg.round() as i64;
            }
        }
    }

    if width == 0 || height == 0 {
        return None;
    }
    let rotation = rotation.rem_euclid(360) as u32;
    if rotation == 90 || rotation == 270 {
        std::mem::swap(&mut width, &mut height);
    }
    Some(VideoInfo {
        width,
        height,
        rotation,
        fps,
        frame_count,
    })
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne [`TileError::Decode`] si `ffprobe` est introuvable, et
/// [`TileError::UnsupportedFormat`] si le fichier ne contient aucun flux vidéo.
pub fn query_video(path: &Path) -> Result<VideoInfo, TileError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,nb_frames:stream_tags=rotate:stream_side_data=rotation",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| TileError::Decode {
            path: path.to_path_buf(),
            reason: format!("impossible de lancer ffprobe ({e}); est-il dans le PATH ?"),
        })?;

    let text = String::from_utf8_lossy(&output.stdout);
    let info = parse_stream_info(&text).ok_or_else(|| TileError::UnsupportedFormat {
        path: path.to_path_buf(),
        format: "no decodable video stream".into(),
    })?;

    log::info!(
        "query_video: {}x{} @ {:.3}fps, rotation {}° — {}",
        info.width,
        info.height,
        info.fps,
        info.rotation,
        path.display()
    );
    Ok(info)
}

/// Lance un processus `ffmpeg` qui écrit des frames RGB24 brutes sur stdout.
///
/// Chaque frame = `w × h × 3` bytes, row-major, sans padding, à la taille
/// d'affichage de `info`. `-vf scale` fige cette taille même si l'autorotation
/// ou le conteneur en décident autrement. `-an` supprime l'audio.
///
/// # Errors
/// Retourne [`TileError::Decode`] si le spawn échoue.
pub fn spawn_ffmpeg_pipe(path: &Path, info: &VideoInfo) -> Result<Child, TileError> {
    let scale = format!("scale={}:{}", info.width, info.height);
    let child = Command::new("ffmpeg")
        .arg("-i")
        .arg(path)
        .args([
            "-vf",
            scale.as_str(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| TileError::Decode {
            path: path.to_path_buf(),
            reason: format!("impossible de lancer ffmpeg ({e})"),
        })?;
    log::debug!("ffmpeg spawné pour {} ({scale})", path.display());
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Source vidéo décodée par un subprocess ffmpeg.
pub struct VideoSource {
    path: PathBuf,
    info: VideoInfo,
    child: Option<Child>,
    frame_bytes: usize,
}

impl VideoSource {
    /// Query `path` and start decoding it.
    ///
    /// # Errors
    /// See [`query_video`] and [`spawn_ffmpeg_pipe`].
    pub fn open(path: &Path) -> Result<Self, TileError> {
        let info = query_video(path)?;
        let child = spawn_ffmpeg_pipe(path, &info)?;
        Ok(Self {
            path: path.to_path_buf(),
            frame_bytes: info.width as usize * info.height as usize * 3,
            info,
            child: Some(child),
        })
    }

    fn finish(&mut self) -> Result<(), TileError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(|e| TileError::Decode {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        if !status.success() {
            return Err(TileError::Decode {
                path: self.path.clone(),
                reason: format!("ffmpeg exited with {status}"),
            });
        }
        Ok(())
    }
}

impl FrameSource for VideoSource {
    fn native_size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn frame_count_hint(&self) -> Option<usize> {
        self.info.frame_count
    }

    fn next_frame(&mut self) -> Result<Option<TimedFrame>, TileError> {
        let Some(stdout) = self.child.as_mut().and_then(|c| c.stdout.as_mut()) else {
            return Ok(None);
        };

        let mut data = vec![0u8; self.frame_bytes];
        let read = read_exact_or_eof(stdout, &mut data).map_err(|e| TileError::Decode {
            path: self.path.clone(),
            reason: format!("erreur lecture pipe: {e}"),
        })?;

        if !read {
            log::info!("ffmpeg: EOF — {}", self.path.display());
            self.finish()?;
            return Ok(None);
        }

        Ok(Some(TimedFrame {
            frame: RawFrame::new(data, self.info.width, self.info.height, Channels::Rgb),
            duration_ms: self.info.frame_duration_ms(),
        }))
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        if let Some(mut c) = self.child.take() {
            let _ = c.kill();
            let _ = c.wait();
        }
    }
}
