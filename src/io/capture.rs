//! Delayed PNG capture of the composed frame after a transition completes.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::foundation::core::ImageRef;
use crate::foundation::error::DriftResult;
use crate::io::codec::save_png;

/// Address a saved capture path is reported under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportAddress {
    /// `/path`
    #[default]
    Path,
    /// `/UploadPath`
    UploadPath,
}

impl ReportAddress {
    /// Wire address string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "/path",
            Self::UploadPath => "/UploadPath",
        }
    }
}

/// Sends a saved capture path to whoever listens (e.g. an OSC peer).
pub trait PathReporter: Send {
    /// Deliver `path` under `address`.
    fn report(&mut self, address: &str, path: &Path) -> DriftResult<()>;
}

/// Reporter that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl PathReporter for LogReporter {
    fn report(&mut self, address: &str, path: &Path) -> DriftResult<()> {
        info!(address, path = %path.display(), "capture reported");
        Ok(())
    }
}

/// Capture behavior.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptureOpts {
    /// Capture after each completed transition.
    pub enabled: bool,
    /// Directory captures are written to; created on demand.
    pub output_folder: PathBuf,
    /// Seconds of frame time between completion and capture.
    pub settle_delay: f64,
    /// Address handed to the reporter.
    pub report_address: ReportAddress,
}

impl Default for CaptureOpts {
    fn default() -> Self {
        Self {
            enabled: true,
            output_folder: PathBuf::from("captures"),
            settle_delay: 1.0,
            report_address: ReportAddress::Path,
        }
    }
}

fn capture_stem(at: SystemTime) -> String {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("capture_{millis}")
}

/// `{folder}/capture_<unix_millis>.png`
pub fn capture_path(folder: &Path, at: SystemTime) -> PathBuf {
    folder.join(format!("{}.png", capture_stem(at)))
}

/// Counts frame time down after a completion and says when to capture.
#[derive(Clone, Debug)]
pub struct CaptureScheduler {
    opts: CaptureOpts,
    remaining: Option<f64>,
    captures: u64,
}

impl CaptureScheduler {
    /// Idle scheduler.
    pub fn new(opts: CaptureOpts) -> Self {
        Self {
            opts,
            remaining: None,
            captures: 0,
        }
    }

    /// Active options.
    pub fn opts(&self) -> &CaptureOpts {
        &self.opts
    }

    /// Whether a capture is waiting for its settle delay.
    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    /// Captures written so far.
    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Start (or restart) the settle countdown. Ignored when capture is disabled.
    pub fn schedule(&mut self) {
        if !self.opts.enabled {
            return;
        }
        if self.remaining.is_some() {
            debug!("capture countdown restarted");
        }
        let delay = if self.opts.settle_delay.is_finite() {
            self.opts.settle_delay.max(0.0)
        } else {
            0.0
        };
        self.remaining = Some(delay);
    }

    /// Drop a pending capture.
    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    /// Advance by `dt` seconds; `true` exactly once when the delay has elapsed.
    pub fn tick(&mut self, dt: f64) -> bool {
        let Some(left) = self.remaining.as_mut() else {
            return false;
        };
        if dt.is_finite() && dt > 0.0 {
            *left -= dt;
        }
        if *left <= 0.0 {
            self.remaining = None;
            return true;
        }
        false
    }

    /// Write `frame` as PNG and return its path.
    pub fn capture(&mut self, frame: ImageRef<'_>, at: SystemTime) -> DriftResult<PathBuf> {
        let mut path = capture_path(&self.opts.output_folder, at);
        // Two captures within one millisecond get a numeric suffix.
        let mut n = 1;
        while path.exists() {
            path = self
                .opts
                .output_folder
                .join(format!("{}-{n}.png", capture_stem(at)));
            n += 1;
        }
        save_png(&path, frame)?;
        self.captures += 1;
        info!(path = %path.display(), "capture saved");
        Ok(path)
    }

    /// Capture, then hand the path to `reporter` if there is one. Report failures are logged;
    /// the saved path is still returned.
    pub fn capture_and_report(
        &mut self,
        frame: ImageRef<'_>,
        at: SystemTime,
        reporter: Option<&mut (dyn PathReporter + 'static)>,
    ) -> DriftResult<PathBuf> {
        let path = self.capture(frame, at)?;
        if let Some(r) = reporter
            && let Err(e) = r.report(self.opts.report_address.as_str(), &path)
        {
            warn!(error = %e, "capture path report failed");
        }
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/io/capture.rs"]
mod tests;
