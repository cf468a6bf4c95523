//! Replay motion source - plays back a recorded JSONL motion log
//!
//! One record per line:
//!
//! ```text
//! {"device": "/user/head", "timestamp_ns": 1000, "position": [0, 1.6, 0],
//!  "orientation": [1, 0, 0, 0], "linear_velocity": [0, 0, 0],
//!  "angular_velocity": [0, 0, 0]}
//! {"device": "/user/head", "timestamp_ns": 2000, "lost": true}
//! ```
//!
//! Records are replayed at their recorded pace, scaled by the speed
//! multiplier. When looping, timestamps of later passes are shifted so the
//! client clock never runs backwards.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{DevicePath, MotionSample, MotionSource, Quat, TrackingCallback, TrackingEvent, Vec3};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Result, StreamError};

/// Gap inserted between the last record of a pass and the first of the next
const LOOP_GAP_NS: u64 = 11_111_111;

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Playback speed (1.0 = recorded pace)
    pub speed_multiplier: f64,

    /// Restart from the first record when the log ends
    pub loop_playback: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            loop_playback: false,
        }
    }
}

/// One JSONL line
#[derive(Debug, Deserialize)]
struct MotionRecord {
    device: String,
    timestamp_ns: u64,
    #[serde(default)]
    position: Option<[f64; 3]>,
    /// [w, x, y, z]
    #[serde(default)]
    orientation: Option<[f64; 4]>,
    #[serde(default)]
    linear_velocity: Option<[f64; 3]>,
    #[serde(default)]
    angular_velocity: Option<[f64; 3]>,
    #[serde(default)]
    lost: bool,
}

impl MotionRecord {
    fn into_event(self, line: usize) -> Result<TrackingEvent> {
        if self.lost {
            return Ok(TrackingEvent::Lost);
        }

        let position = self
            .position
            .ok_or_else(|| StreamError::record(line, &self.device, "missing position"))?;
        let [w, x, y, z] = self
            .orientation
            .ok_or_else(|| StreamError::record(line, &self.device, "missing orientation"))?;

        let sample = MotionSample::new(vec3(position), Quat::new(w, x, y, z), self.timestamp_ns);

        match (self.linear_velocity, self.angular_velocity) {
            (Some(linear), Some(angular)) => Ok(TrackingEvent::Motion(sample.with_velocity(vec3(linear), vec3(angular)))),
            (None, None) => Ok(TrackingEvent::Motion(sample)),
            _ => Err(StreamError::record(
                line,
                &self.device,
                "linear and angular velocity must be given together",
            )),
        }
    }
}

fn vec3([x, y, z]: [f64; 3]) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Decoded record
#[derive(Debug, Clone, Copy)]
struct ReplayEntry {
    timestamp_ns: u64,
    event: TrackingEvent,
}

impl ReplayEntry {
    /// Event with the timestamp moved forward by `shift_ns`
    fn shifted(&self, shift_ns: u64) -> TrackingEvent {
        match self.event {
            TrackingEvent::Motion(mut sample) => {
                sample.timestamp_ns = sample.timestamp_ns.saturating_add(shift_ns);
                TrackingEvent::Motion(sample)
            }
            TrackingEvent::Lost => TrackingEvent::Lost,
        }
    }
}

/// Replay motion source for one device
pub struct ReplayMotionSource {
    device: DevicePath,
    entries: Arc<Vec<ReplayEntry>>,
    config: ReplayConfig,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReplayMotionSource {
    /// Load the records of `device` from a JSONL file
    ///
    /// # Errors
    /// `ReplayIo` if the file cannot be read, `ReplayRecord` for a malformed
    /// line. Lines for other devices are only checked for JSON syntax.
    pub fn load(path: &Path, device: DevicePath, config: ReplayConfig) -> Result<Self> {
        let io_err = |source| StreamError::ReplayIo {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_err)?);

        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err)?;
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let record: MotionRecord = serde_json::from_str(&line)
                .map_err(|e| StreamError::record(line_no, device.as_str(), e.to_string()))?;

            if record.device != device.as_str() {
                continue;
            }

            entries.push(ReplayEntry {
                timestamp_ns: record.timestamp_ns,
                event: record.into_event(line_no)?,
            });
        }

        // Stable sort keeps a loss marker after a sample with the same timestamp
        entries.sort_by_key(|entry| entry.timestamp_ns);

        info!(device = %device, records = entries.len(), "loaded motion replay");

        Ok(Self {
            device,
            entries: Arc::new(entries),
            config,
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded span from first to last record (ns)
    pub fn duration_ns(&self) -> u64 {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => last.timestamp_ns - first.timestamp_ns,
            _ => 0,
        }
    }
}

impl MotionSource for ReplayMotionSource {
    fn device_path(&self) -> &DevicePath {
        &self.device
    }

    fn listen(&self, callback: TrackingCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let listening = self.listening.clone();
        let device = self.device.clone();
        let entries = self.entries.clone();
        let speed = self.config.speed_multiplier.max(0.1);
        let loop_playback = self.config.loop_playback;
        let pass_length_ns = self.duration_ns() + LOOP_GAP_NS;

        let handle = thread::spawn(move || {
            debug!(device = %device, "replay thread started");

            let mut shift_ns: u64 = 0;
            loop {
                let Some(first) = entries.first() else {
                    warn!(device = %device, "no records to replay");
                    break;
                };

                let start_time = Instant::now();
                for entry in entries.iter() {
                    if !listening.load(Ordering::Relaxed) {
                        debug!(device = %device, "replay stopped");
                        return;
                    }

                    let record_offset = (entry.timestamp_ns - first.timestamp_ns) as f64 / 1e9;
                    let target_elapsed = Duration::from_secs_f64(record_offset / speed);
                    let actual_elapsed = start_time.elapsed();
                    if target_elapsed > actual_elapsed {
                        thread::sleep(target_elapsed - actual_elapsed);
                    }

                    callback(entry.shifted(shift_ns));
                }

                if !loop_playback {
                    info!(device = %device, "replay completed");
                    break;
                }

                shift_ns = shift_ns.saturating_add(pass_length_ns);
                debug!(device = %device, shift_ns, "looping replay");
            }

            listening.store(false, Ordering::SeqCst);
        });

        *self.thread_handle.lock() = Some(handle);
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

impl Drop for ReplayMotionSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LOG: &str = r#"
{"device": "/user/head", "timestamp_ns": 3000000, "position": [0, 1.7, 0], "orientation": [1, 0, 0, 0]}
{"device": "/user/hand/left", "timestamp_ns": 1500000, "position": [-0.2, 1, -0.3], "orientation": [1, 0, 0, 0]}
{"device": "/user/head", "timestamp_ns": 1000000, "position": [0, 1.6, 0], "orientation": [1, 0, 0, 0], "linear_velocity": [0, 0.1, 0], "angular_velocity": [0, 0, 0]}

{"device": "/user/head", "timestamp_ns": 4000000, "lost": true}
"#;

    fn write_log(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn collect(source: &ReplayMotionSource) -> Vec<TrackingEvent> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        source.listen(Arc::new(move |event| sink.lock().push(event)));

        let deadline = Instant::now() + Duration::from_secs(2);
        while source.is_listening() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        source.stop();

        let events = events.lock().clone();
        events
    }

    #[test]
    fn test_load_filters_and_sorts() {
        let file = write_log(LOG);
        let source =
            ReplayMotionSource::load(file.path(), DevicePath::new(DevicePath::HEAD), ReplayConfig::default())
                .unwrap();

        assert_eq!(source.len(), 3);
        assert_eq!(source.duration_ns(), 3_000_000);
    }

    #[test]
    fn test_replay_order_and_content() {
        let file = write_log(LOG);
        let source = ReplayMotionSource::load(
            file.path(),
            DevicePath::new(DevicePath::HEAD),
            ReplayConfig {
                speed_multiplier: 10.0,
                loop_playback: false,
            },
        )
        .unwrap();

        let events = collect(&source);
        assert_eq!(events.len(), 3);

        let TrackingEvent::Motion(first) = events[0] else {
            panic!("expected motion, got {:?}", events[0]);
        };
        assert_eq!(first.timestamp_ns, 1_000_000);
        assert!(first.has_velocity());

        let TrackingEvent::Motion(second) = events[1] else {
            panic!("expected motion, got {:?}", events[1]);
        };
        assert_eq!(second.position.y, 1.7);
        assert!(!second.has_velocity());

        assert_eq!(events[2], TrackingEvent::Lost);
    }

    #[test]
    fn test_loop_keeps_timestamps_increasing() {
        let file = write_log(LOG);
        let source = ReplayMotionSource::load(
            file.path(),
            DevicePath::new(DevicePath::HEAD),
            ReplayConfig {
                speed_multiplier: 10.0,
                loop_playback: true,
            },
        )
        .unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        source.listen(Arc::new(move |event| sink.lock().push(event)));

        let deadline = Instant::now() + Duration::from_secs(2);
        while events.lock().len() < 7 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        source.stop();

        let timestamps: Vec<u64> = events
            .lock()
            .iter()
            .filter_map(|event| match event {
                TrackingEvent::Motion(sample) => Some(sample.timestamp_ns),
                TrackingEvent::Lost => None,
            })
            .collect();

        assert!(timestamps.len() >= 4, "timestamps: {timestamps:?}");
        assert!(timestamps.windows(2).all(|w| w[0] < w[1]), "timestamps: {timestamps:?}");
    }

    #[test]
    fn test_missing_orientation_reports_line() {
        let file = write_log(
            "{\"device\": \"/user/head\", \"timestamp_ns\": 1, \"position\": [0, 0, 0]}\n",
        );
        let err = ReplayMotionSource::load(
            file.path(),
            DevicePath::new(DevicePath::HEAD),
            ReplayConfig::default(),
        )
        .err()
        .unwrap();

        assert!(matches!(err, StreamError::ReplayRecord { line: 1, .. }));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_half_velocity_rejected() {
        let file = write_log(
            "{\"device\": \"/user/head\", \"timestamp_ns\": 1, \"position\": [0, 0, 0], \
             \"orientation\": [1, 0, 0, 0], \"linear_velocity\": [0, 0, 0]}\n",
        );
        let result = ReplayMotionSource::load(
            file.path(),
            DevicePath::new(DevicePath::HEAD),
            ReplayConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ReplayMotionSource::load(
            Path::new("/nonexistent/motion.jsonl"),
            DevicePath::new(DevicePath::HEAD),
            ReplayConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, StreamError::ReplayIo { .. }));
    }

    #[test]
    fn test_empty_replay_finishes() {
        let file = write_log(LOG);
        let source = ReplayMotionSource::load(
            file.path(),
            DevicePath::new("/user/waist"),
            ReplayConfig::default(),
        )
        .unwrap();

        assert!(source.is_empty());
        assert!(collect(&source).is_empty());
        assert!(!source.is_listening());
    }
}
