//! Status line shown at the right end of the taskbar, and the brightness
//! keys.
//!
//! The readings are produced by a poller thread. The event loop never waits
//! on it: [`SharedStatus`] takes the lock with `try_lock` and falls back to
//! the last line it managed to read.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, TryLockError,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

pub trait StatusSource {
    /// Current status text, if there is anything to show.
    fn status_line(&mut self) -> Option<String>;
    /// Step the backlight by `delta` notches (positive is brighter).
    fn adjust_brightness(&mut self, delta: i32);
}

/// No status line, brightness keys do nothing.
pub struct NoStatus;

impl StatusSource for NoStatus {
    fn status_line(&mut self) -> Option<String> {
        None
    }

    fn adjust_brightness(&mut self, _delta: i32) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SysInfo {
    pub battery_percent: Option<u32>,
    pub brightness_percent: Option<u32>,
    pub mem_used_percent: Option<u32>,
}

impl SysInfo {
    pub fn format_status(&self) -> String {
        let mut parts = Vec::new();
        if let Some(battery) = self.battery_percent {
            parts.push(format!("BAT {battery}%"));
        }
        if let Some(brightness) = self.brightness_percent {
            parts.push(format!("BRI {brightness}%"));
        }
        if let Some(mem) = self.mem_used_percent {
            parts.push(format!("MEM {mem}%"));
        }
        parts.join("  ")
    }
}

#[derive(Clone, Debug)]
pub struct SysfsPaths {
    pub battery_capacity: PathBuf,
    pub backlight: Option<PathBuf>,
    pub meminfo: PathBuf,
}

impl SysfsPaths {
    /// First battery and first backlight device found under `/sys/class`.
    pub fn discover() -> Self {
        Self {
            battery_capacity: first_entry("/sys/class/power_supply", |name| {
                name.starts_with("BAT")
            })
            .map(|dir| dir.join("capacity"))
            .unwrap_or_else(|| PathBuf::from("/sys/class/power_supply/BAT0/capacity")),
            backlight: first_entry("/sys/class/backlight", |_| true),
            meminfo: PathBuf::from("/proc/meminfo"),
        }
    }

    pub fn read(&self) -> SysInfo {
        SysInfo {
            battery_percent: read_u32(&self.battery_capacity),
            brightness_percent: self.backlight.as_deref().and_then(read_brightness_percent),
            mem_used_percent: fs::read_to_string(&self.meminfo)
                .ok()
                .and_then(|content| mem_used_percent(&content)),
        }
    }
}

fn first_entry(dir: &str, accept: impl Fn(&str) -> bool) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_str().is_some_and(&accept))
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    entries.into_iter().next()
}

fn read_u32(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn read_brightness_percent(backlight: &Path) -> Option<u32> {
    let current = read_u32(&backlight.join("brightness"))?;
    let max = read_u32(&backlight.join("max_brightness")).filter(|max| *max > 0)?;
    Some(current * 100 / max)
}

fn mem_used_percent(meminfo: &str) -> Option<u32> {
    let field = |name: &str| -> Option<u64> {
        meminfo
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|value| value.parse().ok())
    };
    let total = field("MemTotal:").filter(|total| *total > 0)?;
    let available = field("MemAvailable:").unwrap_or(0);
    u32::try_from(total.saturating_sub(available) * 100 / total).ok()
}

/// New raw backlight value after stepping `delta` notches of 5%, clamped to
/// `1..=max`.
pub fn brightness_step(current: u32, max: u32, delta: i32) -> Option<u32> {
    if max == 0 {
        return None;
    }
    let step = i64::from((max / 20).max(1));
    let next = i64::from(current) + i64::from(delta) * step;
    Some(next.clamp(1, i64::from(max)) as u32)
}

/// Snapshot shared with the poller thread.
#[derive(Clone)]
pub struct SharedStatus {
    info: Arc<Mutex<SysInfo>>,
    backlight: Option<PathBuf>,
    last_line: Option<String>,
}

impl SharedStatus {
    pub fn new(backlight: Option<PathBuf>) -> Self {
        Self {
            info: Arc::new(Mutex::new(SysInfo::default())),
            backlight,
            last_line: None,
        }
    }

    pub fn handle(&self) -> Arc<Mutex<SysInfo>> {
        Arc::clone(&self.info)
    }
}

impl StatusSource for SharedStatus {
    fn status_line(&mut self) -> Option<String> {
        match self.info.try_lock() {
            Ok(info) => {
                let line = info.format_status();
                self.last_line = (!line.is_empty()).then_some(line);
            }
            Err(TryLockError::WouldBlock) => {}
            Err(TryLockError::Poisoned(_)) => {
                tracing::warn!("status snapshot poisoned; keeping last status line");
            }
        }
        self.last_line.clone()
    }

    fn adjust_brightness(&mut self, delta: i32) {
        let Some(backlight) = self.backlight.as_deref() else {
            return;
        };
        let (Some(current), Some(max)) = (
            read_u32(&backlight.join("brightness")),
            read_u32(&backlight.join("max_brightness")),
        ) else {
            return;
        };
        let Some(next) = brightness_step(current, max, delta) else {
            return;
        };
        if let Err(err) = fs::write(backlight.join("brightness"), next.to_string()) {
            tracing::warn!(path = %backlight.display(), "failed to set brightness: {err}");
        } else {
            tracing::debug!(current, next, "brightness adjusted");
        }
    }
}

/// Poll sysfs once a second into `shared` until `running` is cleared.
pub fn spawn_sysfs_poller(
    paths: SysfsPaths,
    shared: Arc<Mutex<SysInfo>>,
    running: Arc<AtomicBool>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("bevel-status".to_owned())
        .spawn(move || {
            while running.load(Ordering::Acquire) {
                let info = paths.read();
                match shared.lock() {
                    Ok(mut guard) => *guard = info,
                    Err(_) => {
                        tracing::warn!("status snapshot poisoned; stopping poller");
                        return;
                    }
                }
                thread::sleep(Duration::from_secs(1));
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_skips_missing_readings() {
        let info = SysInfo {
            battery_percent: Some(80),
            brightness_percent: None,
            mem_used_percent: Some(41),
        };
        assert_eq!(info.format_status(), "BAT 80%  MEM 41%");
        assert_eq!(SysInfo::default().format_status(), "");
    }

    #[test]
    fn shared_status_reuses_last_line_while_locked() {
        let mut status = SharedStatus::new(None);
        let handle = status.handle();
        *handle.lock().unwrap() = SysInfo {
            battery_percent: Some(55),
            ..SysInfo::default()
        };
        assert_eq!(status.status_line().as_deref(), Some("BAT 55%"));

        let guard = handle.lock().unwrap();
        assert_eq!(status.status_line().as_deref(), Some("BAT 55%"));
        drop(guard);
    }

    #[test]
    fn brightness_steps_are_clamped() {
        assert_eq!(brightness_step(50, 100, 1), Some(55));
        assert_eq!(brightness_step(3, 100, -1), Some(1));
        assert_eq!(brightness_step(99, 100, 2), Some(100));
        assert_eq!(brightness_step(5, 10, 1), Some(6));
        assert_eq!(brightness_step(5, 0, 1), None);
    }

    #[test]
    fn meminfo_percent() {
        let meminfo = "MemTotal:       1000 kB\nMemFree:         100 kB\nMemAvailable:    250 kB\n";
        assert_eq!(mem_used_percent(meminfo), Some(75));
        assert_eq!(mem_used_percent("garbage"), None);
    }
}
