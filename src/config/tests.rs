use super::load::{InvalidSetting, resolve_config_path};
use super::schema::*;
use crate::session::PlayMode;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_lyra_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("LYRA_CONFIG_PATH", "/tmp/lyra-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/lyra-test-config.toml")
    );
}

#[test]
fn config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g0 = EnvGuard::remove("LYRA_CONFIG_PATH");
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home/lyra/config.toml")
    );
}

#[test]
fn config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g0 = EnvGuard::remove("LYRA_CONFIG_PATH");
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.config/lyra/config.toml")
    );
}

#[test]
fn defaults_cover_the_recognized_audio_extensions() {
    let s = Settings::default();
    assert_eq!(
        s.library.normalized_audio_extensions(),
        vec!["mp3", "m4a", "wav", "aac", "flac"]
    );
    assert_eq!(s.library.normalized_lyric_extensions(), vec!["lrc"]);
    assert!(!s.library.include_hidden);
    assert_eq!(s.library.progress_interval_ms, 1000);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file_and_parse_play_mode_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[library]
audio_extensions = [".MP3", "ogg"]
lyric_extensions = ["lrc", "txt"]
include_hidden = true
follow_links = false
artist_keywords = ["crew"]
progress_interval_ms = 50

[playback]
play_mode = "loop_one"
range_lock = true
tick_ms = 100

[controls]
scrub_seconds = 9

[ui]
header_text = "hello"
show_lyrics = false

[logging]
level = "debug"
file = "/tmp/lyra-test.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("LYRA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("LYRA__CONTROLS__SCRUB_SECONDS");

    let s = Settings::load().unwrap();
    assert_eq!(s.library.normalized_audio_extensions(), vec!["mp3", "ogg"]);
    assert_eq!(s.library.lyric_extensions, vec!["lrc", "txt"]);
    assert!(s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.library.artist_keywords, vec!["crew"]);
    assert_eq!(s.library.progress_interval_ms, 50);
    assert_eq!(s.playback.play_mode, PlayModeSetting::RepeatOne);
    assert_eq!(PlayMode::from(s.playback.play_mode), PlayMode::RepeatOne);
    assert!(s.playback.range_lock);
    assert_eq!(s.playback.tick_ms, 100);
    assert_eq!(s.controls.scrub_seconds, 9);
    assert_eq!(s.ui.header_text, "hello");
    assert!(!s.ui.show_lyrics);
    assert_eq!(s.logging.level, "debug");
    assert_eq!(
        s.logging.file.as_deref(),
        Some(std::path::Path::new("/tmp/lyra-test.log"))
    );
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[controls]
scrub_seconds = 5
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("LYRA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("LYRA__CONTROLS__SCRUB_SECONDS", "30");

    let s = Settings::load().unwrap();
    assert_eq!(s.controls.scrub_seconds, 30);
}

#[test]
fn validate_rejects_empty_extension_list() {
    let mut s = Settings::default();
    s.library.audio_extensions = vec![" . ".into()];
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.tick_ms = 0;
    let err = s.validate().unwrap_err();
    assert_eq!(
        err,
        InvalidSetting {
            field: "playback.tick_ms",
            reason: "must be at least 1",
        }
    );
    assert_eq!(err.to_string(), "playback.tick_ms: must be at least 1");
}
