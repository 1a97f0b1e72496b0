use super::*;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

fn snapshot() -> NowPlayingSnapshot {
    NowPlayingSnapshot {
        path: PathBuf::from("/tmp/music/test.mp3"),
        title: "Test Title".to_string(),
        artist: Some("Test Artist".to_string()),
        album: Some("Test Album".to_string()),
        duration: Duration::from_micros(1_234_567),
        elapsed: Duration::from_secs(2),
        rate: 1.0,
        track_index: Some(7),
        track_count: 9,
        playback: PlaybackState::Playing,
        play_mode: PlayMode::Shuffle,
    }
}

fn handle() -> (MprisHandle, Arc<Mutex<SharedState>>, mpsc::Receiver<()>) {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();
    let handle = MprisHandle {
        state: state.clone(),
        notify: notify_tx,
    };
    (handle, state, notify_rx)
}

fn iface(state: &Arc<Mutex<SharedState>>) -> (PlayerIface, mpsc::Receiver<ControlCmd>) {
    let (tx, rx) = mpsc::channel::<ControlCmd>();
    (
        PlayerIface {
            tx,
            state: state.clone(),
        },
        rx,
    )
}

#[test]
fn publish_fills_and_clear_resets_shared_state() {
    let (mut handle, state, notify) = handle();

    handle.publish(&snapshot()).unwrap();
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title.as_deref(), Some("Test Title"));
        assert_eq!(s.artist, vec!["Test Artist".to_string()]);
        assert_eq!(s.album.as_deref(), Some("Test Album"));
        assert_eq!(s.url.as_deref(), Some("file:///tmp/music/test.mp3"));
        assert_eq!(s.length_micros, Some(1_234_567));
        assert_eq!(s.position_micros, 2_000_000);
        assert_eq!(
            s.track_id.as_ref().map(|p| p.as_str()),
            Some("/org/mpris/MediaPlayer2/track/7")
        );
    }

    handle.clear();
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title, None);
        assert!(s.artist.is_empty());
        assert_eq!(s.length_micros, None);
        assert!(s.track_id.is_none());
        assert_eq!(s.playback, PlaybackState::Stopped);
        // The mode is a player setting, not track data.
        assert_eq!(s.play_mode, PlayMode::Shuffle);
    }

    assert_eq!(notify.try_iter().count(), 2);
}

#[test]
fn unknown_duration_has_no_length() {
    let (mut handle, state, _notify) = handle();
    let snap = NowPlayingSnapshot {
        duration: Duration::ZERO,
        ..snapshot()
    };
    handle.publish(&snap).unwrap();
    assert_eq!(state.lock().unwrap().length_micros, None);
}

#[test]
fn publishing_without_a_service_thread_still_succeeds() {
    let (mut handle, _state, notify) = handle();
    drop(notify);
    assert!(handle.publish(&snapshot()).is_ok());
}

#[test]
fn playback_status_maps_state_to_mpris_strings() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (iface, _rx) = iface(&state);

    for (playback, expected) in [
        (PlaybackState::Stopped, "Stopped"),
        (PlaybackState::Playing, "Playing"),
        (PlaybackState::Paused, "Paused"),
    ] {
        state.lock().unwrap().playback = playback;
        assert_eq!(iface.playback_status(), expected);
    }
}

#[test]
fn play_mode_maps_to_loop_status_and_shuffle() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (iface, _rx) = iface(&state);

    assert_eq!(iface.loop_status(), "Playlist");
    assert!(!iface.shuffle());

    state.lock().unwrap().play_mode = PlayMode::RepeatOne;
    assert_eq!(iface.loop_status(), "Track");

    state.lock().unwrap().play_mode = PlayMode::Shuffle;
    assert_eq!(iface.loop_status(), "Playlist");
    assert!(iface.shuffle());
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let (mut handle, state, _notify) = handle();
    handle.publish(&snapshot()).unwrap();
    let (iface, _rx) = iface(&state);

    let map = iface.metadata();
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:album",
        "xesam:url",
        "mpris:length",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
}

#[test]
fn empty_metadata_still_names_a_track_id() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (iface, _rx) = iface(&state);

    let map = iface.metadata();
    assert_eq!(map.len(), 1);
    assert!(map.contains_key("mpris:trackid"));
}

#[test]
fn transport_methods_forward_commands() {
    let (mut handle, state, _notify) = handle();
    handle.publish(&snapshot()).unwrap();
    let (iface, rx) = iface(&state);

    iface.play_pause();
    iface.next();
    iface.previous();
    iface.seek(-5_000_000);
    iface.set_position(
        ObjectPath::try_from("/org/mpris/MediaPlayer2/track/7").unwrap(),
        30_000_000,
    );
    // Stale track id: ignored.
    iface.set_position(
        ObjectPath::try_from("/org/mpris/MediaPlayer2/track/1").unwrap(),
        1,
    );

    assert_eq!(
        rx.try_iter().collect::<Vec<_>>(),
        vec![
            ControlCmd::PlayPause,
            ControlCmd::Next,
            ControlCmd::Prev,
            ControlCmd::Seek(-5_000_000),
            ControlCmd::SetPosition(30_000_000),
        ]
    );
}

#[test]
fn seek_updates_position_and_queues_one_seeked_signal() {
    let (mut handle, state, notify) = handle();
    handle.publish(&snapshot()).unwrap();
    let (iface, _rx) = iface(&state);

    handle.seeked(Duration::from_secs(42));
    assert_eq!(iface.position(), 42_000_000);
    assert_eq!(iface.take_pending_seek(), Some(42_000_000));
    assert_eq!(iface.take_pending_seek(), None);
    assert_eq!(notify.try_iter().count(), 2);

    handle.seeked(Duration::from_secs(1));
    handle.clear();
    assert_eq!(iface.take_pending_seek(), None);
}

#[test]
fn unqueued_track_gets_a_stable_path_derived_id() {
    let (mut handle, state, _notify) = handle();
    let snap = NowPlayingSnapshot {
        track_index: None,
        ..snapshot()
    };
    handle.publish(&snap).unwrap();
    let first = state.lock().unwrap().track_id.clone().unwrap();
    assert!(first.as_str().starts_with("/org/mpris/MediaPlayer2/track/p"));

    handle.publish(&snap).unwrap();
    assert_eq!(state.lock().unwrap().track_id.as_ref(), Some(&first));

    let other = NowPlayingSnapshot {
        path: PathBuf::from("/tmp/music/other.mp3"),
        ..snap
    };
    handle.publish(&other).unwrap();
    assert_ne!(state.lock().unwrap().track_id.as_ref(), Some(&first));

    // SetPosition for the unqueued track is still honored.
    handle.publish(&NowPlayingSnapshot {
        track_index: None,
        ..snapshot()
    })
    .unwrap();
    let (iface, rx) = iface(&state);
    iface.set_position(first.clone().into_inner(), 5_000_000);
    assert_eq!(
        rx.try_iter().collect::<Vec<_>>(),
        vec![ControlCmd::SetPosition(5_000_000)]
    );
}
