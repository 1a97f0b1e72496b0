//! Playback session: queue, play modes, range-lock and the now-playing
//! projection.
//!
//! A [`PlaybackSession`] is created once by the runtime and driven from the
//! event loop. It talks to the audio device through [`crate::audio::AudioEngine`],
//! publishes [`NowPlayingSnapshot`]s to a [`NowPlayingSurface`] and stores its
//! mode and lock through [`crate::state::PrefsStore`].

mod now_playing;
mod playback;
mod queue;
mod shuffle;
mod types;

pub use now_playing::{NowPlayingSnapshot, NowPlayingSurface, SurfaceError};
pub use playback::{PlaybackSession, SessionPorts};
pub use shuffle::ShuffleCursor;
pub use types::{PlayMode, PlaybackState, SessionEvent};
