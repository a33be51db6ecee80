//! Audio port
//!
//! The simulation never touches a sound engine. It queues `GameEvent`s; the
//! `AudioManager` turns them into cues for whatever `AudioPort` the host
//! plugs in. Port failures are logged here and never reach the simulation.

use std::fmt;

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Voices in the hit pool, so rapid hits overlap instead of cutting off
pub const HIT_POOL_SIZE: usize = 6;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Ball hits paddle
    PaddleHit,
    /// Block destroyed
    BlockBreak,
    /// Powerup collected
    PickupCollect,
    /// Shield spent to save the ball
    ShieldSave,
    /// Every block cleared
    Victory,
    /// Ball lost
    GameOver,
}

/// One sound to play
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    pub effect: SoundEffect,
    /// Pool slot for pooled effects, 0 otherwise
    pub voice: usize,
    /// Effective volume (0.0 - 1.0)
    pub volume: f32,
}

/// Why a port could not play something
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Engine not loaded yet
    NotReady,
    /// Backend-specific failure
    Backend(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::NotReady => write!(f, "audio engine not ready"),
            AudioError::Backend(msg) => write!(f, "audio backend error: {msg}"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Capability the presentation layer provides
pub trait AudioPort: Send {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError>;
    fn play_music(&mut self, volume: f32) -> Result<(), AudioError>;
    fn stop_music(&mut self) -> Result<(), AudioError>;
}

/// Port that plays nothing
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioPort for NullAudio {
    fn play(&mut self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }

    fn play_music(&mut self, _volume: f32) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop_music(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Port that only logs cues (headless runs)
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioPort for LogAudio {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        log::debug!("sfx {:?} voice {} vol {:.2}", cue.effect, cue.voice, cue.volume);
        Ok(())
    }

    fn play_music(&mut self, volume: f32) -> Result<(), AudioError> {
        log::debug!("music on (vol {volume:.2})");
        Ok(())
    }

    fn stop_music(&mut self) -> Result<(), AudioError> {
        log::debug!("music off");
        Ok(())
    }
}

/// Audio manager for the game
pub struct AudioManager {
    port: Box<dyn AudioPort>,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    /// Next hit-pool slot
    hit_voice: usize,
}

impl AudioManager {
    pub fn new(port: Box<dyn AudioPort>) -> Self {
        Self {
            port,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.3,
            muted: false,
            hit_voice: 0,
        }
    }

    pub fn from_settings(port: Box<dyn AudioPort>, settings: &Settings) -> Self {
        let mut manager = Self::new(port);
        manager.set_master_volume(settings.master_volume);
        manager.set_sfx_volume(settings.sfx_volume);
        manager.set_music_volume(settings.music_volume);
        manager.set_muted(settings.muted);
        manager
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self, channel: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * channel
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let volume = self.effective_volume(self.sfx_volume);
        if volume <= 0.0 {
            return;
        }

        let voice = match effect {
            SoundEffect::PaddleHit | SoundEffect::BlockBreak => {
                let voice = self.hit_voice;
                self.hit_voice = (self.hit_voice + 1) % HIT_POOL_SIZE;
                voice
            }
            _ => 0,
        };

        if let Err(e) = self.port.play(Cue {
            effect,
            voice,
            volume,
        }) {
            log::warn!("Could not play {:?}: {}", effect, e);
        }
    }

    pub fn play_hit(&mut self) {
        self.play(SoundEffect::PaddleHit);
    }

    pub fn play_victory(&mut self) {
        self.play(SoundEffect::Victory);
    }

    pub fn play_game_over(&mut self) {
        self.play(SoundEffect::GameOver);
    }

    pub fn play_music(&mut self) {
        let volume = self.effective_volume(self.music_volume);
        if let Err(e) = self.port.play_music(volume) {
            log::warn!("Could not start music: {}", e);
        }
    }

    pub fn stop_music(&mut self) {
        if let Err(e) = self.port.stop_music() {
            log::warn!("Could not stop music: {}", e);
        }
    }

    /// React to the simulation's notifications
    pub fn handle_events(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::SessionStarted { .. } => self.play_music(),
                GameEvent::PaddleHit { .. } => self.play_hit(),
                GameEvent::BlockDestroyed { .. } => self.play(SoundEffect::BlockBreak),
                GameEvent::PowerupCollected { .. } => self.play(SoundEffect::PickupCollect),
                GameEvent::ShieldSaved => self.play(SoundEffect::ShieldSave),
                GameEvent::Victory { .. } => {
                    self.stop_music();
                    self.play_victory();
                }
                GameEvent::GameOver { .. } => {
                    self.stop_music();
                    self.play_game_over();
                }
                GameEvent::PowerupSpawned { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use glam::Vec2;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Sfx(Cue),
        MusicOn,
        MusicOff,
    }

    /// Records calls; optionally fails every one of them
    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<Call>>>,
        broken: bool,
    }

    impl Recorder {
        fn result(&self) -> Result<(), AudioError> {
            if self.broken {
                Err(AudioError::NotReady)
            } else {
                Ok(())
            }
        }
    }

    impl AudioPort for Recorder {
        fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
            self.calls.lock().unwrap().push(Call::Sfx(cue));
            self.result()
        }

        fn play_music(&mut self, _volume: f32) -> Result<(), AudioError> {
            self.calls.lock().unwrap().push(Call::MusicOn);
            self.result()
        }

        fn stop_music(&mut self) -> Result<(), AudioError> {
            self.calls.lock().unwrap().push(Call::MusicOff);
            self.result()
        }
    }

    #[test]
    fn test_game_over_stops_music_then_plays() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::new(Box::new(recorder.clone()));

        audio.handle_events(&[GameEvent::GameOver { score: 3 }]);

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls[0], Call::MusicOff);
        assert!(matches!(calls[1], Call::Sfx(Cue { effect: SoundEffect::GameOver, .. })));
    }

    #[test]
    fn test_hit_pool_rotates() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::new(Box::new(recorder.clone()));
        let hit = GameEvent::PaddleHit { pos: Vec2::ZERO };

        audio.handle_events(&vec![hit; HIT_POOL_SIZE + 1]);

        let voices: Vec<usize> = recorder
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Call::Sfx(cue) => Some(cue.voice),
                _ => None,
            })
            .collect();
        assert_eq!(voices, vec![0, 1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn test_muted_skips_effects() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::new(Box::new(recorder.clone()));
        audio.set_muted(true);

        audio.play_hit();

        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_port_failures_are_swallowed() {
        let recorder = Recorder {
            broken: true,
            ..Default::default()
        };
        let mut audio = AudioManager::new(Box::new(recorder.clone()));

        audio.handle_events(&[
            GameEvent::SessionStarted {
                difficulty: crate::sim::Difficulty::Easy,
            },
            GameEvent::Victory { score: 1 },
        ]);

        assert_eq!(recorder.calls.lock().unwrap().len(), 3);
    }
}
