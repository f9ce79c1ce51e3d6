/// Procedural sound effects, one per kind of game event.
///
/// Effects are synthesised into in-memory WAV buffers once at start-up
/// and played fire-and-forget through rodio. Without the `sound` feature
/// the engine is a stub that accepts the same calls and does nothing.

use crate::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Pickup,
    Treasure,
    ExtraLife,
    Shot,
    EnemyShot,
    MonsterDown,
    Death,
    Jetpack,
    Door,
    Fanfare,
}

impl Sfx {
    pub const ALL: [Sfx; 10] = [
        Sfx::Pickup,
        Sfx::Treasure,
        Sfx::ExtraLife,
        Sfx::Shot,
        Sfx::EnemyShot,
        Sfx::MonsterDown,
        Sfx::Death,
        Sfx::Jetpack,
        Sfx::Door,
        Sfx::Fanfare,
    ];
}

/// Effect for an event. Events with no sound of their own map to `None`.
pub fn sfx_for(event: &GameEvent) -> Option<Sfx> {
    use crate::domain::tile::{classify, TROPHY};

    match event {
        GameEvent::ItemPicked { code, .. } if classify(*code).is(&TROPHY) => Some(Sfx::Treasure),
        GameEvent::ItemPicked { .. } => Some(Sfx::Pickup),
        GameEvent::ExtraLife { .. } => Some(Sfx::ExtraLife),
        GameEvent::ShotFired => Some(Sfx::Shot),
        GameEvent::EnemyShotFired { .. } => Some(Sfx::EnemyShot),
        GameEvent::MonsterKilled { .. } => Some(Sfx::MonsterDown),
        GameEvent::DaveKilled => Some(Sfx::Death),
        GameEvent::JetpackToggled { on: true } => Some(Sfx::Jetpack),
        GameEvent::LevelCleared { .. } => Some(Sfx::Door),
        GameEvent::GameWon { .. } => Some(Sfx::Fanfare),
        GameEvent::GameOver { .. } => Some(Sfx::Death),
        _ => None,
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// Indexed by `Sfx as usize`.
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| Arc::new(make_wav(&synth(sfx))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(sfx as usize) else {
                return;
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    fn synth(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Pickup => notes(&[(988.0, 0.04), (1319.0, 0.06)], 0.2),
            Sfx::Treasure => notes(&[(784.0, 0.06), (988.0, 0.06), (1175.0, 0.06), (1568.0, 0.12)], 0.25),
            Sfx::ExtraLife => notes(&[(523.0, 0.08), (659.0, 0.08), (784.0, 0.08), (1047.0, 0.2)], 0.25),
            Sfx::Shot => sweep(1400.0, 500.0, 0.07, 0.2),
            Sfx::EnemyShot => sweep(500.0, 250.0, 0.09, 0.18),
            Sfx::MonsterDown => noise(0.25, 0.3),
            Sfx::Death => notes(&[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (220.0, 0.3)], 0.3),
            Sfx::Jetpack => noise(0.08, 0.15),
            Sfx::Door => sweep(300.0, 900.0, 0.25, 0.25),
            Sfx::Fanfare => notes(
                &[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.1), (784.0, 0.1), (1047.0, 0.35)],
                0.3,
            ),
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators (mono f32 samples)
    // ════════════════════════════════════════════════════════════

    fn len_of(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sequence of square-ish notes, each with a short decay.
    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in seq {
            let n = len_of(dur);
            samples.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = (t * freq * TAU).sin() * 0.75 + (t * freq * 3.0 * TAU).sin() * 0.25;
                wave * env * volume
            }));
        }
        samples
    }

    /// Linear pitch glide with a fade-out.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = len_of(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = from + (to - from) * p;
                phase += freq * TAU / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - p) * volume
            })
            .collect()
    }

    /// LCG noise burst with a falling envelope.
    fn noise(duration: f32, volume: f32) -> Vec<f32> {
        let n = len_of(duration);
        let mut rng: u32 = 0x2545_f491;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let sample = (rng >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                let env = (1.0 - i as f32 / n as f32).powf(1.5);
                sample * env * volume
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_sizes_match_payload() {
            let wav = make_wav(&synth(Sfx::Shot));
            assert_eq!(&wav[0..4], b"RIFF");
            let data = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize;
            assert_eq!(wav.len(), 44 + data);
        }

        #[test]
        fn every_effect_is_audible_and_bounded() {
            for sfx in Sfx::ALL {
                let samples = synth(sfx);
                assert!(!samples.is_empty(), "{sfx:?} is silent");
                assert!(samples.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play(&self, _sfx: Sfx) {}
}

impl SoundEngine {
    pub fn play_events(&self, events: &[GameEvent]) {
        for sfx in events.iter().filter_map(sfx_for) {
            self.play(sfx);
        }
    }
}
