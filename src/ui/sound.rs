/// Sound engine: procedural 8-bit style sound effects and music via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Effects are fire-and-forget (non-blocking) via rodio's Sink; the music
/// track keeps its own sink so it can be stopped.
///
/// Compile without the "sound" feature to disable audio entirely (the stub
/// SoundEngine does nothing).

use crate::sim::event::{Sfx, Track};

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use super::{Sfx, Track};

    pub(super) const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx: HashMap<Sfx, Arc<Vec<u8>>>,
        theme: Arc<Vec<u8>>,
        music: Option<Sink>,
        volume: f32,
    }

    impl SoundEngine {
        pub fn new(volume: u8) -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            let sfx = [
                Sfx::Move,
                Sfx::Select,
                Sfx::Apple,
                Sfx::Crash,
                Sfx::Paddle,
                Sfx::Point,
                Sfx::Miss,
                Sfx::Lock,
                Sfx::Line,
                Sfx::Hit,
                Sfx::Win,
                Sfx::Lose,
            ]
            .into_iter()
            .map(|s| (s, Arc::new(make_wav(&gen_sfx(s)))))
            .collect();

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx,
                theme: Arc::new(make_wav(&gen_theme())),
                music: None,
                volume: volume_scale(volume),
            })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.sfx.get(&sfx) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.set_volume(self.volume);
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        /// Start a looping track, replacing any track already playing.
        pub fn play_music(&mut self, track: Track) {
            self.stop_music();
            let buf = match track {
                Track::Tetris => &self.theme,
            };
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            let cursor = Cursor::new(buf.as_ref().clone());
            if let Ok(src) = rodio::Decoder::new(cursor) {
                sink.set_volume(self.volume);
                sink.append(src.repeat_infinite());
                self.music = Some(sink);
            }
        }

        pub fn stop_music(&mut self) {
            if let Some(sink) = self.music.take() {
                sink.stop();
            }
        }

        pub fn set_volume(&mut self, percent: u8) {
            self.volume = volume_scale(percent);
            if let Some(sink) = &self.music {
                sink.set_volume(self.volume);
            }
        }
    }

    fn volume_scale(percent: u8) -> f32 {
        percent.min(100) as f32 / 100.0
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// One note: sine plus a little third harmonic for a retro edge.
    fn tone(freq: f32, duration: f32, volume: f32, out: &mut Vec<f32>) {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(0.5);
            let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
            out.push(wave * env * volume);
        }
    }

    /// Pitch slide from `from` to `to` Hz.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32, out: &mut Vec<f32>) {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        for i in 0..n {
            let t = i as f32 / n as f32;
            let freq = from + (to - from) * t;
            phase += freq / SAMPLE_RATE as f32;
            let env = (1.0 - t).powf(0.6);
            out.push((phase * 2.0 * std::f32::consts::PI).sin() * env * volume);
        }
    }

    /// Short noise burst with a falling tone underneath.
    fn crunch(duration: f32, out: &mut Vec<f32>) {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        for i in 0..n {
            let t = i as f32 / n as f32;
            let freq = 200.0 + (1.0 - t) * 300.0;
            let ti = i as f32 / SAMPLE_RATE as f32;
            let tone = (ti * freq * 2.0 * std::f32::consts::PI).sin();
            rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
            let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let env = (1.0 - t).powf(0.8);
            out.push((tone * 0.4 + noise * 0.6) * env * 0.3);
        }
    }

    pub(super) fn gen_sfx(sfx: Sfx) -> Vec<f32> {
        let mut s = Vec::new();
        match sfx {
            Sfx::Move => tone(880.0, 0.03, 0.15, &mut s),
            Sfx::Select => {
                tone(660.0, 0.04, 0.2, &mut s);
                tone(990.0, 0.06, 0.2, &mut s);
            }
            Sfx::Apple => {
                // C6 E6 G6
                for f in [1047.0, 1319.0, 1568.0] {
                    tone(f, 0.045, 0.25, &mut s);
                }
            }
            Sfx::Crash => crunch(0.2, &mut s),
            Sfx::Paddle => tone(520.0, 0.03, 0.25, &mut s),
            Sfx::Point => sweep(500.0, 1200.0, 0.12, 0.25, &mut s),
            Sfx::Miss => sweep(600.0, 200.0, 0.15, 0.25, &mut s),
            Sfx::Lock => tone(220.0, 0.04, 0.25, &mut s),
            Sfx::Line => {
                for f in [523.0, 659.0, 784.0, 1047.0] {
                    tone(f, 0.07, 0.3, &mut s);
                }
            }
            Sfx::Hit => crunch(0.1, &mut s),
            Sfx::Win => {
                for f in [784.0, 1047.0, 1319.0] {
                    tone(f, 0.1, 0.3, &mut s);
                }
            }
            Sfx::Lose => {
                // A4 F#4 Eb4 C4
                for f in [440.0, 370.0, 311.0, 261.0] {
                    tone(f, 0.12, 0.3, &mut s);
                }
            }
        }
        s
    }

    const E5: f32 = 659.25;
    const B4: f32 = 493.88;
    const C5: f32 = 523.25;
    const D5: f32 = 587.33;
    const A4: f32 = 440.0;
    const F5: f32 = 698.46;
    const G5: f32 = 783.99;
    const A5: f32 = 880.0;
    const REST: f32 = 0.0;

    /// Eighth-note length in seconds.
    const EIGHTH: f32 = 0.15;

    /// (pitch, eighths). Korobeiniki, first two phrases.
    const THEME: &[(f32, u8)] = &[
        (E5, 2), (B4, 1), (C5, 1), (D5, 2), (C5, 1), (B4, 1),
        (A4, 2), (A4, 1), (C5, 1), (E5, 2), (D5, 1), (C5, 1),
        (B4, 3), (C5, 1), (D5, 2), (E5, 2),
        (C5, 2), (A4, 2), (A4, 4),
        (REST, 1), (D5, 2), (F5, 1), (A5, 2), (G5, 1), (F5, 1),
        (E5, 3), (C5, 1), (E5, 2), (D5, 1), (C5, 1),
        (B4, 2), (B4, 1), (C5, 1), (D5, 2), (E5, 2),
        (C5, 2), (A4, 2), (A4, 2), (REST, 2),
    ];

    pub(super) fn gen_theme() -> Vec<f32> {
        let mut s = Vec::new();
        for &(freq, eighths) in THEME {
            let dur = EIGHTH * eighths as f32;
            if freq == REST {
                s.extend(std::iter::repeat(0.0).take((SAMPLE_RATE as f32 * dur) as usize));
            } else {
                tone(freq, dur, 0.18, &mut s);
            }
        }
        s
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_volume: u8) -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
    pub fn play_music(&mut self, _track: Track) {}
    pub fn stop_music(&mut self) {}
    pub fn set_volume(&mut self, _percent: u8) {}
}
