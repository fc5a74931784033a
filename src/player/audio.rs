//! rodio-backed playback for loaded tracks.
//!
//! Every track gets its own `Sink` on the shared output mixer, fed by a
//! `PcmSource` that reads the already decoded samples. The source publishes
//! its position through an atomic so the UI thread can read the current time
//! without touching the audio thread, and seeks are handed over the same way
//! and applied on the next frame boundary so channels never swap.

use rodio::mixer::Mixer;
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracklane::decode::DecodedAudio;
use tracklane::playback::PlaybackHandle;

const NO_SEEK: usize = usize::MAX;

/// Default output device, shared by every track
pub struct AudioOutput {
    stream: OutputStream,
}

impl AudioOutput {
    pub fn open_default() -> Result<Self, Box<dyn Error>> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        stream.log_on_drop(false);
        log::info!("Opened default audio output");
        Ok(Self { stream })
    }

    pub fn mixer(&self) -> &Mixer {
        self.stream.mixer()
    }

    /// Create a paused handle for a decoded track
    pub fn handle(&self, audio: DecodedAudio, volume: f32) -> SinkHandle {
        SinkHandle::new(self.mixer(), audio, volume)
    }
}

/// Decoded samples shared between a handle and its sources
#[derive(Debug)]
struct Pcm {
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
}

impl Pcm {
    fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Sample index of the frame at `seconds`, clamped to the end
    fn index_at(&self, seconds: f64) -> usize {
        let frame = (seconds.max(0.0) * self.sample_rate as f64).floor() as usize;
        frame.min(self.frames()) * self.channels.max(1) as usize
    }

    fn seconds_at(&self, index: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (index / self.channels.max(1) as usize) as f64 / self.sample_rate as f64
    }
}

struct PcmSource {
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
    pos: usize,
    position: Arc<AtomicUsize>,
    seek_to: Arc<AtomicUsize>,
}

impl PcmSource {
    fn new(pcm: &Pcm, start: usize, position: Arc<AtomicUsize>, seek_to: Arc<AtomicUsize>) -> Self {
        Self {
            samples: Arc::clone(&pcm.samples),
            channels: pcm.channels,
            sample_rate: pcm.sample_rate,
            pos: start,
            position,
            seek_to,
        }
    }
}

impl Iterator for PcmSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos % self.channels.max(1) as usize == 0 {
            let target = self.seek_to.swap(NO_SEEK, Ordering::AcqRel);
            if target != NO_SEEK {
                self.pos = target;
            }
            self.position.store(self.pos, Ordering::Release);
        }

        let sample = self.samples.get(self.pos).copied();
        if sample.is_some() {
            self.pos += 1;
        } else {
            self.position.store(self.samples.len(), Ordering::Release);
        }
        sample
    }
}

impl Source for PcmSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        let frames = self.samples.len() / self.channels.max(1) as usize;
        Some(Duration::from_secs_f64(
            frames as f64 / self.sample_rate.max(1) as f64,
        ))
    }
}

/// One track's transport on the output mixer
pub struct SinkHandle {
    sink: Sink,
    pcm: Pcm,
    position: Arc<AtomicUsize>,
    seek_to: Arc<AtomicUsize>,
    volume: f32,
}

impl SinkHandle {
    fn new(mixer: &Mixer, audio: DecodedAudio, volume: f32) -> Self {
        let sink = Sink::connect_new(mixer);
        sink.pause();
        let volume = volume.clamp(0.0, 1.0);
        sink.set_volume(volume);
        Self {
            sink,
            pcm: Pcm {
                samples: audio.samples.into(),
                channels: audio.channels,
                sample_rate: audio.sample_rate,
            },
            position: Arc::new(AtomicUsize::new(0)),
            seek_to: Arc::new(AtomicUsize::new(NO_SEEK)),
            volume,
        }
    }

    fn position_index(&self) -> usize {
        match self.seek_to.load(Ordering::Acquire) {
            NO_SEEK => self.position.load(Ordering::Acquire),
            target => target,
        }
    }

    /// Feed a fresh source once the previous one ran out
    fn ensure_source(&mut self) {
        if !self.sink.empty() {
            return;
        }
        let mut start = self.position_index();
        if start >= self.pcm.samples.len() {
            start = 0;
        }
        self.seek_to.store(NO_SEEK, Ordering::Release);
        self.position.store(start, Ordering::Release);
        self.sink.append(PcmSource::new(
            &self.pcm,
            start,
            Arc::clone(&self.position),
            Arc::clone(&self.seek_to),
        ));
    }
}

impl PlaybackHandle for SinkHandle {
    fn play(&mut self) {
        self.ensure_source();
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn current_time(&self) -> f64 {
        self.pcm.seconds_at(self.position_index())
    }

    fn set_current_time(&mut self, seconds: f64) {
        let index = self.pcm.index_at(seconds);
        if self.sink.empty() {
            self.position.store(index, Ordering::Release);
        } else {
            self.seek_to.store(index, Ordering::Release);
        }
    }

    fn duration(&self) -> Option<f64> {
        (self.pcm.sample_rate > 0).then(|| self.pcm.seconds_at(self.pcm.samples.len()))
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }
}
