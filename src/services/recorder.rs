//! Audio recorder
//!
//! Captures PCM frames from a source on a blocking worker until told to
//! stop, then hands back the finished take as a WAV byte buffer. The
//! capture loop runs on the blocking pool so a slow device never stalls
//! the runtime; stop is a flag flip followed by a join, and frames read
//! before the flip are kept.

use crate::config::{AUDIO_BITS_PER_SAMPLE, AUDIO_CHANNELS, AUDIO_SAMPLE_RATE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Source of raw PCM frames (16-bit little-endian mono samples).
///
/// `read_frame` blocks until a frame is available. An error ends the
/// recording early; frames already captured are kept.
pub trait FrameSource: Send + 'static {
    fn read_frame(&mut self) -> std::io::Result<Vec<u8>>;
}

/// In-progress recording.
pub struct AudioRecorder {
    stop: Arc<AtomicBool>,
    frames: mpsc::UnboundedReceiver<Vec<u8>>,
    producer: JoinHandle<()>,
}

impl AudioRecorder {
    /// Start capturing from a source.
    pub fn start(mut source: impl FrameSource) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, frames) = mpsc::unbounded_channel();

        let flag = stop.clone();
        let producer = tokio::task::spawn_blocking(move || {
            tracing::info!("Audio capture started");
            while !flag.load(Ordering::Relaxed) {
                match source.read_frame() {
                    Ok(frame) => {
                        if tx.send(frame).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Audio capture read failed: {}", e);
                        break;
                    }
                }
            }
            tracing::info!("Audio capture stopped");
        });

        Self {
            stop,
            frames,
            producer,
        }
    }

    /// Stop capturing and return the complete recording as WAV bytes.
    pub async fn stop(mut self) -> Vec<u8> {
        self.stop.store(true, Ordering::Relaxed);
        if let Err(e) = self.producer.await {
            tracing::error!("Audio capture task panicked: {}", e);
        }

        let mut pcm = Vec::new();
        self.frames.close();
        while let Ok(frame) = self.frames.try_recv() {
            pcm.extend_from_slice(&frame);
        }
        wav_encode(&pcm)
    }
}

/// Wrap raw 16-bit mono PCM data in a RIFF/WAVE container.
pub fn wav_encode(pcm: &[u8]) -> Vec<u8> {
    let byte_rate = AUDIO_SAMPLE_RATE * u32::from(AUDIO_CHANNELS) * u32::from(AUDIO_BITS_PER_SAMPLE) / 8;
    let block_align = AUDIO_CHANNELS * AUDIO_BITS_PER_SAMPLE / 8;
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&AUDIO_CHANNELS.to_le_bytes());
    wav.extend_from_slice(&AUDIO_SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&AUDIO_BITS_PER_SAMPLE.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}
