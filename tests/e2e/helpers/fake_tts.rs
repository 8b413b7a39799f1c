use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tinytts_backend::infrastructure::repositories::{SynthesisError, TtsRepository};

pub const FRAME_LEN: usize = 417;
pub const FRAME_SECONDS: f64 = 1152.0 / 44100.0;

/// One MPEG1 Layer III frame: 128 kbps, 44.1 kHz, no padding
pub fn mp3_frame() -> Vec<u8> {
    let mut frame = vec![0xFF, 0xFB, 0x90, 0x00];
    frame.resize(FRAME_LEN, 0x55);
    frame
}

/// Speech backend double: one MP3 frame per chunk unless a failure is queued
#[derive(Default)]
pub struct FakeTts {
    failures: Mutex<VecDeque<SynthesisError>>,
    calls: Mutex<Vec<(String, String, f32)>>,
}

impl FakeTts {
    pub fn fail_next(&self, error: SynthesisError, times: usize) {
        let mut failures = self.failures.lock();
        for _ in 0..times {
            failures.push_back(error.clone());
        }
    }

    pub fn calls(&self) -> Vec<(String, String, f32)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TtsRepository for FakeTts {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        speed: f32,
    ) -> Result<Vec<u8>, SynthesisError> {
        self.calls
            .lock()
            .push((text.to_string(), voice.to_string(), speed));

        let failure = self.failures.lock().pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(mp3_frame()),
        }
    }
}
