use super::tts_repository::{SynthesisError, TtsRepository};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

/// Request body of the OpenAI-compatible `/audio/speech` endpoint
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'a str,
}

/// Speech backend speaking the OpenAI audio API (LiteLLM, Kokoro-FastAPI, OpenAI)
pub struct OpenAiCompatibleTtsRepository {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleTtsRepository {
    pub fn new(http_client: reqwest::Client, base_url: &str, api_key: String, model: String) -> Self {
        Self {
            http_client,
            endpoint: format!("{}/audio/speech", base_url.trim_end_matches('/')),
            api_key,
            model,
        }
    }
}

/// Map an unsuccessful response onto the synthesis error taxonomy
fn classify_failure(status: StatusCode, body: &str) -> SynthesisError {
    let lowered = body.to_lowercase();
    let message = format!("{}: {}", status, body.chars().take(300).collect::<String>());

    match status.as_u16() {
        402 | 403 => SynthesisError::QuotaExceeded(message),
        429 if lowered.contains("quota") => SynthesisError::QuotaExceeded(message),
        429 => SynthesisError::RateLimited(message),
        400 | 404 | 422 if lowered.contains("voice") => SynthesisError::InvalidVoice(message),
        408 => SynthesisError::Transport(message),
        code if code >= 500 => SynthesisError::Transport(message),
        _ => SynthesisError::Rejected(message),
    }
}

#[async_trait]
impl TtsRepository for OpenAiCompatibleTtsRepository {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        speed: f32,
    ) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();
        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            speed,
            response_format: "mp3",
        };

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(
                error = %e,
                model = %self.model,
                voice = voice,
                "Speech backend request failed"
            );
            SynthesisError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_failure(status, &error_text));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Transport(format!("Failed to read audio: {}", e)))?;

        if audio.is_empty() {
            return Err(SynthesisError::Transport(
                "Speech backend returned no audio".to_string(),
            ));
        }

        tracing::debug!(
            model = %self.model,
            voice = voice,
            characters_count = text.chars().count(),
            audio_size_bytes = audio.len(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "Chunk synthesized"
        );

        Ok(audio.to_vec())
    }
}
