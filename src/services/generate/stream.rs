//! HTTP streaming for generation requests.
//!
//! The response body is read by a producer task that decodes bytes to text
//! and pushes chunks into a bounded channel; the consumer applies each chunk
//! to the session in arrival order and notifies the webview. The transport
//! delivers a single response body in order, so ordering holds end to end.

use futures_util::StreamExt;
use tauri::Emitter;
use tokio::sync::mpsc;

use crate::services::config::AppConfig;

use super::error::GenerateError;
use super::session::{GeneratorState, RequestPlan};
use super::types::{GenerateRequestBody, GenerateStreamPayload, EVT_GENERATE_STREAM};

/// Chunks buffered between the network reader and the applier.
const CHUNK_CHANNEL_CAPACITY: usize = 32;

/// Issue the request and consume the streamed response.
///
/// Returns the full artifact text on success. The session artifact is reset
/// only after the response status has been validated, so `Server` and
/// pre-stream `Transport` failures leave the previous artifact intact.
pub(super) async fn run_generation_stream(
    app: &tauri::AppHandle,
    state: &GeneratorState,
    plan: &RequestPlan,
    config: &AppConfig,
) -> Result<String, GenerateError> {
    let body = GenerateRequestBody {
        model: &plan.model,
        use_component_library: plan.use_component_library,
        messages: &plan.messages,
    };

    let mut request = state
        .http_client()
        .post(config.generate_endpoint())
        .json(&body);
    if !config.api_key.is_empty() {
        request = request.bearer_auth(&config.api_key);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(GenerateError::server(
            status.as_u16(),
            status.canonical_reason().unwrap_or("request failed"),
        ));
    }

    state.open_stream()?;

    let (tx, mut rx) = mpsc::channel::<String>(CHUNK_CHANNEL_CAPACITY);
    let producer = tauri::async_runtime::spawn(async move {
        let mut stream = response.bytes_stream();
        let mut decoder = Utf8StreamDecoder::default();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(GenerateError::from)?;
            let text = decoder.push(&chunk);
            if !text.is_empty() && tx.send(text).await.is_err() {
                // Receiver gone; stop reading.
                return Ok(());
            }
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            let _ = tx.send(tail).await;
        }
        Ok::<(), GenerateError>(())
    });

    let mut artifact = String::new();
    while let Some(delta) = rx.recv().await {
        state.append_chunk(&delta)?;
        artifact.push_str(&delta);
        let _ = app.emit(
            EVT_GENERATE_STREAM,
            GenerateStreamPayload {
                request_id: plan.request_id.clone(),
                delta,
                done: false,
            },
        );
    }

    producer
        .await
        .map_err(|_| GenerateError::internal("Stream reader task failed"))??;

    if artifact.is_empty() {
        return Err(GenerateError::empty_body("No response body"));
    }

    Ok(artifact)
}

/// Incremental UTF-8 decoder for streamed response bodies.
///
/// A scalar value split across transport chunks is held back until its
/// remaining bytes arrive; invalid sequences decode to U+FFFD. Output is
/// therefore independent of where the transport splits the body.
#[derive(Default)]
struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    fn push(&mut self, input: &[u8]) -> String {
        self.pending.extend_from_slice(input);
        let ready = self.pending.len() - incomplete_suffix_len(&self.pending);
        let tail = self.pending.split_off(ready);
        let ready_bytes = std::mem::replace(&mut self.pending, tail);
        decode_lossy(ready_bytes)
    }

    /// Flush whatever partial sequence is still buffered at end of stream.
    fn finish(&mut self) -> String {
        decode_lossy(std::mem::take(&mut self.pending))
    }
}

fn decode_lossy(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Length of a trailing byte sequence that could still become a valid scalar
/// once more input arrives; 0 when the buffer ends on a boundary.
fn incomplete_suffix_len(buf: &[u8]) -> usize {
    let len = buf.len();
    for back in 1..=len.min(4) {
        let byte = buf[len - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            // Continuation byte; keep scanning for the lead.
            continue;
        }
        let width = match byte {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            // Invalid lead byte; decode now and let lossy handling replace it.
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_chunks(chunks: &[&[u8]]) -> String {
        let mut decoder = Utf8StreamDecoder::default();
        let mut out = String::new();
        for chunk in chunks {
            out.push_str(&decoder.push(chunk));
        }
        out.push_str(&decoder.finish());
        out
    }

    #[test]
    fn test_chunks_reassemble_in_order() {
        assert_eq!(
            decode_chunks(&[b"function ", b"App() ", b"{}"]),
            "function App() {}"
        );
    }

    #[test]
    fn test_scalar_split_across_chunks() {
        // "你好" is six bytes; split inside both scalars.
        let bytes = "你好".as_bytes();
        assert_eq!(decode_chunks(&[&bytes[..2], &bytes[2..4], &bytes[4..]]), "你好");
    }

    #[test]
    fn test_four_byte_scalar_split() {
        let bytes = "🍜".as_bytes();
        assert_eq!(decode_chunks(&[&bytes[..1], &bytes[1..]]), "🍜");
    }

    #[test]
    fn test_chunk_boundary_independence() {
        let text = "let 你 = \"🍜 noodles\";";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            assert_eq!(
                decode_chunks(&[&bytes[..split], &bytes[split..]]),
                text,
                "split at {}",
                split
            );
        }
    }

    #[test]
    fn test_invalid_bytes_become_replacement_chars() {
        assert_eq!(decode_chunks(&[&[0xFF, 0xFE]]), "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn test_dangling_lead_flushed_as_replacement() {
        let mut decoder = Utf8StreamDecoder::default();
        assert_eq!(decoder.push(&[0xE4]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let mut decoder = Utf8StreamDecoder::default();
        assert_eq!(decoder.push(b""), "");
        assert_eq!(decoder.finish(), "");
    }
}
