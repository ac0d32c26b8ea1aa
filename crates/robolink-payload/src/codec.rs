use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{PayloadError, Result};
use crate::schema::{CommandRecord, ImageFrame, Payload, TelemetryRecord};

/// Body tag for [`ImageFrame`]: raw JPEG bytes follow.
pub const TAG_IMAGE: u8 = 0x01;
/// Body tag for [`TelemetryRecord`]: a UTF-8 JSON object follows.
pub const TAG_TELEMETRY: u8 = 0x02;
/// Body tag for [`CommandRecord`]: a UTF-8 JSON object follows.
pub const TAG_COMMAND: u8 = 0x03;

/// Serialize a payload into a frame body.
///
/// Body layout:
/// ```text
/// ┌─────────┬──────────────────────────────────────────┐
/// │ Tag (1B)│ Content                                  │
/// │ 0x01    │ JPEG bytes, verbatim (may be empty)      │
/// │ 0x02    │ {"ch1volt":..,"wifiSignal":..} (JSON)    │
/// │ 0x03    │ {"ma":..,"mb":..} (JSON)                 │
/// └─────────┴──────────────────────────────────────────┘
/// ```
///
/// Telemetry holding NaN or an infinity is rejected with
/// [`PayloadError::NonFinite`] before anything is written.
pub fn encode_payload(payload: &Payload) -> Result<Bytes> {
    let mut body = BytesMut::new();
    match payload {
        Payload::Image(frame) => {
            body.reserve(1 + frame.bytes.len());
            body.put_u8(TAG_IMAGE);
            body.put_slice(&frame.bytes);
        }
        Payload::Telemetry(record) => {
            if let Some(field) = record.non_finite_field() {
                return Err(PayloadError::NonFinite { field });
            }
            body.put_u8(TAG_TELEMETRY);
            body.put_slice(&serde_json::to_vec(record)?);
        }
        Payload::Command(record) => {
            body.put_u8(TAG_COMMAND);
            body.put_slice(&serde_json::to_vec(record)?);
        }
    }
    Ok(body.freeze())
}

/// Parse a frame body back into a payload.
pub fn decode_payload(body: &[u8]) -> Result<Payload> {
    let (&tag, content) = body.split_first().ok_or(PayloadError::Empty)?;
    match tag {
        TAG_IMAGE => Ok(Payload::Image(ImageFrame::new(Bytes::copy_from_slice(
            content,
        )))),
        TAG_TELEMETRY => Ok(Payload::Telemetry(serde_json::from_slice::<TelemetryRecord>(
            content,
        )?)),
        TAG_COMMAND => Ok(Payload::Command(serde_json::from_slice::<CommandRecord>(
            content,
        )?)),
        other => Err(PayloadError::UnknownTag(other)),
    }
}
