//! Stream descriptors and media packets

use bytes::Bytes;

/// Identity of a single live stream as reported by the media router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Router-assigned stream ID
    pub id: u32,

    /// Stream name within its application (e.g. "stream1")
    pub name: String,
}

impl StreamInfo {
    /// Create a new stream descriptor
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}

/// A single media frame observed at the control plane
///
/// Cheap to clone due to `Bytes` reference counting. The orchestrator
/// only observes these; it never inspects or forwards the payload.
#[derive(Debug, Clone)]
pub struct MediaPacket {
    /// Timestamp in milliseconds
    pub timestamp: u32,

    /// Frame payload (zero-copy via reference counting)
    pub data: Bytes,

    /// Whether this is a keyframe (video only)
    pub is_keyframe: bool,
}

impl MediaPacket {
    /// Create a new media packet
    pub fn new(timestamp: u32, data: Bytes, is_keyframe: bool) -> Self {
        Self {
            timestamp,
            data,
            is_keyframe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_info_display() {
        let info = StreamInfo::new(42, "stream1");
        assert_eq!(info.to_string(), "stream1(42)");
    }
}
