use crate::capture::{CaptureSource, CaptureStream};
use crate::error::CaptureError;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use webrtc::api::media_engine::MIME_TYPE_VP8;
use webrtc::media::Sample;
use webrtc::media::io::ivf_reader::IVFReader;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const STREAM_ID: &str = "padlink-screen";

/// Capture backed by a single VP8 sample track.
///
/// Without a file the track carries no frames, which is enough to negotiate
/// and exercise the control channel. With an IVF file the frames are looped
/// at the file's frame rate for as long as the stream is alive.
#[derive(Debug, Clone, Default)]
pub struct SampleTrackSource {
    ivf: Option<PathBuf>,
}

impl SampleTrackSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ivf(path: impl Into<PathBuf>) -> Self {
        Self {
            ivf: Some(path.into()),
        }
    }

    fn track() -> Arc<TrackLocalStaticSample> {
        Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video".to_owned(),
            STREAM_ID.to_owned(),
        ))
    }
}

#[async_trait]
impl CaptureSource for SampleTrackSource {
    async fn start(&self) -> Result<CaptureStream, CaptureError> {
        let track = Self::track();
        let stream = CaptureStream::new(vec![track.clone() as Arc<dyn TrackLocal + Send + Sync>]);

        if let Some(path) = &self.ivf {
            let data = tokio::fs::read(path).await.map_err(|e| {
                CaptureError::Unavailable(format!("cannot read {}: {}", path.display(), e))
            })?;
            // Fail early on a file that is not IVF at all.
            IVFReader::new(Cursor::new(data.as_slice()))
                .map_err(|e| CaptureError::Unavailable(format!("{}: {}", path.display(), e)))?;

            info!("Looping frames from {}", path.display());
            tokio::spawn(feed_ivf(track, Bytes::from(data), stream.stop_token()));
        }

        Ok(stream)
    }
}

async fn feed_ivf(track: Arc<TrackLocalStaticSample>, data: Bytes, stop: CancellationToken) {
    loop {
        let (mut reader, header) = match IVFReader::new(Cursor::new(data.clone())) {
            Ok(reader) => reader,
            Err(e) => {
                warn!("IVF reader failed: {}", e);
                return;
            }
        };
        let frame_ms = if header.timebase_denominator == 0 {
            33
        } else {
            (1000 * u64::from(header.timebase_numerator) / u64::from(header.timebase_denominator))
                .max(1)
        };
        let frame_duration = Duration::from_millis(frame_ms);
        let mut ticker = tokio::time::interval(frame_duration);

        loop {
            tokio::select! {
                _ = stop.cancelled() => {
                    debug!("Frame feeder stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            // End of file: start over.
            let Ok((frame, _)) = reader.parse_next_frame() else {
                break;
            };
            let sample = Sample {
                data: frame.freeze(),
                duration: frame_duration,
                ..Default::default()
            };
            if let Err(e) = track.write_sample(&sample).await {
                debug!("Dropping frame: {}", e);
            }
        }
    }
}
