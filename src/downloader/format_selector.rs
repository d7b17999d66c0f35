// FormatSelector - picks the streams to download for one video
//
// Video requests go through a fixed precedence:
// 1. a 2160p stream exists and the cap is 4K     -> that stream + best audio
// 2. a 1080p stream exists and the cap is 1080p  -> that stream + best audio
// 3. otherwise                                   -> highest-resolution progressive stream
//
// The cap names exactly one branch. A 4K-only video with a 1080p cap does not
// get "best below the cap"; it falls through to the progressive stream.
//
// A webm video stream is paired with Opus audio when the video has one, so the
// merge can stay in webm without re-encoding.

use super::errors::DownloadError;
use super::models::{
    DownloadQuality, DownloadRequest, ResolutionCap, ResolvedVideo, StreamDescriptor, VideoTarget,
};

pub struct FormatSelector;

impl FormatSelector {
    /// Select streams according to the request's mode and cap
    pub fn select(
        video: &ResolvedVideo,
        request: &DownloadRequest,
    ) -> Result<VideoTarget, DownloadError> {
        if request.audio_only {
            Self::select_audio(video, request)
        } else {
            Self::select_video(video, request.resolution_cap)
        }
    }

    pub fn select_video(
        video: &ResolvedVideo,
        cap: ResolutionCap,
    ) -> Result<VideoTarget, DownloadError> {
        let branches = [
            (ResolutionCap::Uhd4k, DownloadQuality::Uhd4k),
            (ResolutionCap::Hd1080, DownloadQuality::Hd1080),
        ];

        for (branch_cap, quality) in branches {
            if branch_cap != cap {
                continue;
            }
            let Some(stream) = Self::find_by_resolution(&video.streams, branch_cap.resolution_label())
            else {
                continue;
            };

            if stream.is_progressive() {
                return Ok(VideoTarget {
                    title: video.title.clone(),
                    chosen_video_stream: Some(stream.clone()),
                    chosen_audio_stream: None,
                    quality,
                });
            }

            match Self::pair_audio(video, stream) {
                Some(audio) => {
                    return Ok(VideoTarget {
                        title: video.title.clone(),
                        chosen_video_stream: Some(stream.clone()),
                        chosen_audio_stream: Some(audio.clone()),
                        quality,
                    })
                }
                None => tracing::warn!(
                    title = %video.title,
                    resolution = branch_cap.resolution_label(),
                    "no audio-only stream to pair with, using combined stream"
                ),
            }
        }

        let fallback = Self::highest_progressive(&video.streams)
            .ok_or_else(|| DownloadError::NoSuitableStream(video.title.clone()))?;

        Ok(VideoTarget {
            title: video.title.clone(),
            chosen_video_stream: Some(fallback.clone()),
            chosen_audio_stream: None,
            quality: DownloadQuality::Fallback,
        })
    }

    pub fn select_audio(
        video: &ResolvedVideo,
        request: &DownloadRequest,
    ) -> Result<VideoTarget, DownloadError> {
        let audio = video
            .audio_only_stream
            .as_ref()
            .ok_or_else(|| DownloadError::NoSuitableStream(video.title.clone()))?;

        Ok(VideoTarget {
            title: video.title.clone(),
            chosen_video_stream: None,
            chosen_audio_stream: Some(audio.clone()),
            quality: DownloadQuality::Audio(request.audio_format),
        })
    }

    /// Audio to merge with `stream`: best Opus/Vorbis for webm, otherwise the
    /// resolver's preferred audio-only stream
    fn pair_audio<'a>(
        video: &'a ResolvedVideo,
        stream: &StreamDescriptor,
    ) -> Option<&'a StreamDescriptor> {
        if stream.extension == "webm" {
            let webm_audio = video
                .streams
                .iter()
                .filter(|s| s.is_audio_only() && s.is_webm_audio())
                .max_by_key(|s| s.abr.map(|b| (b * 100.0) as u32).unwrap_or(0));
            if webm_audio.is_some() {
                return webm_audio;
            }
        }
        video.audio_only_stream.as_ref()
    }

    /// First video stream with the given resolution label, in resolver order
    fn find_by_resolution<'a>(
        streams: &'a [StreamDescriptor],
        label: &str,
    ) -> Option<&'a StreamDescriptor> {
        streams
            .iter()
            .filter(|s| !s.is_audio_only())
            .find(|s| s.resolution.as_deref() == Some(label))
    }

    /// Highest-resolution stream that already carries audio
    fn highest_progressive(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
        streams
            .iter()
            .filter(|s| s.is_progressive())
            .max_by_key(|s| s.height.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::{AudioFormat, StreamKind};

    fn make_stream(id: &str, kind: StreamKind, height: Option<u32>, ext: &str) -> StreamDescriptor {
        StreamDescriptor {
            format_id: id.to_string(),
            kind,
            resolution: height.map(|h| format!("{}p", h)),
            height,
            extension: ext.to_string(),
            default_filename: format!("clip.{}", ext),
            url: format!("https://media.example/{}", id),
            filesize: None,
            abr: None,
            acodec: None,
        }
    }

    fn make_video(heights: &[u32], with_audio: bool) -> ResolvedVideo {
        let mut streams: Vec<StreamDescriptor> = heights
            .iter()
            .map(|h| make_stream(&format!("v{}", h), StreamKind::AdaptiveVideo, Some(*h), "mp4"))
            .collect();
        streams.push(make_stream("p360", StreamKind::Progressive, Some(360), "mp4"));
        streams.push(make_stream("p720", StreamKind::Progressive, Some(720), "mp4"));

        let audio = make_stream("a140", StreamKind::AdaptiveAudio, None, "m4a");
        streams.push(audio.clone());

        ResolvedVideo {
            video_id: "abc123".to_string(),
            title: "clip".to_string(),
            streams,
            audio_only_stream: with_audio.then_some(audio),
        }
    }

    #[test]
    fn test_4k_cap_picks_2160p() {
        let video = make_video(&[2160, 1080], true);
        let target = FormatSelector::select_video(&video, ResolutionCap::Uhd4k).unwrap();

        assert_eq!(target.quality, DownloadQuality::Uhd4k);
        assert_eq!(target.chosen_video_stream.unwrap().format_id, "v2160");
        assert_eq!(target.chosen_audio_stream.unwrap().format_id, "a140");
    }

    #[test]
    fn test_1080p_cap_picks_1080p() {
        let video = make_video(&[2160, 1080], true);
        let target = FormatSelector::select_video(&video, ResolutionCap::Hd1080).unwrap();

        assert_eq!(target.quality, DownloadQuality::Hd1080);
        assert_eq!(target.chosen_video_stream.unwrap().format_id, "v1080");
        assert!(target.chosen_audio_stream.is_some());
    }

    #[test]
    fn test_4k_only_with_1080p_cap_falls_back() {
        let video = make_video(&[2160], true);
        let target = FormatSelector::select_video(&video, ResolutionCap::Hd1080).unwrap();

        assert_eq!(target.quality, DownloadQuality::Fallback);
        assert_eq!(target.chosen_video_stream.unwrap().format_id, "p720");
        assert!(target.chosen_audio_stream.is_none());
    }

    #[test]
    fn test_1080p_only_with_4k_cap_falls_back() {
        let video = make_video(&[1080], true);
        let target = FormatSelector::select_video(&video, ResolutionCap::Uhd4k).unwrap();

        assert_eq!(target.quality, DownloadQuality::Fallback);
        assert_eq!(target.chosen_video_stream.unwrap().format_id, "p720");
    }

    #[test]
    fn test_missing_audio_falls_back_to_progressive() {
        let video = make_video(&[2160], false);
        let target = FormatSelector::select_video(&video, ResolutionCap::Uhd4k).unwrap();
        assert_eq!(target.quality, DownloadQuality::Fallback);
    }

    #[test]
    fn test_no_progressive_is_no_suitable_stream() {
        let mut video = make_video(&[1440], true);
        video.streams.retain(|s| !s.is_progressive());

        let result = FormatSelector::select_video(&video, ResolutionCap::Uhd4k);
        assert!(matches!(result, Err(DownloadError::NoSuitableStream(_))));
    }

    #[test]
    fn test_webm_video_paired_with_opus() {
        let mut video = make_video(&[1080], true);
        let vp9 = make_stream("v2160webm", StreamKind::AdaptiveVideo, Some(2160), "webm");
        video.streams.insert(0, vp9);
        let mut opus = make_stream("a251", StreamKind::AdaptiveAudio, None, "webm");
        opus.acodec = Some("opus".to_string());
        opus.abr = Some(130.0);
        video.streams.push(opus);

        let target = FormatSelector::select_video(&video, ResolutionCap::Uhd4k).unwrap();
        assert_eq!(target.chosen_video_stream.unwrap().format_id, "v2160webm");
        assert_eq!(target.chosen_audio_stream.unwrap().format_id, "a251");

        // mp4 video keeps the AAC stream
        let target = FormatSelector::select_video(&video, ResolutionCap::Hd1080).unwrap();
        assert_eq!(target.chosen_audio_stream.unwrap().format_id, "a140");
    }

    #[test]
    fn test_audio_request_picks_audio_only_stream() {
        let video = make_video(&[2160, 1080], true);
        let request = DownloadRequest::new("https://www.youtube.com/watch?v=abc123", "/tmp")
            .with_audio_only(AudioFormat::Wav);

        let target = FormatSelector::select(&video, &request).unwrap();
        assert_eq!(target.quality, DownloadQuality::Audio(AudioFormat::Wav));
        assert!(target.chosen_video_stream.is_none());
        assert_eq!(target.chosen_audio_stream.unwrap().format_id, "a140");
    }
}
