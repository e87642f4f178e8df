//! URL utilities for video locators and stream URLs

use crate::error::VidmapError;
use url::Url;

/// Query parameter that carries the descrambled signature
pub const SIGNATURE_PARAM: &str = "signature";

/// Extract the video ID from a locator.
///
/// The `v` query parameter wins; `youtu.be/<id>`, `/shorts/<id>` and
/// `/embed/<id>` path forms are accepted as well.
pub fn extract_video_id(locator: &str) -> Result<String, VidmapError> {
    let parsed = Url::parse(locator)?;

    if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "v") {
        if !id.is_empty() {
            return Ok(id.into_owned());
        }
    }

    let path = parsed.path();
    let from_path = match parsed.host_str() {
        Some("youtu.be") => Some(path.trim_start_matches('/')),
        _ => path
            .strip_prefix("/shorts/")
            .or_else(|| path.strip_prefix("/embed/")),
    };

    match from_path.map(|id| id.trim_end_matches('/')) {
        Some(id) if !id.is_empty() && !id.contains('/') => Ok(id.to_string()),
        _ => Err(VidmapError::InvalidUrl(format!(
            "no video ID in {}",
            locator
        ))),
    }
}

/// Turn the companion script path from the player config into an absolute URL.
///
/// Scheme-relative paths take the locator's scheme, root-relative paths are
/// joined to the locator. If the locator does not parse, `default_scheme` is
/// used for scheme-relative paths.
pub fn resolve_script_url(
    locator: &str,
    script_path: &str,
    default_scheme: &str,
) -> Result<String, VidmapError> {
    match Url::parse(locator) {
        Ok(base) => Ok(base.join(script_path)?.to_string()),
        Err(_) if script_path.starts_with("//") => {
            Ok(Url::parse(&format!("{}:{}", default_scheme, script_path))?.to_string())
        }
        Err(_) => Ok(Url::parse(script_path)?.to_string()),
    }
}

/// Check whether a stream URL already carries a signature parameter
pub fn has_signature(stream_url: &str) -> bool {
    match Url::parse(stream_url) {
        Ok(parsed) => parsed
            .query_pairs()
            .any(|(key, value)| key == SIGNATURE_PARAM && !value.is_empty()),
        Err(_) => stream_url.contains("signature="),
    }
}

/// Set `signature=<value>` on a stream URL, replacing any existing
/// (possibly empty) signature parameter
pub fn set_signature(stream_url: &str, signature: &str) -> Result<String, VidmapError> {
    let mut parsed = Url::parse(stream_url)?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != SIGNATURE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(SIGNATURE_PARAM, signature);

    Ok(parsed.to_string())
}

/// Read the `itag` query parameter of a stream URL
pub fn itag_from_url(stream_url: &str) -> Option<u32> {
    Url::parse(stream_url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == "itag")
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("http://video.example.com/watch?feature=x&v=abc123").unwrap(),
            "abc123"
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=10").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/brZCOVlyPPo").unwrap(),
            "brZCOVlyPPo"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/brZCOVlyPPo/").unwrap(),
            "brZCOVlyPPo"
        );
    }

    #[test]
    fn test_extract_video_id_errors() {
        assert!(extract_video_id("https://www.youtube.com/watch").is_err());
        assert!(extract_video_id("https://www.youtube.com/watch?v=").is_err());
        assert!(extract_video_id("https://youtu.be/").is_err());
        assert!(extract_video_id("https://example.com/channel/UCxxx").is_err());
        assert!(matches!(
            extract_video_id("not-a-url"),
            Err(VidmapError::UrlError(_))
        ));
    }

    #[test]
    fn test_resolve_script_url() {
        assert_eq!(
            resolve_script_url(
                "http://www.youtube.com/watch?v=x",
                "//s.ytimg.com/yts/jsbin/html5player.js",
                "https"
            )
            .unwrap(),
            "http://s.ytimg.com/yts/jsbin/html5player.js"
        );
        assert_eq!(
            resolve_script_url("https://host.test/watch?v=x", "/s/player/base.js", "https")
                .unwrap(),
            "https://host.test/s/player/base.js"
        );
        assert_eq!(
            resolve_script_url("https://host.test/watch", "http://cdn.test/p.js", "https")
                .unwrap(),
            "http://cdn.test/p.js"
        );
        assert_eq!(
            resolve_script_url("not a url", "//cdn.test/p.js", "https").unwrap(),
            "https://cdn.test/p.js"
        );
        assert!(resolve_script_url("not a url", "/p.js", "https").is_err());
    }

    #[test]
    fn test_has_signature() {
        assert!(has_signature("http://r.test/videoplayback?id=1&signature=AB.CD"));
        assert!(!has_signature("http://r.test/videoplayback?id=1&signature="));
        assert!(!has_signature("http://r.test/videoplayback?id=1&xsig=AB"));
        assert!(!has_signature("http://r.test/videoplayback"));
    }

    #[test]
    fn test_set_signature() {
        assert_eq!(
            set_signature("http://r.test/videoplayback?id=1", "AB.CD").unwrap(),
            "http://r.test/videoplayback?id=1&signature=AB.CD"
        );
        assert_eq!(
            set_signature("http://r.test/videoplayback", "A/B").unwrap(),
            "http://r.test/videoplayback?signature=A%2FB"
        );
        assert!(has_signature(&set_signature("http://r.test/v?x=1", "ZZ").unwrap()));
        assert!(matches!(
            set_signature("not a url", "ZZ"),
            Err(VidmapError::UrlError(_))
        ));
    }

    #[test]
    fn test_set_signature_replaces_empty_parameter() {
        let signed =
            set_signature("http://r.test/videoplayback?id=1&signature=&itag=18", "NEW").unwrap();
        assert_eq!(signed, "http://r.test/videoplayback?id=1&itag=18&signature=NEW");
        let count = Url::parse(&signed)
            .unwrap()
            .query_pairs()
            .filter(|(key, _)| key == SIGNATURE_PARAM)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_set_signature_keeps_encoded_values() {
        let signed =
            set_signature("http://r.test/v?sparams=id%2Cexpire&mime=video%2Fmp4", "S").unwrap();
        let pairs: Vec<(String, String)> = Url::parse(&signed)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("sparams".to_string(), "id,expire".to_string()),
                ("mime".to_string(), "video/mp4".to_string()),
                ("signature".to_string(), "S".to_string()),
            ]
        );
    }

    #[test]
    fn test_itag_from_url() {
        assert_eq!(itag_from_url("http://r.test/videoplayback?itag=22&id=1"), Some(22));
        assert_eq!(itag_from_url("http://r.test/videoplayback?itag=abc"), None);
        assert_eq!(itag_from_url("http://r.test/videoplayback"), None);
        assert_eq!(itag_from_url("::"), None);
    }
}
