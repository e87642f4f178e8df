//! Lookup and filtering over resolved variants

use crate::core::variant::Variant;
use crate::error::VidmapError;

fn matches(variant: &Variant, extension: Option<&str>, resolution: Option<&str>) -> bool {
    extension.map_or(true, |ext| variant.extension() == ext)
        && resolution.map_or(true, |res| variant.resolution() == res)
}

/// All variants matching both optional criteria, in collection order
pub fn filter<'a>(
    variants: &'a [Variant],
    extension: Option<&str>,
    resolution: Option<&str>,
) -> Vec<&'a Variant> {
    variants
        .iter()
        .filter(|v| matches(v, extension, resolution))
        .collect()
}

/// The single variant matching both optional criteria.
///
/// `Ok(None)` when nothing matches, [`VidmapError::AmbiguousResult`] when
/// more than one variant does.
pub fn get<'a>(
    variants: &'a [Variant],
    extension: Option<&str>,
    resolution: Option<&str>,
) -> Result<Option<&'a Variant>, VidmapError> {
    let mut found = filter(variants, extension, resolution);
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        n => Err(VidmapError::AmbiguousResult(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::formats;

    fn variants() -> Vec<Variant> {
        [18, 22, 43, 45]
            .into_iter()
            .map(|itag| {
                Variant::new(
                    format!("http://r.test/{}", itag),
                    itag,
                    formats::lookup(itag).unwrap(),
                    "clip",
                )
            })
            .collect()
    }

    #[test]
    fn test_filter() {
        let all = variants();
        assert_eq!(filter(&all, None, None).len(), 4);
        assert_eq!(filter(&all, Some("mp4"), None).len(), 2);
        assert_eq!(filter(&all, None, Some("720p")).len(), 2);
        let exact = filter(&all, Some("webm"), Some("360p"));
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].itag(), 43);
        assert!(filter(&all, Some("flv"), None).is_empty());
    }

    #[test]
    fn test_get_single() {
        let all = variants();
        let found = get(&all, Some("mp4"), Some("720p")).unwrap().unwrap();
        assert_eq!(found.itag(), 22);
    }

    #[test]
    fn test_get_none() {
        let all = variants();
        assert!(get(&all, Some("mp4"), Some("1080p")).unwrap().is_none());
        assert!(get(&[], None, None).unwrap().is_none());
    }

    #[test]
    fn test_get_ambiguous() {
        let all = variants();
        let err = get(&all, Some("mp4"), None).unwrap_err();
        assert!(matches!(err, VidmapError::AmbiguousResult(2)));
        assert!(matches!(get(&all, None, None), Err(VidmapError::AmbiguousResult(4))));
    }
}
