use vidmap::platform::cipher::DECIPHER_WRAPPER;
use vidmap::{HttpFetcher, JsCipher, Session, VidmapError};

const TOKEN: &str = "AAAA.BBBBCCCCDDDD1234";

const PLAYER_JS: &str = r#"var _p={};(function(g){
var Qz={Rv:function(a){a.reverse()},Sp:function(a,b){a.splice(0,b)}};
g.noop=function(a){return a};
var Tk=function(a){a=a.split("");Qz.Rv(a,12);return a.join("")};
})(_p);"#;

fn reverse_evaluator(program: &str) -> Result<String, VidmapError> {
    let call = format!("{}(", DECIPHER_WRAPPER);
    let start = program
        .rfind(&call)
        .ok_or_else(|| VidmapError::EvaluatorError("no call".into()))?
        + call.len();
    let end = program[start..]
        .find(");")
        .ok_or_else(|| VidmapError::EvaluatorError("no end".into()))?
        + start;
    let token: String = serde_json::from_str(&program[start..end])
        .map_err(|e| VidmapError::EvaluatorError(e.to_string()))?;
    if program.contains("var Qz={Rv:function(a){a.reverse()}") && program.contains("Qz.Rv(a,12)") {
        Ok(token.chars().rev().collect())
    } else {
        Ok(String::new())
    }
}

fn stream_map() -> String {
    let signed = [
        ("itag", "18"),
        ("url", "http://r1.test/videoplayback?itag=18&signature=READY"),
        ("quality", "medium"),
        ("fallback_host", "tc.r1.test"),
        ("type", "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\""),
    ];
    let scrambled = [
        ("itag", "45"),
        ("url", "http://r2.test/videoplayback?itag=45&id=7"),
        ("quality", "hd720"),
        ("fallback_host", "tc.r2.test"),
        ("s", TOKEN),
        ("type", "video/webm; codecs=\"vp8.0, vorbis\""),
    ];
    let unknown = [
        ("itag", "999"),
        ("url", "http://r3.test/videoplayback?itag=999&signature=X"),
    ];

    [&signed[..], &scrambled[..], &unknown[..]]
        .iter()
        .map(|fields| {
            fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&")
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn watch_page() -> String {
    let config = serde_json::json!({
        "assets": {"js": "/yts/jsbin/player.js"},
        "args": {
            "title": "Integration {Clip}",
            "url_encoded_fmt_stream_map": stream_map(),
        }
    });
    format!(
        "<!DOCTYPE html><html><body><script>var ytplayer = ytplayer || {{}};ytplayer.config = {};</script></body></html>",
        config
    )
}

#[test]
fn resolves_variants_over_http() {
    let mut server = mockito::Server::new();
    let page = server
        .mock("GET", "/watch")
        .match_query(mockito::Matcher::UrlEncoded("v".into(), "clip42".into()))
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(watch_page())
        .expect(1)
        .create();
    let script = server
        .mock("GET", "/yts/jsbin/player.js")
        .with_status(200)
        .with_body(PLAYER_JS)
        .expect(1)
        .create();

    let fetcher = HttpFetcher::new().unwrap();
    let mut session = Session::with_parts(fetcher, JsCipher::new(reverse_evaluator));
    let url = format!("{}/watch?v=clip42", server.url());
    session.set_url(&url).unwrap();

    page.assert();
    script.assert();

    assert_eq!(session.title(), Some("Integration {Clip}"));
    assert_eq!(session.video_id().as_deref(), Some("clip42"));
    assert_eq!(session.script_url(), Some(format!("{}/yts/jsbin/player.js", server.url()).as_str()));

    let itags: Vec<u32> = session.iter().map(|v| v.itag()).collect();
    assert_eq!(itags, vec![18, 45]);

    let mp4 = session.get(Some("mp4"), Some("360p")).unwrap().unwrap();
    assert_eq!(mp4.url(), "http://r1.test/videoplayback?itag=18&signature=READY");

    let webm = session.get(Some("webm"), None).unwrap().unwrap();
    let expected: String = TOKEN.chars().rev().collect();
    let parsed = url::Url::parse(webm.url()).unwrap();
    let signature = parsed
        .query_pairs()
        .find(|(k, _)| k == "signature")
        .map(|(_, v)| v.into_owned());
    assert_eq!(signature.as_deref(), Some(expected.as_str()));
    assert_eq!(webm.resolution(), "720p");

    assert!(session.get(Some("flv"), None).unwrap().is_none());
    assert!(matches!(
        session.get(None, None),
        Err(VidmapError::AmbiguousResult(2))
    ));

    session.set_filename("renamed");
    assert!(session.filter(None, None).iter().all(|v| v.filename() == "renamed"));
}

#[test]
fn page_without_config_is_structure_error() {
    let mut server = mockito::Server::new();
    let _page = server
        .mock("GET", "/watch")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body("<html>the host redesigned its page</html>")
        .create();

    let mut session = Session::with_parts(HttpFetcher::new().unwrap(), JsCipher::new(reverse_evaluator));
    let err = session
        .set_url(&format!("{}/watch?v=x", server.url()))
        .unwrap_err();
    assert!(matches!(err, VidmapError::StructureError(_)));
    assert!(session.videos().is_empty());
}

#[test]
fn http_failure_is_reported() {
    let mut server = mockito::Server::new();
    let _page = server
        .mock("GET", "/watch")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .create();

    let mut session = Session::with_parts(HttpFetcher::new().unwrap(), JsCipher::new(reverse_evaluator));
    let err = session
        .set_url(&format!("{}/watch?v=x", server.url()))
        .unwrap_err();
    assert!(matches!(err, VidmapError::HttpError(_)));
    assert!(!err.is_host_change());
}
