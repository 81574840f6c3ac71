use crate::domain::render::RenderRequest;

/// Assemble the single-document page the capture driver loads: user markup
/// in the body, user styles scoped after a minimal reset, user script after
/// an onerror guard so a stray page error cannot abort capture.
///
/// Content is embedded verbatim; escaping is the submitter's concern.
pub fn compose_document(request: &RenderRequest) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
    * {{ margin: 0; padding: 0; box-sizing: border-box; }}
    body {{
      margin: 0;
      padding: 0;
      overflow: hidden;
      background: #000;
      font-family: 'Noto Sans', 'Noto Color Emoji', system-ui, sans-serif;
    }}
    /* User CSS */
    {css}
  </style>
</head>
<body>
  {html}
  <script>
    window.onerror = function (msg) {{ console.log('Page Error:', msg); return true; }};

    /* User JS */
    {js}
  </script>
</body>
</html>"#,
        css = request.css,
        html = request.html,
        js = request.js,
    )
}

/// File name of the composed document inside a session directory.
pub const DOCUMENT_FILE_NAME: &str = "index.html";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::render::{OutputFormat, Resolution};

    fn request() -> RenderRequest {
        RenderRequest {
            html: String::from("<div id=\"scene\">content</div>"),
            css: String::from("#scene { color: red; }"),
            js: String::from("console.log('ready');"),
            resolution: Resolution::Square,
            format: OutputFormat::Mp4,
            duration: 5,
            fps: 10,
        }
    }

    #[test]
    fn embeds_user_content_verbatim() {
        let document = compose_document(&request());
        assert!(document.contains("<div id=\"scene\">content</div>"));
        assert!(document.contains("#scene { color: red; }"));
        assert!(document.contains("console.log('ready');"));
    }

    #[test]
    fn guards_against_page_errors_before_user_script() {
        let document = compose_document(&request());
        let guard = document.find("window.onerror").unwrap();
        let user_js = document.find("console.log('ready')").unwrap();
        assert!(guard < user_js);
    }

    #[test]
    fn pins_a_black_hidden_overflow_stage() {
        let document = compose_document(&request());
        assert!(document.contains("overflow: hidden"));
        assert!(document.contains("background: #000"));
        assert!(document.starts_with("<!DOCTYPE html>"));
    }
}
