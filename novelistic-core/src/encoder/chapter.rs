use super::ChapterEntry;
use quick_xml::escape::escape;

/// Stylesheet shared by every chapter and the navigation document
pub const STYLESHEET: &str = r#"
body {
    margin: 5% auto;
    max-width: 800px;
    line-height: 1.6;
    font-size: 1.2em;
    color: #222;
    padding: 0 10px;
    font-family: system-ui, -apple-system, sans-serif;
}

h1 {
    line-height: 1.2;
    text-align: center;
    margin-bottom: 2em;
}

p {
    margin: 1em 0;
    text-indent: 1.5em;
}

img {
    max-width: 100%;
    height: auto;
}

nav[epub|type="toc"] {
    margin: 5% auto;
    max-width: 800px;
}

nav[epub|type="toc"] ol {
    list-style-type: none;
    margin: 1em 0;
    padding: 0;
}

nav[epub|type="toc"] li {
    margin: 0.5em 0;
}

nav[epub|type="toc"] a {
    color: #0066cc;
    text-decoration: none;
}
"#;

/// Id of the heading each chapter document opens with
pub(crate) const HEADING_ID: &str = "chapter-heading";

/// Wrap a sanitized chapter body in an XHTML content document
pub(crate) fn chapter_xhtml(chapter: &ChapterEntry, language: &str) -> String {
    let title = escape(chapter.title.as_str());
    let language = escape(language);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{language}" xml:lang="{language}">
<head>
    <meta charset="UTF-8"/>
    <title>{title}</title>
    <link rel="stylesheet" type="text/css" href="../style.css"/>
</head>
<body>
    <section epub:type="chapter">
        <h1 id="{HEADING_ID}">{title}</h1>
        {body}
    </section>
</body>
</html>"#,
        body = chapter.body,
    )
}
