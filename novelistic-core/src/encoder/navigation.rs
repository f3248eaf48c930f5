//! EPUB 3 navigation document and EPUB 2 NCX

use super::epub::PublicationContext;
use super::ChapterEntry;
use crate::types::Novel;
use quick_xml::escape::escape;

/// Generate `nav.xhtml`: one list entry per chapter in spine order
pub(crate) fn nav_xhtml(novel: &Novel, chapters: &[ChapterEntry], language: &str) -> String {
    let mut entries = String::new();
    for chapter in chapters {
        entries.push_str(&format!(
            "            <li><a href=\"{}\">{}</a></li>\n",
            chapter.href,
            escape(chapter.title.as_str())
        ));
    }
    let language = escape(language);

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{language}" xml:lang="{language}">
<head>
    <meta charset="UTF-8"/>
    <title>{title} - Table of Contents</title>
    <link rel="stylesheet" type="text/css" href="style.css"/>
</head>
<body>
    <nav id="toc" epub:type="toc">
        <h1>Table of Contents</h1>
        <ol>
{entries}        </ol>
    </nav>
</body>
</html>"#,
        title = escape(novel.title.as_str()),
    )
}

/// Generate `toc.ncx`; `playOrder` runs from 1 in spine order
pub(crate) fn toc_ncx(novel: &Novel, chapters: &[ChapterEntry], context: &PublicationContext) -> String {
    let mut nav_points = String::new();
    for (index, chapter) in chapters.iter().enumerate() {
        nav_points.push_str(&format!(
            r#"        <navPoint id="{id}" playOrder="{play_order}">
            <navLabel>
                <text>{label}</text>
            </navLabel>
            <content src="{href}"/>
        </navPoint>
"#,
            id = chapter.id,
            play_order = index + 1,
            label = escape(chapter.title.as_str()),
            href = chapter.href,
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
    <head>
        <meta name="dtb:uid" content="urn:uuid:{identifier}"/>
        <meta name="dtb:depth" content="1"/>
        <meta name="dtb:totalPageCount" content="0"/>
        <meta name="dtb:maxPageNumber" content="0"/>
    </head>
    <docTitle>
        <text>{title}</text>
    </docTitle>
    <navMap>
{nav_points}    </navMap>
</ncx>"#,
        identifier = context.identifier,
        title = escape(novel.title.as_str()),
    )
}
