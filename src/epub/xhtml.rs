//! XHTML content document skeleton shared by sections and the nav document.

use crate::util::escape_xml;

/// Wrap a body fragment in a complete XHTML 1.1 / EPUB 3 content document.
///
/// `body` is inserted verbatim; callers are responsible for it being
/// well-formed XHTML.
pub fn xhtml_document(title: &str, language: &str, css: Option<&str>, body: &str) -> String {
    let mut doc = String::with_capacity(body.len() + 512);
    let language = escape_xml(language);

    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n");
    doc.push_str(&format!(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" xml:lang=\"{language}\" lang=\"{language}\">\n"
    ));
    doc.push_str("  <head>\n    <meta charset=\"UTF-8\" />\n");
    doc.push_str(&format!("    <title>{}</title>\n", escape_xml(title)));
    if let Some(css) = css {
        doc.push_str(&format!(
            "    <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\" />\n",
            escape_xml(css)
        ));
    }
    doc.push_str("  </head>\n  <body>\n");
    doc.push_str(body);
    if !body.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str("  </body>\n</html>\n");
    doc
}

/// Body of the generated cover page for `image_href`.
pub fn cover_body(image_href: &str, alt: &str) -> String {
    format!(
        "    <img src=\"{}\" alt=\"{}\" />\n",
        escape_xml(image_href),
        escape_xml(alt)
    )
}
