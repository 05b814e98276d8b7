//! Text extraction for rich documents: PDF, EPUB, plain text and DOCX.
//!
//! PDF text comes from `pdf-extract` and EPUB books are opened with the `epub` crate. DOCX is a ZIP
//! container of XML parts, read with `zip` and `quick-xml`. No layout reconstruction is attempted
//! beyond paragraph and block boundaries.

use quick_xml::Reader;
use epub::doc::EpubDoc;
use quick_xml::events::{BytesText, Event};
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;
use zip::result::ZipError;

use super::ExtractError;
use crate::file_type::FileType;

/// Extract text from one of the document formats.
///
/// Spreadsheet types are routed to the tabular readers by the dispatcher and are rejected here
/// with [`ExtractError::UnexpectedType`].
pub fn extract_document(content: &[u8], file_type: FileType) -> Result<String, ExtractError> {
    match file_type {
        FileType::Pdf => extract_pdf(content),
        FileType::Epub => extract_epub(content),
        FileType::Txt => Ok(extract_txt(content)),
        FileType::Docx => extract_docx(content),
        FileType::Xlsx | FileType::Csv => Err(ExtractError::UnexpectedType(file_type)),
    }
}

fn extract_pdf(content: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(content).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Plain text, decoded as UTF-8. A leading byte-order mark is dropped and invalid sequences are
/// replaced rather than rejected.
fn extract_txt(content: &[u8]) -> String {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    String::from_utf8_lossy(content).into_owned()
}

/// One line per top-level body paragraph, in document order.
pub fn extract_docx(content: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(content))?;
    let document_xml = read_part(&mut archive, "word/document.xml")?;
    Ok(docx_paragraphs(&document_xml)?.join("\n"))
}

/// Collect the text of each `w:p` that sits directly in `w:body`.
///
/// Paragraphs inside tables are not body paragraphs and are skipped, as is text of paragraphs
/// nested in text boxes. Empty paragraphs are kept so blank lines survive.
fn docx_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    // w:p depth below the current body paragraph
    let mut nested = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                if name == b"w:p" {
                    if current.is_some() {
                        nested += 1;
                    } else if parent_is(&stack, b"w:body") {
                        current = Some(String::new());
                    }
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let in_run = parent_is(&stack, b"w:r");
                match (e.name().as_ref(), current.as_mut()) {
                    (b"w:p", None) if parent_is(&stack, b"w:body") => paragraphs.push(String::new()),
                    (b"w:tab", Some(paragraph)) if in_run && nested == 0 => paragraph.push('\t'),
                    (b"w:br" | b"w:cr", Some(paragraph)) if in_run && nested == 0 => paragraph.push('\n'),
                    _ => {}
                }
            }
            Event::Text(t) => {
                if let Some(paragraph) = current.as_mut()
                    && nested == 0
                    && parent_is(&stack, b"w:t")
                {
                    paragraph.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => {
                stack.pop();
                if e.name().as_ref() == b"w:p" && current.is_some() {
                    if nested > 0 {
                        nested -= 1;
                    } else if let Some(paragraph) = current.take() {
                        paragraphs.push(paragraph);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn parent_is(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.last().is_some_and(|parent| parent == name)
}

/// Text of every spine item, in reading order.
///
/// The container, package document and spine are read by the `epub` crate. Each chapter is an
/// XHTML document reduced to text by [`xhtml_text`].
pub fn extract_epub(content: &[u8]) -> Result<String, ExtractError> {
    let mut doc = EpubDoc::from_reader(Cursor::new(content)).map_err(|e| ExtractError::Epub(e.to_string()))?;

    let mut text = String::new();
    let mut chapter = 0usize;
    loop {
        let (xhtml, _mime) = doc
            .get_current_str()
            .ok_or_else(|| ExtractError::MissingPart(format!("spine item {chapter}")))?;
        text.push_str(&xhtml_text(&xhtml)?);

        if !doc.go_next() {
            break;
        }
        chapter += 1;
    }

    Ok(text)
}

/// Elements whose end starts a new line of text.
const BLOCK_ELEMENTS: &[&[u8]] = &[
    b"p",
    b"div",
    b"h1",
    b"h2",
    b"h3",
    b"h4",
    b"h5",
    b"h6",
    b"li",
    b"tr",
    b"dt",
    b"dd",
    b"blockquote",
    b"pre",
    b"section",
    b"article",
    b"aside",
    b"header",
    b"footer",
    b"figcaption",
    b"table",
    b"ul",
    b"ol",
];

/// Elements whose content is never rendered.
const SKIPPED_ELEMENTS: &[&[u8]] = &[b"head", b"script", b"style"];

/// Plain text of an XHTML content document.
fn xhtml_text(xhtml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xhtml);
    let mut text = TextBuffer::default();
    let mut skipped = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if SKIPPED_ELEMENTS.contains(&e.local_name().as_ref()) {
                    skipped += 1;
                }
            }
            Event::Empty(e) => {
                if skipped == 0 && e.local_name().as_ref() == b"br" {
                    text.break_line();
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                if SKIPPED_ELEMENTS.contains(&name.as_ref()) {
                    skipped = skipped.saturating_sub(1);
                } else if skipped == 0 && BLOCK_ELEMENTS.contains(&name.as_ref()) {
                    text.break_line();
                }
            }
            Event::Text(t) if skipped == 0 => text.push(&unescape_html(&t)?),
            Event::CData(c) if skipped == 0 => text.push(&String::from_utf8_lossy(&c)),
            Event::Eof => break,
            _ => {}
        }
    }

    text.break_line();
    Ok(text.into_inner())
}

/// XHTML chapters commonly use HTML named entities such as `&nbsp;`.
fn unescape_html<'a>(t: &'a BytesText<'a>) -> Result<std::borrow::Cow<'a, str>, quick_xml::Error> {
    use quick_xml::escape::{resolve_html5_entity, resolve_predefined_entity};
    t.unescape_with(|entity| resolve_predefined_entity(entity).or_else(|| resolve_html5_entity(entity)))
}

/// Accumulates text with ASCII whitespace collapsed, one line per block.
#[derive(Debug, Default)]
struct TextBuffer {
    out: String,
}

impl TextBuffer {
    fn push(&mut self, chunk: &str) {
        for c in chunk.chars() {
            if c.is_ascii_whitespace() {
                if !self.out.is_empty() && !self.out.ends_with([' ', '\n']) {
                    self.out.push(' ');
                }
            } else {
                self.out.push(c);
            }
        }
    }

    fn break_line(&mut self) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn into_inner(self) -> String {
        self.out
    }
}

/// Read one archive member as UTF-8 text.
fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String, ExtractError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Err(ExtractError::MissingPart(name.to_string())),
        Err(e) => return Err(e.into()),
    };

    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(xml)
}
