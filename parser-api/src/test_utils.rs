//! Test utilities: application setup and in-memory document fixtures.

use std::io::Write;

use axum_test::TestServer;
use quick_xml::escape::escape;
use zip::{ZipWriter, write::SimpleFileOptions};

use crate::config::Config;

/// Install the process-wide rustls provider. Safe to call from every test.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        // The Prometheus layer installs a global recorder, which can only happen once per process
        enable_metrics: false,
        ..Default::default()
    }
}

pub async fn create_test_app(config: Config) -> TestServer {
    install_crypto_provider();
    crate::Application::new(config)
        .await
        .expect("Failed to create application")
        .into_test_server()
}

/// Serve `body` over raw HTTP/1.1 with chunked transfer encoding, so the response carries no
/// `Content-Length`. Returns the base URL; any path is answered with the same body.
pub async fn serve_chunked(body: Vec<u8>, chunk_size: usize) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
    let addr = listener.local_addr().expect("upstream address");

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let mut response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
                for chunk in body.chunks(chunk_size) {
                    response.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
                    response.extend_from_slice(chunk);
                    response.extend_from_slice(b"\r\n");
                }
                response.extend_from_slice(b"0\r\n\r\n");
                let _ = stream.write_all(&response).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

/// Build a zip archive from `(path, contents)` entries, in order.
pub fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(contents.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Build a minimal `.docx` whose `w:body` contains `body`.
pub fn build_docx(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    );
    build_zip(&[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
        ),
        ("word/document.xml", &document),
    ])
}

/// Build a minimal EPUB. `chapters` are `(manifest id, href relative to the package, body html)`
/// and `spine` lists manifest ids in reading order.
pub fn build_epub(chapters: &[(&str, &str, &str)], spine: &[&str]) -> Vec<u8> {
    let manifest: String = chapters
        .iter()
        .map(|(id, href, _)| format!(r#"<item id="{id}" href="{href}" media-type="application/xhtml+xml"/>"#))
        .collect();
    let itemrefs: String = spine.iter().map(|id| format!(r#"<itemref idref="{id}"/>"#)).collect();

    let opf = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Test Book</dc:title></metadata>
  <manifest>{manifest}</manifest>
  <spine>{itemrefs}</spine>
</package>"#
    );

    let pages: Vec<(String, String)> = chapters
        .iter()
        .map(|(_, href, body)| {
            (
                format!("OEBPS/{href}"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>{href}</title></head><body>{body}</body></html>"#
                ),
            )
        })
        .collect();

    let mut entries: Vec<(&str, &str)> = vec![
        ("mimetype", "application/epub+zip"),
        (
            "META-INF/container.xml",
            r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#,
        ),
        ("OEBPS/content.opf", &opf),
    ];
    entries.extend(pages.iter().map(|(name, xhtml)| (name.as_str(), xhtml.as_str())));
    build_zip(&entries)
}

/// One worksheet for [`build_xlsx`]. Each row lists cell values from column A; a value starting
/// with `#` is written as a number (`"#2.5"`), anything else as an inline string.
pub struct XlsxSheet<'a> {
    name: &'a str,
    rows: &'a [&'a [&'a str]],
}

impl<'a> XlsxSheet<'a> {
    pub fn new(name: &'a str, rows: &'a [&'a [&'a str]]) -> Self {
        Self { name, rows }
    }

    fn to_xml(&self) -> String {
        let mut rows = String::new();
        for (r, row) in self.rows.iter().enumerate() {
            rows.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                let reference = format!("{}{}", column_name(c), r + 1);
                match value.strip_prefix('#') {
                    Some(number) => rows.push_str(&format!(r#"<c r="{reference}"><v>{number}</v></c>"#)),
                    None => rows.push_str(&format!(
                        r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape(*value)
                    )),
                }
            }
            rows.push_str("</row>");
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{rows}</sheetData></worksheet>"#
        )
    }
}

fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).expect("ascii column name")
}

/// Build a minimal `.xlsx` workbook with `sheets` in order.
pub fn build_xlsx(sheets: &[XlsxSheet<'_>]) -> Vec<u8> {
    let mut overrides = String::new();
    let mut sheet_entries = String::new();
    let mut relationships = String::new();
    let mut worksheets = Vec::new();

    for (i, sheet) in sheets.iter().enumerate() {
        let n = i + 1;
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        sheet_entries.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            escape(sheet.name)
        ));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
        worksheets.push((format!("xl/worksheets/sheet{n}.xml"), sheet.to_xml()));
    }

    let content_types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
    );
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets></workbook>"#
    );
    let workbook_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#
    );

    let mut entries: Vec<(&str, &str)> = vec![
        ("[Content_Types].xml", &content_types),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        ),
        ("xl/workbook.xml", &workbook),
        ("xl/_rels/workbook.xml.rels", &workbook_rels),
    ];
    entries.extend(worksheets.iter().map(|(name, xml)| (name.as_str(), xml.as_str())));
    build_zip(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
    }
}
