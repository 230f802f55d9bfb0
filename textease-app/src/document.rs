use anyhow::{bail, Context, Result};
use encoding_rs::WINDOWS_1251;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::{Cursor, Read};
use std::path::Path;

/// Largest document accepted for upload.
pub const MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;

const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Docx,
}

/// Read a `.txt` or `.docx` document into a string.
///
/// Plain text is decoded as UTF-8, then Windows-1251, then Latin-1. Word
/// documents yield their non-blank paragraphs joined by newlines.
pub async fn read_document(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let format = match extension.as_deref() {
        Some("txt") => Format::Text,
        Some("docx") => Format::Docx,
        _ => bail!("only .txt and .docx documents are supported"),
    };

    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("cannot open {}", path.display()))?;
    if metadata.len() > MAX_DOCUMENT_BYTES {
        bail!(
            "{} is {} bytes; documents are limited to 20 MB",
            path.display(),
            metadata.len()
        );
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;

    match format {
        Format::Text => Ok(decode_text(&bytes).into_owned()),
        Format::Docx => tokio::task::spawn_blocking(move || docx_paragraphs(&bytes))
            .await
            .context("document reader stopped")?
            .with_context(|| format!("{} is not a readable Word document", path.display())),
    }
}

fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(text);
    }
    // Code page 1251 leaves 0x98 unassigned.
    if !bytes.contains(&0x98) {
        if let Some(text) = WINDOWS_1251.decode_without_bom_handling_and_without_replacement(bytes) {
            return text;
        }
    }
    encoding_rs::mem::decode_latin1(bytes)
}

fn docx_paragraphs(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .with_context(|| format!("missing {DOCX_BODY}"))?
        .read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let paragraph = std::mem::take(&mut current);
                    if !paragraph.trim().is_empty() {
                        paragraphs.push(paragraph);
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_with_body(body: &str) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let mut zip = zip::ZipWriter::new(file.reopen().unwrap());
        zip.start_file(DOCX_BODY, SimpleFileOptions::default()).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
        .unwrap();
        zip.finish().unwrap();
        file
    }

    #[tokio::test]
    async fn reads_utf8_text() {
        let mut file = tempfile::Builder::new().suffix(".TXT").tempfile().unwrap();
        write!(file, "Главный герой пошёл в лес.").unwrap();
        let text = read_document(file.path()).await.unwrap();
        assert_eq!(text, "Главный герой пошёл в лес.");
    }

    #[tokio::test]
    async fn legacy_encodings_are_decoded() {
        let mut cyrillic = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        // "Привет, мир." in Windows-1251.
        cyrillic
            .write_all(&[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2, 0x2C, 0x20, 0xEC, 0xE8, 0xF0, 0x2E])
            .unwrap();
        assert_eq!(read_document(cyrillic.path()).await.unwrap(), "Привет, мир.");

        let mut latin = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        latin.write_all(b"caf\xE9 \x98").unwrap();
        assert_eq!(read_document(latin.path()).await.unwrap(), "café \u{98}");
    }

    #[tokio::test]
    async fn docx_paragraphs_are_joined_by_newlines() {
        let file = docx_with_body(
            "<w:p><w:r><w:t>Первый </w:t></w:r><w:r><w:t xml:space=\"preserve\">абзац &amp; ещё.</w:t></w:r></w:p>\
             <w:p><w:r><w:t>   </w:t></w:r></w:p>\
             <w:p><w:r><w:t>Второй</w:t><w:tab/><w:t>абзац.</w:t></w:r></w:p>",
        );
        let text = read_document(file.path()).await.unwrap();
        assert_eq!(text, "Первый абзац & ещё.\nВторой\tабзац.");
    }

    #[tokio::test]
    async fn rejects_other_extensions_and_broken_docx() {
        let pdf = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let err = read_document(pdf.path()).await.unwrap_err();
        assert!(err.to_string().contains(".docx"));

        let mut fake = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        write!(fake, "not a zip archive").unwrap();
        let err = read_document(fake.path()).await.unwrap_err();
        assert!(err.to_string().contains("not a readable Word document"));
    }

    #[tokio::test]
    async fn rejects_oversized_documents() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.as_file().set_len(MAX_DOCUMENT_BYTES + 1).unwrap();
        let err = read_document(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("20 MB"));
    }
}
