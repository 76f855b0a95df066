//! Multi-format content parser dispatched by declared media type

use crate::error::{Error, ParseErrorKind, Result};

/// Parser variants, keyed by declared media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// Plain text and Markdown
    PlainText,
    /// HTML with tag stripping
    Html,
    /// CSV flattened row by row
    Csv,
    /// Word document (.docx)
    Docx,
    /// PDF text extraction
    Pdf,
    /// Fallback that attempts byte-to-text decoding
    Fallback,
}

impl ParserKind {
    /// Resolve the handler for a declared media type.
    ///
    /// Returns `None` for types that are known to carry no extractable text
    /// (images, audio, video); every other unrecognized type is given to the
    /// fallback decoder.
    pub fn for_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/plain" | "text/markdown" => Some(Self::PlainText),
            "text/html" => Some(Self::Html),
            "text/csv" | "application/csv" => Some(Self::Csv),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "application/pdf" => Some(Self::Pdf),
            _ if essence.starts_with("image/")
                || essence.starts_with("audio/")
                || essence.starts_with("video/") =>
            {
                None
            }
            _ => Some(Self::Fallback),
        }
    }
}

/// Content parser: `(bytes, declared media type) -> extracted text`
pub struct ContentParser;

impl ContentParser {
    /// Extract plain text from raw file bytes
    pub fn parse(data: &[u8], media_type: &str) -> Result<String> {
        let kind = ParserKind::for_media_type(media_type).ok_or_else(|| {
            Error::parse(
                ParseErrorKind::UnsupportedType,
                format!("No text can be extracted from '{}'", media_type),
            )
        })?;

        match kind {
            ParserKind::PlainText | ParserKind::Fallback => Self::parse_text(data),
            ParserKind::Html => Self::parse_html(data),
            ParserKind::Csv => Self::parse_csv(data),
            ParserKind::Docx => Self::parse_docx(data),
            ParserKind::Pdf => Self::parse_pdf(data),
        }
    }

    /// Decode bytes as UTF-8 text
    fn parse_text(data: &[u8]) -> Result<String> {
        String::from_utf8(data.to_vec()).map_err(|e| {
            Error::parse(
                ParseErrorKind::DecodeFailure,
                format!("Content is not valid UTF-8: {}", e),
            )
        })
    }

    /// Strip markup from an HTML document
    fn parse_html(data: &[u8]) -> Result<String> {
        let html = Self::parse_text(data)?;
        let document = scraper::Html::parse_document(&html);

        let body_selector = scraper::Selector::parse("body").unwrap();
        let text: String = match document.select(&body_selector).next() {
            Some(body) => body.text().collect::<Vec<_>>().join(" "),
            None => document.root_element().text().collect::<Vec<_>>().join(" "),
        };

        let whitespace = regex::Regex::new(r"\s+").unwrap();
        Ok(whitespace.replace_all(text.trim(), " ").to_string())
    }

    /// Flatten a CSV file into one line per record
    fn parse_csv(data: &[u8]) -> Result<String> {
        let mut reader = csv::Reader::from_reader(data);
        let mut lines = Vec::new();

        if let Ok(headers) = reader.headers() {
            let header_line = headers.iter().collect::<Vec<_>>().join(", ");
            if !header_line.is_empty() {
                lines.push(header_line);
            }
        }

        for record in reader.records() {
            let record = record.map_err(|e| {
                Error::parse(
                    ParseErrorKind::DecodeFailure,
                    format!("Invalid CSV record: {}", e),
                )
            })?;
            lines.push(record.iter().collect::<Vec<_>>().join(", "));
        }

        Ok(lines.join("\n"))
    }

    /// Extract paragraph text from a DOCX document
    fn parse_docx(data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| {
            Error::parse(
                ParseErrorKind::DecodeFailure,
                format!("Failed to read DOCX: {}", e),
            )
        })?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }

    /// Extract text from a PDF document
    fn parse_pdf(data: &[u8]) -> Result<String> {
        let content = pdf_extract::extract_text_from_mem(data).map_err(|e| {
            Error::parse(
                ParseErrorKind::DecodeFailure,
                format!("Failed to extract PDF text: {}", e),
            )
        })?;

        // Strip null chars and collapse the per-line noise extraction leaves behind
        let content = content
            .replace('\0', "")
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if content.is_empty() {
            return Err(Error::parse(
                ParseErrorKind::DecodeFailure,
                "No text content could be extracted from PDF",
            ));
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passthrough() {
        let text = ContentParser::parse(b"hello world", "text/plain").unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn markdown_is_read_as_text() {
        let text = ContentParser::parse(b"# Title\n\nbody", "text/markdown").unwrap();
        assert_eq!(text, "# Title\n\nbody");
    }

    #[test]
    fn html_is_stripped() {
        let html = b"<html><body><h1>Title</h1><p>First paragraph.</p></body></html>";
        let text = ContentParser::parse(html, "text/html").unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("First paragraph."));
        assert!(!text.contains('<'));
    }

    #[test]
    fn csv_is_flattened() {
        let csv = b"name,city\nada,london\ngrace,washington";
        let text = ContentParser::parse(csv, "text/csv").unwrap();
        assert!(text.contains("name, city"));
        assert!(text.contains("ada, london"));
        assert!(text.contains("grace, washington"));
    }

    #[test]
    fn media_type_parameters_are_ignored() {
        let text = ContentParser::parse(b"abc", "text/plain; charset=utf-8").unwrap();
        assert_eq!(text, "abc");
    }

    #[test]
    fn image_type_is_unsupported() {
        let err = ContentParser::parse(&[0xFF, 0xD8, 0xFF], "image/jpeg").unwrap_err();
        match err {
            Error::Parse { kind, .. } => assert_eq!(kind, ParseErrorKind::UnsupportedType),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_type_falls_back_to_text_decode() {
        let text = ContentParser::parse(b"some bytes", "application/x-custom").unwrap();
        assert_eq!(text, "some bytes");
    }

    #[test]
    fn invalid_utf8_on_fallback_is_decode_failure() {
        let err = ContentParser::parse(&[0x80, 0x81, 0x82], "application/octet-stream").unwrap_err();
        match err {
            Error::Parse { kind, .. } => assert_eq!(kind, ParseErrorKind::DecodeFailure),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
