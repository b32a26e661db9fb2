//! DOCX text extraction: read `word/document.xml` out of the OOXML zip and
//! collect the `w:t` text runs, one line per paragraph.

use crate::errors::AppError;
use quick_xml::events::Event;
use std::io::Read;
use std::path::Path;

/// Upper bound on the decompressed document part, to keep a hostile archive
/// from ballooning in memory.
const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

pub fn extract_text(path: &Path) -> Result<String, AppError> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::AcquisitionFailed(format!("DOCX open {}: {e}", path.display())))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| AppError::AcquisitionFailed(format!("DOCX archive: {e}")))?;

    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| AppError::AcquisitionFailed("word/document.xml not found in DOCX".to_string()))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_DOCUMENT_XML_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| AppError::AcquisitionFailed(format!("DOCX read: {e}")))?;
    if xml.len() as u64 >= MAX_DOCUMENT_XML_BYTES {
        return Err(AppError::AcquisitionFailed(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    text_runs(&xml)
}

fn text_runs(xml: &[u8]) -> Result<String, AppError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut out = String::new();
    let mut in_text_run = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(Event::Text(t)) if in_text_run => {
                out.push_str(t.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                // Paragraph boundary.
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AppError::AcquisitionFailed(format!("DOCX XML parse: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}
