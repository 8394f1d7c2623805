//! SVG writing operations.

use std::{borrow::Cow, fs, io::Write, path::Path};

use anyhow::{Context, Result};

/// In-memory SVG writer. The document is only written to disk once complete.
pub(crate) struct SvgStringWriter {
    buffer: Vec<u8>
}

/// Implement std::io::Write so `write!` / `writeln!` work.
impl Write for SvgStringWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> { Ok(()) }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.buffer.extend_from_slice(buf);
        Ok(())
    }
}

impl SvgStringWriter {
    pub(crate) fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Write the XML declaration and the opening <svg> tag.
    pub(crate) fn write_header(&mut self, width: f64, height: f64) -> Result<()> {
        writeln!(self, r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"##)?;
        writeln!(self, r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" id="chart" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"##)?;
        writeln!(self, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;
        Ok(())
    }

    /// Write the text styles used by the annotations and the legend.
    pub(crate) fn write_styles(&mut self) -> Result<()> {
        writeln!(self, r##"<defs>
<style>
    text {{ font-family: "Helvetica Neue", Arial, sans-serif; }}
    .map-title {{ font-size: 26px; font-weight: 700; }}
    .map-subtitle {{ font-size: 16px; }}
    .legendText {{ font-size: 12px; fill: #373737; }}
    .referenceText {{ font-size: 10px; fill: #7c7c7c; }}
    .referenceText a {{ text-decoration: underline; }}
</style>
</defs>"##)?;
        Ok(())
    }

    /// Write the closing </svg> tag.
    pub(crate) fn write_footer(&mut self) -> Result<()> {
        writeln!(self, "</svg>")?;
        Ok(())
    }

    pub(crate) fn into_string(self) -> Result<String> {
        String::from_utf8(self.buffer)
            .context("[svg] SVG output is not valid UTF-8")
    }
}

/// Write a finished document, creating parent directories as needed.
pub(crate) fn save_svg(path: &Path, document: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("[svg] Failed to create {}", parent.display()))?;
    }
    fs::write(path, document)
        .with_context(|| format!("[svg] Failed to write {}", path.display()))
}

/// Escape text content and attribute values.
pub(crate) fn escape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_footer_frame_the_document() {
        let mut writer = SvgStringWriter::new();
        writer.write_header(900.0, 890.0).unwrap();
        writer.write_footer().unwrap();
        let doc = writer.into_string().unwrap();

        assert!(doc.starts_with("<?xml"));
        assert!(doc.contains(r#"width="900" height="890""#));
        assert!(doc.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("map.svg");
        save_svg(&path, "<svg/>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<svg/>");
    }
}
