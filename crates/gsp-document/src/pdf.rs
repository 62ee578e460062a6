//! # Minimal PDF 1.4 Emitter
//!
//! Serializes positioned draw operations into a PDF using only the
//! base-14 Helvetica fonts, so no font program is embedded and text is
//! written in WinAnsi (Latin-1) encoding, which covers Portuguese
//! accented characters.
//!
//! The writer is deliberately small: one object per page plus shared
//! font and catalog objects, uncompressed content streams, and a
//! classic cross-reference table. Nothing time- or randomness-dependent
//! is written (no `/CreationDate`, no `/ID`, no `/Producer`), so output
//! bytes are a pure function of the input operations.

/// A4 portrait, in PDF points.
pub const PAGE_WIDTH: f64 = 595.28;
pub const PAGE_HEIGHT: f64 = 841.89;

/// Font selector for text operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    fn resource_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "F1",
            Self::HelveticaBold => "F2",
        }
    }
}

/// A positioned draw operation. Coordinates are PDF points with the
/// origin at the bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Text at a baseline position.
    Text {
        x: f64,
        y: f64,
        font: Font,
        size: f64,
        text: String,
    },
    /// A straight stroked line.
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
    },
    /// A filled rectangle in light gray, used for table header bands.
    ShadedRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// One page of draw operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<Op>,
}

/// Approximate advance width of a string in points, at the given size.
///
/// Uses the standard Helvetica AFM widths for ASCII and a 556/1000
/// fallback for everything else (accented Latin-1 letters are close to
/// that). Good enough for right-alignment and centering; only layout
/// positions depend on it, never correctness.
pub fn text_width(text: &str, size: f64) -> f64 {
    let millis: u32 = text.chars().map(char_width_millis).sum();
    f64::from(millis) * size / 1000.0
}

fn char_width_millis(c: char) -> u32 {
    const ASCII_WIDTHS: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ./
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0-?
        1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @-O
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P-_
        333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `-o
        556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p-~
    ];
    let code = c as u32;
    if (0x20..0x7f).contains(&code) {
        u32::from(ASCII_WIDTHS[(code - 0x20) as usize])
    } else {
        556
    }
}

/// Encode a string for a PDF literal string in WinAnsi.
///
/// Characters outside Latin-1 degrade to `?`; backslash and
/// parentheses are escaped.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let byte = match u32::from(c) {
            code @ 0x20..=0xff => code as u8,
            _ => b'?',
        };
        match byte {
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(byte);
            }
            _ => out.push(byte),
        }
    }
    out
}

fn write_op(stream: &mut Vec<u8>, op: &Op) {
    match op {
        Op::Text {
            x,
            y,
            font,
            size,
            text,
        } => {
            stream.extend_from_slice(
                format!(
                    "BT /{} {size:.2} Tf {x:.2} {y:.2} Td (",
                    font.resource_name()
                )
                .as_bytes(),
            );
            stream.extend_from_slice(&encode_text(text));
            stream.extend_from_slice(b") Tj ET\n");
        }
        Op::Line {
            x1,
            y1,
            x2,
            y2,
            width,
        } => {
            stream.extend_from_slice(
                format!("{width:.2} w {x1:.2} {y1:.2} m {x2:.2} {y2:.2} l S\n").as_bytes(),
            );
        }
        Op::ShadedRect {
            x,
            y,
            width,
            height,
        } => {
            stream.extend_from_slice(
                format!("0.92 g {x:.2} {y:.2} {width:.2} {height:.2} re f 0 g\n").as_bytes(),
            );
        }
    }
}

/// Serialize pages into a complete PDF document.
pub fn render(pages: &[Page]) -> Vec<u8> {
    // Object layout: 1 catalog, 2 page tree, 3 Helvetica, 4 Helvetica-Bold,
    // then alternating page/content objects.
    let page_count = pages.len();
    let first_page_obj = 5;

    let mut bodies: Vec<Vec<u8>> = Vec::new();

    bodies.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", first_page_obj + i * 2))
        .collect();
    bodies.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {page_count} >>",
            kids.join(" ")
        )
        .into_bytes(),
    );

    bodies.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );
    bodies.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );

    for (i, page) in pages.iter().enumerate() {
        let content_obj = first_page_obj + i * 2 + 1;
        bodies.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.2} {PAGE_HEIGHT:.2}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_obj} 0 R >>"
            )
            .into_bytes(),
        );

        let mut stream = Vec::new();
        for op in &page.ops {
            write_op(&mut stream, op);
        }
        let mut content = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        content.extend_from_slice(&stream);
        content.extend_from_slice(b"endstream");
        bodies.push(content);
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::with_capacity(bodies.len());
    for (i, body) in bodies.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", bodies.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            bodies.len() + 1
        )
        .as_bytes(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> Page {
        Page {
            ops: vec![
                Op::Text {
                    x: 50.0,
                    y: 800.0,
                    font: Font::HelveticaBold,
                    size: 14.0,
                    text: "Proposta Comercial".to_string(),
                },
                Op::Line {
                    x1: 50.0,
                    y1: 790.0,
                    x2: 545.0,
                    y2: 790.0,
                    width: 0.75,
                },
            ],
        }
    }

    #[test]
    fn test_header_and_trailer() {
        let bytes = render(&[sample_page()]);
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_page_count_in_page_tree() {
        let bytes = render(&[sample_page(), Page::default()]);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
        assert_eq!(text.matches("/Type /Page ").count(), 2);
    }

    #[test]
    fn test_output_is_byte_stable() {
        let pages = vec![sample_page(), sample_page()];
        assert_eq!(render(&pages), render(&pages));
    }

    #[test]
    fn test_no_volatile_metadata() {
        let text = String::from_utf8_lossy(&render(&[sample_page()])).to_string();
        assert!(!text.contains("/CreationDate"));
        assert!(!text.contains("/Producer"));
        assert!(!text.contains("/ID"));
    }

    #[test]
    fn test_text_escaping() {
        let page = Page {
            ops: vec![Op::Text {
                x: 0.0,
                y: 0.0,
                font: Font::Helvetica,
                size: 10.0,
                text: "a (b) c\\d".to_string(),
            }],
        };
        let bytes = render(&[page]);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains(r"(a \(b\) c\\d)"));
    }

    #[test]
    fn test_latin1_passthrough() {
        let encoded = encode_text("Produção: ção é ótima");
        // Every byte is Latin-1, no replacement characters.
        assert!(!encoded.contains(&b'?'));
    }

    #[test]
    fn test_text_width_scales_with_size() {
        let w10 = text_width("Proposta", 10.0);
        let w20 = text_width("Proposta", 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-9);
        assert!(w10 > 0.0);
    }

    #[test]
    fn test_xref_offsets_resolve_to_objects() {
        let bytes = render(&[sample_page()]);
        let text = String::from_utf8_lossy(&bytes);
        let xref_pos = text.rfind("xref\n").unwrap();
        for line in text[xref_pos..].lines().skip(3) {
            let Some(offset) = line.split(' ').next().and_then(|s| s.parse::<usize>().ok())
            else {
                break;
            };
            if line.ends_with("n ") {
                assert!(text[offset..].starts_with(char::is_numeric));
            }
        }
    }
}
