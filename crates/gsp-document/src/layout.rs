//! # Deterministic Two-Page Layout
//!
//! Turns a [`ProposalDocumentData`] into positioned draw operations.
//! Page one is the proposal body; page two is the counter-signature
//! page, present in every document so the printed contract always has
//! a dedicated acceptance sheet.
//!
//! The layout is a single top-down pass with a y cursor. All positions
//! derive from the input data alone, so composing the same proposal
//! twice yields identical operations.

use gsp_core::Money;

use crate::model::ProposalDocumentData;
use crate::pdf::{text_width, Font, Op, Page, PAGE_HEIGHT, PAGE_WIDTH};

const MARGIN: f64 = 50.0;
const RIGHT_EDGE: f64 = PAGE_WIDTH - MARGIN;
const BODY_SIZE: f64 = 9.0;
const LABEL_SIZE: f64 = 10.0;
const TITLE_SIZE: f64 = 16.0;
const LINE_GAP: f64 = 13.0;

// Items table column edges: name | description | qty | unit | total.
const COL_DESC: f64 = 200.0;
const COL_QTY_RIGHT: f64 = 390.0;
const COL_UNIT_RIGHT: f64 = 465.0;

/// One page with a descending y cursor.
struct Composer {
    ops: Vec<Op>,
    y: f64,
}

impl Composer {
    fn new() -> Self {
        Self {
            ops: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn advance(&mut self, dy: f64) {
        self.y -= dy;
    }

    fn text(&mut self, x: f64, font: Font, size: f64, text: &str) {
        self.ops.push(Op::Text {
            x,
            y: self.y,
            font,
            size,
            text: text.to_string(),
        });
    }

    fn text_right(&mut self, right: f64, font: Font, size: f64, text: &str) {
        let x = right - text_width(text, size);
        self.text(x, font, size, text);
    }

    fn text_center(&mut self, font: Font, size: f64, text: &str) {
        let x = (PAGE_WIDTH - text_width(text, size)) / 2.0;
        self.text(x, font, size, text);
    }

    fn rule(&mut self) {
        self.ops.push(Op::Line {
            x1: MARGIN,
            y1: self.y,
            x2: RIGHT_EDGE,
            y2: self.y,
            width: 0.75,
        });
    }

    fn signature_line(&mut self, x1: f64, x2: f64, label: &str) {
        self.ops.push(Op::Line {
            x1,
            y1: self.y,
            x2,
            y2: self.y,
            width: 0.75,
        });
        let center = (x1 + x2) / 2.0;
        let y = self.y;
        self.ops.push(Op::Text {
            x: center - text_width(label, BODY_SIZE) / 2.0,
            y: y - 12.0,
            font: Font::Helvetica,
            size: BODY_SIZE,
            text: label.to_string(),
        });
    }

    fn into_page(self) -> Page {
        Page { ops: self.ops }
    }
}

/// Greedy word wrap against a column width.
fn wrap(text: &str, size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Compose the full two-page document.
pub fn compose(data: &ProposalDocumentData) -> Vec<Page> {
    vec![compose_body(data), compose_countersignature(data)]
}

fn compose_body(data: &ProposalDocumentData) -> Page {
    let mut c = Composer::new();

    // Header: issuing company identification.
    c.text(MARGIN, Font::HelveticaBold, 13.0, &data.company.name);
    c.text_right(RIGHT_EDGE, Font::Helvetica, BODY_SIZE, &data.company.document);
    c.advance(LINE_GAP);
    c.text(MARGIN, Font::Helvetica, BODY_SIZE, &data.company.email);
    c.text_right(RIGHT_EDGE, Font::Helvetica, BODY_SIZE, &data.company.phone);
    if let Some(address) = &data.company.address {
        c.advance(LINE_GAP);
        c.text(MARGIN, Font::Helvetica, BODY_SIZE, address);
    }
    c.advance(10.0);
    c.rule();

    // Title block.
    c.advance(32.0);
    c.text_center(Font::HelveticaBold, TITLE_SIZE, "PROPOSTA COMERCIAL");
    c.advance(18.0);
    c.text_center(Font::Helvetica, 11.0, &data.client.name);

    // Metadata lines.
    c.advance(26.0);
    let mut meta = vec![
        format!("Código: {}", data.code),
        format!("Status: {}", data.status),
        format!("Emissão: {}", data.issue_date.to_br_date()),
    ];
    if let Some(validity) = &data.validity_date {
        meta.push(format!("Validade: {}", validity.to_br_date()));
    }
    for line in &meta {
        c.text(MARGIN, Font::Helvetica, BODY_SIZE, line);
        c.advance(LINE_GAP);
    }

    // Service summary heading.
    c.advance(8.0);
    c.text(MARGIN, Font::HelveticaBold, LABEL_SIZE, &data.title);
    c.advance(20.0);

    // Parties, two columns.
    let col2 = PAGE_WIDTH / 2.0 + 10.0;
    c.text(MARGIN, Font::HelveticaBold, LABEL_SIZE, "CONTRATADA");
    c.text(col2, Font::HelveticaBold, LABEL_SIZE, "CONTRATANTE");
    c.advance(LINE_GAP);
    let company_lines = [
        data.company.name.as_str(),
        data.company.document.as_str(),
        data.company.email.as_str(),
        data.company.phone.as_str(),
    ];
    let client_lines = [
        data.client.name.as_str(),
        data.client.document.as_str(),
        data.client.email.as_str(),
        data.client.phone.as_str(),
    ];
    for (left, right) in company_lines.iter().zip(client_lines.iter()) {
        c.text(MARGIN, Font::Helvetica, BODY_SIZE, left);
        c.text(col2, Font::Helvetica, BODY_SIZE, right);
        c.advance(LINE_GAP);
    }

    // Items table.
    c.advance(12.0);
    c.ops.push(Op::ShadedRect {
        x: MARGIN,
        y: c.y - 4.0,
        width: RIGHT_EDGE - MARGIN,
        height: 16.0,
    });
    c.text(MARGIN + 4.0, Font::HelveticaBold, BODY_SIZE, "Item");
    c.text(COL_DESC, Font::HelveticaBold, BODY_SIZE, "Descrição");
    c.text_right(COL_QTY_RIGHT, Font::HelveticaBold, BODY_SIZE, "Qtd.");
    c.text_right(COL_UNIT_RIGHT, Font::HelveticaBold, BODY_SIZE, "Valor unit.");
    c.text_right(RIGHT_EDGE - 4.0, Font::HelveticaBold, BODY_SIZE, "Total");
    c.advance(18.0);

    for item in &data.items {
        c.text(MARGIN + 4.0, Font::Helvetica, BODY_SIZE, &item.name);
        if let Some(description) = &item.description {
            let desc_lines = wrap(description, BODY_SIZE, COL_QTY_RIGHT - COL_DESC - 30.0);
            if let Some(first) = desc_lines.first() {
                c.text(COL_DESC, Font::Helvetica, BODY_SIZE, first);
            }
            c.text_right(COL_QTY_RIGHT, Font::Helvetica, BODY_SIZE, &item.quantity.format_br());
            c.text_right(
                COL_UNIT_RIGHT,
                Font::Helvetica,
                BODY_SIZE,
                &item.unit_price.format_brl(),
            );
            c.text_right(
                RIGHT_EDGE - 4.0,
                Font::Helvetica,
                BODY_SIZE,
                &item.line_total().format_brl(),
            );
            c.advance(LINE_GAP);
            for line in desc_lines.iter().skip(1) {
                c.text(COL_DESC, Font::Helvetica, BODY_SIZE, line);
                c.advance(LINE_GAP);
            }
        } else {
            c.text_right(COL_QTY_RIGHT, Font::Helvetica, BODY_SIZE, &item.quantity.format_br());
            c.text_right(
                COL_UNIT_RIGHT,
                Font::Helvetica,
                BODY_SIZE,
                &item.unit_price.format_brl(),
            );
            c.text_right(
                RIGHT_EDGE - 4.0,
                Font::Helvetica,
                BODY_SIZE,
                &item.line_total().format_brl(),
            );
            c.advance(LINE_GAP);
        }
    }

    c.advance(2.0);
    c.rule();
    c.advance(14.0);
    if data.discount != Money::ZERO {
        c.text_right(COL_UNIT_RIGHT, Font::Helvetica, BODY_SIZE, "Subtotal");
        c.text_right(
            RIGHT_EDGE - 4.0,
            Font::Helvetica,
            BODY_SIZE,
            &data.subtotal().format_brl(),
        );
        c.advance(LINE_GAP);
        c.text_right(COL_UNIT_RIGHT, Font::Helvetica, BODY_SIZE, "Desconto");
        c.text_right(
            RIGHT_EDGE - 4.0,
            Font::Helvetica,
            BODY_SIZE,
            &format!("- {}", data.discount.format_brl()),
        );
        c.advance(LINE_GAP);
    }
    c.text_right(COL_UNIT_RIGHT, Font::HelveticaBold, LABEL_SIZE, "Total");
    c.text_right(
        RIGHT_EDGE - 4.0,
        Font::HelveticaBold,
        LABEL_SIZE,
        &data.total().format_brl(),
    );
    c.advance(24.0);

    // Observations.
    if let Some(observations) = &data.observations {
        c.text(MARGIN, Font::HelveticaBold, LABEL_SIZE, "Observações");
        c.advance(LINE_GAP);
        for line in wrap(observations, BODY_SIZE, RIGHT_EDGE - MARGIN) {
            c.text(MARGIN, Font::Helvetica, BODY_SIZE, &line);
            c.advance(LINE_GAP);
        }
        c.advance(10.0);
    }

    // Dated signature block at a fixed offset from the bottom.
    c.y = 150.0;
    c.text_center(
        Font::Helvetica,
        BODY_SIZE,
        &format!("{}, {}", data.city, data.issue_date.to_br_long_date()),
    );
    c.y = 100.0;
    c.signature_line(MARGIN, MARGIN + 200.0, &data.responsible_name);
    c.signature_line(RIGHT_EDGE - 200.0, RIGHT_EDGE, &data.client.name);

    c.into_page()
}

fn compose_countersignature(data: &ProposalDocumentData) -> Page {
    let mut c = Composer::new();

    c.advance(40.0);
    c.text_center(Font::HelveticaBold, TITLE_SIZE, "ACEITE E CONTRA-ASSINATURA");
    c.advance(22.0);
    c.text_center(
        Font::Helvetica,
        LABEL_SIZE,
        &format!("Proposta {}", data.code),
    );

    c.advance(40.0);
    for line in wrap(
        "As partes abaixo declaram estar de acordo com os termos, valores e \
         condições descritos nesta proposta comercial.",
        LABEL_SIZE,
        RIGHT_EDGE - MARGIN,
    ) {
        c.text_center(Font::Helvetica, LABEL_SIZE, &line);
        c.advance(LINE_GAP + 2.0);
    }

    c.y = 260.0;
    c.text_center(
        Font::Helvetica,
        BODY_SIZE,
        &format!("{}, {}", data.city, data.issue_date.to_br_long_date()),
    );

    c.y = 190.0;
    c.signature_line(
        MARGIN,
        MARGIN + 200.0,
        &format!("{} (CONTRATADA)", data.responsible_name),
    );
    c.signature_line(
        RIGHT_EDGE - 200.0,
        RIGHT_EDGE,
        &format!("{} (CONTRATANTE)", data.client.name),
    );

    c.into_page()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClientBlock, CompanyBlock, DocumentItem};
    use gsp_core::{Quantity, Timestamp};

    fn sample() -> ProposalDocumentData {
        ProposalDocumentData {
            code: "PROP-2026-0042".to_string(),
            title: "Produção de evento corporativo".to_string(),
            status: "SENT".to_string(),
            issue_date: Timestamp::parse("2026-03-01T12:00:00Z").unwrap(),
            validity_date: Some(Timestamp::parse("2026-03-31T12:00:00Z").unwrap()),
            company: CompanyBlock {
                name: "GS Produções".to_string(),
                document: "04.252.011/0001-10".to_string(),
                email: "contato@gs.example".to_string(),
                phone: "+55 (21) 3333-4444".to_string(),
                address: Some("Av. Rio Branco 1, Rio de Janeiro - RJ".to_string()),
            },
            client: ClientBlock {
                name: "Ana Souza".to_string(),
                document: "529.982.247-25".to_string(),
                email: "ana@example.com".to_string(),
                phone: "+55 (21) 99999-9999".to_string(),
            },
            responsible_name: "Bruno Lima".to_string(),
            items: vec![
                DocumentItem {
                    name: "Sonorização".to_string(),
                    description: Some("Equipamento e operação durante o evento".to_string()),
                    quantity: Quantity(100),
                    unit_price: gsp_core::Money(450_000),
                },
                DocumentItem {
                    name: "Iluminação".to_string(),
                    description: None,
                    quantity: Quantity(250),
                    unit_price: gsp_core::Money(80_000),
                },
            ],
            discount: gsp_core::Money(50_000),
            observations: Some("Valores válidos por 30 dias.".to_string()),
            city: "Rio de Janeiro".to_string(),
        }
    }

    fn page_texts(page: &Page) -> Vec<&str> {
        page.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_composes_exactly_two_pages() {
        assert_eq!(compose(&sample()).len(), 2);
    }

    #[test]
    fn test_body_carries_title_and_metadata() {
        let pages = compose(&sample());
        let texts = page_texts(&pages[0]);
        assert!(texts.contains(&"PROPOSTA COMERCIAL"));
        assert!(texts.contains(&"Código: PROP-2026-0042"));
        assert!(texts.contains(&"Emissão: 01/03/2026"));
        assert!(texts.contains(&"Validade: 31/03/2026"));
    }

    #[test]
    fn test_totals_row_matches_items() {
        // 1.00 × 4500.00 + 2.50 × 800.00 - 500.00 = 6000.00
        let pages = compose(&sample());
        let texts = page_texts(&pages[0]);
        assert!(texts.contains(&"R$ 6.500,00")); // subtotal
        assert!(texts.contains(&"- R$ 500,00")); // discount
        assert!(texts.contains(&"R$ 6.000,00")); // total
    }

    #[test]
    fn test_date_line_long_form() {
        let pages = compose(&sample());
        let texts = page_texts(&pages[0]);
        assert!(texts.contains(&"Rio de Janeiro, 01 de março de 2026"));
    }

    #[test]
    fn test_countersignature_page_names_both_parties() {
        let pages = compose(&sample());
        let texts = page_texts(&pages[1]);
        assert!(texts.contains(&"ACEITE E CONTRA-ASSINATURA"));
        assert!(texts.contains(&"Bruno Lima (CONTRATADA)"));
        assert!(texts.contains(&"Ana Souza (CONTRATANTE)"));
    }

    #[test]
    fn test_composition_is_deterministic() {
        assert_eq!(compose(&sample()), compose(&sample()));
    }

    #[test]
    fn test_full_render_is_byte_stable() {
        let data = sample();
        assert_eq!(
            crate::render_proposal(&data),
            crate::render_proposal(&data)
        );
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("um dois tres quatro cinco seis", 10.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 10.0) <= 60.0 || !line.contains(' '));
        }
    }
}
