//! # Proposal Document Model
//!
//! Plain data consumed by the layout layer. Values arrive here already
//! in display form: documents formatted (`000.000.000-00`), dates as
//! [`Timestamp`], money as [`Money`] centavos. The model computes the
//! grand total so the rendered totals row always matches the item list.

use serde::{Deserialize, Serialize};

use gsp_core::{Money, Quantity, Timestamp};

/// The issuing company block shown in the page header and the parties
/// section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyBlock {
    pub name: String,
    /// CPF or CNPJ in display form.
    pub document: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
}

/// The client (contratante) block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBlock {
    pub name: String,
    /// CPF or CNPJ in display form.
    pub document: String,
    pub email: String,
    pub phone: String,
}

/// One line of the items table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentItem {
    pub name: String,
    pub description: Option<String>,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl DocumentItem {
    /// Quantity times unit price, rounded to the centavo.
    pub fn line_total(&self) -> Money {
        self.quantity.line_total(self.unit_price)
    }
}

/// Everything the two-page proposal document renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDocumentData {
    /// Proposal code (e.g., `PROP-2026-0042`).
    pub code: String,
    /// Proposal title, rendered as the service summary heading.
    pub title: String,
    /// Display status (`DRAFT`, `OPEN`, `SENT`, `WON`, `LOST`).
    pub status: String,
    pub issue_date: Timestamp,
    pub validity_date: Option<Timestamp>,
    pub company: CompanyBlock,
    pub client: ClientBlock,
    /// Name printed over the company-side signature line.
    pub responsible_name: String,
    pub items: Vec<DocumentItem>,
    /// Discount subtracted from the items subtotal.
    pub discount: Money,
    pub observations: Option<String>,
    /// City printed in the long-form date line.
    pub city: String,
}

impl ProposalDocumentData {
    /// Sum of line totals before discount.
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .fold(Money::ZERO, |acc, item| {
                acc.checked_add(item.line_total()).unwrap_or(acc)
            })
    }

    /// Subtotal minus discount, floored at zero.
    pub fn total(&self) -> Money {
        match self.subtotal().checked_sub(self.discount) {
            Some(total) if !total.is_negative() => total,
            _ => Money::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(qty: i64, price: i64) -> DocumentItem {
        DocumentItem {
            name: "Servico".to_string(),
            description: None,
            quantity: Quantity(qty),
            unit_price: Money(price),
        }
    }

    fn data(items: Vec<DocumentItem>, discount: i64) -> ProposalDocumentData {
        ProposalDocumentData {
            code: "PROP-2026-0001".to_string(),
            title: "Producao de evento".to_string(),
            status: "OPEN".to_string(),
            issue_date: Timestamp::parse("2026-03-01T12:00:00Z").unwrap(),
            validity_date: None,
            company: CompanyBlock {
                name: "GS Producoes".to_string(),
                document: "04.252.011/0001-10".to_string(),
                email: "contato@gs.example".to_string(),
                phone: "+55 (21) 3333-4444".to_string(),
                address: None,
            },
            client: ClientBlock {
                name: "Ana Souza".to_string(),
                document: "529.982.247-25".to_string(),
                email: "ana@example.com".to_string(),
                phone: "+55 (21) 99999-9999".to_string(),
            },
            responsible_name: "Bruno Lima".to_string(),
            items,
            discount: Money(discount),
            observations: None,
            city: "Rio de Janeiro".to_string(),
        }
    }

    #[test]
    fn test_total_is_subtotal_minus_discount() {
        let d = data(vec![item(200, 5000), item(100, 2500)], 500);
        assert_eq!(d.subtotal(), Money(12_500));
        assert_eq!(d.total(), Money(12_000));
    }

    #[test]
    fn test_total_floors_at_zero() {
        let d = data(vec![item(100, 1000)], 99_999);
        assert_eq!(d.total(), Money::ZERO);
    }

    #[test]
    fn test_fractional_quantity_line_total() {
        let d = data(vec![item(250, 1000)], 0);
        assert_eq!(d.total(), Money(2_500));
    }
}
