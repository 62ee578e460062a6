//! # gsp-document — Proposal Document Composer
//!
//! Renders a commercial proposal as a two-page A4 PDF: page one carries
//! the proposal body (header, parties, items table, totals, signature
//! block) and page two is the counter-signature page.
//!
//! The pipeline is split in three layers:
//!
//! - [`model`] — plain data describing the proposal, already formatted
//!   upstream (digits-only documents arrive here in display form).
//! - [`layout`] — turns the model into positioned draw operations for
//!   each page; all measurement and pagination decisions live here.
//! - [`pdf`] — serializes draw operations into PDF 1.4 bytes using the
//!   base-14 Helvetica fonts and WinAnsi text encoding.
//!
//! Output is byte-stable: the same model always renders the same bytes.
//! The emitter writes no timestamps, document IDs, or producer strings,
//! so proposal PDFs can be compared and cached by content hash.

pub mod layout;
pub mod model;
pub mod pdf;

pub use model::{ClientBlock, CompanyBlock, DocumentItem, ProposalDocumentData};

/// Render a proposal to PDF bytes.
pub fn render_proposal(data: &ProposalDocumentData) -> Vec<u8> {
    pdf::render(&layout::compose(data))
}
