//! Core types and text extraction for court judgment documents.

pub mod document;
pub mod footer;
pub mod minguo;
pub mod paragraph;
pub mod preface;

pub use document::{AnalysisMeta, CaseMeta, Document, Sections, SummaryEntry};
pub use footer::{Person, Role, VerificationBlock};
pub use paragraph::{Paragraph, Paragraphs};
pub use preface::{Party, PartySide, Preface};
