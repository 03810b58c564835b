//! memo - daily memos, rotating tips and weekly reports kept as plain Markdown.
//!
//! The [`markdown`] module is a small structural editing engine: it parses
//! markdown into a tree with byte spans, finds heading-bounded sections and
//! splices rendered sections into other documents without touching the rest
//! of the text. The [`journal`] module builds the daily workflows on top.

pub mod config;
pub mod error;
pub mod journal;
pub mod markdown;
