//! Markdown table extraction for OSSEM documents.
//!
//! Extraction runs in two passes. [`scan_blocks`] turns a document into a
//! flat sequence of headings, paragraphs and pipe tables; [`classify`] walks
//! that sequence and decides which paragraph is the description and which
//! tables hold field rows for the given [`ParseContext`]. Neither pass fails:
//! a document with no recognisable structure yields an empty extraction.

mod inline;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{DATA_FIELDS_HEADINGS, DESCRIPTION_HEADING};
use crate::domain::FieldRow;

pub use inline::strip_inline;

static ATX_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$").expect("valid heading pattern")
});
static SETEXT_UNDERLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(=+|-+)$").expect("valid setext pattern"));
static TABLE_DELIMITER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\|?\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|?\s*$").expect("valid delimiter pattern")
});
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(```|~~~)").expect("valid fence pattern"));
static THEMATIC_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([-*_])(\s*[-*_]){2,}$").expect("valid break pattern"));
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([-*+]|\d+[.)])\s+").expect("valid list pattern"));
static HTML_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<([A-Za-z/!])").expect("valid html pattern"));

/// Which collection a document belongs to; changes how headings and tables are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseContext {
    Cim,
    Dd,
    Ddm,
}

impl ParseContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseContext::Cim => "cim",
            ParseContext::Dd => "dd",
            ParseContext::Ddm => "ddm",
        }
    }
}

/// A block-level element of a markdown document
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    /// Lists, code, rules and raw html; never carry descriptions or fields
    Other,
}

/// The collection-independent content of one markdown document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedDocument {
    pub description: Option<String>,
    pub field_rows: Vec<FieldRow>,
}

/// Extracts descriptions and field tables from markdown text
pub trait DocumentExtractor {
    fn extract(&self, markdown: &str, context: ParseContext) -> ExtractedDocument;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownTableExtractor;

impl MarkdownTableExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for MarkdownTableExtractor {
    fn extract(&self, markdown: &str, context: ParseContext) -> ExtractedDocument {
        let blocks = scan_blocks(markdown);
        let document = classify(&blocks, context);
        tracing::trace!(
            context = context.as_str(),
            blocks = blocks.len(),
            rows = document.field_rows.len(),
            has_description = document.description.is_some(),
            "extracted markdown document"
        );
        crate::observability::metrics::parser::document_extracted(context.as_str(), document.field_rows.len());
        document
    }
}

/// First pass: split a markdown document into blocks
pub fn scan_blocks(markdown: &str) -> Vec<Block> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            i += 1;
            continue;
        }

        if let Some(fence) = FENCE.find(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let marker = fence.as_str();
            i += 1;
            while i < lines.len() && !lines[i].trim().starts_with(marker) {
                i += 1;
            }
            i += 1;
            blocks.push(Block::Other);
            continue;
        }

        if let Some(caps) = ATX_HEADING.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let level = caps.get(1).map(|m| m.as_str().len()).unwrap_or(1) as u8;
            let text = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            blocks.push(Block::Heading {
                level,
                text: strip_inline(text),
            });
            i += 1;
            continue;
        }

        if !paragraph.is_empty() && SETEXT_UNDERLINE.is_match(trimmed) {
            let level = if trimmed.starts_with('=') { 1 } else { 2 };
            let text = paragraph.join(" ");
            paragraph.clear();
            blocks.push(Block::Heading {
                level,
                text: strip_inline(&text),
            });
            i += 1;
            continue;
        }

        if line.contains('|') && i + 1 < lines.len() && TABLE_DELIMITER.is_match(lines[i + 1]) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let headers = split_row(line);
            i += 2;
            let mut rows = Vec::new();
            while i < lines.len() && !lines[i].trim().is_empty() && lines[i].contains('|') {
                rows.push(split_row(lines[i]));
                i += 1;
            }
            blocks.push(Block::Table { headers, rows });
            continue;
        }

        if THEMATIC_BREAK.is_match(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Other);
            i += 1;
            continue;
        }

        if (paragraph.is_empty() && LIST_ITEM.is_match(line)) || HTML_BLOCK.is_match(line) {
            // Lists and html blocks run to the next blank line
            flush_paragraph(&mut paragraph, &mut blocks);
            while i < lines.len() && !lines[i].trim().is_empty() {
                i += 1;
            }
            blocks.push(Block::Other);
            continue;
        }

        if let Some(quoted) = trimmed.strip_prefix('>') {
            paragraph.push(quoted.trim().to_string());
            i += 1;
            continue;
        }

        paragraph.push(trimmed.to_string());
        i += 1;
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn flush_paragraph(paragraph: &mut Vec<String>, blocks: &mut Vec<Block>) {
    if paragraph.is_empty() {
        return;
    }
    let text = strip_inline(&paragraph.join("\n"));
    paragraph.clear();
    blocks.push(Block::Paragraph(text));
}

/// Split a pipe table row into trimmed, inline-stripped cells
fn split_row(line: &str) -> Vec<String> {
    let mut body = line.trim();
    if let Some(rest) = body.strip_prefix('|') {
        body = rest;
    }
    if body.ends_with('|') && !body.ends_with("\\|") {
        body = &body[..body.len() - 1];
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);

    cells.iter().map(|cell| strip_inline(cell.trim())).collect()
}

fn is_data_fields_heading(text: &str) -> bool {
    DATA_FIELDS_HEADINGS.contains(&text)
}

fn opens_description(block: &Block, context: ParseContext) -> bool {
    match block {
        Block::Heading { level, text } if !is_data_fields_heading(text) => {
            (*level == 1 && context == ParseContext::Cim) || text == DESCRIPTION_HEADING
        }
        _ => false,
    }
}

/// Second pass: pick the description and field rows out of a block sequence
pub fn classify(blocks: &[Block], context: ParseContext) -> ExtractedDocument {
    let description = blocks
        .iter()
        .position(|block| opens_description(block, context))
        .and_then(|start| {
            blocks[start + 1..].iter().find_map(|block| match block {
                Block::Paragraph(text) => Some(text.clone()),
                _ => None,
            })
        });

    let mut field_rows = Vec::new();
    let mut expecting_fields = false;
    for block in blocks {
        match block {
            Block::Heading { text, .. } if is_data_fields_heading(text) => expecting_fields = true,
            Block::Table { headers, rows } => {
                if expecting_fields || context == ParseContext::Ddm {
                    field_rows.extend(table_rows(headers, rows));
                }
                expecting_fields = false;
            }
            _ => {}
        }
    }

    ExtractedDocument {
        description,
        field_rows,
    }
}

fn table_rows(headers: &[String], rows: &[Vec<String>]) -> Vec<FieldRow> {
    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    rows.iter()
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header.clone(), cells.get(idx).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DD_DOCUMENT: &str = r#"# Event ID 4688: A new process has been created

## Description

This event generates every time a new process starts.

More detail that should not be captured.

## Data Dictionary

| Standard Name | Field Name | Type | Description | Sample Value |
|---|---|---|---|---|
| process_name | NewProcessName | string | full path of the new process | `C:\Windows\cmd.exe` |
| | TokenElevationType | string | token type | %%1936 |
"#;

    #[test]
    fn test_scan_blocks_recognises_structure() {
        let blocks = scan_blocks(DD_DOCUMENT);
        assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
        assert_eq!(
            blocks[1],
            Block::Heading {
                level: 2,
                text: "Description".to_string()
            }
        );
        assert!(matches!(blocks[2], Block::Paragraph(_)));
        assert!(matches!(blocks.last(), Some(Block::Table { .. })));
    }

    #[test]
    fn test_extracts_first_description_paragraph_only() {
        let doc = MarkdownTableExtractor::new().extract(DD_DOCUMENT, ParseContext::Dd);
        assert_eq!(
            doc.description.as_deref(),
            Some("This event generates every time a new process starts.")
        );
    }

    #[test]
    fn test_extracts_data_dictionary_rows_with_lowercased_headers() {
        let doc = MarkdownTableExtractor::new().extract(DD_DOCUMENT, ParseContext::Dd);
        assert_eq!(doc.field_rows.len(), 2);

        let first = &doc.field_rows[0];
        assert_eq!(first["standard name"], "process_name");
        assert_eq!(first["field name"], "NewProcessName");
        assert_eq!(first["sample value"], "C:\\Windows\\cmd.exe");

        assert_eq!(doc.field_rows[1]["standard name"], "");
    }

    #[test]
    fn test_cim_first_level_heading_opens_description() {
        let markdown = "# Process\n\nEvent fields used to define metadata about processes.\n\n## Data Fields\n\n| Standard Name | Type | Description | Sample Value |\n|---|---|---|---|\n| process_name | string | name | cmd.exe |\n";
        let doc = MarkdownTableExtractor::new().extract(markdown, ParseContext::Cim);
        assert_eq!(
            doc.description.as_deref(),
            Some("Event fields used to define metadata about processes.")
        );
        assert_eq!(doc.field_rows.len(), 1);
    }

    #[test]
    fn test_first_level_heading_is_not_a_description_outside_cim() {
        let markdown = "# Process\n\nJust a title paragraph.\n";
        let doc = MarkdownTableExtractor::new().extract(markdown, ParseContext::Dd);
        assert_eq!(doc.description, None);
    }

    #[test]
    fn test_tables_without_marker_are_ignored_outside_ddm() {
        let markdown = "## Notes\n\n| a | b |\n|---|---|\n| 1 | 2 |\n";
        let dd = MarkdownTableExtractor::new().extract(markdown, ParseContext::Dd);
        assert!(dd.field_rows.is_empty());

        let ddm = MarkdownTableExtractor::new().extract(markdown, ParseContext::Ddm);
        assert_eq!(ddm.field_rows.len(), 1);
        assert_eq!(ddm.field_rows[0]["a"], "1");
    }

    #[test]
    fn test_ddm_concatenates_every_table() {
        let markdown = "| EventID | Relationship |\n|---|---|\n| 4688 | created |\n\nText between.\n\n| EventID | Relationship |\n|---|---|\n| 1 | created |\n";
        let doc = MarkdownTableExtractor::new().extract(markdown, ParseContext::Ddm);
        let ids: Vec<&str> = doc.field_rows.iter().map(|r| r["eventid"].as_str()).collect();
        assert_eq!(ids, vec!["4688", "1"]);
    }

    #[test]
    fn test_missing_cells_map_to_empty_string() {
        let markdown = "## Data Fields\n\n| Standard Name | Type | Description |\n|---|---|---|\n| user_name | string |\n";
        let doc = MarkdownTableExtractor::new().extract(markdown, ParseContext::Cim);
        assert_eq!(doc.field_rows[0]["description"], "");
        assert_eq!(doc.field_rows[0]["type"], "string");
    }

    #[test]
    fn test_malformed_table_yields_no_rows() {
        let markdown = "## Data Fields\n\n| Standard Name | Type |\n| user_name | string |\n";
        let doc = MarkdownTableExtractor::new().extract(markdown, ParseContext::Cim);
        assert!(doc.field_rows.is_empty());
    }

    #[test]
    fn test_setext_description_heading() {
        let markdown = "Description\n-----------\n\nSetext styled description.\n";
        let doc = MarkdownTableExtractor::new().extract(markdown, ParseContext::Dd);
        assert_eq!(doc.description.as_deref(), Some("Setext styled description."));
    }

    #[test]
    fn test_code_blocks_and_lists_are_not_paragraphs() {
        let markdown = "## Description\n\n```\nnot a description\n```\n\n- not this either\n- nor this\n\nThe real description.\n";
        let doc = MarkdownTableExtractor::new().extract(markdown, ParseContext::Dd);
        assert_eq!(doc.description.as_deref(), Some("The real description."));
    }

    #[test]
    fn test_escaped_pipes_stay_in_cell() {
        assert_eq!(split_row(r"| a \| b | c |"), vec!["a | b", "c"]);
    }

    #[test]
    fn test_empty_document_extracts_nothing() {
        let doc = MarkdownTableExtractor::new().extract("", ParseContext::Ddm);
        assert_eq!(doc, ExtractedDocument::default());
    }
}
