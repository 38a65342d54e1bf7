//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use colored::*;
use gleaner_domain::Chunk;
use gleaner_extractor::DocumentGraph;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const PREVIEW_CHARS: usize = 40;

/// Extraction outcome for one input file.
#[derive(Debug, Serialize)]
pub struct DocumentReport {
    /// Input file name
    pub source: String,

    /// Merged graph, if extraction succeeded
    #[serde(flatten)]
    pub result: Option<DocumentGraph>,

    /// Failure description, if extraction failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Chunks produced for one input file.
#[derive(Debug, Serialize)]
pub struct ChunkReport {
    /// Input file name
    pub source: String,

    /// Chunks in document order
    pub chunks: Vec<ChunkView>,
}

/// Printable view of a chunk.
#[derive(Debug, Serialize)]
pub struct ChunkView {
    /// Hex chunk id
    pub id: String,
    /// Length in characters
    pub chars: usize,
    /// Chunk text
    pub content: String,
}

impl From<&Chunk> for ChunkView {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id.to_string(),
            chars: chunk.content.chars().count(),
            content: chunk.content.clone(),
        }
    }
}

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format extraction results.
    pub fn format_documents(&self, reports: &[DocumentReport], pretty: bool) -> Result<String> {
        match self.format {
            CliFormat::Json => to_json(reports, pretty),
            CliFormat::Table => Ok(self.format_documents_table(reports)),
        }
    }

    /// Format chunking results.
    pub fn format_chunks(&self, reports: &[ChunkReport], pretty: bool) -> Result<String> {
        match self.format {
            CliFormat::Json => to_json(reports, pretty),
            CliFormat::Table => Ok(self.format_chunks_table(reports)),
        }
    }

    fn format_documents_table(&self, reports: &[DocumentReport]) -> String {
        if reports.is_empty() {
            return self.warning("No documents processed.");
        }

        let mut builder = Builder::default();
        builder.push_record([
            "Source", "Status", "Chunks", "Entities", "Relationships", "Gleaning", "Time (ms)",
        ]);

        for report in reports {
            match (&report.result, &report.error) {
                (Some(document), _) => builder.push_record([
                    report.source.clone(),
                    self.colorize("ok", "green"),
                    document.metadata.chunk_count.to_string(),
                    document.graph.entities.len().to_string(),
                    (document.graph.relationships.len()
                        + document.graph.other_relationships.len())
                    .to_string(),
                    document.metadata.gleaning_rounds.to_string(),
                    document.metadata.processing_time_ms.to_string(),
                ]),
                (None, error) => builder.push_record([
                    report.source.clone(),
                    self.colorize(error.as_deref().unwrap_or("failed"), "red"),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]),
            }
        }

        render_table(builder)
    }

    fn format_chunks_table(&self, reports: &[ChunkReport]) -> String {
        if reports.iter().all(|r| r.chunks.is_empty()) {
            return self.warning("No chunks produced.");
        }

        let mut builder = Builder::default();
        builder.push_record(["Source", "#", "ID", "Chars", "Preview"]);

        for report in reports {
            for (index, chunk) in report.chunks.iter().enumerate() {
                builder.push_record([
                    report.source.clone(),
                    index.to_string(),
                    chunk.id.clone(),
                    chunk.chars.to_string(),
                    preview(&chunk.content),
                ]);
            }
        }

        render_table(builder)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn render_table(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn preview(content: &str) -> String {
    let mut preview: String = content.chars().take(PREVIEW_CHARS).collect();
    if content.chars().count() > PREVIEW_CHARS {
        preview.push('…');
    }
    preview
}
