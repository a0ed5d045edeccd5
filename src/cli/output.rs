//! Output formatting for CLI commands.

use std::io::Write;

use serde::Serialize;

use crate::cli::args::{HearthArgs, OutputFormat};
use crate::error::Result;
use crate::gateway::SearchPage;
use crate::index::IndexStats;
use crate::suggest::{GroupedSuggestions, Suggestions};

/// How results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Printer {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl Printer {
    pub fn from_args(args: &HearthArgs) -> Self {
        Printer {
            format: args.output_format,
            pretty: args.pretty,
        }
    }

    fn json<W: Write, T: Serialize>(&self, out: &mut W, value: &T) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, value)?;
        } else {
            serde_json::to_writer(&mut *out, value)?;
        }
        writeln!(out)?;
        Ok(())
    }

    pub fn page<W: Write>(&self, out: &mut W, page: &SearchPage) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(out, page);
        }

        if page.hits.is_empty() {
            writeln!(out, "No matching listings.")?;
            return Ok(());
        }
        writeln!(
            out,
            "Showing {}-{} of {} listings",
            page.skip + 1,
            page.skip + page.hits.len(),
            page.total_count
        )?;
        for (rank, hit) in page.hits.iter().enumerate() {
            let doc = &hit.document;
            write!(
                out,
                "{:>3}. #{} {} | {} | {}/week | {}",
                page.skip + rank + 1,
                hit.id,
                doc.title,
                doc.location,
                doc.rent_per_week,
                doc.apartment_type
            )?;
            if hit.score > 0.0 {
                write!(out, " | score {:.3}", hit.score)?;
            }
            if hit.featured {
                write!(out, " | featured")?;
            }
            writeln!(out)?;
        }
        if page.has_more() {
            writeln!(out, "Page {} of {}", page.skip / page.limit.max(1) + 1, page.page_count())?;
        }
        Ok(())
    }

    pub fn suggestions<W: Write>(&self, out: &mut W, suggestions: &Suggestions) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(out, suggestions);
        }
        if suggestions.is_empty() {
            writeln!(out, "No suggestions.")?;
        }
        for item in &suggestions.items {
            writeln!(out, "{item}")?;
        }
        Ok(())
    }

    pub fn grouped<W: Write>(&self, out: &mut W, grouped: &GroupedSuggestions) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(out, grouped);
        }
        for (label, items) in [
            ("Titles", &grouped.titles),
            ("Locations", &grouped.locations),
            ("Keywords", &grouped.keywords),
        ] {
            writeln!(out, "{label}: {}", items.join(", "))?;
        }
        Ok(())
    }

    pub fn stats<W: Write>(&self, out: &mut W, stats: &IndexStats) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(out, stats);
        }
        writeln!(out, "Documents:          {}", stats.documents)?;
        writeln!(out, "Visible:            {}", stats.visible_documents)?;
        writeln!(out, "Featured:           {}", stats.featured_documents)?;
        writeln!(out, "Title terms:        {}", stats.title_terms)?;
        writeln!(out, "Description terms:  {}", stats.description_terms)?;
        writeln!(out, "Location terms:     {}", stats.location_terms)?;
        writeln!(out, "Keyword terms:      {}", stats.keyword_terms)?;
        Ok(())
    }
}
