//! The word-processing rebranding pipeline.

use crate::document::{body_mut, DocxDocument};
use crate::images::{self, DrawingPrefixes};
use crate::text;
use rebrand_core::{
    DocumentFormat, ImageData, Package, RebrandConfig, RebrandOutput, RebrandReport, Rect,
    ReplacementImages, Result,
};

/// Rebrands DOCX documents. Only the logo is replaced; Word has no favicon slot.
pub struct DocxRebrander {
    config: RebrandConfig,
}

impl DocxRebrander {
    /// Create a rebrander with the given configuration.
    pub fn new(config: RebrandConfig) -> Self {
        Self { config }
    }

    /// Rebrand a document held in memory: headers, then the first body picture, then text.
    pub fn rebrand(&self, bytes: &[u8], images: &ReplacementImages) -> Result<RebrandOutput> {
        let mut report = RebrandReport::new(DocumentFormat::Docx);
        report.diagnostics.info("Opening Word file...");
        if images.favicon.is_some() {
            report
                .diagnostics
                .warn("Favicon replacement is not supported for Word documents; ignoring it");
        }

        let mut document = DocxDocument::open(bytes)?;
        report.units = document.section_count()?;
        let mut drawing_id = document.next_drawing_id()?;
        let logo_rect = self.config.placements.logo;

        report.diagnostics.info("Processing headers...");
        let headers = document.header_parts()?;
        for part in &headers {
            if self.replace_header_logo(document.package_mut(), part, &images.logo, &logo_rect, drawing_id, &mut report)? {
                drawing_id += 1;
            }
        }

        report.diagnostics.info("Looking for the logo in the document...");
        let main = document.main_part().to_string();
        if self.replace_body_logo(document.package_mut(), &main, &images.logo, &logo_rect, drawing_id, &mut report)? {
            report.diagnostics.info("  → Logo replaced in the document");
        }

        report.diagnostics.info("Applying styles...");
        let names = document.style_names().clone();
        let root = &mut document.package_mut().xml_mut(&main)?.root;
        let styled = text::style_body(
            body_mut(root)?,
            &names,
            &self.config.word,
            &mut report.diagnostics,
        );
        report.paragraphs_styled = styled.paragraphs;
        log::debug!("{} title(s), {} bullet(s)", styled.titles, styled.bullets);

        let bytes = document.to_bytes()?;
        report.diagnostics.info(format!(
            "Done: {} logo(s) replaced, {} paragraph(s) restyled",
            report.logos_inserted, report.paragraphs_styled
        ));
        Ok(RebrandOutput { bytes, report })
    }

    /// Clear every drawing run of a header and, if any was found, append the new logo.
    fn replace_header_logo(
        &self,
        package: &mut Package,
        part: &str,
        logo: &ImageData,
        rect: &Rect,
        drawing_id: u32,
        report: &mut RebrandReport,
    ) -> Result<bool> {
        let mut header = package.take_xml(part)?;
        let cleared: usize = header
            .root
            .elements_mut()
            .filter(|e| e.is("p"))
            .map(images::clear_drawing_runs)
            .sum();

        let inserted = cleared > 0 && header.root.child("p").is_some();
        if inserted {
            let rel_id = images::add_image_relationship(package, part, logo)?;
            let prefixes = DrawingPrefixes::declare(&mut header.root);
            let run = images::inline_picture_run(&prefixes, &rel_id, drawing_id, rect);
            if let Some(first) = header.root.child_mut("p") {
                first.push(run);
            }
            report.logos_removed += cleared;
            report.logos_inserted += 1;
            report.diagnostics.info("  → New logo added to the header");
        }

        package.put_xml(part, header);
        Ok(inserted)
    }

    /// Replace the first drawing run among the top-level body paragraphs.
    fn replace_body_logo(
        &self,
        package: &mut Package,
        part: &str,
        logo: &ImageData,
        rect: &Rect,
        drawing_id: u32,
        report: &mut RebrandReport,
    ) -> Result<bool> {
        let mut document = package.take_xml(part)?;
        let found = body_mut(&mut document.root)?
            .elements_mut()
            .filter(|e| e.is("p"))
            .position(images::clear_first_drawing_run);

        if let Some(index) = found {
            let rel_id = images::add_image_relationship(package, part, logo)?;
            let prefixes = DrawingPrefixes::declare(&mut document.root);
            let run = images::inline_picture_run(&prefixes, &rel_id, drawing_id, rect);
            if let Some(paragraph) = body_mut(&mut document.root)?
                .elements_mut()
                .filter(|e| e.is("p"))
                .nth(index)
            {
                paragraph.push(run);
            }
            report.logos_removed += 1;
            report.logos_inserted += 1;
        }

        package.put_xml(part, document);
        Ok(found.is_some())
    }
}

impl Default for DocxRebrander {
    fn default() -> Self {
        Self::new(RebrandConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{drawing_paragraph, paragraph, png, DocxBuilder};
    use rebrand_core::{Element, Level, Placements};

    fn part_root(bytes: &[u8], part: &str) -> Element {
        Package::open(bytes).unwrap().take_xml(part).unwrap().root
    }

    fn drawing_extents(root: &Element) -> Vec<(String, String)> {
        root.descendants()
            .filter(|e| e.is("extent"))
            .map(|e| {
                (
                    e.attr("cx").unwrap_or_default().to_string(),
                    e.attr("cy").unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    fn logo_extent() -> (String, String) {
        let logo = Placements::default().logo;
        (logo.width.0.to_string(), logo.height.0.to_string())
    }

    #[test]
    fn test_header_logo_replaced() {
        let bytes = DocxBuilder::new()
            .paragraph(paragraph(None, "Report"))
            .final_section(Some(1))
            .header(1, true)
            .build();

        let output = DocxRebrander::default()
            .rebrand(&bytes, &ReplacementImages::new(png()))
            .unwrap();

        let header = part_root(&output.bytes, "word/header1.xml");
        assert_eq!(drawing_extents(&header), vec![logo_extent()]);
        let doc_pr = header.find_descendant("docPr").unwrap();
        assert_eq!(doc_pr.attr("id"), Some("42"));

        let mut package = Package::open(&output.bytes).unwrap();
        let rels = package.relationships("word/header1.xml").unwrap();
        let embed = header.find_descendant("blip").unwrap().prefixed_attr("embed").unwrap().to_string();
        let target = &rels.get(&embed).unwrap().target;
        assert!(package.raw(&format!("word/{}", target)).is_some());

        assert_eq!(output.report.logos_inserted, 1);
        assert_eq!(output.report.units, 1);
    }

    #[test]
    fn test_shared_header_processed_once() {
        let bytes = DocxBuilder::new()
            .paragraph(paragraph(None, "One"))
            .section_break(Some(1))
            .paragraph(paragraph(None, "Two"))
            .final_section(None)
            .header(1, true)
            .build();

        let output = DocxRebrander::default()
            .rebrand(&bytes, &ReplacementImages::new(png()))
            .unwrap();

        let header = part_root(&output.bytes, "word/header1.xml");
        assert_eq!(drawing_extents(&header).len(), 1);
        assert_eq!(output.report.units, 2);
        assert_eq!(output.report.logos_inserted, 1);
    }

    #[test]
    fn test_header_without_picture_is_untouched() {
        let bytes = DocxBuilder::new()
            .paragraph(paragraph(None, "Report"))
            .final_section(Some(1))
            .header(1, false)
            .build();

        let output = DocxRebrander::default()
            .rebrand(&bytes, &ReplacementImages::new(png()))
            .unwrap();

        let header = part_root(&output.bytes, "word/header1.xml");
        assert!(drawing_extents(&header).is_empty());
        assert_eq!(output.report.logos_inserted, 0);
    }

    #[test]
    fn test_first_body_picture_replaced_only() {
        let bytes = DocxBuilder::new()
            .paragraph(paragraph(None, "Intro"))
            .paragraph(drawing_paragraph(5))
            .paragraph(drawing_paragraph(6))
            .final_section(None)
            .build();

        let output = DocxRebrander::default()
            .rebrand(&bytes, &ReplacementImages::new(png()))
            .unwrap();

        let root = part_root(&output.bytes, "word/document.xml");
        let body = root.child("body").unwrap();
        let paragraphs: Vec<&Element> = body.children_named("p").collect();

        // the replaced paragraph keeps its emptied run and gains the new one
        let first = paragraphs[1];
        assert_eq!(first.children_named("r").count(), 2);
        assert!(first.children_named("r").next().unwrap().children.is_empty());
        assert_eq!(drawing_extents(first), vec![logo_extent()]);
        assert_eq!(first.find_descendant("docPr").unwrap().attr("id"), Some("7"));

        // the second picture stays as it was
        assert_eq!(paragraphs[2].find_descendant("docPr").unwrap().attr("id"), Some("6"));
        assert!(output
            .report
            .diagnostics
            .entries()
            .iter()
            .any(|d| d.message == "  → Logo replaced in the document"));
    }

    #[test]
    fn test_plain_then_bullet_styles() {
        let bytes = DocxBuilder::new()
            .paragraph(paragraph(None, "Plain text A"))
            .paragraph(paragraph(None, "- bullet text"))
            .final_section(None)
            .build();

        let output = DocxRebrander::default()
            .rebrand(&bytes, &ReplacementImages::new(png()))
            .unwrap();

        let root = part_root(&output.bytes, "word/document.xml");
        let sizes: Vec<&str> = root
            .descendants()
            .filter(|e| e.is("sz"))
            .filter_map(|e| e.attr("w:val"))
            .collect();
        assert_eq!(sizes, vec!["56", "28"]);
        assert_eq!(output.report.paragraphs_styled, 2);
    }

    #[test]
    fn test_favicon_is_reported_as_unsupported() {
        let bytes = DocxBuilder::new()
            .paragraph(paragraph(None, "Text"))
            .final_section(None)
            .build();
        let images = ReplacementImages::new(png()).with_favicon(png());

        let output = DocxRebrander::default().rebrand(&bytes, &images).unwrap();

        let warnings: Vec<_> = output.report.diagnostics.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, Level::Warning);
        assert_eq!(output.report.favicons_inserted, 0);
    }

    #[test]
    fn test_round_trip_keeps_paragraphs_and_runs() {
        let bytes = DocxBuilder::new()
            .paragraph(paragraph(Some("Title"), "Annual report"))
            .paragraph(paragraph(None, "Body text"))
            .paragraph(paragraph(None, "* starred item"))
            .final_section(None)
            .build();

        let mut before = DocxDocument::open(&bytes).unwrap();
        let mut after = DocxDocument::open(&before.to_bytes().unwrap()).unwrap();
        assert_eq!(after.paragraph_count().unwrap(), before.paragraph_count().unwrap());
        assert_eq!(after.run_count().unwrap(), before.run_count().unwrap());
        assert_eq!(after.section_count().unwrap(), 1);

        let output = DocxRebrander::default()
            .rebrand(&bytes, &ReplacementImages::new(png()))
            .unwrap();
        let mut rebranded = DocxDocument::open(&output.bytes).unwrap();
        assert_eq!(rebranded.paragraph_count().unwrap(), 3);
        assert_eq!(rebranded.run_count().unwrap(), before.run_count().unwrap());
    }
}
