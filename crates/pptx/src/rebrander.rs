//! The presentation rebranding pipeline.

use crate::document::PptxDocument;
use crate::pictures::{self, RemovalFlags};
use crate::shapes::InheritedGeometry;
use crate::text;
use rebrand_core::{
    DocumentFormat, ImageData, RebrandConfig, RebrandOutput, RebrandReport, Rect,
    ReplacementImages, Result,
};

/// Rebrands PPTX presentations.
pub struct PptxRebrander {
    config: RebrandConfig,
}

impl PptxRebrander {
    /// Create a rebrander with the given configuration.
    pub fn new(config: RebrandConfig) -> Self {
        Self { config }
    }

    /// Rebrand a presentation held in memory.
    ///
    /// Masters are processed before slides: a logo or favicon removed from a
    /// master forces a replacement onto every slide.
    pub fn rebrand(&self, bytes: &[u8], images: &ReplacementImages) -> Result<RebrandOutput> {
        let mut report = RebrandReport::new(DocumentFormat::Pptx);
        report.diagnostics.info("Opening PowerPoint file...");

        let mut document = PptxDocument::open(bytes)?;
        report.units = document.unit_count();

        let mut master_flags = RemovalFlags::default();
        let masters = document.masters().to_vec();
        for (i, part) in masters.iter().enumerate() {
            report.diagnostics.info(format!("Master {}", i + 1));
            let flags = self.process_master(&mut document, part, &mut report)?;
            master_flags.merge(flags);
        }
        if master_flags.needs_logo() || master_flags.needs_favicon() {
            log::debug!("Master branding removed, replacing on every slide");
        }

        let slides = document.slides().to_vec();
        let total = slides.len();
        for (i, part) in slides.iter().enumerate() {
            report.diagnostics.info(format!("Slide {}/{}", i + 1, total));
            self.process_slide(&mut document, part, master_flags, images, &mut report)?;
        }

        report.diagnostics.info("Saving presentation...");
        let bytes = document.to_bytes()?;
        report.diagnostics.info(format!(
            "Done: {} logo(s) and {} favicon(s) replaced, {} paragraph(s) restyled",
            report.logos_inserted, report.favicons_inserted, report.paragraphs_styled
        ));

        Ok(RebrandOutput { bytes, report })
    }

    fn process_master(
        &self,
        document: &mut PptxDocument,
        part: &str,
        report: &mut RebrandReport,
    ) -> Result<RemovalFlags> {
        let root = &mut document.package_mut().xml_mut(part)?.root;
        let tree = text::shape_tree_mut(root)?;
        // master placeholders carry their own geometry
        let inherited = InheritedGeometry::default();

        let flags =
            pictures::remove_legacy_pictures(tree, &inherited, &self.config, &mut report.diagnostics);
        report.logos_removed += flags.logos;
        report.favicons_removed += flags.favicons;

        let styled = text::style_text_containers(
            tree,
            &inherited,
            &self.config.presentation,
            &mut report.diagnostics,
        );
        report.paragraphs_styled += styled.paragraphs;
        Ok(flags)
    }

    fn process_slide(
        &self,
        document: &mut PptxDocument,
        part: &str,
        master_flags: RemovalFlags,
        images: &ReplacementImages,
        report: &mut RebrandReport,
    ) -> Result<()> {
        let inherited = document.placeholder_geometry(part)?;
        let package = document.package_mut();
        let mut slide = package.take_xml(part)?;

        let flags = {
            let tree = text::shape_tree_mut(&mut slide.root)?;
            pictures::remove_legacy_pictures(tree, &inherited, &self.config, &mut report.diagnostics)
        };
        report.logos_removed += flags.logos;
        report.favicons_removed += flags.favicons;

        let placements = self.config.placements;
        let mut insert = |image: &ImageData, rect: &Rect, label: &str| {
            pictures::insert_picture(package, part, &mut slide.root, image, rect, label)
        };

        if flags.needs_logo() || master_flags.needs_logo() {
            insert(&images.logo, &placements.logo, "Logo")?;
            report.logos_inserted += 1;
            report.diagnostics.info("  → New logo inserted");
        }
        if flags.needs_favicon() || master_flags.needs_favicon() {
            match &images.favicon {
                Some(favicon) => {
                    insert(favicon, &placements.favicon, "Favicon")?;
                    report.favicons_inserted += 1;
                    report.diagnostics.info("  → New favicon inserted");
                }
                None => log::debug!("  No favicon supplied, skipping insertion"),
            }
        }

        let tree = text::shape_tree_mut(&mut slide.root)?;
        let cells = text::style_tables(tree, &self.config.presentation);
        let styled = text::style_text_containers(
            tree,
            &inherited,
            &self.config.presentation,
            &mut report.diagnostics,
        );
        if !styled.title_found {
            log::debug!("  No title candidate on {}", part);
        }
        report.paragraphs_styled += styled.paragraphs + cells;

        package.put_xml(part, slide);
        Ok(())
    }
}

impl Default for PptxRebrander {
    fn default() -> Self {
        Self::new(RebrandConfig::default())
    }
}
