//! Loading a presentation package: masters, slides and their relationships.

use crate::shapes::InheritedGeometry;
use rebrand_core::package::{part_number, resolve_target};
use rebrand_core::{Error, Package, Result};
use std::collections::HashMap;

/// Main part of every presentation.
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// An opened presentation with its masters and slides in processing order.
pub struct PptxDocument {
    package: Package,
    masters: Vec<String>,
    slides: Vec<String>,
    /// Inherited geometry per layout part.
    layouts: HashMap<String, InheritedGeometry>,
}

impl PptxDocument {
    /// Open a presentation from in-memory bytes.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let mut package = Package::open(bytes)?;
        let main = package.main_part().unwrap_or_else(|_| PRESENTATION_PART.to_string());
        if !package.contains(&main) {
            return Err(Error::MissingPart(main));
        }

        let masters = list_parts(&mut package, &main, "sldMasterIdLst", "/slideMaster")?;
        let slides = list_parts(&mut package, &main, "sldIdLst", "/slide")?;
        log::debug!("{} master(s), {} slide(s)", masters.len(), slides.len());

        Ok(Self {
            package,
            masters,
            slides,
            layouts: HashMap::new(),
        })
    }

    pub fn masters(&self) -> &[String] {
        &self.masters
    }

    pub fn slides(&self) -> &[String] {
        &self.slides
    }

    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Masters plus slides.
    pub fn unit_count(&self) -> usize {
        self.masters.len() + self.slides.len()
    }

    /// Placeholder geometry a slide inherits from its layout and that layout's master.
    pub fn placeholder_geometry(&mut self, slide_part: &str) -> Result<InheritedGeometry> {
        let Some(layout) = self.related_part(slide_part, "/slideLayout")? else {
            return Ok(InheritedGeometry::default());
        };
        if let Some(geometry) = self.layouts.get(&layout) {
            return Ok(geometry.clone());
        }

        let mut geometry = match self.related_part(&layout, "/slideMaster")? {
            Some(master) => InheritedGeometry::from_master(&self.package.xml_mut(&master)?.root),
            None => InheritedGeometry::default(),
        };
        geometry.add_layout(&self.package.xml_mut(&layout)?.root);
        self.layouts.insert(layout, geometry.clone());
        Ok(geometry)
    }

    /// Target of the first relationship of a type, if that part exists.
    fn related_part(&mut self, part: &str, rel_type: &str) -> Result<Option<String>> {
        let rels = self.package.relationships(part)?;
        Ok(rels
            .find_by_type(rel_type)
            .map(|rel| resolve_target(part, &rel.target))
            .filter(|target| self.package.contains(target)))
    }

    /// Total `a:r` runs across masters and slides.
    pub fn run_count(&mut self) -> Result<usize> {
        let parts: Vec<String> = self.masters.iter().chain(&self.slides).cloned().collect();
        let mut total = 0;
        for part in parts {
            total += crate::text::run_count(&self.package.xml_mut(&part)?.root);
        }
        Ok(total)
    }

    /// Serialize the presentation back to a ZIP.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package.to_bytes()
    }
}

/// Parts listed under `p:<list>` of the presentation part, in list order.
///
/// Without the list, every relationship of the given type is used, ordered by
/// the number in its part name.
fn list_parts(package: &mut Package, main: &str, list: &str, rel_type: &str) -> Result<Vec<String>> {
    let rels = package.relationships(main)?;
    let root = &package.xml_mut(main)?.root;

    let from_list: Option<Vec<String>> = root.child(list).map(|ids| {
        ids.elements()
            .filter_map(|entry| entry.prefixed_attr("id"))
            .filter_map(|rel_id| rels.get(rel_id))
            .map(|rel| resolve_target(main, &rel.target))
            .collect()
    });

    let parts = match from_list {
        Some(parts) => parts,
        None => {
            let mut parts: Vec<(String, Option<u32>)> = rels
                .iter()
                .filter(|rel| rel.rel_type.ends_with(rel_type))
                .map(|rel| {
                    let part = resolve_target(main, &rel.target);
                    let number = part_number(&part);
                    (part, number)
                })
                .collect();
            parts.sort_by(|a, b| match (a.1, b.1) {
                (Some(na), Some(nb)) => na.cmp(&nb),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.0.cmp(&b.0),
            });
            parts.into_iter().map(|(part, _)| part).collect()
        }
    };

    Ok(parts
        .into_iter()
        .filter(|part| {
            let present = package.contains(part);
            if !present {
                log::warn!("Listed part {} is missing from the package", part);
            }
            present
        })
        .collect())
}
