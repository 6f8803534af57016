//! In-memory presentations for tests.

use rebrand_core::{Emu, ImageData, Rect};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A small PNG-signed image.
pub fn png() -> ImageData {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(b"logo");
    ImageData::new(bytes).unwrap()
}

/// A GIF-signed image, distinct from [`png`].
pub fn gif() -> ImageData {
    ImageData::new(b"GIF89a-favicon".to_vec()).unwrap()
}

fn xfrm(rect: Rect) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        rect.left.0, rect.top.0, rect.width.0, rect.height.0
    )
}

/// A `p:pic` at `rect`.
pub fn picture(id: u32, name: &str, rect: Rect) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="{name}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId9"/></p:blipFill><p:spPr>{}<a:prstGeom prst="rect"/></p:spPr></p:pic>"#,
        xfrm(rect)
    )
}

/// A text box named `Box <id>` with its top at `top_cm`, one paragraph per entry.
pub fn text_box(id: u32, top_cm: f64, paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|text| format!(r#"<a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p>"#, text))
        .collect();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Box {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{}</p:spPr><p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>"#,
        xfrm(Rect::new(Emu::from_cm(5.0), Emu::from_cm(top_cm), Emu::from_cm(20.0), Emu::from_cm(2.0)))
    )
}

/// A title placeholder without its own transform.
pub fn title_placeholder(id: u32, text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Title {id}"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
    )
}

fn shape_tree_part(root: &str, shapes: &str) -> String {
    format!(
        r#"{DECL}<p:{root} {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld></p:{root}>"#
    )
}

fn rels(entries: &[(String, &str, String)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{REL_NS}/{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(
        r#"{DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
    )
}

/// Builds a one-master, one-layout presentation.
pub struct PptxBuilder {
    master_shapes: Vec<String>,
    slides: Vec<Vec<String>>,
    slide_list: SlideList,
    with_presentation: bool,
}

enum SlideList {
    InOrder,
    Reversed,
    Absent,
}

impl PptxBuilder {
    pub fn new() -> Self {
        Self {
            master_shapes: Vec::new(),
            slides: Vec::new(),
            slide_list: SlideList::InOrder,
            with_presentation: true,
        }
    }

    pub fn master(mut self, shapes: &[String]) -> Self {
        self.master_shapes = shapes.to_vec();
        self
    }

    pub fn slide(mut self, shapes: &[String]) -> Self {
        self.slides.push(shapes.to_vec());
        self
    }

    pub fn reverse_slide_list(mut self) -> Self {
        self.slide_list = SlideList::Reversed;
        self
    }

    pub fn without_slide_list(mut self) -> Self {
        self.slide_list = SlideList::Absent;
        self
    }

    pub fn without_presentation(mut self) -> Self {
        self.with_presentation = false;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut files: Vec<(String, String)> = Vec::new();

        files.push((
            "[Content_Types].xml".to_string(),
            format!(
                r#"{DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/></Types>"#
            ),
        ));
        files.push((
            "_rels/.rels".to_string(),
            rels(&[("rId1".to_string(), "officeDocument", "ppt/presentation.xml".to_string())]),
        ));

        let slide_rel = |i: usize| format!("rId{}", i + 2);
        let mut order: Vec<usize> = (0..self.slides.len()).collect();
        if matches!(self.slide_list, SlideList::Reversed) {
            order.reverse();
        }
        let slide_list = match self.slide_list {
            SlideList::Absent => String::new(),
            _ => format!(
                "<p:sldIdLst>{}</p:sldIdLst>",
                order
                    .iter()
                    .map(|&i| format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, slide_rel(i)))
                    .collect::<String>()
            ),
        };
        if self.with_presentation {
            files.push((
                "ppt/presentation.xml".to_string(),
                format!(
                    r#"{DECL}<p:presentation {NS}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{slide_list}<p:sldSz cx="17280000" cy="9720000"/></p:presentation>"#
                ),
            ));
        }

        let mut presentation_rels = vec![(
            "rId1".to_string(),
            "slideMaster",
            "slideMasters/slideMaster1.xml".to_string(),
        )];
        for i in 0..self.slides.len() {
            presentation_rels.push((slide_rel(i), "slide", format!("slides/slide{}.xml", i + 1)));
        }
        files.push(("ppt/_rels/presentation.xml.rels".to_string(), rels(&presentation_rels)));

        let master_title = format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Master title"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr>{}</p:spPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>Click to edit the title</a:t></a:r></a:p></p:txBody></p:sp>"#,
            xfrm(Rect::from_cm(2.0, 1.0, 40.0, 3.0))
        );
        files.push((
            "ppt/slideMasters/slideMaster1.xml".to_string(),
            shape_tree_part("sldMaster", &format!("{}{}", master_title, self.master_shapes.concat())),
        ));
        files.push((
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
            rels(&[("rId1".to_string(), "slideLayout", "../slideLayouts/slideLayout1.xml".to_string())]),
        ));
        files.push((
            "ppt/slideLayouts/slideLayout1.xml".to_string(),
            shape_tree_part("sldLayout", &title_placeholder(2, "Layout title")),
        ));
        files.push((
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels".to_string(),
            rels(&[("rId1".to_string(), "slideMaster", "../slideMasters/slideMaster1.xml".to_string())]),
        ));

        for (i, shapes) in self.slides.iter().enumerate() {
            files.push((
                format!("ppt/slides/slide{}.xml", i + 1),
                shape_tree_part("sld", &shapes.concat()),
            ));
            files.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                rels(&[("rId1".to_string(), "slideLayout", "../slideLayouts/slideLayout1.xml".to_string())]),
            ));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in files {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}
