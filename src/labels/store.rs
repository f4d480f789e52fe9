//! LabelMe annotation store
//!
//! The store is one XML document per raster. Appends re-emit every existing
//! element and insert the new objects before the closing `</annotation>`;
//! nothing already stored is modified or removed. Appends are a
//! read-then-write of the whole file, so concurrent appends to one store
//! must be serialized by the caller.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::coordinate::Pixel;
use crate::errors::{BandTraceError, BandResult};
use crate::utils::output;

use super::object::{write_object, write_text_element, LabeledObject, NewLabel};

const SOURCE_IMAGE: &str = "The MIT-CSAIL database of objects and scenes";
const SOURCE_ANNOTATION: &str = "LabelMe Webtool";

/// Header fields of a freshly created document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHeader {
    /// Image the annotations refer to
    pub filename: String,
    pub folder: String,
    pub rows: usize,
    pub cols: usize,
}

impl DocumentHeader {
    /// Header for the preview of `raster`, stored alongside `store`
    pub fn for_raster(raster: &Path, store: &Path, rows: usize, cols: usize) -> Self {
        let stem = raster
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let folder = store
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        DocumentHeader { filename: format!("{}.png", stem), folder, rows, cols }
    }

    /// Minimal document with no objects
    fn to_document(&self) -> BandResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Start(BytesStart::new("annotation")))?;
        write_text_element(&mut writer, "filename", &self.filename)?;
        write_text_element(&mut writer, "folder", &self.folder)?;

        writer.write_event(Event::Start(BytesStart::new("source")))?;
        write_text_element(&mut writer, "sourceImage", SOURCE_IMAGE)?;
        write_text_element(&mut writer, "sourceAnnotation", SOURCE_ANNOTATION)?;
        writer.write_event(Event::End(BytesEnd::new("source")))?;

        writer.write_event(Event::Start(BytesStart::new("imagesize")))?;
        write_text_element(&mut writer, "nrows", &self.rows.to_string())?;
        write_text_element(&mut writer, "ncols", &self.cols.to_string())?;
        writer.write_event(Event::End(BytesEnd::new("imagesize")))?;

        writer.write_event(Event::End(BytesEnd::new("annotation")))?;
        into_string(writer)
    }
}

fn into_string(writer: Writer<Vec<u8>>) -> BandResult<String> {
    String::from_utf8(writer.into_inner()).map_err(|e| BandTraceError::Xml(e.to_string()))
}

/// Annotation document at a fixed path
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    path: PathBuf,
}

impl AnnotationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AnnotationStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Every stored object
    ///
    /// # Returns
    /// The objects, or [`BandTraceError::NoLabels`] when the store was never created
    pub fn read_objects(&self) -> BandResult<Vec<LabeledObject>> {
        if !self.exists() {
            return Err(BandTraceError::NoLabels);
        }
        parse_objects(&fs::read_to_string(&self.path)?)
    }

    /// Objects that are verified and not deleted
    pub fn exportable_objects(&self) -> BandResult<Vec<LabeledObject>> {
        Ok(self.read_objects()?.into_iter().filter(LabeledObject::is_exportable).collect())
    }

    /// Appends new objects, creating the document from `header` if needed
    ///
    /// Ids continue from the largest stored id, starting at 0.
    ///
    /// # Returns
    /// The appended objects with their ids
    pub fn append(&self, labels: Vec<NewLabel>, header: &DocumentHeader) -> BandResult<Vec<LabeledObject>> {
        let content = if self.exists() {
            fs::read_to_string(&self.path)?
        } else {
            info!("Creating annotation store {}", self.path.display());
            header.to_document()?
        };

        let first_id = parse_objects(&content)?
            .iter()
            .map(|o| o.id)
            .max()
            .map_or(0, |id| id + 1);

        let objects: Vec<LabeledObject> = labels
            .into_iter()
            .enumerate()
            .map(|(k, label)| label.into_object(first_id + k as i64))
            .collect();

        let document = insert_objects(&content, &objects)?;
        output::write_atomic(&self.path, document.as_bytes())?;

        info!("Appended {} objects to {}", objects.len(), self.path.display());
        Ok(objects)
    }
}

fn element_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

/// Re-emits `content` with `objects` inserted before `</annotation>`
fn insert_objects(content: &str, objects: &[LabeledObject]) -> BandResult<String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut depth = 0usize;
    let mut inserted = false;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e))?;
            },
            Event::End(e) => {
                if depth == 1 && e.name().as_ref() == b"annotation" {
                    for object in objects {
                        write_object(&mut writer, object)?;
                    }
                    inserted = true;
                }
                depth = depth.saturating_sub(1);
                writer.write_event(Event::End(e))?;
            },
            Event::Empty(e) if depth == 0 && e.name().as_ref() == b"annotation" => {
                writer.write_event(Event::Start(BytesStart::new("annotation")))?;
                for object in objects {
                    write_object(&mut writer, object)?;
                }
                writer.write_event(Event::End(BytesEnd::new("annotation")))?;
                inserted = true;
            },
            event => writer.write_event(event)?,
        }
    }

    if !inserted {
        return Err(BandTraceError::Xml("document has no <annotation> root".to_string()));
    }
    into_string(writer)
}

/// Object being read
#[derive(Default)]
struct ObjectBuilder {
    id: Option<i64>,
    name: String,
    deleted: bool,
    verified: bool,
    attributes: String,
    points: Vec<Pixel>,
    x: Option<f64>,
    y: Option<f64>,
}

impl ObjectBuilder {
    fn set_field(&mut self, parent: &str, field: &str, text: &str) {
        match (parent, field) {
            ("object", "name") => self.name = text.to_string(),
            ("object", "deleted") => self.deleted = text.trim() == "1",
            ("object", "verified") => self.verified = text.trim() == "1",
            ("object", "attributes") => self.attributes = text.to_string(),
            ("object", "id") => match text.trim().parse::<i64>() {
                Ok(id) => self.id = Some(id),
                Err(_) => warn!("Ignoring non-numeric object id '{}'", text),
            },
            ("pt", "x") => self.x = text.trim().parse().ok(),
            ("pt", "y") => self.y = text.trim().parse().ok(),
            _ => {},
        }
    }

    fn finish_point(&mut self) {
        match (self.x.take(), self.y.take()) {
            (Some(x), Some(y)) => self.points.push(Pixel::new(y.round() as i64, x.round() as i64)),
            _ => warn!("Skipping polygon point without numeric x and y"),
        }
    }

    fn finish(self) -> Option<LabeledObject> {
        let Some(id) = self.id else {
            warn!("Skipping object '{}' without an id", self.name);
            return None;
        };
        Some(LabeledObject {
            id,
            name: self.name,
            deleted: self.deleted,
            verified: self.verified,
            attributes: self.attributes,
            points: self.points,
        })
    }
}

/// Reads the `<object>` children of the document root
fn parse_objects(content: &str) -> BandResult<Vec<LabeledObject>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut current: Option<ObjectBuilder> = None;
    let mut objects = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = element_name(e.name().as_ref());
                if path.len() == 1 && name == "object" {
                    current = Some(ObjectBuilder::default());
                }
                path.push(name);
            },
            Event::Text(text) => {
                if let (Some(builder), [.., parent, field]) = (current.as_mut(), path.as_slice()) {
                    builder.set_field(parent, field, &text.unescape()?);
                }
            },
            Event::End(_) => {
                let name = path.pop().unwrap_or_default();
                match name.as_str() {
                    "pt" => {
                        if let Some(builder) = current.as_mut() {
                            builder.finish_point();
                        }
                    },
                    "object" if path.len() == 1 => {
                        if let Some(object) = current.take().and_then(ObjectBuilder::finish) {
                            objects.push(object);
                        }
                    },
                    _ => {},
                }
            },
            _ => {},
        }
    }

    debug!("Parsed {} annotation objects", objects.len());
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> DocumentHeader {
        DocumentHeader { filename: "dsm.png".to_string(), folder: "project/1".to_string(), rows: 40, cols: 30 }
    }

    fn label(name: &str) -> NewLabel {
        NewLabel { name: name.to_string(), points: vec![Pixel::new(0, 0), Pixel::new(0, 5), Pixel::new(5, 5)] }
    }

    #[test]
    fn test_missing_store_reports_no_labels() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path().join("dsm.xml"));
        assert!(matches!(store.read_objects(), Err(BandTraceError::NoLabels)));
        assert!(matches!(store.exportable_objects(), Err(BandTraceError::NoLabels)));
    }

    #[test]
    fn test_ids_start_at_zero_and_continue() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path().join("dsm.xml"));

        let first = store.append(vec![label("a"), label("b")], &header()).unwrap();
        assert_eq!(first.iter().map(|o| o.id).collect::<Vec<_>>(), vec![0, 1]);

        let second = store.append(vec![label("c")], &header()).unwrap();
        assert_eq!(second[0].id, 2);

        let stored = store.read_objects().unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].name, "c");
        assert_eq!(stored[0].points, label("a").points);
    }

    #[test]
    fn test_new_document_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path().join("dsm.xml"));
        store.append(Vec::new(), &header()).unwrap();

        let xml = fs::read_to_string(store.path()).unwrap();
        assert!(xml.contains("<filename>dsm.png</filename>"));
        assert!(xml.contains("<sourceAnnotation>LabelMe Webtool</sourceAnnotation>"));
        assert!(xml.contains("<nrows>40</nrows>"));
        assert!(xml.contains("<ncols>30</ncols>"));
    }

    #[test]
    fn test_existing_content_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dsm.xml");
        fs::write(
            &path,
            "<annotation><filename>x.png</filename><custom a=\"1\">keep me</custom>\
             <object><name>old</name><deleted>0</deleted><verified>1</verified><attributes>tall</attributes>\
             <polygon><pt><x>1</x><y>2</y></pt><pt><x>3</x><y>2</y></pt><pt><x>3</x><y>4</y></pt></polygon>\
             <id>41</id></object></annotation>",
        )
        .unwrap();

        let store = AnnotationStore::new(&path);
        let appended = store.append(vec![label("new")], &header()).unwrap();
        assert_eq!(appended[0].id, 42);

        let xml = fs::read_to_string(&path).unwrap();
        assert!(xml.contains("<custom a=\"1\">keep me</custom>"));
        assert!(xml.contains("<filename>x.png</filename>"));

        let exportable = store.exportable_objects().unwrap();
        assert_eq!(exportable.len(), 1);
        assert_eq!(exportable[0].name, "old");
        assert_eq!(exportable[0].attributes, "tall");
        assert_eq!(exportable[0].points[0], Pixel::new(2, 1));
    }

    #[test]
    fn test_document_without_root_is_rejected() {
        assert!(matches!(insert_objects("<other/>", &[]), Err(BandTraceError::Xml(_))));
    }

    #[test]
    fn test_header_for_raster() {
        let header = DocumentHeader::for_raster(Path::new("/data/odm_dem/dsm.tif"), Path::new("/data/labels/dsm.xml"), 3, 4);
        assert_eq!(header.filename, "dsm.png");
        assert_eq!(header.folder, "/data/labels");
    }
}
