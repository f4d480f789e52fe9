//! Labeled objects and their LabelMe XML form

use std::collections::HashSet;
use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::coordinate::Pixel;
use crate::errors::BandResult;

/// Fewest distinct vertices a label polygon needs
pub(crate) const MIN_DISTINCT_POINTS: usize = 3;

/// Number of distinct pixels in a vertex list
pub(crate) fn distinct_points(points: &[Pixel]) -> usize {
    points.iter().collect::<HashSet<_>>().len()
}

/// One annotation object in pixel space
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledObject {
    pub id: i64,
    pub name: String,
    pub deleted: bool,
    pub verified: bool,
    pub attributes: String,
    /// Polygon vertices, stored as `x = col`, `y = row`; not closed
    pub points: Vec<Pixel>,
}

impl LabeledObject {
    /// Whether the object should be exported
    pub fn is_exportable(&self) -> bool {
        self.verified && !self.deleted
    }
}

/// An object waiting for an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewLabel {
    pub name: String,
    pub points: Vec<Pixel>,
}

impl NewLabel {
    /// Fresh, unverified object with the given id
    pub fn into_object(self, id: i64) -> LabeledObject {
        LabeledObject {
            id,
            name: self.name,
            deleted: false,
            verified: false,
            attributes: String::new(),
            points: self.points,
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Writes `<name>text</name>`, or `<name/>` for empty text
pub(crate) fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> BandResult<()> {
    if text.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

/// Writes one `<object>` element
pub(crate) fn write_object<W: Write>(writer: &mut Writer<W>, object: &LabeledObject) -> BandResult<()> {
    writer.write_event(Event::Start(BytesStart::new("object")))?;
    write_text_element(writer, "name", &object.name)?;
    write_text_element(writer, "deleted", flag(object.deleted))?;
    write_text_element(writer, "verified", flag(object.verified))?;
    write_text_element(writer, "occluded", "no")?;
    write_text_element(writer, "attributes", &object.attributes)?;

    writer.write_event(Event::Start(BytesStart::new("parts")))?;
    write_text_element(writer, "hasparts", "")?;
    write_text_element(writer, "ispartof", "")?;
    writer.write_event(Event::End(BytesEnd::new("parts")))?;

    writer.write_event(Event::Start(BytesStart::new("polygon")))?;
    for point in &object.points {
        writer.write_event(Event::Start(BytesStart::new("pt")))?;
        write_text_element(writer, "x", &point.col.to_string())?;
        write_text_element(writer, "y", &point.row.to_string())?;
        writer.write_event(Event::End(BytesEnd::new("pt")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("polygon")))?;

    write_text_element(writer, "id", &object.id.to_string())?;
    writer.write_event(Event::End(BytesEnd::new("object")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_xml_layout() {
        let object = NewLabel {
            name: "From 0 To 10".to_string(),
            points: vec![Pixel::new(4, 1), Pixel::new(5, 2), Pixel::new(6, 3)],
        }
        .into_object(7);

        let mut writer = Writer::new(Vec::new());
        write_object(&mut writer, &object).unwrap();
        let xml = String::from_utf8(writer.into_inner()).unwrap();

        assert!(xml.starts_with("<object><name>From 0 To 10</name><deleted>0</deleted><verified>0</verified>"));
        assert!(xml.contains("<occluded>no</occluded><attributes/><parts><hasparts/><ispartof/></parts>"));
        assert!(xml.contains("<pt><x>1</x><y>4</y></pt>"));
        assert!(xml.ends_with("<id>7</id></object>"));
    }

    #[test]
    fn test_names_are_escaped() {
        let object = NewLabel { name: "a < b".to_string(), points: Vec::new() }.into_object(0);
        let mut writer = Writer::new(Vec::new());
        write_object(&mut writer, &object).unwrap();
        let xml = String::from_utf8(writer.into_inner()).unwrap();
        assert!(xml.contains("<name>a &lt; b</name>"));
    }

    #[test]
    fn test_exportable_flags() {
        let mut object = NewLabel { name: "x".to_string(), points: Vec::new() }.into_object(0);
        assert!(!object.is_exportable());
        object.verified = true;
        assert!(object.is_exportable());
        object.deleted = true;
        assert!(!object.is_exportable());
    }
}
