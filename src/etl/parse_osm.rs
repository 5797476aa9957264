use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{ElementKind, RawChild, RawElement, RawTag};
use crate::errors::{Error, Result};

struct OpenElement {
    depth: usize,
    element: RawElement,
    wanted: bool,
}

enum Step {
    Continue,
    Element(RawElement),
    Eof,
}

/// Lazily yields the node/way/relation elements of an .osm document. Only the
/// element currently being read is held in memory; its buffer is reused for
/// the next one.
pub struct OsmElements<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    kinds: Vec<ElementKind>,
    depth: usize,
    current: Option<OpenElement>,
    root_seen: bool,
    finished: bool,
}

/// Opens an .osm file, decompressing on the fly when the name ends in `.xz`.
pub fn open_osm(path: &Path, kinds: &[ElementKind]) -> Result<OsmElements<Box<dyn BufRead>>> {
    let file = fs::File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let file_reader = BufReader::new(file);
    let source: Box<dyn BufRead> = if is_xz(path) {
        Box::new(BufReader::new(XzDecoder::new(file_reader)))
    } else {
        Box::new(file_reader)
    };
    Ok(OsmElements::from_reader(source, kinds))
}

fn is_xz(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("xz"))
}

fn read_attributes(el: &BytesStart, position: usize) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attribute_res in el.attributes() {
        let attribute = attribute_res.map_err(|err| Error::from_attr(position, err))?;
        let key = str::from_utf8(attribute.key.as_ref())
            .map_err(|err| Error::malformed(position, err.to_string()))?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|err| Error::from_xml(position, err))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

fn take_attribute(attributes: &mut Vec<(String, String)>, name: &str) -> Option<String> {
    let index = attributes.iter().position(|(key, _)| key == name)?;
    Some(attributes.remove(index).1)
}

fn required_attribute(attributes: &mut Vec<(String, String)>, name: &str, element: &str, position: usize) -> Result<String> {
    take_attribute(attributes, name)
        .ok_or_else(|| Error::malformed(position, format!("<{element}> without '{name}' attribute")))
}

fn parse_element(kind: ElementKind, el: &BytesStart, position: usize) -> Result<RawElement> {
    let attributes = read_attributes(el, position)?;
    let id = attributes
        .iter()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.clone())
        .ok_or_else(|| Error::malformed(position, format!("<{kind}> without 'id' attribute")))?;
    Ok(RawElement {
        kind,
        id,
        attributes,
        children: Vec::new(),
    })
}

fn parse_child(el: &BytesStart, position: usize) -> Result<Option<RawChild>> {
    let name = el.name();
    let child = match name.as_ref() {
        b"tag" => {
            let mut attributes = read_attributes(el, position)?;
            let key = required_attribute(&mut attributes, "k", "tag", position)?;
            let value = required_attribute(&mut attributes, "v", "tag", position)?;
            RawChild::Tag(RawTag { key, value })
        }
        b"nd" => {
            let mut attributes = read_attributes(el, position)?;
            RawChild::NodeRef(required_attribute(&mut attributes, "ref", "nd", position)?)
        }
        b"member" => {
            let mut attributes = read_attributes(el, position)?;
            RawChild::Member {
                member_type: take_attribute(&mut attributes, "type").unwrap_or_default(),
                member_ref: required_attribute(&mut attributes, "ref", "member", position)?,
                role: take_attribute(&mut attributes, "role").unwrap_or_default(),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(child))
}

impl<R: BufRead> OsmElements<R> {
    pub fn from_reader(source: R, kinds: &[ElementKind]) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);

        OsmElements {
            reader,
            buf: Vec::new(),
            kinds: kinds.to_vec(),
            depth: 0,
            current: None,
            root_seen: false,
            finished: false,
        }
    }

    fn open(&mut self, el: &BytesStart, depth: usize, empty: bool, position: usize) -> Result<Option<RawElement>> {
        if let Some(open) = self.current.as_mut() {
            if open.wanted && depth == open.depth + 1 {
                if let Some(child) = parse_child(el, position)? {
                    open.element.children.push(child);
                }
            }
            return Ok(None);
        }

        let name = el.name();
        let Some(kind) = ElementKind::from_tag_name(name.as_ref()) else {
            return Ok(None);
        };
        let element = parse_element(kind, el, position)?;
        let wanted = self.kinds.contains(&kind);
        if empty {
            return Ok(wanted.then_some(element));
        }
        self.current = Some(OpenElement { depth, element, wanted });
        Ok(None)
    }

    /// A document has exactly one root element.
    fn enter_root(&mut self, position: usize) -> Result<()> {
        if self.root_seen {
            return Err(Error::malformed(position, "content after the root element"));
        }
        self.root_seen = true;
        Ok(())
    }

    fn close(&mut self) -> Option<RawElement> {
        let closing = self.current.as_ref().is_some_and(|open| open.depth == self.depth);
        self.depth = self.depth.saturating_sub(1);
        if !closing {
            return None;
        }
        let open = self.current.take()?;
        open.wanted.then_some(open.element)
    }

    fn step(&mut self) -> Result<Step> {
        let mut buf = std::mem::take(&mut self.buf);
        let result = self.step_with(&mut buf);
        buf.clear();
        self.buf = buf;
        result
    }

    fn step_with(&mut self, buf: &mut Vec<u8>) -> Result<Step> {
        let event = self
            .reader
            .read_event_into(buf)
            .map_err(|err| Error::from_xml(self.reader.buffer_position(), err))?;
        let position = self.reader.buffer_position();

        let step = match event {
            Event::Start(e) => {
                if self.depth == 0 {
                    self.enter_root(position)?;
                }
                self.depth += 1;
                let depth = self.depth;
                self.open(&e, depth, false, position)?.map_or(Step::Continue, Step::Element)
            }
            Event::Empty(e) => {
                if self.depth == 0 {
                    self.enter_root(position)?;
                }
                let depth = self.depth + 1;
                self.open(&e, depth, true, position)?.map_or(Step::Continue, Step::Element)
            }
            Event::End(_) => self.close().map_or(Step::Continue, Step::Element),
            Event::Text(e) if self.depth == 0 && e.iter().any(|b| !b.is_ascii_whitespace()) => {
                return Err(Error::malformed(position, "text outside the root element"));
            }
            Event::CData(_) if self.depth == 0 => {
                return Err(Error::malformed(position, "text outside the root element"));
            }
            Event::Eof => {
                if self.depth > 0 {
                    return Err(Error::malformed(position, "unexpected end of file inside an open element"));
                }
                if !self.root_seen {
                    return Err(Error::malformed(position, "document has no root element"));
                }
                Step::Eof
            }
            // Declarations, comments, doctype and text inside elements carry no map data.
            _ => Step::Continue,
        };
        Ok(step)
    }
}

impl<R: BufRead> Iterator for OsmElements<R> {
    type Item = Result<RawElement>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.step() {
                Ok(Step::Continue) => continue,
                Ok(Step::Element(element)) => return Some(Ok(element)),
                Ok(Step::Eof) => self.finished = true,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}
