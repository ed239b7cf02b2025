use roxmltree::{Edge, Node};

use crate::{
    pipe::Pipe,
    svg::{DrawingEvent, QName, TagKind},
    Error,
};

// Flattens the element tree into start/end events carrying their depth.
#[derive(Debug, Default)]
pub struct DrawingReader<'a, 'input> {
    depth: usize,
    _s: std::marker::PhantomData<(&'a (), &'input ())>,
}

impl<'a, 'input> DrawingReader<'a, 'input> {
    pub fn new() -> Self {
        Self::default()
    }
}

fn name(node: Node) -> QName {
    let tag = node.tag_name();
    QName {
        namespace: tag.namespace().map(str::to_string),
        local: tag.name().to_string(),
    }
}

impl<'a, 'input> Pipe for DrawingReader<'a, 'input> {
    type Input = Edge<'a, 'input>;
    type Output = DrawingEvent;

    type Error = Error;

    fn process(&mut self, edge: Self::Input) -> Result<Option<Self::Output>, Self::Error> {
        match edge {
            Edge::Open(node) if node.is_element() => {
                let depth = self.depth;
                self.depth += 1;
                let name = name(node);
                trace!(depth, name = %name, "element");

                let attributes = node
                    .attributes()
                    .map(|attr| {
                        let name = QName {
                            namespace: attr.namespace().map(str::to_string),
                            local: attr.name().to_string(),
                        };
                        (name, attr.value().to_string())
                    })
                    .collect();

                Ok(Some(DrawingEvent {
                    kind: TagKind::Start,
                    depth,
                    name,
                    attributes,
                }))
            }
            Edge::Close(node) if node.is_element() => {
                self.depth -= 1;
                Ok(Some(DrawingEvent {
                    kind: TagKind::End,
                    depth: self.depth,
                    name: name(node),
                    attributes: vec![],
                }))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
fn events(content: &str) -> Result<Vec<DrawingEvent>, Error> {
    use crate::pipe::{Producer, TryCollector};

    let document = crate::svg::read("test.svg".as_ref(), content)?;
    let mut pipes = document
        .root()
        .traverse()
        .feed(DrawingReader::new())
        .producer()
        .feed(TryCollector::new());
    pipes.produce().unwrap()
}

#[cfg(test)]
fn parse_message(err: Error) -> String {
    match err {
        Error::Parse { message, .. } => message,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn resolves_default_and_prefixed_namespaces() {
    use crate::svg::{INKSCAPE_NS, SVG_NS};

    let events = events(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
            <g id="layer" inkscape:label="Layer"><image x="1"/></g>
        </svg>"#,
    )
    .unwrap();

    let kinds: Vec<_> = events
        .iter()
        .map(|e| (e.name.local.as_str(), e.kind, e.depth))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("svg", TagKind::Start, 0),
            ("g", TagKind::Start, 1),
            ("image", TagKind::Start, 2),
            ("image", TagKind::End, 2),
            ("g", TagKind::End, 1),
            ("svg", TagKind::End, 0),
        ]
    );
    assert!(events.iter().all(|e| e.name.namespace.as_deref() == Some(SVG_NS)));

    let group = &events[1];
    assert!(group.is_svg("g"));
    assert_eq!(group.attribute(None, "id"), Some("layer"));
    assert_eq!(group.attribute(Some(INKSCAPE_NS), "label"), Some("Layer"));
    assert_eq!(group.attribute(Some(SVG_NS), "id"), None);
    assert_eq!(group.attributes.len(), 2);
}

#[test]
fn prefixed_element_names_resolve_like_default_ones() {
    let events = events(
        r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:g id="a"/></svg:svg>"#,
    )
    .unwrap();
    assert!(events[1].is_svg("g"));
    assert!(events[1].opens());
}

#[test]
fn references_in_attribute_values_are_decoded() {
    let events = events(
        r#"<!DOCTYPE svg [<!ENTITY prefix "FN">]>
        <svg xmlns="http://www.w3.org/2000/svg"><g id="a&amp;b" label="FN&#55;" title="&prefix;2"/></svg>"#,
    )
    .unwrap();
    assert_eq!(events[1].attribute(None, "id"), Some("a&b"));
    assert_eq!(events[1].attribute(None, "label"), Some("FN7"));
    assert_eq!(events[1].attribute(None, "title"), Some("FN2"));
}

#[test]
fn mismatched_closing_tag_is_a_parse_error() {
    let err = events(r#"<svg xmlns="http://www.w3.org/2000/svg"><g></image></svg>"#).unwrap_err();
    parse_message(err);
}

#[test]
fn unclosed_element_is_a_parse_error() {
    let err = events(r#"<svg xmlns="http://www.w3.org/2000/svg"><g>"#).unwrap_err();
    parse_message(err);
}

#[test]
fn empty_document_is_a_parse_error() {
    parse_message(events("").unwrap_err());
}

#[test]
fn second_root_is_a_parse_error() {
    parse_message(events(r#"<svg xmlns="http://www.w3.org/2000/svg"/><svg/>"#).unwrap_err());
}

#[test]
fn unbound_prefix_is_a_parse_error() {
    let err = events(r#"<svg xmlns="http://www.w3.org/2000/svg"><image xlink:href="a.png"/></svg>"#)
        .unwrap_err();
    assert!(parse_message(err).contains("xlink"));
}

#[test]
fn duplicate_attribute_is_a_parse_error() {
    let err = events(r#"<svg xmlns="http://www.w3.org/2000/svg"><image x="1" x="2"/></svg>"#)
        .unwrap_err();
    parse_message(err);
}

#[test]
fn undefined_entity_is_a_parse_error() {
    let err = events(r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="&nosuch;"/></svg>"#)
        .unwrap_err();
    parse_message(err);
}
