use std::path::PathBuf;

use crate::{
    config::LayerConfig,
    pipe::Pipe,
    svg::{parse, DrawingEvent, TagKind, INKSCAPE_NS},
    Error, Site,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerState {
    Searching,
    Inside,
    Done,
}

// The layer is a `g` directly under the root, markers are its direct `image` children.
#[derive(Debug)]
pub struct LayerExtractor {
    path: PathBuf,
    layer: LayerConfig,
    state: LayerState,
    images: usize,
}

impl LayerExtractor {
    pub fn new(path: impl Into<PathBuf>, layer: LayerConfig) -> Self {
        Self {
            path: path.into(),
            layer,
            state: LayerState::Searching,
            images: 0,
        }
    }

    fn structure(&self, message: String) -> Error {
        Error::Structure {
            path: self.path.clone(),
            message,
        }
    }

    fn enter_layer(&mut self, group: &DrawingEvent) -> Result<(), Error> {
        if self.state != LayerState::Searching {
            return Err(self.structure(format!(
                "layer `{}` appears more than once",
                self.layer.id
            )));
        }
        debug!(layer = %self.layer.id, "found node layer");
        self.state = match group.kind {
            TagKind::Start => LayerState::Inside,
            _ => LayerState::Done,
        };
        Ok(())
    }

    fn marker(&mut self, image: &DrawingEvent) -> Result<Option<Site>, Error> {
        let index = self.images;
        self.images += 1;

        let Some(label) = image.attribute(Some(INKSCAPE_NS), "label") else {
            debug!(index, "skipping image without label");
            return Ok(None);
        };
        let Ok((_, digits)) = parse::site_digits(&self.layer.label_prefix, label) else {
            debug!(index, label, "skipping image, not a site marker");
            return Ok(None);
        };

        let fail = |attribute: &'static str, message: String| Error::Format {
            path: self.path.clone(),
            index,
            label: label.to_string(),
            attribute,
            message,
        };

        let id = digits
            .parse::<u32>()
            .map_err(|err| fail("inkscape:label", format!("site id `{digits}`: {err}")))?;

        let attr = |name: &'static str| -> Result<i32, Error> {
            let value = image
                .attribute(None, name)
                .ok_or_else(|| fail(name, "attribute is missing".to_string()))?;
            parse::parse_integer(value)
                .ok_or_else(|| fail(name, format!("`{value}` is not an integer")))
        };
        let (x, y, width, height) = (attr("x")?, attr("y")?, attr("width")?, attr("height")?);

        // Origin is top-left.
        let x = x
            .checked_add(width.div_euclid(2))
            .ok_or_else(|| fail("width", "center overflows".to_string()))?;
        let y = y
            .checked_add(height.div_euclid(2))
            .ok_or_else(|| fail("height", "center overflows".to_string()))?;

        trace!(id, x, y, "site");
        Ok(Some(Site { id, x, y }))
    }
}

impl Pipe for LayerExtractor {
    type Input = DrawingEvent;
    type Output = Site;

    type Error = Error;

    fn process(&mut self, event: Self::Input) -> Result<Option<Self::Output>, Self::Error> {
        if event.depth == 1
            && event.opens()
            && event.is_svg("g")
            && event.attribute(None, "id") == Some(self.layer.id.as_str())
        {
            return self.enter_layer(&event).map(|_| None);
        }
        match self.state {
            LayerState::Inside if event.depth == 1 && matches!(event.kind, TagKind::End) => {
                self.state = LayerState::Done;
                Ok(None)
            }
            LayerState::Inside if event.depth == 2 && event.opens() && event.is_svg("image") => {
                self.marker(&event)
            }
            _ => Ok(None),
        }
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        if self.state == LayerState::Searching {
            return Err(self.structure(format!(
                "no `g` element with id `{}` under the root element",
                self.layer.id
            )));
        }
        info!(images = self.images, "read node layer");
        Ok(())
    }
}

#[cfg(test)]
use std::path::Path;

#[cfg(test)]
use crate::{
    pipe::{Producer, TryCollector},
    svg::DrawingReader,
};

#[cfg(test)]
const HEAD: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">"#;

#[cfg(test)]
fn sites(body: &str) -> Result<Vec<Site>, Error> {
    let path = Path::new("map.svg");
    let content = format!("{HEAD}{body}</svg>");
    let document = crate::svg::read(path, &content)?;
    let mut pipes = document
        .root()
        .traverse()
        .feed(DrawingReader::new().pipe(LayerExtractor::new(path, LayerConfig::default())))
        .producer()
        .feed(TryCollector::new());
    pipes.produce().unwrap()
}

#[cfg(test)]
fn image(label: &str, x: i32, y: i32, width: i32, height: i32) -> String {
    format!(
        r#"<image inkscape:label="{label}" x="{x}" y="{y}" width="{width}" height="{height}"/>"#
    )
}

#[test]
fn center_of_marker() {
    let sites = sites(&format!(r#"<g id="nodeslayer">{}</g>"#, image("FN1", 10, 20, 4, 6))).unwrap();
    assert_eq!(sites, vec![Site { id: 1, x: 12, y: 23 }]);
}

#[test]
fn odd_sizes_round_down() {
    let sites = sites(&format!(r#"<g id="nodeslayer">{}</g>"#, image("FN1", 0, 0, 5, 7))).unwrap();
    assert_eq!(sites, vec![Site { id: 1, x: 2, y: 3 }]);
}

#[test]
fn only_matching_labels_count() {
    let body = format!(
        r#"<g id="nodeslayer">{}{}{}<image x="0" y="0" width="1" height="1"/><rect inkscape:label="FN9"/></g>"#,
        image("FN007", 0, 0, 2, 2),
        image("NodeDecor", 0, 0, 2, 2),
        image("FN3", 4, 4, 2, 2),
    );
    let ids: Vec<_> = sites(&body).unwrap().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![7, 3]);
}

#[test]
fn decorative_images_skip_attribute_checks() {
    let body = r#"<g id="nodeslayer"><image inkscape:label="Decor"/></g>"#;
    assert_eq!(sites(body).unwrap(), vec![]);
}

#[test]
fn images_outside_the_layer_are_ignored() {
    let body = format!(
        r#"{}<g id="other">{}</g><g id="nodeslayer"><g>{}</g>{}</g>"#,
        image("FN1", 0, 0, 2, 2),
        image("FN2", 0, 0, 2, 2),
        image("FN3", 0, 0, 2, 2),
        image("FN4", 0, 0, 2, 2),
    );
    let ids: Vec<_> = sites(&body).unwrap().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![4]);
}

#[test]
fn nested_layer_id_is_not_the_layer() {
    let body = format!(r#"<g id="wrapper"><g id="nodeslayer">{}</g></g>"#, image("FN1", 0, 0, 2, 2));
    assert!(matches!(sites(&body), Err(Error::Structure { .. })));
}

#[test]
fn missing_layer() {
    let err = sites(&format!(r#"<g id="decor">{}</g>"#, image("FN1", 0, 0, 2, 2))).unwrap_err();
    match err {
        Error::Structure { message, .. } => assert!(message.contains("nodeslayer")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn duplicated_layer() {
    let err = sites(r#"<g id="nodeslayer"/><g id="nodeslayer"/>"#).unwrap_err();
    assert!(matches!(err, Error::Structure { .. }));
}

#[test]
fn empty_layer_has_no_sites() {
    assert_eq!(sites(r#"<g id="nodeslayer"/>"#).unwrap(), vec![]);
}

#[test]
fn missing_dimension_names_the_attribute() {
    let body = r#"<g id="nodeslayer"><image inkscape:label="FN5" x="1" y="2" height="3"/></g>"#;
    match sites(body).unwrap_err() {
        Error::Format {
            index,
            label,
            attribute,
            ..
        } => {
            assert_eq!(index, 0);
            assert_eq!(label, "FN5");
            assert_eq!(attribute, "width");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn fractional_coordinate_is_a_format_error() {
    let body = r#"<g id="nodeslayer"><image inkscape:label="FN5" x="1.5" y="2" width="2" height="3"/></g>"#;
    assert!(matches!(
        sites(body),
        Err(Error::Format { attribute: "x", .. })
    ));
}

#[test]
fn oversized_id_is_a_format_error() {
    let body = format!(r#"<g id="nodeslayer">{}</g>"#, image("FN99999999999", 0, 0, 2, 2));
    assert!(matches!(
        sites(&body),
        Err(Error::Format { attribute: "inkscape:label", .. })
    ));
}

#[test]
fn negative_odd_sizes_round_toward_negative_infinity() {
    let sites = sites(&format!(r#"<g id="nodeslayer">{}</g>"#, image("FN1", -5, -5, 3, 3))).unwrap();
    assert_eq!(sites, vec![Site { id: 1, x: -4, y: -4 }]);
}

#[test]
fn character_references_in_labels_are_decoded() {
    let body = r#"<g id="nodeslayer"><image inkscape:label="FN&#55;" x="&#49;0" y="2" width="4" height="2"/></g>"#;
    assert_eq!(sites(body).unwrap(), vec![Site { id: 7, x: 12, y: 3 }]);
}

#[test]
fn duplicate_attribute_on_a_marker_is_a_parse_error() {
    let body = r#"<g id="nodeslayer"><image inkscape:label="FN1" x="1" x="2" y="0" width="2" height="2"/></g>"#;
    assert!(matches!(sites(body), Err(Error::Parse { .. })));
}
