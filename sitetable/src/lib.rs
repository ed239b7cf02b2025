#[macro_use]
extern crate tracing;

use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub mod config;
pub mod extract;
pub mod pipe;
pub mod ser;
pub mod sort;
pub mod svg;

use roxmltree::Document;

use crate::{
    config::{Config, LayerConfig},
    extract::LayerExtractor,
    pipe::{Pipe, Producer, TryCollector},
    ser::WriteTable,
    sort::SortSites,
    svg::DrawingReader,
};

// Marker center in drawing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    pub id: u32,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse drawing `{}`: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("unexpected structure in drawing `{}`: {message}", .path.display())]
    Structure { path: PathBuf, message: String },
    #[error(
        "invalid site marker #{index} (label `{label}`) in `{}`, `{attribute}`: {message}",
        .path.display()
    )]
    Format {
        path: PathBuf,
        index: usize,
        label: String,
        attribute: &'static str,
        message: String,
    },
    #[error("site id {id} is used by more than one marker")]
    DuplicateSite { id: u32 },
    #[error("invalid config `{}`: {message}", .path.display())]
    Config { path: PathBuf, message: String },
    #[error("failed to write site table to {target}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

fn site_producer<'a>(
    document: &'a Document<'a>,
    path: &Path,
    layer: &LayerConfig,
) -> impl Producer<Item = Result<Site, Error>> + 'a {
    document
        .root()
        .traverse()
        .feed(DrawingReader::new().pipe(LayerExtractor::new(path, layer.clone())))
}

pub fn read_sites(drawing: impl AsRef<Path>, config: &Config) -> Result<Vec<Site>, Error> {
    let drawing = drawing.as_ref();
    let content = svg::open(drawing)?;
    let document = svg::read(drawing, &content)?;
    collect_sites(site_producer(&document, drawing, &config.layer), config)
}

// `name` only shows up in errors.
pub fn parse_sites(content: &str, name: impl AsRef<Path>, config: &Config) -> Result<Vec<Site>, Error> {
    let name = name.as_ref();
    let document = svg::read(name, content)?;
    collect_sites(site_producer(&document, name, &config.layer), config)
}

fn collect_sites(
    sites: impl Producer<Item = Result<Site, Error>>,
    config: &Config,
) -> Result<Vec<Site>, Error> {
    let mut pipes = sites
        .producer()
        .feed(TryCollector::new().pipe(SortSites::new(config.duplicates)));
    pipes.produce().unwrap_or_else(|| Ok(vec![]))
}

// A file sink is only created once every marker was read successfully.
pub fn generate<W: Write>(
    drawing: impl AsRef<Path>,
    config: &Config,
    sink: WriteTable<W>,
) -> Result<usize, Error> {
    let drawing = drawing.as_ref();
    let content = svg::open(drawing)?;
    let document = svg::read(drawing, &content)?;

    let mut pipes = site_producer(&document, drawing, &config.layer)
        .producer()
        .feed(
            TryCollector::new()
                .pipe(SortSites::new(config.duplicates))
                .pipe(sink),
        );

    pipes.produce().unwrap_or(Ok(0))
}

#[test]
fn sites_sorted_regardless_of_document_order() {
    let drawing = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
        <g id="nodeslayer">
            <image inkscape:label="FN2" x="0" y="0" width="2" height="2"/>
            <image inkscape:label="FN1" x="10" y="20" width="4" height="6"/>
        </g>
    </svg>"#;
    let sites = parse_sites(drawing, "inline.svg", &Config::default()).unwrap();
    assert_eq!(
        sites,
        vec![Site { id: 1, x: 12, y: 23 }, Site { id: 2, x: 1, y: 1 }]
    );
}
