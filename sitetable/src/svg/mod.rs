mod reader;
pub mod parse;

use std::path::Path;

pub use reader::DrawingReader;
use roxmltree::{Document, ParsingOptions};

use crate::Error;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local == local
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DrawingEvent {
    pub kind: TagKind,
    // root element sits at 0
    pub depth: usize,
    pub name: QName,
    pub attributes: Vec<(QName, String)>,
}

impl DrawingEvent {
    pub fn opens(&self) -> bool {
        self.kind == TagKind::Start
    }

    pub fn is_svg(&self, local: &str) -> bool {
        self.name.is(Some(SVG_NS), local)
    }

    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.is(namespace, local))
            .map(|(_, value)| value.as_str())
    }
}

pub fn open(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|err| Error::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

pub fn read<'a>(path: &Path, content: &'a str) -> Result<Document<'a>, Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(content, options).map_err(|err| Error::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}
