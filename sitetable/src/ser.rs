use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use serde::Deserialize;

use crate::{pipe::Pipe, Error, Site};

// `entry` is written once per site with `$id`, `$x` and `$y` substituted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableTemplate {
    pub comment: Option<String>,
    pub includes: Vec<String>,
    pub declaration: String,
    pub entry: String,
    pub close: String,
}

impl Default for TableTemplate {
    fn default() -> Self {
        Self {
            comment: Some(
                "To update this file, run sitetable <path to map svg> <path to this cpp file>"
                    .to_string(),
            ),
            includes: vec!["fnsite_ui.h".to_string()],
            declaration:
                "extern const std::unordered_map<FnSite::id_t, std::pair<int, int>> site_positions"
                    .to_string(),
            entry: "  {$id, {$x, $y}},".to_string(),
            close: "};".to_string(),
        }
    }
}

impl TableTemplate {
    pub fn entry(&self, site: &Site) -> String {
        self.entry
            .replace("$id", &site.id.to_string())
            .replace("$x", &site.x.to_string())
            .replace("$y", &site.y.to_string())
    }

    pub fn write_table<W: Write>(&self, out: &mut W, sites: &[Site]) -> std::io::Result<()> {
        if let Some(comment) = &self.comment {
            writeln!(out, "/* {comment} */")?;
            writeln!(out)?;
        }
        for include in &self.includes {
            writeln!(out, "#include \"{include}\"")?;
        }
        if !self.includes.is_empty() {
            writeln!(out)?;
        }
        writeln!(out, "{}{{", self.declaration)?;
        for site in sites {
            writeln!(out, "{}", self.entry(site))?;
        }
        writeln!(out, "{}", self.close)
    }
}

#[derive(Debug)]
enum Target<W> {
    Writer(W),
    // created on first write
    File(PathBuf),
}

#[derive(Debug)]
pub struct WriteTable<W> {
    target: Target<W>,
    template: TableTemplate,
}

impl<W: Write> WriteTable<W> {
    pub fn new(writer: W, template: TableTemplate) -> Self {
        Self {
            target: Target::Writer(writer),
            template,
        }
    }
}

impl WriteTable<File> {
    pub fn create(path: impl Into<PathBuf>, template: TableTemplate) -> Self {
        Self {
            target: Target::File(path.into()),
            template,
        }
    }
}

impl<W: Write> Pipe for WriteTable<W> {
    type Input = Vec<Site>;

    type Output = usize;

    type Error = Error;

    fn process(&mut self, sites: Self::Input) -> Result<Option<Self::Output>, Self::Error> {
        match &mut self.target {
            Target::Writer(writer) => self
                .template
                .write_table(writer, &sites)
                .and_then(|_| writer.flush())
                .map_err(|source| Error::Io {
                    target: "output writer".to_string(),
                    source,
                })?,
            Target::File(path) => {
                File::create(&*path)
                    .map(BufWriter::new)
                    .and_then(|mut out| {
                        self.template.write_table(&mut out, &sites)?;
                        out.flush()
                    })
                    .map_err(|source| Error::Io {
                        target: format!("`{}`", path.display()),
                        source,
                    })?;
                info!("Wrote {} sites to {}", sites.len(), path.display());
            }
        }
        Ok(Some(sites.len()))
    }
}

#[cfg(test)]
use pretty_assertions::assert_eq;

#[cfg(test)]
fn render(template: &TableTemplate, sites: &[Site]) -> String {
    let mut out = Vec::new();
    template.write_table(&mut out, sites).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn default_layout() {
    let sites = [Site { id: 1, x: 12, y: 23 }, Site { id: 7, x: -3, y: 0 }];
    assert_eq!(
        render(&TableTemplate::default(), &sites),
        "/* To update this file, run sitetable <path to map svg> <path to this cpp file> */\n\
         \n\
         #include \"fnsite_ui.h\"\n\
         \n\
         extern const std::unordered_map<FnSite::id_t, std::pair<int, int>> site_positions{\n\
         \x20 {1, {12, 23}},\n\
         \x20 {7, {-3, 0}},\n\
         };\n"
    );
}

#[test]
fn empty_table() {
    let template = TableTemplate {
        comment: None,
        includes: vec![],
        ..TableTemplate::default()
    };
    assert_eq!(
        render(&template, &[]),
        "extern const std::unordered_map<FnSite::id_t, std::pair<int, int>> site_positions{\n};\n"
    );
}

#[test]
fn custom_entry() {
    let template = TableTemplate {
        entry: "  [$id] = {$y, $x},".to_string(),
        ..TableTemplate::default()
    };
    assert_eq!(template.entry(&Site { id: 4, x: 1, y: 2 }), "  [4] = {2, 1},");
}

#[test]
fn write_table_pipe_counts_entries() {
    let mut out = Vec::new();
    let written = WriteTable::new(&mut out, TableTemplate::default())
        .process(vec![Site { id: 1, x: 0, y: 0 }])
        .unwrap();
    assert_eq!(written, Some(1));
    assert!(String::from_utf8(out).unwrap().contains("  {1, {0, 0}},\n};\n"));
}
