use crate::{config::DuplicatePolicy, pipe::Pipe, Error, Site};

#[derive(Debug)]
pub struct SortSites {
    duplicates: DuplicatePolicy,
}

impl SortSites {
    pub fn new(duplicates: DuplicatePolicy) -> Self {
        Self { duplicates }
    }
}

impl Pipe for SortSites {
    type Input = Vec<Site>;
    type Output = Vec<Site>;

    type Error = Error;

    fn process(&mut self, mut sites: Self::Input) -> Result<Option<Self::Output>, Self::Error> {
        // Stable, duplicates keep document order.
        sites.sort_by_key(|site| site.id);

        let mut last_reported = None;
        for pair in sites.windows(2) {
            let id = pair[0].id;
            if id != pair[1].id || last_reported == Some(id) {
                continue;
            }
            match self.duplicates {
                DuplicatePolicy::Reject => return Err(Error::DuplicateSite { id }),
                DuplicatePolicy::Keep => {
                    warn!(id, "site id appears more than once, every entry is written");
                    last_reported = Some(id);
                }
            }
        }

        Ok(Some(sites))
    }
}

#[cfg(test)]
fn site(id: u32, x: i32) -> Site {
    Site { id, x, y: 0 }
}

#[test]
fn sorts_by_id() {
    let sorted = SortSites::new(DuplicatePolicy::Keep)
        .process(vec![site(2, 0), site(10, 0), site(1, 0)])
        .unwrap()
        .unwrap();
    let ids: Vec<_> = sorted.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 10]);
}

#[test]
fn duplicates_keep_document_order() {
    let sorted = SortSites::new(DuplicatePolicy::Keep)
        .process(vec![site(3, 1), site(1, 0), site(3, 2), site(3, 3)])
        .unwrap()
        .unwrap();
    assert_eq!(sorted, vec![site(1, 0), site(3, 1), site(3, 2), site(3, 3)]);
}

#[test]
fn duplicates_rejected() {
    let err = SortSites::new(DuplicatePolicy::Reject)
        .process(vec![site(4, 0), site(1, 0), site(4, 1)])
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateSite { id: 4 }));
}

#[test]
fn empty_input() {
    let sorted = SortSites::new(DuplicatePolicy::Reject).process(vec![]).unwrap();
    assert_eq!(sorted, Some(vec![]));
}
