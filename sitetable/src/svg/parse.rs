use nom::{
    bytes::complete::tag,
    character::complete::{digit1, multispace0, one_of},
    combinator::{map_res, opt, recognize},
    sequence::{delimited, pair, preceded},
    IResult,
};

// Anchored at the start only, anything after the digits is ignored.
pub fn site_digits<'a>(prefix: &str, label: &'a str) -> IResult<&'a str, &'a str> {
    preceded(tag(prefix), digit1)(label)
}

pub fn integer(s: &str) -> IResult<&str, i32> {
    delimited(
        multispace0,
        map_res(recognize(pair(opt(one_of("+-")), digit1)), str::parse::<i32>),
        multispace0,
    )(s)
}

pub fn parse_integer(value: &str) -> Option<i32> {
    match integer(value) {
        Ok(("", n)) => Some(n),
        _ => None,
    }
}

#[test]
fn site_digits_strip_prefix() {
    assert_eq!(site_digits("FN", "FN007"), Ok(("", "007")));
    assert_eq!(site_digits("FN", "FN12a"), Ok(("a", "12")));
    assert!(site_digits("FN", "NodeDecor").is_err());
    assert!(site_digits("FN", "FN").is_err());
    assert!(site_digits("FN", "xFN1").is_err());
}

#[test]
fn integers() {
    assert_eq!(parse_integer("10"), Some(10));
    assert_eq!(parse_integer(" -4 "), Some(-4));
    assert_eq!(parse_integer("+7"), Some(7));
    assert_eq!(parse_integer("10.5"), None);
    assert_eq!(parse_integer(""), None);
    assert_eq!(parse_integer("abc"), None);
    assert_eq!(parse_integer("99999999999"), None);
}
