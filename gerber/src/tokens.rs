//! Low-level token parsers shared by every statement handler.
//!
//! `nom` combinators for numeric literals, names, and identifiers.
//! Statement-level dispatch lives in [`crate::parser`], not here.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{anychar, char, digit0, digit1, one_of},
    combinator::{map, not, opt, peek, recognize, verify},
    multi::{many0, many_m_n},
    sequence::{pair, preceded, terminated},
    IResult,
};

pub(crate) type PResult<'a, T> = IResult<&'a str, T>;

/// Parse a string of ASCII digits into an `i64`.
fn into_i64(x: &str) -> i64 {
    x.parse().expect("caller only passes digit characters")
}

/// Parse a signed integer, e.g. a raw Gerber coordinate literal.
pub(crate) fn integer(input: &str) -> PResult<i64> {
    map(recognize(pair(opt(one_of("+-")), digit1)), into_i64)(input)
}

/// Parse a positive integer with no leading zeros other than a bare `0`.
pub(crate) fn positive_integer(input: &str) -> PResult<i64> {
    map(preceded(many0(char('0')), digit1), into_i64)(input)
}

fn into_f64(x: &str) -> f64 {
    x.parse().expect("caller only passes a validated decimal")
}

fn unsigned_decimal(input: &str) -> PResult<f64> {
    map(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        into_f64,
    )(input)
}

/// Parse a signed decimal literal, used for aperture template parameters.
pub(crate) fn decimal(input: &str) -> PResult<f64> {
    map(pair(opt(one_of("+-")), unsigned_decimal), |(sign, val)| {
        if sign == Some('-') {
            -val
        } else {
            val
        }
    })(input)
}

/// Parse a `D`-prefixed aperture identifier, `D10` or greater.
pub(crate) fn aperture_identifier(input: &str) -> PResult<i64> {
    verify(preceded(char('D'), positive_integer), |&id| id >= 10)(input)
}

fn name_fragment_first(input: &str) -> PResult<char> {
    verify(anychar, |&c| c.is_alphabetic() || c == '_' || c == '$')(input)
}

fn name_fragment_rest(input: &str) -> PResult<char> {
    verify(anychar, |&c| {
        c.is_alphanumeric() || c == '.' || c == '_' || c == '$'
    })(input)
}

fn user_name_shorter_than(max: usize) -> impl Fn(&str) -> PResult<&str> {
    move |input| {
        if max == 0 {
            Ok((input, ""))
        } else {
            recognize(pair(
                name_fragment_first,
                terminated(
                    many_m_n(0, max - 1, name_fragment_rest),
                    peek(not(name_fragment_rest)),
                ),
            ))(input)
        }
    }
}

/// Parse a user-defined or aperture-template name (a bare word, not
/// system-reserved), e.g. an `AD` template name.
pub(crate) fn name(input: &str) -> PResult<&str> {
    user_name_shorter_than(127)(input)
}

/// Parse a comma-delimited field used by attribute statements: any run of
/// characters that is not a delimiter (`%`, `*`, `,`).
pub(crate) fn field(input: &str) -> PResult<&str> {
    recognize(many0(not(one_of("%*,"))))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers() {
        assert_eq!(integer("0"), Ok(("", 0)));
        assert_eq!(integer("123"), Ok(("", 123)));
        assert_eq!(integer("+123"), Ok(("", 123)));
        assert_eq!(integer("-123"), Ok(("", -123)));
        assert_eq!(integer("2512000"), Ok(("", 2512000)));
    }

    #[test]
    fn parses_decimals() {
        assert_eq!(decimal("0"), Ok(("", 0.)));
        assert_eq!(decimal("0."), Ok(("", 0.)));
        assert_eq!(decimal(".1"), Ok(("", 0.1)));
        assert_eq!(decimal("-1.5"), Ok(("", -1.5)));
        assert!(decimal(".").is_err());
    }

    #[test]
    fn parses_aperture_identifier() {
        assert_eq!(aperture_identifier("D10"), Ok(("", 10)));
        assert_eq!(aperture_identifier("D123"), Ok(("", 123)));
        assert!(aperture_identifier("D9").is_err());
    }

    #[test]
    fn parses_name() {
        assert_eq!(name("DONUTVAR,"), Ok((",", "DONUTVAR")));
        assert_eq!(name("C"), Ok(("", "C")));
    }
}
