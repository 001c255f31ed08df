// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP attribute tokenizer using nom combinators
//!
//! Turns the text of one entity instance (`#12=IFCWALL(...);`) or one header
//! record (`FILE_NAME(...)`) into [`AttributeValue`]s.

use crate::entity::{AttributeValue, DecodedEntity};
use ifcore_model::{EntityId, IfcType, ParseError, Result};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map_res, opt, recognize},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult, Parser,
};

// ============================================================================
// Parsing Primitives
// ============================================================================

/// Parse whitespace
fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

/// Parse an entity reference (#123)
fn entity_ref(input: &str) -> IResult<&str, AttributeValue> {
    let (input, _) = char('#')(input)?;
    let (input, id) = map_res(digit1, str::parse::<u32>).parse(input)?;
    Ok((input, AttributeValue::EntityRef(EntityId(id))))
}

/// Parse a STEP string ('text' with '' for escaped quotes)
fn step_string(input: &str) -> IResult<&str, AttributeValue> {
    let (input, _) = char('\'')(input)?;

    let bytes = input.as_bytes();
    let mut end = 0;
    loop {
        match bytes.get(end) {
            Some(b'\'') if bytes.get(end + 1) == Some(&b'\'') => end += 2,
            Some(b'\'') => break,
            Some(_) => end += 1,
            None => return Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
        }
    }

    let value = decode_string(&input[..end]);
    Ok((&input[end + 1..], AttributeValue::String(value)))
}

/// Parse a number (integer or float)
fn number(input: &str) -> IResult<&str, AttributeValue> {
    let (rest, num_str) = recognize((
        opt(alt((char('-'), char('+')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    let invalid = || nom::Err::Error(Error::new(input, ErrorKind::Float));
    let digits = num_str.strip_prefix('+').unwrap_or(num_str);
    if digits.contains(['.', 'e', 'E']) {
        let f: f64 = lexical_core::parse(digits.as_bytes()).map_err(|_| invalid())?;
        Ok((rest, AttributeValue::Float(f)))
    } else {
        let i: i64 = lexical_core::parse(digits.as_bytes()).map_err(|_| invalid())?;
        Ok((rest, AttributeValue::Integer(i)))
    }
}

/// Parse an enumeration (.VALUE.)
fn enumeration(input: &str) -> IResult<&str, AttributeValue> {
    let (input, _) = char('.')(input)?;
    let (input, name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = char('.')(input)?;
    Ok((input, AttributeValue::Enum(name.to_ascii_uppercase())))
}

/// Parse null ($)
fn null_value(input: &str) -> IResult<&str, AttributeValue> {
    let (input, _) = char('$')(input)?;
    Ok((input, AttributeValue::Null))
}

/// Parse derived (*)
fn derived_value(input: &str) -> IResult<&str, AttributeValue> {
    let (input, _) = char('*')(input)?;
    Ok((input, AttributeValue::Derived))
}

/// Parse a parenthesised, comma separated list of values
fn value_list(input: &str) -> IResult<&str, Vec<AttributeValue>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), value),
        pair(ws, char(')')),
    )
    .parse(input)
}

fn list(input: &str) -> IResult<&str, AttributeValue> {
    let (input, items) = value_list(input)?;
    Ok((input, AttributeValue::List(items)))
}

/// Parse a typed value like IFCLABEL('text')
fn typed_value(input: &str) -> IResult<&str, AttributeValue> {
    let (input, type_name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = value_list(input)?;
    Ok((
        input,
        AttributeValue::TypedValue(type_name.to_ascii_uppercase(), args),
    ))
}

/// Parse any attribute value
fn value(input: &str) -> IResult<&str, AttributeValue> {
    alt((
        entity_ref,
        step_string,
        null_value,
        derived_value,
        enumeration,
        number,
        list,
        typed_value,
    ))
    .parse(input)
}

// ============================================================================
// String decoding
// ============================================================================

/// Decode STEP string escapes
///
/// Handles doubled quotes, `\X2\...\X0\` (UTF-16 code units in hex),
/// `\X\HH` (ISO 8859-1 byte) and `\\`. Unrecognised escapes are kept as-is.
pub fn decode_string(raw: &str) -> String {
    if !raw.contains(['\'', '\\']) {
        return raw.to_string();
    }

    let raw = raw.replace("''", "'");
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw.as_str();

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(body) = rest.strip_prefix("\\X2\\") {
            if let Some(end) = body.find("\\X0\\") {
                let units: Vec<u16> = body[..end]
                    .as_bytes()
                    .chunks(4)
                    .filter_map(|c| std::str::from_utf8(c).ok())
                    .filter_map(|h| u16::from_str_radix(h, 16).ok())
                    .collect();
                out.extend(std::char::decode_utf16(units).map(|c| c.unwrap_or('\u{FFFD}')));
                rest = &body[end + 4..];
                continue;
            }
        } else if let Some(body) = rest.strip_prefix("\\X\\") {
            if let Some(byte) = body.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte as char);
                rest = &body[2..];
                continue;
            }
        } else if let Some(body) = rest.strip_prefix("\\\\") {
            out.push('\\');
            rest = body;
            continue;
        }

        out.push('\\');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Entity Parsing
// ============================================================================

/// Parse a complete entity instance
///
/// Format: `#123=IFCWALL(attr1,attr2,...);`
pub fn parse_entity(input: &str) -> Result<DecodedEntity> {
    let input = input.trim_start();

    let (input, id) = (char('#'), map_res(digit1, str::parse::<u32>))
        .parse(input)
        .map(|(rest, (_, id))| (rest, id))
        .map_err(|_: nom::Err<Error<&str>>| ParseError::format("expected '#<id>' at start of entity"))?;
    let id = EntityId(id);

    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_: nom::Err<Error<&str>>| ParseError::entity_parse(id, "expected '=' after entity id"))?;

    let (input, type_name) =
        take_while1::<_, &str, Error<&str>>(|c: char| c.is_alphanumeric() || c == '_')
            .parse(input)
            .map_err(|_| ParseError::entity_parse(id, "expected type name"))?;

    let (input, _) = ws(input).unwrap_or((input, ()));

    let (_, attributes) = value_list(input)
        .map_err(|e| ParseError::entity_parse(id, format!("failed to parse attributes: {e:?}")))?;

    Ok(DecodedEntity {
        id,
        ifc_type: IfcType::parse(type_name),
        attributes,
    })
}

/// Parse the argument list of a header record such as `FILE_NAME(...)`
///
/// `input` starts at the opening parenthesis.
pub fn parse_arguments(input: &str) -> Option<Vec<AttributeValue>> {
    value_list(input.trim_start()).ok().map(|(_, values)| values)
}
