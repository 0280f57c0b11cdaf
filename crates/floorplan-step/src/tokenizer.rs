// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP entity tokenizer using nom combinators

use crate::strings::decode_step_string;
use floorplan_model::{AttributeValue, DecodedEntity, EntityId, IfcType};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{opt, recognize},
    error::{Error as NomError, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult, Parser,
};

/// Raw token borrowed from the file content
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    EntityRef(u32),
    /// String body as written, escapes not yet decoded
    String(&'a str),
    Integer(i64),
    Float(f64),
    Enum(&'a str),
    List(Vec<Token<'a>>),
    TypedValue(&'a str, Vec<Token<'a>>),
    Null,
    Derived,
}

impl Token<'_> {
    /// Convert token to owned AttributeValue
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(decode_step_string(s)),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Enum(s) => match *s {
                "T" | "TRUE" => AttributeValue::Bool(true),
                "F" | "FALSE" => AttributeValue::Bool(false),
                _ => AttributeValue::Enum((*s).to_string()),
            },
            Token::List(items) => {
                AttributeValue::List(items.iter().map(Token::to_attribute_value).collect())
            }
            Token::TypedValue(name, args) => AttributeValue::TypedValue(
                name.to_ascii_uppercase(),
                args.iter().map(Token::to_attribute_value).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }
}

fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

fn entity_ref(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('#')(input)?;
    let (rest, digits) = take_while1(|c: char| c.is_ascii_digit())(input)?;
    let id = digits
        .parse::<u32>()
        .map_err(|_| nom::Err::Error(NomError::new(input, ErrorKind::Digit)))?;
    Ok((rest, Token::EntityRef(id)))
}

/// A STEP string ('text', with '' for an embedded quote)
fn step_string(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('\'')(input)?;

    let bytes = input.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if bytes.get(end + 1) == Some(&b'\'') {
                end += 2;
                continue;
            }
            return Ok((&input[end + 1..], Token::String(&input[..end])));
        }
        end += 1;
    }

    Err(nom::Err::Error(NomError::new(input, ErrorKind::Char)))
}

/// Integer or real; STEP reals may end in a bare dot ("0.")
fn number(input: &str) -> IResult<&str, Token<'_>> {
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

    let bad = |_| nom::Err::Error(NomError::new(input, ErrorKind::Float));
    if num_str.contains(['.', 'e', 'E']) {
        let f: f64 = lexical_core::parse(num_str.as_bytes()).map_err(bad)?;
        Ok((rest, Token::Float(f)))
    } else {
        let i: i64 = lexical_core::parse(num_str.as_bytes()).map_err(bad)?;
        Ok((rest, Token::Integer(i)))
    }
}

fn enumeration(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('.')(input)?;
    let (input, name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = char('.')(input)?;
    Ok((input, Token::Enum(name)))
}

fn null_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('$')(input)?;
    Ok((input, Token::Null))
}

fn derived_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('*')(input)?;
    Ok((input, Token::Derived))
}

fn token_list(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

fn list(input: &str) -> IResult<&str, Token<'_>> {
    let (input, items) = token_list(input)?;
    Ok((input, Token::List(items)))
}

/// A typed value like IFCLABEL('text')
fn typed_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, type_name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = token_list(input)?;
    Ok((input, Token::TypedValue(type_name, args)))
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
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

/// Parse a complete entity instance
///
/// Format: `#123=IFCSPACE(attr1,attr2,...);`
pub fn parse_entity(input: &str) -> Result<DecodedEntity, String> {
    let input = input.trim_start();

    let (input, _) = char::<&str, NomError<&str>>('#')
        .parse(input)
        .map_err(|_| "Expected # at start of entity")?;

    let (input, id_str) =
        take_while1::<_, &str, NomError<&str>>(|c: char| c.is_ascii_digit())
            .parse(input)
            .map_err(|_| "Expected entity ID")?;
    let id: u32 = id_str.parse().map_err(|_| "Invalid entity ID")?;

    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_: nom::Err<NomError<&str>>| "Expected = after entity ID")?;

    let (input, type_name) =
        take_while1::<_, &str, NomError<&str>>(|c: char| c.is_alphanumeric() || c == '_')
            .parse(input)
            .map_err(|_| "Expected type name")?;

    let (input, _) = ws(input).unwrap_or((input, ()));
    let (_, tokens) =
        token_list(input).map_err(|e| format!("Failed to parse attributes of #{id}: {e:?}"))?;

    Ok(DecodedEntity {
        id: EntityId(id),
        ifc_type: IfcType::parse(type_name),
        attributes: tokens.iter().map(Token::to_attribute_value).collect(),
    })
}

/// Parse a header record such as `FILE_NAME('a.ifc', ...);`
pub fn parse_header_record(input: &str) -> Option<(&str, Vec<AttributeValue>)> {
    match typed_value(input.trim_start()).ok()? {
        (_, Token::TypedValue(name, args)) => {
            Some((name, args.iter().map(Token::to_attribute_value).collect()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_ref() {
        let (remaining, token) = entity_ref("#123").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::EntityRef(123));
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(step_string("'never closed").is_err());
    }

    #[test]
    fn test_parse_string_with_escaped_quote() {
        let (remaining, token) = step_string("'it''s a test',").unwrap();
        assert_eq!(remaining, ",");
        assert_eq!(token, Token::String("it''s a test"));
        assert_eq!(
            token.to_attribute_value(),
            AttributeValue::String("it's a test".into())
        );
    }

    #[test]
    fn test_parse_step_reals() {
        let (_, token) = number("0.").unwrap();
        assert_eq!(token, Token::Float(0.0));
        let (_, token) = number("1.5E-3").unwrap();
        match token {
            Token::Float(f) => assert!((f - 0.0015).abs() < 1e-12),
            other => panic!("Expected float, got {other:?}"),
        }
        let (_, token) = number("-42").unwrap();
        assert_eq!(token, Token::Integer(-42));
    }

    #[test]
    fn test_logical_enums_become_bools() {
        let (_, token) = enumeration(".T.").unwrap();
        assert_eq!(token.to_attribute_value(), AttributeValue::Bool(true));
        let (_, token) = enumeration(".VIRTUAL.").unwrap();
        assert_eq!(
            token.to_attribute_value(),
            AttributeValue::Enum("VIRTUAL".into())
        );
    }

    #[test]
    fn test_parse_space_entity() {
        let entity = parse_entity(
            "#42= IFCSPACE('0h$ksovXH3Jeg0w$H3hGMs',#5,'101','Kontor',$,#60,#70,'Kontor 101',.ELEMENT.,.INTERNAL.,$);",
        )
        .unwrap();
        assert_eq!(entity.id, EntityId(42));
        assert_eq!(entity.ifc_type, IfcType::IfcSpace);
        assert_eq!(entity.attr_str("LongName"), Some("Kontor 101"));
        assert_eq!(entity.attr_ref("ObjectPlacement"), Some(EntityId(60)));
    }

    #[test]
    fn test_parse_typed_value_in_list() {
        let entity =
            parse_entity("#7=IFCPROPERTYSINGLEVALUE('Height',$,IFCLENGTHMEASURE(3000.),$);")
                .unwrap();
        assert_eq!(entity.attr_float("NominalValue"), Some(3000.0));
    }
}
