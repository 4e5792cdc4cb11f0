//! Parsing of the exported keyspace definition.
//!
//! The replication settings arrive as a CQL map literal inside a
//! `CREATE KEYSPACE` fragment. The literal is read with a strict tokenizer
//! accepting only `{ 'key' : value, ... }` where a value is a quoted string
//! or an unsigned integer.

use regex::Regex;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::LazyLock;
use tracing::debug;

use svckit::errors::KeyspaceError;
use svckit::types::ReplicationClass;

static MAP_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("map literal pattern"));

static DURABLE_WRITES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)durable_writes\s*=\s*(true|false)").expect("durable_writes pattern")
});

/// Durable writes assumed when the fragment carries no `durable_writes` clause,
/// matching the server default.
pub const DEFAULT_DURABLE_WRITES: bool = true;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationValue {
    Text(String),
    Integer(u64),
}

impl ReplicationValue {
    fn as_factor(&self, key: &str) -> Result<u32, KeyspaceError> {
        let parsed = match self {
            ReplicationValue::Integer(n) => u32::try_from(*n).ok(),
            ReplicationValue::Text(s) => s.trim().parse::<u32>().ok(),
        };
        parsed.ok_or_else(|| {
            KeyspaceError::ParseError(format!("'{}' is not a valid replication factor: {:?}", key, self))
        })
    }
}

/// Replication settings of a keyspace as currently stored on the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveKeyspaceConfig {
    /// Short strategy class name, e.g. `SimpleStrategy`.
    pub class: String,
    pub replication_factor: Option<u32>,
    pub data_centres: BTreeMap<String, u32>,
    pub durable_writes: bool,
}

impl LiveKeyspaceConfig {
    /// Parses an exported `CREATE KEYSPACE ... WITH replication = {...}` fragment.
    pub fn parse(fragment: &str) -> Result<Self, KeyspaceError> {
        let found = MAP_LITERAL.find(fragment).ok_or_else(|| {
            KeyspaceError::ParseError(format!("No replication map found in: {}", fragment))
        })?;
        let literal = found.as_str();

        // Map keys are datacentre names and may contain anything, so only the
        // clauses after the literal are searched.
        let durable_writes = match DURABLE_WRITES.captures(&fragment[found.end()..]) {
            Some(caps) => caps[1].eq_ignore_ascii_case("true"),
            None => {
                debug!(
                    "No durable_writes clause in keyspace definition, assuming {}",
                    DEFAULT_DURABLE_WRITES
                );
                DEFAULT_DURABLE_WRITES
            }
        };

        let mut map = parse_replication_map(literal)?;

        let class = match map.remove("class") {
            Some(ReplicationValue::Text(class)) => ReplicationClass::short_name(&class).to_string(),
            Some(other) => {
                return Err(KeyspaceError::ParseError(format!(
                    "Replication class must be a string, got {:?}",
                    other
                )))
            }
            None => {
                return Err(KeyspaceError::ParseError(
                    "Replication map has no 'class' entry".to_string(),
                ))
            }
        };

        let mut replication_factor = None;
        let mut data_centres = BTreeMap::new();

        match ReplicationClass::from_class_name(&class) {
            Some(ReplicationClass::SimpleStrategy) => {
                if let Some(value) = map.get("replication_factor") {
                    replication_factor = Some(value.as_factor("replication_factor")?);
                }
            }
            Some(ReplicationClass::NetworkTopologyStrategy) => {
                for (dc, value) in &map {
                    data_centres.insert(dc.clone(), value.as_factor(dc)?);
                }
            }
            // Left for the diff to reject with the class name.
            None => {}
        }

        Ok(Self {
            class,
            replication_factor,
            data_centres,
            durable_writes,
        })
    }

    pub fn replication_class(&self) -> Option<ReplicationClass> {
        ReplicationClass::from_class_name(&self.class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    OpenBrace,
    CloseBrace,
    Colon,
    Comma,
    Text(String),
    Integer(u64),
}

fn tokenize(literal: &str) -> Result<Vec<Token>, KeyspaceError> {
    let mut tokens = Vec::new();
    let mut chars = literal.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '{' => {
                chars.next();
                tokens.push(Token::OpenBrace);
            }
            '}' => {
                chars.next();
                tokens.push(Token::CloseBrace);
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '\'' => tokens.push(Token::Text(read_quoted(&mut chars)?)),
            c if c.is_ascii_digit() => tokens.push(Token::Integer(read_integer(&mut chars)?)),
            other => {
                return Err(KeyspaceError::ParseError(format!(
                    "Unexpected character '{}' in replication map",
                    other
                )))
            }
        }
    }

    Ok(tokens)
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> Result<String, KeyspaceError> {
    chars.next(); // opening quote
    let mut text = String::new();
    loop {
        match chars.next() {
            Some('\'') => {
                // '' is an escaped quote
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    text.push('\'');
                } else {
                    return Ok(text);
                }
            }
            Some(c) => text.push(c),
            None => {
                return Err(KeyspaceError::ParseError(
                    "Unterminated string in replication map".to_string(),
                ))
            }
        }
    }
}

fn read_integer(chars: &mut Peekable<Chars<'_>>) -> Result<u64, KeyspaceError> {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            chars.next();
        } else {
            break;
        }
    }
    digits
        .parse::<u64>()
        .map_err(|e| KeyspaceError::ParseError(format!("Invalid integer '{}': {}", digits, e)))
}

/// Parses `{ 'key' : value, ... }` into an ordered map. Duplicate keys,
/// bare words, nested structures and trailing garbage are rejected.
pub fn parse_replication_map(literal: &str) -> Result<BTreeMap<String, ReplicationValue>, KeyspaceError> {
    let tokens = tokenize(literal)?;
    let mut iter = tokens.into_iter();
    let unexpected = |what: &str, token: Option<Token>| {
        KeyspaceError::ParseError(format!("Expected {} in replication map, found {:?}", what, token))
    };

    match iter.next() {
        Some(Token::OpenBrace) => {}
        other => return Err(unexpected("'{'", other)),
    }

    let mut map = BTreeMap::new();
    let mut expect_entry = true;

    loop {
        match iter.next() {
            Some(Token::CloseBrace) if map.is_empty() || !expect_entry => break,
            Some(Token::Text(key)) if expect_entry => {
                match iter.next() {
                    Some(Token::Colon) => {}
                    other => return Err(unexpected("':'", other)),
                }
                let value = match iter.next() {
                    Some(Token::Text(s)) => ReplicationValue::Text(s),
                    Some(Token::Integer(n)) => ReplicationValue::Integer(n),
                    other => return Err(unexpected("a string or integer value", other)),
                };
                if map.insert(key.clone(), value).is_some() {
                    return Err(KeyspaceError::ParseError(format!(
                        "Duplicate key '{}' in replication map",
                        key
                    )));
                }
                expect_entry = false;
            }
            Some(Token::Comma) if !expect_entry => expect_entry = true,
            other => {
                let what = if expect_entry { "a quoted key" } else { "',' or '}'" };
                return Err(unexpected(what, other));
            }
        }
    }

    if let Some(extra) = iter.next() {
        return Err(unexpected("end of replication map", Some(extra)));
    }

    Ok(map)
}
