use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde_json::Value;

/// First `{...}` span in the reply, shortest match. Flat mappings close at
/// the first brace, so this usually lands on the object itself even when
/// the model wraps it in prose.
static FIRST_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[\s\S]*?\}").unwrap());

/// Outcome of pulling a filename→folder mapping out of raw model text.
/// Absence is an expected, reportable condition rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Entries in document order. Later consumers pick the first entry when
    /// basenames collide, so order is part of the contract.
    Mapping(Vec<(String, String)>),
    Absent { reason: String, raw: String },
}

impl Extraction {
    fn absent(reason: impl Into<String>, raw: &str) -> Self {
        Self::Absent {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

/// JSON object deserialized as ordered pairs. A map type would re-sort or
/// collapse duplicate keys.
struct OrderedMapping(Vec<(String, String)>);

impl<'de> serde::Deserialize<'de> for OrderedMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairVisitor;

        impl<'de> Visitor<'de> for PairVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping filenames to folder strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    pairs.push((key, value));
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairVisitor).map(OrderedMapping)
    }
}

enum Candidate {
    Parsed(Vec<(String, String)>),
    WrongShape(String),
    Unparseable,
}

fn try_parse(candidate: &str) -> Candidate {
    match serde_json::from_str::<OrderedMapping>(candidate) {
        Ok(OrderedMapping(pairs)) => Candidate::Parsed(pairs),
        Err(err) if err.classify() == serde_json::error::Category::Data => {
            let shape = serde_json::from_str::<Value>(candidate)
                .map(|value| describe_shape(&value))
                .unwrap_or("unknown");
            Candidate::WrongShape(shape.to_string())
        }
        Err(_) => Candidate::Unparseable,
    }
}

fn describe_shape(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "an object with non-string values",
        Value::Array(_) => "an array",
        Value::String(_) => "a string",
        Value::Number(_) => "a number",
        Value::Bool(_) => "a boolean",
        Value::Null => "null",
    }
}

/// Interior of the first fenced code block: an opener line that is a fence
/// marker (optionally tagged `json`) through its matching closer line.
fn fenced_block(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.trim().lines().collect();
    let start = lines.iter().position(|line| {
        let t = line.trim();
        t.starts_with("```json") || t == "```"
    })?;
    let close = lines[start + 1..]
        .iter()
        .position(|line| line.trim() == "```")?;
    let body = lines[start + 1..start + 1 + close].join("\n");
    Some(body.trim().to_string())
}

/// Recover a filename→folder mapping from raw model text. Strategies are
/// tried in order, each only when the previous one yields nothing that
/// parses: the first `{...}` span, then a fenced code block, then the
/// widest first-`{`-to-last-`}` substring. A value that parses but is not
/// a string→string object stops the chain and reports the observed shape.
pub fn extract_mapping(raw: &str) -> Extraction {
    if let Some(found) = FIRST_OBJECT.find(raw) {
        match try_parse(found.as_str()) {
            Candidate::Parsed(pairs) => return Extraction::Mapping(pairs),
            Candidate::WrongShape(shape) => {
                return Extraction::absent(
                    format!("reply parsed as {shape}, not a filename mapping"),
                    raw,
                )
            }
            Candidate::Unparseable => {}
        }
    }

    if let Some(block) = fenced_block(raw) {
        match try_parse(&block) {
            Candidate::Parsed(pairs) => return Extraction::Mapping(pairs),
            Candidate::WrongShape(shape) => {
                return Extraction::absent(
                    format!("fenced block parsed as {shape}, not a filename mapping"),
                    raw,
                )
            }
            Candidate::Unparseable => {}
        }
    }

    let trimmed = raw.trim();
    if let (Some(first), Some(last)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if first < last {
            match try_parse(&trimmed[first..=last]) {
                Candidate::Parsed(pairs) => return Extraction::Mapping(pairs),
                Candidate::WrongShape(shape) => {
                    return Extraction::absent(
                        format!("reply parsed as {shape}, not a filename mapping"),
                        raw,
                    )
                }
                Candidate::Unparseable => {
                    return Extraction::absent("no parseable JSON object in reply", raw)
                }
            }
        }
    }

    Extraction::absent("reply contains no JSON object", raw)
}
