//! Improvement plans: a verdict per unit of work (usually a method).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the planner decided for one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum UnitVerdict {
    NoChange,
    Improve { instruction: String },
}

impl UnitVerdict {
    pub fn is_improve(&self) -> bool {
        matches!(self, UnitVerdict::Improve { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanUnit {
    pub name: String,
    pub verdict: UnitVerdict,
}

impl PlanUnit {
    pub fn no_change(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdict: UnitVerdict::NoChange,
        }
    }

    pub fn improve(name: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdict: UnitVerdict::Improve {
                instruction: instruction.into(),
            },
        }
    }
}

/// Per-unit plan for one target, produced once before any attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub units: Vec<PlanUnit>,
    /// Planner reply the units were parsed from
    pub raw: String,
}

impl Plan {
    /// A plan with no units, which means no change anywhere
    pub fn empty(raw: impl Into<String>) -> Self {
        Self {
            units: Vec::new(),
            raw: raw.into(),
        }
    }

    /// Parse a planner reply.
    ///
    /// A JSON object is tried first; otherwise every `Name: (yes, instruction)`
    /// or `Name: No` line is read. Anything unrecognised yields no units.
    pub fn parse(raw: &str) -> Self {
        let units = parse_json_units(raw).unwrap_or_else(|| parse_line_units(raw));
        Self {
            units,
            raw: raw.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Whether at least one unit asks for a change
    pub fn needs_improvement(&self) -> bool {
        self.units.iter().any(|u| u.verdict.is_improve())
    }

    /// `(unit, instruction)` for every unit that needs a change
    pub fn improvements(&self) -> impl Iterator<Item = (&str, &str)> {
        self.units.iter().filter_map(|u| match &u.verdict {
            UnitVerdict::Improve { instruction } => Some((u.name.as_str(), instruction.as_str())),
            UnitVerdict::NoChange => None,
        })
    }

    /// One `unit: instruction` line per improvement
    pub fn instructions(&self) -> Vec<String> {
        self.improvements()
            .map(|(name, instruction)| {
                if instruction.is_empty() {
                    name.to_string()
                } else {
                    format!("{}: {}", name, instruction)
                }
            })
            .collect()
    }

    /// Bulleted list of improvements, for prompts
    pub fn render(&self) -> String {
        self.instructions()
            .iter()
            .map(|line| format!("- {}", line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn parse_json_units(raw: &str) -> Option<Vec<PlanUnit>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    let object: serde_json::Map<String, Value> = serde_json::from_str(&raw[start..=end]).ok()?;
    Some(
        object
            .into_iter()
            .map(|(name, value)| PlanUnit {
                verdict: verdict_from_value(&value),
                name,
            })
            .collect(),
    )
}

fn verdict_from_value(value: &Value) -> UnitVerdict {
    match value {
        Value::String(text) => parse_verdict_text(text).unwrap_or(UnitVerdict::NoChange),
        Value::Bool(true) => UnitVerdict::Improve {
            instruction: String::new(),
        },
        Value::Array(items) => {
            let flag = items.first().and_then(Value::as_str).unwrap_or_default();
            if is_yes(flag) {
                let instruction = items[1..]
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                UnitVerdict::Improve { instruction }
            } else {
                UnitVerdict::NoChange
            }
        }
        Value::Object(fields) => {
            let flag = ["improve", "needs_change", "refactor"]
                .iter()
                .find_map(|key| fields.get(*key))
                .is_some_and(|v| match v {
                    Value::Bool(b) => *b,
                    Value::String(s) => is_yes(s),
                    _ => false,
                });
            if flag {
                let instruction = ["instruction", "suggestion"]
                    .iter()
                    .find_map(|key| fields.get(*key).and_then(Value::as_str))
                    .unwrap_or_default()
                    .to_string();
                UnitVerdict::Improve { instruction }
            } else {
                UnitVerdict::NoChange
            }
        }
        _ => UnitVerdict::NoChange,
    }
}

fn parse_line_units(raw: &str) -> Vec<PlanUnit> {
    raw.lines()
        .flat_map(split_entries)
        .filter_map(|entry| {
            let (name, rest) = entry.split_once(':')?;
            let name = unit_name(name)?;
            let verdict = parse_verdict_text(rest.trim().trim_end_matches(',').trim_end_matches('}'))?;
            Some(PlanUnit { name, verdict })
        })
        .collect()
}

/// Split one line into `name: verdict` entries.
///
/// Commas inside parentheses or double quotes never split. A top-level comma only
/// starts a new entry when a `name:` follows it, so `yes, split it` stays whole.
fn split_entries(line: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            '(' | '[' if !quoted => depth += 1,
            ')' | ']' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                pieces.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    pieces.push(current);

    let mut entries: Vec<String> = Vec::new();
    for piece in pieces {
        let starts_entry = piece.split_once(':').is_some_and(|(name, _)| unit_name(name).is_some());
        match entries.last_mut() {
            Some(last) if !starts_entry => {
                last.push(',');
                last.push_str(&piece);
            }
            _ => entries.push(piece),
        }
    }
    entries
}

/// A unit name with braces, bullets, numbering and quotes removed
fn unit_name(text: &str) -> Option<String> {
    let name = text
        .trim()
        .trim_start_matches(|c: char| matches!(c, '{' | '-' | '*' | '•') || c.is_whitespace())
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['.', ')'])
        .trim()
        .trim_matches('"')
        .trim_matches('\'');
    if name.is_empty() || name.contains(char::is_whitespace) {
        None
    } else {
        Some(name.to_string())
    }
}

/// `(yes, instruction)`, `yes - instruction`, `No` and friends
fn parse_verdict_text(text: &str) -> Option<UnitVerdict> {
    let text = text.trim().trim_matches('"');
    let text = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text)
        .trim();

    let word_end = text
        .find(|c: char| !c.is_alphabetic())
        .unwrap_or(text.len());
    let (word, rest) = text.split_at(word_end);

    if is_yes(word) {
        let instruction = rest
            .trim_start_matches(|c: char| c == ',' || c == ':' || c == '-' || c.is_whitespace())
            .trim()
            .to_string();
        Some(UnitVerdict::Improve { instruction })
    } else if matches!(word.to_lowercase().as_str(), "no" | "false") {
        Some(UnitVerdict::NoChange)
    } else {
        None
    }
}

fn is_yes(word: &str) -> bool {
    matches!(word.trim().to_lowercase().as_str(), "yes" | "true")
}
