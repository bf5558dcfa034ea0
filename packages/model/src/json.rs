//! # Node JSON
//!
//! ```json
//! { "object": "block", "type": "paragraph", "data": {},
//!   "nodes": [{ "object": "text", "text": "hi", "marks": [{ "type": "bold" }] }] }
//! ```
//!
//! Marks on a text are listed once per contiguous run. A mark covering the
//! whole text carries no `offset`/`length`; a partial one carries both.
//! Keys are written only when asked for and regenerated when absent.

use crate::error::{ModelError, ModelResult};
use crate::key::Key;
use crate::mark::{Data, Mark, MarkSet};
use crate::node::{Element, Node};
use crate::text::{byte_index, Leaf, Text};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value as Json};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOptions {
    pub preserve_keys: bool,
}

/// One contiguous run of a mark inside a text
struct MarkRun {
    mark: Mark,
    offset: usize,
    length: usize,
}

fn mark_runs(text: &Text) -> Vec<MarkRun> {
    let mut runs: Vec<MarkRun> = Vec::new();
    let mut offset = 0;
    for leaf in text.leaves() {
        let len = leaf.len();
        for mark in leaf.marks.iter() {
            let open = runs
                .iter_mut()
                .rev()
                .find(|r| &r.mark == mark && r.offset + r.length == offset);
            match open {
                Some(run) => run.length += len,
                None => runs.push(MarkRun {
                    mark: mark.clone(),
                    offset,
                    length: len,
                }),
            }
        }
        offset += len;
    }
    runs
}

impl Node {
    pub fn to_json(&self, options: JsonOptions) -> Json {
        let mut out = Map::new();
        out.insert("object".into(), json!(self.object().as_str()));
        if options.preserve_keys {
            out.insert("key".into(), json!(self.key().as_str()));
        }

        match self {
            Node::Text(text) => {
                let total = text.len();
                let marks: Vec<Json> = mark_runs(text)
                    .into_iter()
                    .map(|run| {
                        let mut m = Map::new();
                        m.insert("type".into(), json!(run.mark.ty));
                        if !run.mark.data.is_empty() {
                            m.insert("data".into(), Json::Object(run.mark.data));
                        }
                        if !(run.offset == 0 && run.length == total) {
                            m.insert("offset".into(), json!(run.offset));
                            m.insert("length".into(), json!(run.length));
                        }
                        Json::Object(m)
                    })
                    .collect();
                out.insert("text".into(), json!(text.text()));
                out.insert("marks".into(), Json::Array(marks));
            }
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => {
                if !matches!(self, Node::Document(_)) {
                    out.insert("type".into(), json!(e.ty));
                }
                out.insert("data".into(), Json::Object(e.data.clone()));
                let nodes = e.nodes().iter().map(|n| n.to_json(options)).collect();
                out.insert("nodes".into(), Json::Array(nodes));
            }
        }

        Json::Object(out)
    }

    pub fn from_json(value: &Json) -> ModelResult<Node> {
        let object = value
            .as_object()
            .ok_or_else(|| ModelError::invalid_json("node must be an object"))?;

        let kind = object
            .get("object")
            .and_then(Json::as_str)
            .ok_or_else(|| ModelError::invalid_json("node is missing `object`"))?;

        let key = match object.get("key") {
            Some(Json::String(k)) => Key::new(k.clone()),
            Some(Json::Number(n)) => Key::new(n.to_string()),
            _ => Key::generate(),
        };

        if kind == "text" {
            return text_from_json(object, key).map(Node::Text);
        }

        let data = match object.get("data") {
            Some(Json::Object(d)) => d.clone(),
            Some(Json::Null) | None => Data::new(),
            Some(_) => return Err(ModelError::invalid_json("`data` must be an object")),
        };

        let nodes = match object.get("nodes") {
            Some(Json::Array(items)) => items.iter().map(Node::from_json).collect::<ModelResult<Vec<_>>>()?,
            None => Vec::new(),
            Some(_) => return Err(ModelError::invalid_json("`nodes` must be an array")),
        };

        let ty = object.get("type").and_then(Json::as_str).unwrap_or_default();
        let element = Element::new(ty, nodes).with_key(key).with_data(data);

        match kind {
            "document" => Ok(Node::Document(element)),
            "block" => Ok(Node::Block(element)),
            "inline" => Ok(Node::Inline(element)),
            other => Err(ModelError::invalid_json(format!("unknown object `{}`", other))),
        }
    }
}

/// A non-negative count stored under `field`, if present
fn count_field(entry: &Json, field: &str) -> ModelResult<Option<usize>> {
    let Some(value) = entry.get(field) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| ModelError::invalid_json(format!("`{field}` must be a count, got {value}")))
}

fn text_from_json(object: &Map<String, Json>, key: Key) -> ModelResult<Text> {
    let string = object.get("text").and_then(Json::as_str).unwrap_or_default();
    let total = string.chars().count();

    let mut runs = Vec::new();
    if let Some(marks) = object.get("marks") {
        let marks = marks
            .as_array()
            .ok_or_else(|| ModelError::invalid_json("`marks` must be an array"))?;
        for entry in marks {
            let mark: Mark = serde_json::from_value(entry.clone())
                .map_err(|e| ModelError::invalid_json(e.to_string()))?;
            let offset = count_field(entry, "offset")?.unwrap_or(0);
            let length = count_field(entry, "length")?.unwrap_or(total.saturating_sub(offset));
            if offset.checked_add(length).is_none() {
                return Err(ModelError::invalid_json(format!("mark run {offset}+{length} overflows")));
            }
            runs.push(MarkRun { mark, offset, length });
        }
    }

    if total == 0 {
        let marks: MarkSet = runs.into_iter().map(|r| r.mark).collect();
        return Ok(Text::from_leaves(key, vec![Leaf::new("", marks)]));
    }

    let mut cuts = vec![0, total];
    for run in &runs {
        cuts.push(run.offset.min(total));
        cuts.push((run.offset + run.length).min(total));
    }
    cuts.sort_unstable();
    cuts.dedup();

    let leaves = cuts
        .windows(2)
        .map(|w| {
            let (start, end) = (w[0], w[1]);
            let text = &string[byte_index(string, start)..byte_index(string, end)];
            let marks: MarkSet = runs
                .iter()
                .filter(|r| r.offset <= start && r.offset + r.length >= end)
                .map(|r| r.mark.clone())
                .collect();
            Leaf::new(text, marks)
        })
        .collect();

    Ok(Text::from_leaves(key, leaves))
}

// Operations embed nodes and must replay to identical trees, so the serde
// form always keeps keys.
impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json(JsonOptions { preserve_keys: true }).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Json::deserialize(deserializer)?;
        Node::from_json(&value).map_err(D::Error::custom)
    }
}
