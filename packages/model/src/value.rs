use crate::error::{ModelError, ModelResult};
use crate::history::History;
use crate::json::JsonOptions;
use crate::mark::Data;
use crate::node::Node;
use crate::path::Path;
use crate::range::Selection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as Json};

/// The whole editor state at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "object", rename = "value")]
pub struct Value {
    pub document: Node,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,

    #[serde(skip)]
    pub history: History,

    #[serde(default)]
    pub data: Data,
}

/// The value-level fields `set_value` can change
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

impl Value {
    pub fn new(document: Node) -> Self {
        Self {
            document,
            selection: None,
            history: History::default(),
            data: Data::new(),
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn properties(&self) -> ValueProperties {
        ValueProperties {
            data: Some(self.data.clone()),
        }
    }

    /// Rewrite the offset of selection points sitting in the text at `path`
    pub(crate) fn shift_selection(&mut self, path: &Path, f: impl Fn(usize) -> usize) {
        if let Some(selection) = &mut self.selection {
            for point in [&mut selection.anchor, &mut selection.focus] {
                if &point.path == path {
                    point.offset = f(point.offset);
                }
            }
        }
    }

    pub fn to_json(&self, options: JsonOptions) -> Json {
        let mut out = Map::new();
        out.insert("object".into(), json!("value"));
        out.insert("document".into(), self.document.to_json(options));
        if let Some(selection) = &self.selection {
            out.insert("selection".into(), json!(selection));
        }
        out.insert("data".into(), Json::Object(self.data.clone()));
        Json::Object(out)
    }

    pub fn from_json(value: &Json) -> ModelResult<Value> {
        let object = value
            .as_object()
            .ok_or_else(|| ModelError::invalid_json("value must be an object"))?;

        let document = object
            .get("document")
            .ok_or_else(|| ModelError::invalid_json("value is missing `document`"))
            .and_then(Node::from_json)?;
        if !document.is_document() {
            return Err(ModelError::invalid_json("`document` must have object \"document\""));
        }

        let selection = match object.get("selection") {
            Some(Json::Null) | None => None,
            Some(s) => Some(serde_json::from_value(s.clone()).map_err(|e| ModelError::invalid_json(e.to_string()))?),
        };

        let data = match object.get("data") {
            Some(Json::Object(d)) => d.clone(),
            _ => Data::new(),
        };

        Ok(Value {
            document,
            selection,
            history: History::default(),
            data,
        })
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::new(Node::document(Vec::new()))
    }
}
