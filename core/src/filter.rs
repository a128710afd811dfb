//! Filter expression tree sent as the `query` parameter.
//!
//! A `Filter` is an insertion-ordered map from field path to predicate. A
//! predicate is a literal (`{"title": "Hello"}`), an operator object
//! (`{"price": {"$lt": 10}}`), or, for the top-level `$or`/`$and` keys, the
//! combinator's operand.
//!
//! Setting any predicate on a field path replaces whatever that path held
//! before; operators on the same path are never merged.

use serde_json::{Map, Value};

pub const OR: &str = "$or";
pub const AND: &str = "$and";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    expr: Map<String, Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Literal equality predicate.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.expr.insert(field.into(), value.into());
        self
    }

    /// `{field: {op: operand}}`, replacing any previous predicate on `field`.
    pub fn set_operator(
        &mut self,
        field: impl Into<String>,
        op: &str,
        operand: impl Into<Value>,
    ) -> &mut Self {
        let mut inner = Map::new();
        inner.insert(op.to_string(), operand.into());
        self.expr.insert(field.into(), Value::Object(inner));
        self
    }

    pub fn remove(&mut self, field: &str) -> &mut Self {
        self.expr.shift_remove(field);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.expr.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_empty()
    }

    pub fn len(&self) -> usize {
        self.expr.len()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.expr
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.expr.clone())
    }

    /// Compact JSON text of the tree, keys in insertion order.
    pub fn to_json_string(&self) -> String {
        Value::Object(self.expr.clone()).to_string()
    }
}

impl From<Map<String, Value>> for Filter {
    fn from(expr: Map<String, Value>) -> Self {
        Self { expr }
    }
}

/// Render a list the way the taxonomy endpoint expects `$and` operands:
/// `[` + each element as compact JSON, joined by `", "` + `]`.
pub(crate) fn list_string_form(items: &[Value]) -> String {
    let parts: Vec<String> = items.iter().map(Value::to_string).collect();
    format!("[{}]", parts.join(", "))
}
