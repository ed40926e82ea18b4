//! Known values handed to an instance.

use modello_ast::ExprId;

use crate::instance::Model;

#[derive(Debug, Clone)]
pub enum Value {
    Expr(ExprId),
    /// Values for the attributes of a nested model.
    Nested(Values),
    /// An existing instance whose attribute values seed a nested model.
    Instance(Model),
}

/// Attribute name to [`Value`], in insertion order. Setting a name twice
/// replaces the earlier value.
#[derive(Debug, Clone, Default)]
pub struct Values {
    entries: Vec<(String, Value)>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&mut self, name: &str, value: Value) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn set(mut self, name: &str, expr: ExprId) -> Self {
        self.put(name, Value::Expr(expr));
        self
    }

    pub fn nested(mut self, name: &str, values: Values) -> Self {
        self.put(name, Value::Nested(values));
        self
    }

    pub fn instance(mut self, name: &str, model: &Model) -> Self {
        self.put(name, Value::Instance(model.clone()));
        self
    }

    /// Set a dotted path, creating nested value maps on the way:
    /// `insert_path("base.a", x)` is `nested("base", Values::new().set("a", x))`.
    pub fn insert_path(&mut self, path: &str, expr: ExprId) {
        match path.split_once('.') {
            None => self.put(path, Value::Expr(expr)),
            Some((head, rest)) => {
                let existing = self.entries.iter_mut().find(|(n, _)| n == head);
                match existing {
                    Some((_, Value::Nested(inner))) => inner.insert_path(rest, expr),
                    _ => {
                        let mut inner = Values::new();
                        inner.insert_path(rest, expr);
                        self.put(head, Value::Nested(inner));
                    }
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modello_ast::Context;

    #[test]
    fn paths_create_nested_maps() {
        let mut ctx = Context::new();
        let (one, two) = (ctx.num(1), ctx.num(2));
        let mut values = Values::new().set("d", one);
        values.insert_path("child.a", one);
        values.insert_path("child.b", two);
        values.insert_path("d", two);
        assert_eq!(values.len(), 2);
        assert!(matches!(values.get("d"), Some(Value::Expr(e)) if *e == two));
        let Some(Value::Nested(child)) = values.get("child") else {
            panic!("child should be nested");
        };
        assert_eq!(child.len(), 2);
        assert!(matches!(child.get("b"), Some(Value::Expr(e)) if *e == two));
    }
}
