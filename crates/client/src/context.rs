use serde_json::{Map, Value};

/// Metadata threaded alongside a request, such as `headers`. Keys keep their insertion order.
pub type Context = Map<String, Value>;

/// Merges context layers, given from the lowest to the highest precedence, into a new context.
///
/// Objects present in several layers are merged key by key, at any depth. Any other value of a
/// higher layer replaces the lower one entirely; arrays are not concatenated.
pub fn merge<'a>(layers: impl IntoIterator<Item = &'a Context>) -> Context {
    let mut merged = Context::new();

    for layer in layers {
        merge_into(&mut merged, layer);
    }

    merged
}

fn merge_into(target: &mut Context, layer: &Context) {
    for (key, value) in layer {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge_into(existing, incoming),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
