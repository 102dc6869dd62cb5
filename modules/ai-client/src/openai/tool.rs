use schemars::{schema_for, JsonSchema};

use super::types::ToolDefinitionWire;

/// Build a function tool whose parameters schema is derived from `T`.
///
/// Field doc comments on `T` become parameter descriptions. The root-level
/// `$schema`, `title` and `definitions` keys are dropped and nested `$ref`s
/// are inlined, since the function-calling API wants a plain object schema.
pub fn function_tool<T: JsonSchema>(name: &str, description: &str) -> ToolDefinitionWire {
    let schema = schema_for!(T);
    let mut parameters = serde_json::to_value(schema).unwrap_or_default();

    let definitions = parameters.get("definitions").cloned();
    if let Some(defs) = definitions {
        inline_refs(&mut parameters, &defs);
    }
    if let serde_json::Value::Object(map) = &mut parameters {
        map.remove("$schema");
        map.remove("title");
        map.remove("definitions");
    }

    ToolDefinitionWire::function(name, description, parameters)
}

fn inline_refs(value: &mut serde_json::Value, definitions: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(ref_path)) = map.get("$ref").cloned() {
                let type_name = ref_path.trim_start_matches("#/definitions/");
                if let Some(def) = definitions.get(type_name) {
                    *value = def.clone();
                    inline_refs(value, definitions);
                    return;
                }
            }
            for (key, v) in map.iter_mut() {
                if key != "definitions" {
                    inline_refs(v, definitions);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}
