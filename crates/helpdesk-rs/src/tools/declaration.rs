//! Tool declarations: name, description and typed parameters.
//!
//! A [`ToolDeclaration`] is built once when the tool is constructed and never
//! changes afterwards. It is the single source of truth for both the JSON
//! Schema sent to the model and the validation the registry performs before
//! dispatch.

use serde_json::{Map, Value, json};

use crate::ToolDef;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    /// Filled in by the registry when the model omits the parameter.
    pub default: Option<Value>,
    pub description: String,
}

/// The declared interface of a tool.
#[derive(Debug, Clone)]
pub struct ToolDeclaration {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
}

impl ToolDeclaration {
    /// Start a declaration builder.
    pub fn builder(name: impl Into<String>) -> ToolDeclarationBuilder {
        ToolDeclarationBuilder {
            name: name.into(),
            description: None,
            params: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// JSON Schema of the argument object.
    pub fn parameter_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            let mut prop = json!({
                "type": p.kind.as_str(),
                "description": p.description,
            });
            if let Some(default) = &p.default {
                prop["default"] = default.clone();
            }
            properties.insert(p.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// The function-calling definition sent to the model.
    pub fn to_tool_def(&self) -> ToolDef {
        ToolDef::new(
            self.name.clone(),
            self.description.clone(),
            self.parameter_schema(),
        )
    }
}

/// Builder for [`ToolDeclaration`]. Panics on `build()` if the description
/// is missing or a parameter name is declared twice, so an incomplete tool
/// cannot be registered.
pub struct ToolDeclarationBuilder {
    name: String,
    description: Option<String>,
    params: Vec<ParamSpec>,
}

impl ToolDeclarationBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A parameter the model must supply.
    pub fn required(
        mut self,
        name: impl Into<String>,
        kind: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            required: true,
            default: None,
            description: description.into(),
        });
        self
    }

    /// An optional parameter with no default.
    pub fn optional(
        mut self,
        name: impl Into<String>,
        kind: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            required: false,
            default: None,
            description: description.into(),
        });
        self
    }

    /// An optional parameter filled with `default` when omitted.
    pub fn with_default(
        mut self,
        name: impl Into<String>,
        kind: ParamType,
        default: impl Into<Value>,
        description: impl Into<String>,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            required: false,
            default: Some(default.into()),
            description: description.into(),
        });
        self
    }

    pub fn build(self) -> ToolDeclaration {
        let description = self
            .description
            .expect("ToolDeclaration requires 'description'");
        for (i, p) in self.params.iter().enumerate() {
            assert!(
                !self.params[..i].iter().any(|q| q.name == p.name),
                "duplicate parameter '{}' in tool '{}'",
                p.name,
                self.name
            );
        }
        ToolDeclaration {
            name: self.name,
            description,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment() -> ToolDeclaration {
        ToolDeclaration::builder("schedule_appointment")
            .description("Book a service appointment")
            .with_default("service_type", ParamType::String, "Genel Servis", "Service")
            .optional("preferred_date", ParamType::String, "YYYY-MM-DD")
            .with_default("preferred_time", ParamType::String, "09:00", "HH:MM")
            .build()
    }

    #[test]
    fn schema_lists_properties_and_required() {
        let decl = ToolDeclaration::builder("get_order_status")
            .description("Look up an order")
            .required("order_id", ParamType::String, "Order number")
            .build();
        let schema = decl.parameter_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["order_id"]["type"], "string");
        assert_eq!(schema["required"], json!(["order_id"]));
    }

    #[test]
    fn schema_carries_defaults() {
        let schema = appointment().parameter_schema();
        assert_eq!(schema["properties"]["preferred_time"]["default"], "09:00");
        assert!(schema["properties"]["preferred_date"].get("default").is_none());
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn tool_def_uses_declaration() {
        let def = appointment().to_tool_def();
        assert_eq!(def.function.name, "schedule_appointment");
        assert_eq!(def.function.description, "Book a service appointment");
        assert_eq!(def.function.parameters["type"], "object");
    }

    #[test]
    #[should_panic(expected = "requires 'description'")]
    fn builder_panics_without_description() {
        ToolDeclaration::builder("x").build();
    }

    #[test]
    #[should_panic(expected = "duplicate parameter")]
    fn builder_panics_on_duplicate_param() {
        ToolDeclaration::builder("x")
            .description("d")
            .optional("a", ParamType::String, "")
            .optional("a", ParamType::Integer, "")
            .build();
    }
}
