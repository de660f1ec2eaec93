// Brook Abstract Syntax Tree
// Values and statements produced by the parser and walked by the interpreter

use crate::scope::Scope;
use crate::types;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::rc::Rc;

/// A typed value node. Every variant carries (or derives) its object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Value {
    Constant(Constant),
    Variable(VariableRef),
    MethodCall(MethodCall),
    Array(ArrayValue),
    Instance(ClassInstance),
    DirectMethod(DirectMethod),
    New(NewInstance),
}

/// Scalar data: the literal text plus its type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub text: String,
    pub object_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRef {
    pub path: Vec<String>,
    pub object_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub path: Vec<String>,
    pub arguments: Vec<Value>,
    pub object_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub element_type: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub declared_type: String,
    pub value: Value,
}

/// A live object. Properties are a snapshot seeded from the class defaults;
/// the method map is the instance's own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInstance {
    pub class_name: String,
    pub properties: IndexMap<String, Property>,
    pub methods: IndexMap<String, Rc<MethodDefinition>>,
}

/// A call bound to a known definition rather than a name, used for implicit
/// conversions. `owner` supplies the instance a class method runs against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMethod {
    pub method: Rc<MethodDefinition>,
    pub arguments: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ClassInstance>,
}

/// `new Class`. Instantiated when evaluated, from the class definition in
/// scope at that point, so a class can create instances of itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInstance {
    pub class_name: String,
}

impl Value {
    pub fn constant(text: impl Into<String>, object_type: impl Into<String>) -> Self {
        Value::Constant(Constant {
            text: text.into(),
            object_type: object_type.into(),
        })
    }

    pub fn null() -> Self {
        Self::constant(types::NULL, types::NULL)
    }

    pub fn boolean(value: bool) -> Self {
        Self::constant(if value { "true" } else { "false" }, types::BOOL)
    }

    pub fn int(value: i64) -> Self {
        Self::constant(value.to_string(), types::INT)
    }

    pub fn float(value: f64) -> Self {
        Self::constant(value.to_string(), types::FLOAT)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::constant(value, types::STRING)
    }

    pub fn object_type(&self) -> Cow<'_, str> {
        match self {
            Value::Constant(c) => Cow::Borrowed(&c.object_type),
            Value::Variable(v) => Cow::Borrowed(&v.object_type),
            Value::MethodCall(m) => Cow::Borrowed(&m.object_type),
            Value::Array(a) => Cow::Owned(types::array_of(&a.element_type)),
            Value::Instance(i) => Cow::Borrowed(&i.class_name),
            Value::DirectMethod(d) => Cow::Borrowed(&d.method.return_type),
            Value::New(n) => Cow::Borrowed(&n.class_name),
        }
    }

    /// Fully resolved: nothing left to look up or call.
    pub fn is_real(&self) -> bool {
        matches!(
            self,
            Value::Constant(_) | Value::Array(_) | Value::Instance(_)
        )
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Value::Constant(c) => Some(c),
            _ => None,
        }
    }

    /// Default value for a declaration without an initializer.
    pub fn default_for(declared_type: &str) -> Option<Self> {
        match declared_type {
            types::INT => Some(Self::int(0)),
            types::FLOAT => Some(Self::float(0.0)),
            types::BOOL => Some(Self::boolean(false)),
            types::STRING => Some(Self::string("")),
            types::NULL => Some(Self::null()),
            other => types::element_type(other).map(|element| {
                Value::Array(ArrayValue {
                    element_type: element.to_string(),
                    values: Vec::new(),
                })
            }),
        }
    }

    /// An empty array literal takes its element type from the declaration it
    /// initializes.
    pub fn retype_empty_array(self, declared_type: &str) -> Self {
        match (self, types::element_type(declared_type)) {
            (Value::Array(array), Some(element))
                if array.values.is_empty() && array.element_type == types::NULL =>
            {
                Value::Array(ArrayValue {
                    element_type: element.to_string(),
                    values: Vec::new(),
                })
            }
            (value, _) => value,
        }
    }
}

impl Constant {
    pub fn as_bool(&self) -> Option<bool> {
        match (self.object_type.as_str(), self.text.as_str()) {
            (types::BOOL, "true") => Some(true),
            (types::BOOL, "false") => Some(false),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        self.text.trim().parse().ok()
    }

    pub fn as_float(&self) -> Option<f64> {
        self.text.trim().parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub declared_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodBody {
    Statements(Vec<Statement>),
    /// Implemented by the host; resolved through the native symbol table.
    Native { symbol: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDefinition {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub body: MethodBody,
}

impl MethodDefinition {
    pub fn native(name: &str, parameters: &[(&str, &str)], return_type: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            return_type: return_type.to_string(),
            parameters: parameters
                .iter()
                .map(|(name, declared_type)| Parameter {
                    name: name.to_string(),
                    declared_type: declared_type.to_string(),
                })
                .collect(),
            body: MethodBody::Native {
                symbol: symbol.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub declared_type: String,
    pub value: Value,
}

/// Immutable class template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    pub methods: Vec<Rc<MethodDefinition>>,
}

impl ClassDefinition {
    /// Fresh instance with unresolved field defaults.
    pub fn instantiate(&self) -> ClassInstance {
        ClassInstance {
            class_name: self.name.clone(),
            properties: self
                .fields
                .iter()
                .map(|field| {
                    (
                        field.name.clone(),
                        Property {
                            declared_type: field.declared_type.clone(),
                            value: field.value.clone(),
                        },
                    )
                })
                .collect(),
            methods: self
                .methods
                .iter()
                .map(|method| (method.name.clone(), Rc::clone(method)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub name: String,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "statement", rename_all = "snake_case")]
pub enum Statement {
    FunctionCall {
        call: MethodCall,
    },
    VariableInit {
        name: String,
        declared_type: String,
        value: Value,
    },
    VariableSet {
        path: Vec<String>,
        value: Value,
    },
    MethodDefinition {
        method: Rc<MethodDefinition>,
    },
    If {
        condition: Value,
        body: Vec<Statement>,
        else_body: Option<Vec<Statement>>,
    },
    While {
        condition: Value,
        body: Vec<Statement>,
    },
    Return {
        value: Value,
    },
    Throw {
        value: Value,
    },
    TryCatch {
        body: Vec<Statement>,
        catch: Option<CatchClause>,
    },
    EnterScope,
    ExitScope,
    /// `exports` is filled in for script libraries so a serialized program
    /// does not depend on the library file at run time.
    LoadLib {
        name: String,
        exports: Option<Scope>,
    },
}

/// A parsed program: top-level statements plus every class met while parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub statements: Vec<Statement>,
    pub classes: Vec<Rc<ClassDefinition>>,
}

impl Script {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
