use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_string;
use crate::error::TypeError;

// ---------------------------------------------------------------------------
// TypeFamily
// ---------------------------------------------------------------------------

/// The eight families every declared type belongs to.
///
/// Rule dispatch and the walker's built-in policies are selected by family;
/// the full [`TypeId`] additionally distinguishes custom types within one
/// family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFamily {
    Bool,
    Int,
    Float,
    String,
    Sequence,
    Set,
    Map,
    Object,
}

impl TypeFamily {
    /// All families, in declaration order.
    pub const ALL: [TypeFamily; 8] = [
        TypeFamily::Bool,
        TypeFamily::Int,
        TypeFamily::Float,
        TypeFamily::String,
        TypeFamily::Sequence,
        TypeFamily::Set,
        TypeFamily::Map,
        TypeFamily::Object,
    ];

    /// Name of the family's built-in type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Sequence => "list",
            Self::Set => "set",
            Self::Map => "map",
            Self::Object => "object",
        }
    }

    /// Returns `true` for families whose values contain child nodes.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::Sequence | Self::Set | Self::Map | Self::Object)
    }
}

impl fmt::Display for TypeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// TypeId
// ---------------------------------------------------------------------------

/// Declared type identity of a value tree node.
///
/// Built-in types are named after their family. Custom types share a family
/// with a built-in type but carry their own name, which is what the rule
/// registry keys on.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId {
    family: TypeFamily,
    name: Cow<'static, str>,
}

impl TypeId {
    pub const BOOL: Self = Self::builtin(TypeFamily::Bool);
    pub const INT: Self = Self::builtin(TypeFamily::Int);
    pub const FLOAT: Self = Self::builtin(TypeFamily::Float);
    pub const STRING: Self = Self::builtin(TypeFamily::String);
    pub const SEQUENCE: Self = Self::builtin(TypeFamily::Sequence);
    pub const SET: Self = Self::builtin(TypeFamily::Set);
    pub const MAP: Self = Self::builtin(TypeFamily::Map);
    pub const OBJECT: Self = Self::builtin(TypeFamily::Object);

    /// The built-in type of a family.
    pub const fn builtin(family: TypeFamily) -> Self {
        let name = match family {
            TypeFamily::Bool => "bool",
            TypeFamily::Int => "int",
            TypeFamily::Float => "float",
            TypeFamily::String => "string",
            TypeFamily::Sequence => "list",
            TypeFamily::Set => "set",
            TypeFamily::Map => "map",
            TypeFamily::Object => "object",
        };
        Self {
            family,
            name: Cow::Borrowed(name),
        }
    }

    /// A custom type within `family`. See [`Self::try_custom`] for a checked
    /// variant.
    pub fn custom(family: TypeFamily, name: impl Into<String>) -> Self {
        Self {
            family,
            name: Cow::Owned(name.into()),
        }
    }

    /// A custom type within `family`, rejecting empty names.
    pub fn try_custom(family: TypeFamily, name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TypeError::EmptyTypeName);
        }
        Ok(Self::custom(family, name))
    }

    pub fn family(&self) -> TypeFamily {
        self.family
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this is the family's built-in type.
    pub fn is_builtin(&self) -> bool {
        self.name == self.family.name()
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({self})")
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_builtin() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.family, self.name)
        }
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// The payload of a [`TypedValue`].
///
/// `Null` and `Unknown` belong to every family: `Null` is an explicit
/// absence, `Unknown` is a value that has not been resolved yet.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Value {
    Null,
    Unknown,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<TypedValue>),
    Set(Vec<TypedValue>),
    Map(BTreeMap<String, TypedValue>),
    Object(BTreeMap<String, TypedValue>),
}

impl Value {
    /// Short name of the payload kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Unknown => "unknown",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Sequence(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    /// Whether this payload may be carried by a node of `family`.
    pub fn fits(&self, family: TypeFamily) -> bool {
        matches!(
            (self, family),
            (Self::Null | Self::Unknown, _)
                | (Self::Bool(_), TypeFamily::Bool)
                | (Self::Int(_), TypeFamily::Int)
                | (Self::Float(_), TypeFamily::Float)
                | (Self::String(_), TypeFamily::String)
                | (Self::Sequence(_), TypeFamily::Sequence)
                | (Self::Set(_), TypeFamily::Set)
                | (Self::Map(_), TypeFamily::Map)
                | (Self::Object(_), TypeFamily::Object)
        )
    }
}

/// Raw equality: exact for bool/int, IEEE for float except that NaN equals
/// NaN (as in the canonical form), byte-wise for strings, recursive for
/// aggregates. Set membership is compared without regard to order.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::Unknown, Self::Unknown) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x == y))
            }
            (Self::Map(a), Self::Map(b)) | (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// TypedValue
// ---------------------------------------------------------------------------

/// A value tree node: a payload plus the declared type it was produced under.
///
/// Trees are immutable inputs to the walker, which builds merged trees out of
/// clones of prior and proposed nodes.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "UncheckedValue")]
pub struct TypedValue {
    type_id: TypeId,
    value: Value,
}

/// Wire shape of a [`TypedValue`] before the family check and set dedup.
#[derive(Deserialize)]
struct UncheckedValue {
    type_id: TypeId,
    value: Value,
}

impl TryFrom<UncheckedValue> for TypedValue {
    type Error = TypeError;

    fn try_from(raw: UncheckedValue) -> Result<Self, Self::Error> {
        TypedValue::new(raw.type_id, raw.value)
    }
}

impl TypedValue {
    /// Create a node, checking that the payload belongs to the type's family.
    ///
    /// Set payloads are deduplicated by canonical representation, keeping
    /// the first occurrence.
    pub fn new(type_id: TypeId, value: Value) -> Result<Self, TypeError> {
        if !value.fits(type_id.family()) {
            return Err(TypeError::KindMismatch {
                type_id: type_id.to_string(),
                kind: value.kind_name(),
            });
        }
        let value = match value {
            Value::Set(items) => Value::Set(dedup(items)),
            other => other,
        };
        Ok(Self { type_id, value })
    }

    pub fn null(type_id: TypeId) -> Self {
        Self {
            type_id,
            value: Value::Null,
        }
    }

    pub fn unknown(type_id: TypeId) -> Self {
        Self {
            type_id,
            value: Value::Unknown,
        }
    }

    pub fn bool(b: bool) -> Self {
        Self {
            type_id: TypeId::BOOL,
            value: Value::Bool(b),
        }
    }

    pub fn int(i: i64) -> Self {
        Self {
            type_id: TypeId::INT,
            value: Value::Int(i),
        }
    }

    pub fn float(f: f64) -> Self {
        Self {
            type_id: TypeId::FLOAT,
            value: Value::Float(f),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::STRING,
            value: Value::String(s.into()),
        }
    }

    pub fn sequence(items: Vec<TypedValue>) -> Self {
        Self {
            type_id: TypeId::SEQUENCE,
            value: Value::Sequence(items),
        }
    }

    /// A built-in set; duplicate members are dropped.
    pub fn set(items: Vec<TypedValue>) -> Self {
        Self {
            type_id: TypeId::SET,
            value: Value::Set(dedup(items)),
        }
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, TypedValue)>) -> Self {
        Self {
            type_id: TypeId::MAP,
            value: Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    pub fn object<K: Into<String>>(attributes: impl IntoIterator<Item = (K, TypedValue)>) -> Self {
        Self {
            type_id: TypeId::OBJECT,
            value: Value::Object(
                attributes
                    .into_iter()
                    .map(|(k, v)| (k.into(), v))
                    .collect(),
            ),
        }
    }

    /// Retag this node with another type of the same family.
    pub fn with_type(self, type_id: TypeId) -> Result<Self, TypeError> {
        if type_id.family() != self.type_id.family() {
            return Err(TypeError::FamilyMismatch {
                from: self.type_id.to_string(),
                to: type_id.to_string(),
            });
        }
        Ok(Self {
            type_id,
            value: self.value,
        })
    }

    pub fn type_id(&self) -> &TypeId {
        &self.type_id
    }

    pub fn family(&self) -> TypeFamily {
        self.type_id.family()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.value, Value::Unknown)
    }

    /// Neither null nor unknown.
    pub fn is_concrete(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Members of a sequence or set.
    pub fn elements(&self) -> Option<&[TypedValue]> {
        match &self.value {
            Value::Sequence(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Entries of a map or attributes of an object.
    pub fn entries(&self) -> Option<&BTreeMap<String, TypedValue>> {
        match &self.value {
            Value::Map(entries) | Value::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// A single object attribute or map entry.
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.entries().and_then(|e| e.get(name))
    }

    /// Same type, new members. `None` unless this is a sequence or set.
    pub fn with_elements(&self, items: Vec<TypedValue>) -> Option<TypedValue> {
        let value = match self.value {
            Value::Sequence(_) => Value::Sequence(items),
            Value::Set(_) => Value::Set(dedup(items)),
            _ => return None,
        };
        Some(Self {
            type_id: self.type_id.clone(),
            value,
        })
    }

    /// Same type, new entries. `None` unless this is a map or object.
    pub fn with_entries(&self, entries: BTreeMap<String, TypedValue>) -> Option<TypedValue> {
        let value = match self.value {
            Value::Map(_) => Value::Map(entries),
            Value::Object(_) => Value::Object(entries),
            _ => return None,
        };
        Some(Self {
            type_id: self.type_id.clone(),
            value,
        })
    }
}

/// Declared type and raw payload must both match.
impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.value == other.value
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_id, self)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Null => f.write_str("null"),
            Value::Unknown => f.write_str("<unknown>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Sequence(items) => write_items(f, "[", items, "]"),
            Value::Set(items) => write_items(f, "<", items, ">"),
            Value::Map(entries) | Value::Object(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_items(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: &[TypedValue],
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

fn dedup(items: Vec<TypedValue>) -> Vec<TypedValue> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(canonical_string(item)))
        .collect()
}
