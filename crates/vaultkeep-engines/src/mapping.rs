//! Declarative field remapping for engine config restores
//!
//! Engines whose backed-up records do not match the shape their write
//! endpoints accept describe the conversion as a static table of rules.

use serde_json::Value;
use vaultkeep_core::types::Payload;
use vaultkeep_core::{Error, Result};

/// Literal written by [`FieldRule::Const`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstValue {
    Bool(bool),
    Str(&'static str),
}

impl ConstValue {
    fn to_value(self) -> Value {
        match self {
            ConstValue::Bool(b) => Value::Bool(b),
            ConstValue::Str(s) => Value::String(s.to_string()),
        }
    }
}

/// One step of a mapping. Source fields may be dotted (`private.key`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Copy a field when present
    Copy { from: &'static str, to: &'static str },
    /// Merge every member of an object field into the top level
    Flatten { from: &'static str },
    /// Always set a literal
    Const { to: &'static str, value: ConstValue },
    /// Turn a numeric index into its name; strings pass through
    Enumerate {
        from: &'static str,
        to: &'static str,
        names: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub name: &'static str,
    pub rules: &'static [FieldRule],
}

fn lookup<'a>(input: &'a Payload, field: &str) -> Option<&'a Value> {
    let mut parts = field.split('.');
    let mut current = input.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

impl FieldMapping {
    /// Build the write payload for `input`; `origin` names the record in errors
    pub fn apply(&self, origin: &str, input: &Payload) -> Result<Payload> {
        let mut out = Payload::new();
        for rule in self.rules {
            match *rule {
                FieldRule::Copy { from, to } => {
                    if let Some(value) = lookup(input, from) {
                        out.insert(to.to_string(), value.clone());
                    }
                }
                FieldRule::Flatten { from } => match lookup(input, from) {
                    Some(Value::Object(map)) => {
                        for (k, v) in map {
                            out.insert(k.clone(), v.clone());
                        }
                    }
                    Some(Value::Null) | None => {}
                    Some(other) => {
                        return Err(Error::decode(
                            origin,
                            format!("{}: '{}' should be an object, found {}", self.name, from, other),
                        ))
                    }
                },
                FieldRule::Const { to, value } => {
                    out.insert(to.to_string(), value.to_value());
                }
                FieldRule::Enumerate { from, to, names } => {
                    let Some(value) = lookup(input, from) else {
                        continue;
                    };
                    let mapped = match value {
                        Value::Number(n) => {
                            let name = n
                                .as_u64()
                                .and_then(|i| names.get(i as usize))
                                .ok_or_else(|| {
                                    Error::decode(
                                        origin,
                                        format!("{}: unknown {} index {}", self.name, from, n),
                                    )
                                })?;
                            Value::String(name.to_string())
                        }
                        other => other.clone(),
                    };
                    out.insert(to.to_string(), mapped);
                }
            }
        }
        Ok(out)
    }
}

/// Database connection record to `config/<name>` write body
pub const DATABASE_CONFIG: FieldMapping = FieldMapping {
    name: "database config",
    rules: &[
        FieldRule::Copy { from: "allowed_roles", to: "allowed_roles" },
        FieldRule::Copy { from: "password_policy", to: "password_policy" },
        FieldRule::Copy { from: "plugin_name", to: "plugin_name" },
        FieldRule::Copy { from: "plugin_version", to: "plugin_version" },
        FieldRule::Copy { from: "root_rotation_statements", to: "root_rotation_statements" },
        FieldRule::Copy { from: "verify_connection", to: "verify_connection" },
        FieldRule::Flatten { from: "connection_details" },
    ],
};

/// Stored AD config to `config` write body
pub const AD_CONFIG: FieldMapping = FieldMapping {
    name: "ad config",
    rules: &[
        FieldRule::Flatten { from: "PasswordConf" },
        FieldRule::Flatten { from: "ADConf" },
    ],
};

/// `{public, private}` CA key records to `config/ca` write body
pub const SSH_CA: FieldMapping = FieldMapping {
    name: "ssh ca",
    rules: &[
        FieldRule::Copy { from: "private.key", to: "private_key" },
        FieldRule::Copy { from: "public.key", to: "public_key" },
        FieldRule::Const { to: "generate_signing_key", value: ConstValue::Bool(false) },
    ],
};

/// Stored TOTP key to `keys/<name>` write body
pub const TOTP_KEY: FieldMapping = FieldMapping {
    name: "totp key",
    rules: &[
        FieldRule::Copy { from: "exported", to: "exported" },
        FieldRule::Copy { from: "url", to: "url" },
        FieldRule::Copy { from: "key", to: "key" },
        FieldRule::Copy { from: "issuer", to: "issuer" },
        FieldRule::Copy { from: "account_name", to: "account_name" },
        FieldRule::Copy { from: "period", to: "period" },
        FieldRule::Enumerate {
            from: "algorithm",
            to: "algorithm",
            names: &["SHA1", "SHA256", "SHA512"],
        },
        FieldRule::Copy { from: "digits", to: "digits" },
        FieldRule::Copy { from: "skew", to: "skew" },
        FieldRule::Copy { from: "qr_size", to: "qr_size" },
    ],
};
