use std::collections::HashMap;
use std::ffi::CString;

use log::debug;

/// Variables visible to the interpreter and handed to every loaded program.
///
/// The table is threaded through execution explicitly. A forked child gets
/// its own copy, so assignments made inside a branch never reach the parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Empty table, mostly useful in tests.
    pub fn new() -> Self {
        Environment { vars: HashMap::new() }
    }

    /// Snapshot of the OS environment at start-up.
    pub fn from_os() -> Self {
        let mut env = Environment::new();
        for (k, v) in std::env::vars_os() {
            // Non UTF-8 entries cannot be expanded into words; skip them.
            if let (Ok(k), Ok(v)) = (k.into_string(), v.into_string()) {
                env.vars.insert(k, v);
            }
        }
        env
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.as_str())
    }

    /// Always overwrites an existing value.
    pub fn set(&mut self, key: &str, value: &str) {
        debug!("env: {}={}", key, value);
        self.vars.insert(key.to_string(), value.to_string());
    }

    /// `KEY=VALUE` strings for `execve`. Entries with interior NULs are dropped.
    pub fn to_envp(&self) -> Vec<CString> {
        self.vars
            .iter()
            .filter_map(|(k, v)| CString::new(format!("{}={}", k, v)).ok())
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Environment {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
