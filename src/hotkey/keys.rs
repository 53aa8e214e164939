//! Key identifiers, combinations and held-key tracking
//!
//! Every key the daemon reasons about is a [`KeyId`]: a lowercase name with
//! the platform's `key_` class prefix stripped. Raw platform identifiers and
//! command-line key names go through the same normalization so they always
//! compare equal.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Raw key identifier as reported by a device backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawKey {
    /// Platform name for the key, e.g. `KEY_LEFTCTRL`
    Named(String),
    /// Scancode with no known name
    Unknown(u16),
}

/// Canonical identifier for a physical key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(String);

impl KeyId {
    /// Normalize a key name. Returns `None` when nothing is left of it.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        let name = lower.strip_prefix("key_").unwrap_or(&lower);
        if name.is_empty() {
            None
        } else {
            Some(Self(name.to_owned()))
        }
    }

    /// The normalized name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert a raw backend key into a [`KeyId`]
///
/// Unknown scancodes yield `None`; callers must drop those events without
/// touching the held-key set since their press and release cannot be
/// correlated.
pub fn normalize(raw: &RawKey) -> Option<KeyId> {
    match raw {
        RawKey::Named(name) => KeyId::from_name(name),
        RawKey::Unknown(_) => None,
    }
}

/// A non-empty, unordered set of keys that must be held together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombination {
    keys: BTreeSet<KeyId>,
}

impl KeyCombination {
    /// Parse a `+`-joined list of key names, e.g. `rightctrl+m`
    pub fn parse(spec: &str) -> Result<Self, KeyParseError> {
        let mut keys = BTreeSet::new();
        for part in spec.split('+') {
            let key = KeyId::from_name(part).ok_or_else(|| KeyParseError::EmptyKey {
                spec: spec.to_owned(),
            })?;
            keys.insert(key);
        }
        Ok(Self { keys })
    }

    /// True when every key of the combination is currently held
    pub fn is_satisfied_by(&self, held: &HeldKeys) -> bool {
        self.keys.iter().all(|key| held.contains(key))
    }

    /// Keys of the combination in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &KeyId> {
        self.keys.iter()
    }

    /// Check whether `key` is part of the combination
    #[cfg(test)]
    pub fn contains(&self, key: &KeyId) -> bool {
        self.keys.contains(key)
    }

    /// Number of distinct keys
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for key in &self.keys {
            if !first {
                f.write_str("+")?;
            }
            write!(f, "{key}")?;
            first = false;
        }
        Ok(())
    }
}

/// Errors from parsing key names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("empty key name in combination {spec:?}")]
    EmptyKey { spec: String },
}

/// Keys currently in the pressed state
#[derive(Debug, Clone, Default)]
pub struct HeldKeys {
    keys: HashSet<KeyId>,
}

impl HeldKeys {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as pressed. Returns `false` if it was already held.
    pub fn press(&mut self, key: KeyId) -> bool {
        self.keys.insert(key)
    }

    /// Mark a key as released. Releasing a key that is not held is a no-op.
    pub fn release(&mut self, key: &KeyId) -> bool {
        self.keys.remove(key)
    }

    /// Check whether `key` is held
    pub fn contains(&self, key: &KeyId) -> bool {
        self.keys.contains(key)
    }

    /// Forget every held key
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> KeyId {
        KeyId::from_name(name).unwrap()
    }

    #[test]
    fn test_normalize_named_keys() {
        let raw = RawKey::Named("KEY_LEFTCTRL".to_string());
        assert_eq!(normalize(&raw).unwrap().as_str(), "leftctrl");

        let raw = RawKey::Named("KEY_A".to_string());
        assert_eq!(normalize(&raw).unwrap().as_str(), "a");

        let raw = RawKey::Named("KEY_1".to_string());
        assert_eq!(normalize(&raw).unwrap().as_str(), "1");
    }

    #[test]
    fn test_normalize_keeps_button_prefix() {
        let button = normalize(&RawKey::Named("BTN_LEFT".to_string())).unwrap();
        let arrow = normalize(&RawKey::Named("KEY_LEFT".to_string())).unwrap();
        assert_eq!(button.as_str(), "btn_left");
        assert_ne!(button, arrow);
    }

    #[test]
    fn test_normalize_unknown_scancode() {
        assert_eq!(normalize(&RawKey::Unknown(0x2fe)), None);
    }

    #[test]
    fn test_cli_names_match_device_names() {
        let from_device = normalize(&RawKey::Named("KEY_RIGHTCTRL".to_string())).unwrap();
        assert_eq!(key("rightctrl"), from_device);
        assert_eq!(key("RightCtrl"), from_device);
        assert_eq!(key(" KEY_RIGHTCTRL "), from_device);
        assert_eq!(key("!").as_str(), "!");
    }

    #[test]
    fn test_empty_names_rejected() {
        assert_eq!(KeyId::from_name(""), None);
        assert_eq!(KeyId::from_name("   "), None);
        assert_eq!(KeyId::from_name("KEY_"), None);
    }

    #[test]
    fn test_combination_parse() {
        let combo = KeyCombination::parse("rightctrl+m").unwrap();
        assert_eq!(combo.len(), 2);
        assert!(combo.contains(&key("rightctrl")));
        assert!(combo.contains(&key("m")));
        assert_eq!(combo.to_string(), "m+rightctrl");

        let keys: Vec<&str> = combo.iter().map(KeyId::as_str).collect();
        assert_eq!(keys, ["m", "rightctrl"]);
    }

    #[test]
    fn test_combination_parse_rejects_empty_parts() {
        assert!(KeyCombination::parse("a++b").is_err());
        assert!(KeyCombination::parse("a+").is_err());
        assert!(KeyCombination::parse("").is_err());
    }

    #[test]
    fn test_combination_is_unordered_set() {
        let a = KeyCombination::parse("leftshift+a").unwrap();
        let b = KeyCombination::parse("a+leftshift+a").unwrap();
        assert_eq!(a, b);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_combination_subset_of_held() {
        let combo = KeyCombination::parse("rightctrl+m").unwrap();
        let mut held = HeldKeys::new();
        assert!(!combo.is_satisfied_by(&held));

        held.press(key("m"));
        assert!(!combo.is_satisfied_by(&held));

        held.press(key("rightctrl"));
        held.press(key("leftshift"));
        assert!(combo.is_satisfied_by(&held));

        held.release(&key("m"));
        assert!(!combo.is_satisfied_by(&held));
    }

    #[test]
    fn test_held_keys_press_release() {
        let mut held = HeldKeys::new();
        assert!(held.press(key("a")));
        assert!(!held.press(key("a")));
        assert_eq!(held.len(), 1);

        assert!(held.release(&key("a")));
        assert!(!held.release(&key("a")));
        assert!(held.is_empty());
    }
}
