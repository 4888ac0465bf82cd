use core::fmt;

/// Reference to an entity owned by the host (a sensor, a switch, a TRV).
///
/// The core never interprets the contents; it only hands them back to the
/// host through [`crate::StateReader`] and [`crate::ServiceBus`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityRef(String);

impl EntityRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({})", self.0)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityRef {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Derive a stable identifier from a display name.
///
/// Lowercases ASCII letters, keeps digits, and collapses every other run of
/// characters into a single `_`. Leading and trailing separators are dropped.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Identity of a device (hub, zone or circuit) that owns displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceInfo {
    /// Stable id, usually the slug of the name.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Device model ("Zone Thermostat", "Heating Circuit", ...).
    pub model: &'static str,
}

impl DeviceInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, model: &'static str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model,
        }
    }

    /// Unique id of a display owned by this device.
    pub fn display_id(&self, role: &str) -> String {
        format!("{}_{}", self.id, slugify(role))
    }
}
