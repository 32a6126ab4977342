//! Keys making up the paste accelerator

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidModifierError;

/// A key taking part in the paste chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasteKey {
    Control,
    Meta,
    V,
}

impl PasteKey {
    /// DOM `KeyboardEvent.key` value
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Control => "Control",
            Self::Meta => "Meta",
            Self::V => "v",
        }
    }

    /// DOM `KeyboardEvent.code` value
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Control => "ControlLeft",
            Self::Meta => "MetaLeft",
            Self::V => "KeyV",
        }
    }

    /// Windows virtual key code
    pub const fn virtual_key_code(&self) -> u32 {
        match self {
            Self::Control => 17,
            Self::Meta => 91,
            Self::V => 86,
        }
    }

    /// Bit this key contributes to the DevTools modifier mask (0 for non-modifiers).
    /// Alt=1, Ctrl=2, Meta=4, Shift=8.
    pub const fn modifier_bit(&self) -> u32 {
        match self {
            Self::Control => 2,
            Self::Meta => 4,
            Self::V => 0,
        }
    }

    pub const fn is_modifier(&self) -> bool {
        self.modifier_bit() != 0
    }
}

impl fmt::Display for PasteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Modifier held while pressing V.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasteModifier {
    Control,
    Meta,
}

impl PasteModifier {
    /// Platform default: Meta (Cmd) on macOS, Control elsewhere
    pub const fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Meta
        } else {
            Self::Control
        }
    }

    pub const fn key(&self) -> PasteKey {
        match self {
            Self::Control => PasteKey::Control,
            Self::Meta => PasteKey::Meta,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Meta => "meta",
        }
    }
}

impl Default for PasteModifier {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl fmt::Display for PasteModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PasteModifier {
    type Err = InvalidModifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "control" | "ctrl" => Ok(Self::Control),
            "meta" | "cmd" | "command" | "super" => Ok(Self::Meta),
            _ => Err(InvalidModifierError {
                input: s.to_string(),
            }),
        }
    }
}
