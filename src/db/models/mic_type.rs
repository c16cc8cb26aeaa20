use serde::{Deserialize, Serialize};

/// Physical mic system, mirroring the belt-pack system type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MicType {
    #[default]
    Wireless,
    Hardwired,
}

impl MicType {
    /// Convert from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "wireless" => Some(MicType::Wireless),
            "hardwired" => Some(MicType::Hardwired),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MicType::Wireless => "wireless",
            MicType::Hardwired => "hardwired",
        }
    }
}

impl From<MicType> for String {
    fn from(mic_type: MicType) -> Self {
        mic_type.as_str().to_string()
    }
}

impl TryFrom<&str> for MicType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value).ok_or_else(|| format!("Invalid mic type: {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(MicType::from_str("Wireless"), Some(MicType::Wireless));
        assert_eq!(MicType::from_str(" HARDWIRED "), Some(MicType::Hardwired));
        assert_eq!(MicType::from_str("handheld"), None);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&MicType::Hardwired).unwrap();
        assert_eq!(json, "\"hardwired\"");
    }
}
