use serde::{Deserialize, Serialize};

/// A string did not name any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ConversationRole {
    User => "user",
    Assistant => "assistant",
});

str_enum!(ExportFormat {
    Csv => "csv",
    Pdf => "pdf",
});

/// The three clinical labels the extraction model is asked to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusLevel {
    Normal,
    SlightlyAbnormal,
    Critical,
}

/// Clinical status exactly as the extraction model wrote it.
///
/// The text is stored and exported untouched. `level` classifies it
/// case-insensitively (surrounding whitespace ignored); anything outside the
/// three labels has no level and never lands in a summary bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabStatus(String);

impl LabStatus {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn level(&self) -> Option<StatusLevel> {
        match self.0.trim().to_uppercase().as_str() {
            "NORMAL" => Some(StatusLevel::Normal),
            "SLIGHTLY_ABNORMAL" => Some(StatusLevel::SlightlyAbnormal),
            "CRITICAL" => Some(StatusLevel::Critical),
            _ => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.level().is_some()
    }
}

impl std::fmt::Display for LabStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn conversation_role_round_trip() {
        for (variant, s) in [
            (ConversationRole::User, "user"),
            (ConversationRole::Assistant, "assistant"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ConversationRole::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn conversation_role_serializes_lowercase() {
        let json = serde_json::to_string(&ConversationRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn export_format_rejects_unknown() {
        let err = ExportFormat::from_str("xml").unwrap_err();
        assert_eq!(err.field, "ExportFormat");
        assert_eq!(err.value, "xml");
    }

    #[test]
    fn lab_status_level_is_case_insensitive() {
        assert_eq!(LabStatus::new("normal").level(), Some(StatusLevel::Normal));
        assert_eq!(
            LabStatus::new(" Slightly_Abnormal ").level(),
            Some(StatusLevel::SlightlyAbnormal)
        );
        assert_eq!(LabStatus::new("CRITICAL").level(), Some(StatusLevel::Critical));
    }

    #[test]
    fn lab_status_keeps_unrecognized_text() {
        let status = LabStatus::new("borderline");
        assert!(!status.is_recognized());
        assert_eq!(status.level(), None);
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"borderline\"");
    }

    #[test]
    fn lab_status_round_trips_model_casing() {
        let status: LabStatus = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(status.level(), Some(StatusLevel::Critical));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"critical\"");
        assert_eq!(status.to_string(), "critical");
    }
}
