use serde::{Deserialize, Deserializer, Serialize};

/// One selectable session as delivered by the catalog source.
///
/// The wire naming differs between backends (the index CSV uses snake case,
/// older API builds used `Season`/`Round`/`Session`/`SessionID`), so every
/// field accepts the known aliases.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Season label. Usually a four digit year but treated as opaque text.
    #[serde(alias = "Season", deserialize_with = "label_or_number")]
    pub year: String,
    /// Event name, unique within a year
    #[serde(alias = "eventName", alias = "Round")]
    pub event_name: String,
    /// Human readable session designation, e.g. "Practice 1" or "Race"
    #[serde(alias = "sessionType", alias = "Session")]
    pub session_type: String,
    /// Opaque identifier, unique across the catalog
    #[serde(alias = "sessionId", alias = "SessionID")]
    pub session_id: String,
}

impl SessionRecord {
    pub fn new(year: &str, event_name: &str, session_type: &str, session_id: &str) -> Self {
        Self {
            year: year.to_string(),
            event_name: event_name.to_string(),
            session_type: session_type.to_string(),
            session_id: session_id.to_string(),
        }
    }

    pub fn is_in(&self, year: &str, event_name: &str) -> bool {
        self.year == year && self.event_name == event_name
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Label {
    Text(String),
    Integer(i64),
}

// Index builders write the season as an integer column, which some API
// versions forward as a JSON number.
fn label_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Label::deserialize(deserializer)? {
        Label::Text(text) => text,
        Label::Integer(value) => value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_wire_format() {
        let record: SessionRecord = serde_json::from_str(
            r#"{"session_id":"2023_Monaco_Grand_Prix_R","year":"2023","event_name":"Monaco Grand Prix","event_date":"2023-05-28","session_type":"Race","sid":"R"}"#,
        )
        .unwrap();
        assert_eq!(
            record,
            SessionRecord::new("2023", "Monaco Grand Prix", "Race", "2023_Monaco_Grand_Prix_R")
        );
    }

    #[test]
    fn test_legacy_wire_format() {
        let record: SessionRecord = serde_json::from_str(
            r#"{"Season":"2022","Round":"Spa","Session":"Qualifying","SessionID":"Q7"}"#,
        )
        .unwrap();
        assert_eq!(record, SessionRecord::new("2022", "Spa", "Qualifying", "Q7"));
    }

    #[test]
    fn test_camel_case_and_numeric_year() {
        let record: SessionRecord = serde_json::from_str(
            r#"{"year":2021,"eventName":"Imola","sessionType":"Sprint","sessionId":"S1"}"#,
        )
        .unwrap();
        assert_eq!(record.year, "2021");
        assert_eq!(record.session_id, "S1");
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let result = serde_json::from_str::<SessionRecord>(
            r#"{"year":"2021","event_name":"Imola","session_type":"Sprint"}"#,
        );
        assert!(result.is_err());
    }
}
