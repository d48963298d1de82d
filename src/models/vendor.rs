use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// One criterion score as it appears in the snapshot.
///
/// `null`, a missing key and the placeholder `"-"` all mean the score is
/// absent. Absent is never treated as zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScoreValue {
    Number(f64),
    Text(String),
    #[default]
    Absent,
}

/// Borrowed view of a sortable column value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
    Absent,
}

impl ScoreValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, ScoreValue::Absent)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScoreValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_field(&self) -> FieldValue<'_> {
        match self {
            ScoreValue::Number(n) => FieldValue::Number(*n),
            ScoreValue::Text(s) => FieldValue::Text(s),
            ScoreValue::Absent => FieldValue::Absent,
        }
    }

    /// Cell text; absent scores show the placeholder dash
    pub fn display(&self) -> String {
        match self {
            ScoreValue::Number(n) => n.to_string(),
            ScoreValue::Text(s) => s.clone(),
            ScoreValue::Absent => "-".to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for ScoreValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(ScoreValue::Absent),
            Value::Number(n) => n
                .as_f64()
                .map(ScoreValue::Number)
                .ok_or_else(|| de::Error::custom("score is not representable as f64")),
            Value::String(s) if s.trim() == "-" => Ok(ScoreValue::Absent),
            Value::String(s) => Ok(ScoreValue::Text(s)),
            Value::Bool(b) => Ok(ScoreValue::Text(b.to_string())),
            other => Err(de::Error::custom(format!("unexpected score value {}", other))),
        }
    }
}

impl Serialize for ScoreValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScoreValue::Number(n) => serializer.serialize_f64(*n),
            ScoreValue::Text(s) => serializer.serialize_str(s),
            ScoreValue::Absent => serializer.serialize_none(),
        }
    }
}

/// A ranked döner shop with its criterion scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRecord {
    pub name: String,
    #[serde(default)]
    pub preis: ScoreValue,
    #[serde(default)]
    pub geschmack: ScoreValue,
    #[serde(default, rename = "präsentation")]
    pub praesentation: ScoreValue,
    #[serde(default, rename = "übereinstimmung bestellung")]
    pub bestellung: ScoreValue,
    #[serde(default)]
    pub menge: ScoreValue,
    #[serde(default)]
    pub service: ScoreValue,
    #[serde(default)]
    pub ambiente: ScoreValue,
    #[serde(default)]
    pub layering: ScoreValue,
    #[serde(default)]
    pub zeit: ScoreValue,
    #[serde(default)]
    pub fleisch: ScoreValue,
    #[serde(default)]
    pub brot: ScoreValue,
    #[serde(default, rename = "gemüse")]
    pub gemuese: ScoreValue,
    #[serde(default)]
    pub sauce: ScoreValue,
    #[serde(default)]
    pub gesamt: ScoreValue,
    /// Reviewer note shown in the detail dialog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kommentar: Option<String>,
}

impl VendorRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preis: ScoreValue::Absent,
            geschmack: ScoreValue::Absent,
            praesentation: ScoreValue::Absent,
            bestellung: ScoreValue::Absent,
            menge: ScoreValue::Absent,
            service: ScoreValue::Absent,
            ambiente: ScoreValue::Absent,
            layering: ScoreValue::Absent,
            zeit: ScoreValue::Absent,
            fleisch: ScoreValue::Absent,
            brot: ScoreValue::Absent,
            gemuese: ScoreValue::Absent,
            sauce: ScoreValue::Absent,
            gesamt: ScoreValue::Absent,
            kommentar: None,
        }
    }

    pub fn score(&self, key: SortKey) -> Option<&ScoreValue> {
        let score = match key {
            SortKey::Name => return None,
            SortKey::Price => &self.preis,
            SortKey::Taste => &self.geschmack,
            SortKey::Presentation => &self.praesentation,
            SortKey::OrderMatch => &self.bestellung,
            SortKey::Quantity => &self.menge,
            SortKey::Service => &self.service,
            SortKey::Ambience => &self.ambiente,
            SortKey::Layering => &self.layering,
            SortKey::Time => &self.zeit,
            SortKey::Meat => &self.fleisch,
            SortKey::Bread => &self.brot,
            SortKey::Vegetables => &self.gemuese,
            SortKey::Sauce => &self.sauce,
            SortKey::Overall => &self.gesamt,
        };
        Some(score)
    }

    pub fn value(&self, key: SortKey) -> FieldValue<'_> {
        match self.score(key) {
            Some(score) => score.as_field(),
            None => FieldValue::Text(&self.name),
        }
    }

    /// Cell text for one column; the overall score always shows one decimal
    pub fn display(&self, key: SortKey) -> String {
        match (key, self.score(key)) {
            (SortKey::Name, _) | (_, None) => self.name.clone(),
            (SortKey::Overall, Some(ScoreValue::Number(n))) => format!("{:.1}", n),
            (SortKey::Overall, Some(_)) => "-".to_string(),
            (_, Some(score)) => score.display(),
        }
    }
}

/// Sortable columns of the ranking table, tagged by their snapshot key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    Price,
    Taste,
    Presentation,
    OrderMatch,
    Quantity,
    Service,
    Ambience,
    Layering,
    Time,
    Meat,
    Bread,
    Vegetables,
    Sauce,
    Overall,
}

impl SortKey {
    /// Column order of the rendered table
    pub const ALL: [SortKey; 15] = [
        SortKey::Name,
        SortKey::Price,
        SortKey::Taste,
        SortKey::Presentation,
        SortKey::OrderMatch,
        SortKey::Quantity,
        SortKey::Service,
        SortKey::Ambience,
        SortKey::Layering,
        SortKey::Time,
        SortKey::Meat,
        SortKey::Bread,
        SortKey::Vegetables,
        SortKey::Sauce,
        SortKey::Overall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Price => "preis",
            SortKey::Taste => "geschmack",
            SortKey::Presentation => "präsentation",
            SortKey::OrderMatch => "übereinstimmung bestellung",
            SortKey::Quantity => "menge",
            SortKey::Service => "service",
            SortKey::Ambience => "ambiente",
            SortKey::Layering => "layering",
            SortKey::Time => "zeit",
            SortKey::Meat => "fleisch",
            SortKey::Bread => "brot",
            SortKey::Vegetables => "gemüse",
            SortKey::Sauce => "sauce",
            SortKey::Overall => "gesamt",
        }
    }

    /// Column header label
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::Price => "Preis",
            SortKey::Taste => "Geschmack",
            SortKey::Presentation => "Präsentation",
            SortKey::OrderMatch => "Bestellung",
            SortKey::Quantity => "Menge",
            SortKey::Service => "Service",
            SortKey::Ambience => "Ambiente",
            SortKey::Layering => "Layering",
            SortKey::Time => "Zeit",
            SortKey::Meat => "Fleisch",
            SortKey::Bread => "Brot",
            SortKey::Vegetables => "Gemüse",
            SortKey::Sauce => "Sauce",
            SortKey::Overall => "Gesamt",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SortKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| AppError::Validation(format!("Unknown sort key: {}", s)))
    }
}

impl Serialize for SortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
