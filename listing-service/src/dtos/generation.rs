use serde::{Deserialize, Serialize};
use std::fmt;

/// A listing attribute the form may send either as text or as a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Number(_) => false,
            FieldValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s.trim()),
        }
    }
}

/// Body of `POST /api/generate`. Every field is optional; absent or blank
/// fields are left out of the prompt.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub platform: Option<String>,
    pub tone: Option<String>,
    pub property_type: Option<String>,
    pub address: Option<String>,
    pub price: Option<FieldValue>,
    pub bedrooms: Option<FieldValue>,
    pub bathrooms: Option<FieldValue>,
    pub square_feet: Option<FieldValue>,
    pub lot_size: Option<FieldValue>,
    pub year_built: Option<FieldValue>,
    pub features: Option<String>,
    pub neighborhood: Option<String>,
    pub target_audience: Option<String>,
    pub call_to_action: Option<String>,
    pub additional_details: Option<String>,
    pub include_hashtags: Option<bool>,
    pub include_emojis: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub variations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numbers_and_strings_for_numeric_fields() {
        let req: GenerationRequest = serde_json::from_str(
            r#"{"price": 450000, "bedrooms": "3", "squareFeet": 1850.5, "includeHashtags": true}"#,
        )
        .unwrap();

        assert_eq!(req.price.unwrap().to_string(), "450000");
        assert_eq!(req.bedrooms.unwrap().to_string(), "3");
        assert_eq!(req.square_feet.unwrap().to_string(), "1850.5");
        assert_eq!(req.include_hashtags, Some(true));
        assert!(req.platform.is_none());
    }

    #[test]
    fn empty_body_is_a_valid_request() {
        let req: GenerationRequest = serde_json::from_str("{}").unwrap();
        assert!(req.address.is_none());
        assert!(req.include_emojis.is_none());
    }

    #[test]
    fn whitespace_text_is_blank() {
        assert!(FieldValue::Text("   ".into()).is_blank());
        assert!(!FieldValue::Text("2".into()).is_blank());
    }
}
