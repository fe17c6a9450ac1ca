use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// The payload returned by a successful upload.
///
/// Its shape is up to the server; the only requirement is that it is a JSON object. The keys that
/// the finance coach server normally sends are available through accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadReceipt(Map<String, Value>);

impl UploadReceipt {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn message(&self) -> Option<&str> {
        self.get("message").and_then(Value::as_str)
    }

    pub fn total_transactions(&self) -> Option<u64> {
        self.get("total_transactions").and_then(Value::as_u64)
    }

    pub fn processed_transactions(&self) -> Option<u64> {
        self.get("processed_transactions").and_then(Value::as_u64)
    }

    pub fn skipped_duplicates(&self) -> Option<u64> {
        self.get("skipped_duplicates").and_then(Value::as_u64)
    }
}

impl Display for UploadReceipt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message().unwrap_or("Upload complete"))?;
        if let Some(processed) = self.processed_transactions() {
            write!(f, ": {processed} transactions imported")?;
            if let Some(skipped) = self.skipped_duplicates().filter(|n| *n > 0) {
                write!(f, ", {skipped} duplicates skipped")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_summary() {
        let json = r#"{
            "message": "Transactions uploaded successfully",
            "total_transactions": 20,
            "processed_transactions": 18,
            "skipped_duplicates": 2
        }"#;
        let receipt: UploadReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(Some(20), receipt.total_transactions());
        assert_eq!(
            "Transactions uploaded successfully: 18 transactions imported, 2 duplicates skipped",
            receipt.to_string()
        );
    }

    #[test]
    fn test_receipt_arbitrary_object() {
        let receipt: UploadReceipt = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(Some("abc"), receipt.get("id").and_then(Value::as_str));
        assert_eq!("Upload complete", receipt.to_string());
    }

    #[test]
    fn test_receipt_must_be_object() {
        assert!(serde_json::from_str::<UploadReceipt>("[1, 2]").is_err());
        assert!(serde_json::from_str::<UploadReceipt>("\"ok\"").is_err());
    }
}
