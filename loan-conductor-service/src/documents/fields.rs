use std::collections::BTreeMap;
use step_flow::DocumentCategory;

/// Fields "extracted" from a verified document. Canned per category; other
/// categories extract nothing.
pub fn mock_fields(category: &DocumentCategory) -> BTreeMap<String, String> {
    let pairs: &[(&str, &str)] = match category {
        DocumentCategory::IdentityDocument => &[
            ("name", "John Doe"),
            ("dob", "1990-01-01"),
            ("aadhaarNumber", "XXXX XXXX 1234"),
            ("address", "123 Main St, Anytown"),
        ],
        DocumentCategory::TaxIdentityDocument => &[
            ("name", "John Doe"),
            ("panNumber", "ABCDE1234F"),
            ("dob", "1990-01-01"),
        ],
        DocumentCategory::IncomeProof => &[
            ("employerName", "ABC Company"),
            ("income", "₹50,000"),
            ("period", "Monthly"),
        ],
        DocumentCategory::Other(_) => &[],
    };

    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pan_card_fields() {
        let fields = mock_fields(&DocumentCategory::TaxIdentityDocument);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["panNumber"], "ABCDE1234F");
    }

    #[test]
    fn unknown_category_extracts_nothing() {
        assert!(mock_fields(&DocumentCategory::Other("Utility Bill".into())).is_empty());
    }
}
