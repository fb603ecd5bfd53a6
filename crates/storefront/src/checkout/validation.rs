//! Declarative step validation for the checkout form.
//!
//! Each step's requirements are a table of field rules evaluated
//! uniformly, so validation is a pure function of the incoming section:
//! no UI, no draft state, no side effects. The shipping-info table
//! includes the three `*_code` companion fields because the cascading
//! selector can leave a division name set while its code is missing,
//! and an order without division codes is undeliverable.

use serde::{Deserialize, Serialize};

/// Shipping information collected in step one.
///
/// `email` is optional and not re-validated here; the field-level form
/// already checked it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub full_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    pub city_code: String,
    pub district: String,
    pub district_code: String,
    pub ward: String,
    pub ward_code: String,
}

/// A required-field rule: the field's wire name plus its accessor.
struct FieldRule {
    field: &'static str,
    value: fn(&ShippingInfo) -> &str,
}

const SHIPPING_INFO_RULES: &[FieldRule] = &[
    FieldRule {
        field: "full_name",
        value: |i| &i.full_name,
    },
    FieldRule {
        field: "phone",
        value: |i| &i.phone,
    },
    FieldRule {
        field: "address",
        value: |i| &i.address,
    },
    FieldRule {
        field: "city",
        value: |i| &i.city,
    },
    FieldRule {
        field: "city_code",
        value: |i| &i.city_code,
    },
    FieldRule {
        field: "district",
        value: |i| &i.district,
    },
    FieldRule {
        field: "district_code",
        value: |i| &i.district_code,
    },
    FieldRule {
        field: "ward",
        value: |i| &i.ward,
    },
    FieldRule {
        field: "ward_code",
        value: |i| &i.ward_code,
    },
];

/// A single failed field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appears on the wire.
    pub field: &'static str,
    /// Inline message for the field.
    pub message: &'static str,
}

/// The outcome of validating one step section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationReport {
    /// Per-field errors; empty means the section is valid.
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    /// Whether the section passed every rule.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate the shipping-info section.
///
/// Every required field (and each division `*_code` companion) must be
/// non-empty after trimming.
#[must_use]
pub fn validate_shipping_info(info: &ShippingInfo) -> ValidationReport {
    let errors = SHIPPING_INFO_RULES
        .iter()
        .filter(|rule| (rule.value)(info).trim().is_empty())
        .map(|rule| FieldError {
            field: rule.field,
            message: "is required",
        })
        .collect();

    ValidationReport { errors }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete_info() -> ShippingInfo {
        ShippingInfo {
            full_name: "Nguyen Thi Hoa".into(),
            phone: "0901234567".into(),
            email: Some("hoa@example.com".into()),
            address: "12 Hang Gai".into(),
            city: "Ha Noi".into(),
            city_code: "01".into(),
            district: "Hoan Kiem".into(),
            district_code: "002".into(),
            ward: "Hang Trong".into(),
            ward_code: "00070".into(),
        }
    }

    #[test]
    fn test_complete_info_is_valid() {
        assert!(validate_shipping_info(&complete_info()).is_valid());
    }

    #[test]
    fn test_email_is_not_required() {
        let mut info = complete_info();
        info.email = None;
        assert!(validate_shipping_info(&info).is_valid());
    }

    #[test]
    fn test_missing_ward_code_fails() {
        let mut info = complete_info();
        info.ward_code = String::new();

        let report = validate_shipping_info(&info);
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field, "ward_code");
    }

    #[test]
    fn test_whitespace_only_field_fails() {
        let mut info = complete_info();
        info.full_name = "   ".into();
        assert!(!validate_shipping_info(&info).is_valid());
    }

    #[test]
    fn test_empty_section_reports_every_required_field() {
        let report = validate_shipping_info(&ShippingInfo::default());
        assert_eq!(report.errors.len(), SHIPPING_INFO_RULES.len());
        let fields: Vec<_> = report.errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"city_code"));
        assert!(fields.contains(&"district_code"));
        assert!(fields.contains(&"ward_code"));
    }
}
