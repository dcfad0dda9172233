//! Customer Details & Validation
//!
//! Validation is pure and cheap so the UI can run it on every keystroke.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Customer and billing fields entered on the checkout form
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl CustomerInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    pub fn field(&self, field: CustomerField) -> &str {
        match field {
            CustomerField::FirstName => &self.first_name,
            CustomerField::LastName => &self.last_name,
            CustomerField::Email => &self.email,
            CustomerField::Phone => &self.phone,
            CustomerField::Address => &self.address,
            CustomerField::City => &self.city,
            CustomerField::State => &self.state,
            CustomerField::ZipCode => &self.zip_code,
            CustomerField::Country => &self.country,
        }
    }
}

/// Checkout form field names
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CustomerField {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    City,
    State,
    ZipCode,
    Country,
}

impl CustomerField {
    pub const ALL: [CustomerField; 9] = [
        CustomerField::FirstName,
        CustomerField::LastName,
        CustomerField::Email,
        CustomerField::Phone,
        CustomerField::Address,
        CustomerField::City,
        CustomerField::State,
        CustomerField::ZipCode,
        CustomerField::Country,
    ];

    /// Wire name, as used for error keys
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerField::FirstName => "firstName",
            CustomerField::LastName => "lastName",
            CustomerField::Email => "email",
            CustomerField::Phone => "phone",
            CustomerField::Address => "address",
            CustomerField::City => "city",
            CustomerField::State => "state",
            CustomerField::ZipCode => "zipCode",
            CustomerField::Country => "country",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CustomerField::FirstName => "First name",
            CustomerField::LastName => "Last name",
            CustomerField::Email => "Email",
            CustomerField::Phone => "Phone",
            CustomerField::Address => "Address",
            CustomerField::City => "City",
            CustomerField::State => "State",
            CustomerField::ZipCode => "ZIP code",
            CustomerField::Country => "Country",
        }
    }
}

/// Field name → message; empty means the form is valid
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<CustomerField, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: CustomerField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: CustomerField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CustomerField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn insert(&mut self, field: CustomerField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(CustomerField::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Validate every field; all are required and `email` must look like
/// `local@domain.tld`.
pub fn validate(customer: &CustomerInfo) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    for field in CustomerField::ALL {
        if customer.field(field).trim().is_empty() {
            errors.insert(field, format!("{} is required", field.label()));
        }
    }

    if !errors.contains(CustomerField::Email) && !is_valid_email(&customer.email) {
        errors.insert(CustomerField::Email, "Please enter a valid email address");
    }

    errors
}

/// Basic shape check: no whitespace, a non-empty local part, and a domain
/// with a dot that has text on both sides.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    !local.is_empty()
        && domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::valid_customer;

    #[test]
    fn test_valid_customer() {
        assert!(validate(&valid_customer()).is_empty());
    }

    #[test]
    fn test_every_field_required() {
        let errors = validate(&CustomerInfo::default());
        assert_eq!(errors.len(), CustomerField::ALL.len());
        assert_eq!(errors.get(CustomerField::ZipCode), Some("ZIP code is required"));
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let mut customer = valid_customer();
        customer.city = "   ".into();
        let errors = validate(&customer);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(CustomerField::City));
    }

    #[test]
    fn test_bad_email_keyed_as_email() {
        let mut customer = valid_customer();
        customer.email = "not-an-email".into();
        let errors = validate(&customer);

        assert_eq!(errors.len(), 1);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["email"], "Please enter a valid email address");
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email(" first.last@sub.example.org "));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn test_validation_is_repeatable() {
        let mut customer = valid_customer();
        customer.phone.clear();
        assert_eq!(validate(&customer), validate(&customer));
    }
}
