//! Aggregate roots for the Address context.

use serde::{Deserialize, Serialize};
use vivah_core::error::DomainError;

/// Maximum length of the city, state and country fields.
pub const MAX_REGION_LEN: usize = 100;

/// Maximum length of the street field.
pub const MAX_STREET_LEN: usize = 255;

/// A postal address owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Identifier assigned by the primary store.
    pub id: i64,
    /// The owning user.
    pub user_id: i64,
    /// Street line, if given.
    pub street: Option<String>,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Country.
    pub country: String,
}

impl Address {
    /// Builds an address from an id, its owner and validated fields.
    #[must_use]
    pub fn new(id: i64, user_id: i64, fields: AddressFields) -> Self {
        Self {
            id,
            user_id,
            street: fields.street,
            city: fields.city,
            state: fields.state,
            country: fields.country,
        }
    }

    /// Overwrites the mutable fields. The id and owner never change.
    pub fn apply_fields(&mut self, fields: AddressFields) {
        self.street = fields.street;
        self.city = fields.city;
        self.state = fields.state;
        self.country = fields.country;
    }
}

/// The mutable part of an address, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFields {
    street: Option<String>,
    city: String,
    state: String,
    country: String,
}

impl AddressFields {
    /// Trims and validates raw input.
    ///
    /// A blank street is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if city, state or country is empty
    /// or if any field exceeds its maximum length.
    pub fn new(
        street: Option<&str>,
        city: &str,
        state: &str,
        country: &str,
    ) -> Result<Self, DomainError> {
        let street = street.map(str::trim).filter(|s| !s.is_empty());
        if let Some(street) = street {
            check_len("street", street, MAX_STREET_LEN)?;
        }

        Ok(Self {
            street: street.map(str::to_owned),
            city: required("city", city)?,
            state: required("state", state)?,
            country: required("country", country)?,
        })
    }

    /// Street line, if given.
    #[must_use]
    pub fn street(&self) -> Option<&str> {
        self.street.as_deref()
    }

    /// City.
    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    /// State or province.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Country.
    #[must_use]
    pub fn country(&self) -> &str {
        &self.country
    }
}

fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be empty")));
    }
    check_len(field, value, MAX_REGION_LEN)?;
    Ok(value.to_owned())
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_trim_input_and_drop_blank_street() {
        // Act
        let fields = AddressFields::new(Some("   "), " Pune ", "MH", "India").unwrap();

        // Assert
        assert_eq!(fields.street(), None);
        assert_eq!(fields.city(), "Pune");
        assert_eq!(fields.state(), "MH");
        assert_eq!(fields.country(), "India");
    }

    #[test]
    fn test_fields_reject_empty_city() {
        let result = AddressFields::new(None, "", "MH", "India");

        match result {
            Err(DomainError::Validation(msg)) => assert_eq!(msg, "city must not be empty"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_fields_reject_blank_country() {
        let result = AddressFields::new(None, "Pune", "MH", "  ");

        match result {
            Err(DomainError::Validation(msg)) => assert_eq!(msg, "country must not be empty"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_fields_reject_overlong_state() {
        let state = "x".repeat(MAX_REGION_LEN + 1);

        let result = AddressFields::new(None, "Pune", &state, "India");

        match result {
            Err(DomainError::Validation(msg)) => {
                assert_eq!(msg, "state must be at most 100 characters");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_fields_reject_overlong_street() {
        let street = "s".repeat(MAX_STREET_LEN + 1);

        let result = AddressFields::new(Some(&street), "Pune", "MH", "India");

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_apply_fields_keeps_id_and_owner() {
        // Arrange
        let mut address = Address::new(
            1,
            5,
            AddressFields::new(None, "Pune", "MH", "India").unwrap(),
        );

        // Act
        address.apply_fields(AddressFields::new(Some("MG Road"), "Mumbai", "MH", "India").unwrap());

        // Assert
        assert_eq!(address.id, 1);
        assert_eq!(address.user_id, 5);
        assert_eq!(address.street.as_deref(), Some("MG Road"));
        assert_eq!(address.city, "Mumbai");
    }
}
