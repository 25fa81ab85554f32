//! Input validation for Dialer.
//!
//! This module provides validation functions for all user inputs.
//! All validators return DialerError::Validation on failure.

use crate::error::{DialerError, DialerResult};
use crate::models::{Contact, NewContact};
use crate::phone::format_phone_number;

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_NUMBER_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 320;
pub const MAX_OCCUPATION_LENGTH: usize = 200;
pub const MAX_NOTES_LENGTH: usize = 10_000;
pub const MAX_SEARCH_QUERY_LENGTH: usize = 500;

fn check_length(value: &str, field_name: &str, max: usize) -> DialerResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(DialerError::validation(
            field_name,
            format!("cannot exceed {} characters (got {})", max, len),
        ));
    }
    Ok(())
}

/// Validate a contact name, returning it trimmed.
pub fn validate_contact_name(name: &str) -> DialerResult<String> {
    let stripped = name.trim();

    if stripped.is_empty() {
        return Err(DialerError::validation(
            "name",
            "cannot be empty or whitespace only",
        ));
    }
    check_length(stripped, "name", MAX_NAME_LENGTH)?;

    Ok(stripped.to_string())
}

/// Validate a phone number, returning it trimmed and in canonical form.
///
/// No digit-count check is applied: anything that is not exactly ten digits
/// is stored as entered.
pub fn validate_phone_number(number: &str) -> DialerResult<String> {
    let stripped = number.trim();

    if stripped.is_empty() {
        return Err(DialerError::validation(
            "number",
            "cannot be empty or whitespace only",
        ));
    }
    check_length(stripped, "number", MAX_NUMBER_LENGTH)?;

    Ok(format_phone_number(stripped))
}

/// Trim an optional free-text field. Blank values become `None`.
pub fn validate_optional_text(
    value: Option<&str>,
    field_name: &str,
    max: usize,
) -> DialerResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => {
            check_length(text, field_name, max)?;
            Ok(Some(text.to_string()))
        }
    }
}

/// Validate an email address (optional).
///
/// Only a loose shape check: one `@` with something on both sides.
pub fn validate_email(email: Option<&str>) -> DialerResult<Option<String>> {
    let email = validate_optional_text(email, "email", MAX_EMAIL_LENGTH)?;
    if let Some(ref addr) = email {
        match addr.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => {
                return Err(DialerError::validation(
                    "email",
                    format!("'{}' is not an email address", addr),
                ))
            }
        }
    }
    Ok(email)
}

/// Validate a search query.
pub fn validate_search_query(query: &str) -> DialerResult<()> {
    check_length(query, "query", MAX_SEARCH_QUERY_LENGTH)
}

/// Normalise the fields of a contact about to be created.
pub fn validate_new_contact(fields: NewContact) -> DialerResult<NewContact> {
    Ok(NewContact {
        name: validate_contact_name(&fields.name)?,
        number: validate_phone_number(&fields.number)?,
        email: validate_email(fields.email.as_deref())?,
        occupation: validate_optional_text(
            fields.occupation.as_deref(),
            "occupation",
            MAX_OCCUPATION_LENGTH,
        )?,
        notes: validate_optional_text(fields.notes.as_deref(), "notes", MAX_NOTES_LENGTH)?,
        avatar: fields.avatar.filter(|a| !a.trim().is_empty()),
    })
}

/// Normalise an edited contact, keeping its id.
pub fn validate_contact(contact: Contact) -> DialerResult<Contact> {
    let id = contact.id;
    let fields = validate_new_contact(NewContact {
        name: contact.name,
        number: contact.number,
        email: contact.email,
        occupation: contact.occupation,
        notes: contact.notes,
        avatar: contact.avatar,
    })?;
    Ok(Contact::from_new(id, fields))
}
