//! Field validators
//!
//! A validator is a boxed predicate over [`Claims`] that closes over the
//! expected value. Validators are run in order by [`validate_fields`] or a
//! [`ClaimsValidator`]; the first failure is reported and the rest are
//! skipped.

use crate::claims::{AUDIENCE, Claims, ID, ISSUER, SUBJECT};
use crate::error::{JwtError, JwtResult};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Predicate over a claims set
pub type FieldValidator = Box<dyn Fn(&Claims) -> JwtResult<()> + Send + Sync>;

fn string_equals(name: &'static str, expected: String) -> FieldValidator {
    Box::new(move |claims: &Claims| match claims.string(name) {
        None => Err(JwtError::missing_claim(name)),
        Some(actual) if actual == expected => Ok(()),
        Some(_) => Err(JwtError::claim_mismatch(name)),
    })
}

/// Require `iss` to equal `issuer`.
#[must_use]
pub fn issuer_validator(issuer: impl Into<String>) -> FieldValidator {
    string_equals(ISSUER, issuer.into())
}

/// Require `sub` to equal `subject`.
#[must_use]
pub fn subject_validator(subject: impl Into<String>) -> FieldValidator {
    string_equals(SUBJECT, subject.into())
}

/// Require `jti` to equal `id`.
#[must_use]
pub fn id_validator(id: impl Into<String>) -> FieldValidator {
    string_equals(ID, id.into())
}

/// Require `aud` to hold exactly the `expected` set, in any order.
///
/// A token audience that is a subset or a superset of `expected` is
/// rejected.
#[must_use]
pub fn audiences_validator<I, S>(expected: I) -> FieldValidator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut expected: Vec<String> = expected.into_iter().map(Into::into).collect();
    expected.sort_unstable();

    Box::new(move |claims: &Claims| {
        let actual = claims.audiences();
        if actual.is_empty() {
            return Err(JwtError::missing_claim(AUDIENCE));
        }
        if actual.len() != expected.len() {
            return Err(JwtError::claim_mismatch(AUDIENCE));
        }

        let mut actual: Vec<&str> = actual.iter().map(String::as_str).collect();
        actual.sort_unstable();
        if actual.iter().zip(&expected).all(|(a, e)| *a == e.as_str()) {
            Ok(())
        } else {
            Err(JwtError::claim_mismatch(AUDIENCE))
        }
    })
}

/// Require the claim `name` to equal `expected` as a JSON value.
///
/// Numbers compare by JSON representation, so `1` and `1.0` differ.
#[must_use]
pub fn field_validator(name: impl Into<String>, expected: impl Into<Value>) -> FieldValidator {
    let name = name.into();
    let expected = expected.into();
    Box::new(move |claims: &Claims| match claims.value(&name) {
        None => Err(JwtError::missing_claim(&name)),
        Some(actual) if actual == expected => Ok(()),
        Some(_) => Err(JwtError::claim_mismatch(&name)),
    })
}

/// Require the claims to be valid at `at`, see [`Claims::valid_at`].
#[must_use]
pub fn time_validator(at: DateTime<Utc>) -> FieldValidator {
    Box::new(move |claims: &Claims| {
        if claims.valid_at(at) {
            Ok(())
        } else {
            Err(JwtError::Expired)
        }
    })
}

/// Run `validators` in order against `claims`.
///
/// # Errors
/// The error of the first validator that fails.
pub fn validate_fields(claims: &Claims, validators: &[FieldValidator]) -> JwtResult<()> {
    validators.iter().try_for_each(|validate| validate(claims))
}

/// Ordered list of validators, assembled with a builder.
#[derive(Default)]
pub struct ClaimsValidator {
    validators: Vec<FieldValidator>,
}

impl ClaimsValidator {
    /// Create an empty validator, which accepts everything
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the issuer
    #[must_use]
    pub fn with_issuer(self, issuer: impl Into<String>) -> Self {
        self.with(issuer_validator(issuer))
    }

    /// Require the subject
    #[must_use]
    pub fn with_subject(self, subject: impl Into<String>) -> Self {
        self.with(subject_validator(subject))
    }

    /// Require exactly these audiences
    #[must_use]
    pub fn with_audiences<I, S>(self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(audiences_validator(audiences))
    }

    /// Require the token id
    #[must_use]
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with(id_validator(id))
    }

    /// Require a named claim to hold a JSON value
    #[must_use]
    pub fn with_field(self, name: impl Into<String>, expected: impl Into<Value>) -> Self {
        self.with(field_validator(name, expected))
    }

    /// Require validity at `at`
    #[must_use]
    pub fn valid_at(self, at: DateTime<Utc>) -> Self {
        self.with(time_validator(at))
    }

    /// Append a caller supplied check
    #[must_use]
    pub fn with_custom_validator<F>(self, validator: F) -> Self
    where
        F: Fn(&Claims) -> JwtResult<()> + Send + Sync + 'static,
    {
        self.with(Box::new(validator))
    }

    /// Append a prepared validator
    #[must_use]
    pub fn with(mut self, validator: FieldValidator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Number of checks in this validator
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether no checks were added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every check in insertion order.
    ///
    /// # Errors
    /// The error of the first check that fails.
    pub fn validate(&self, claims: &Claims) -> JwtResult<()> {
        validate_fields(claims, &self.validators)
    }
}

impl std::fmt::Debug for ClaimsValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsValidator")
            .field("validators", &self.validators.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims() -> Claims {
        Claims::new()
            .with_issuer("issuer")
            .with_subject("subject")
            .with_id("id-1")
            .with_claim("admin", json!(true))
    }

    #[test]
    fn string_validators_distinguish_missing_from_mismatch() {
        assert!(issuer_validator("issuer")(&claims()).is_ok());
        assert_eq!(
            issuer_validator("other")(&claims()),
            Err(JwtError::ClaimMismatch("iss".to_string()))
        );
        assert_eq!(
            subject_validator("subject")(&Claims::new()),
            Err(JwtError::MissingClaim("sub".to_string()))
        );
        assert!(id_validator("id-1")(&claims()).is_ok());
    }

    #[test]
    fn field_validator_compares_json_values() {
        assert!(field_validator("admin", true)(&claims()).is_ok());
        assert_eq!(
            field_validator("admin", false)(&claims()),
            Err(JwtError::ClaimMismatch("admin".to_string()))
        );
        assert_eq!(
            field_validator("role", "root")(&claims()),
            Err(JwtError::MissingClaim("role".to_string()))
        );
        // registered claims are visible too
        assert!(field_validator("iss", "issuer")(&claims()).is_ok());
    }

    #[test]
    fn empty_audience_is_missing() {
        assert_eq!(
            audiences_validator(["a"])(&Claims::new()),
            Err(JwtError::MissingClaim("aud".to_string()))
        );
    }

    #[test]
    fn builder_runs_checks_in_order() {
        let validator = ClaimsValidator::new()
            .with_subject("nobody")
            .with_issuer("nobody");
        assert_eq!(validator.len(), 2);
        assert_eq!(
            validator.validate(&claims()),
            Err(JwtError::ClaimMismatch("sub".to_string()))
        );
        assert!(ClaimsValidator::new().validate(&claims()).is_ok());
    }

    #[test]
    fn custom_validator_sees_the_claims() {
        let validator = ClaimsValidator::new().with_custom_validator(|c: &Claims| {
            if c.extensions().count() == 1 {
                Ok(())
            } else {
                Err(JwtError::claim_mismatch("extensions"))
            }
        });
        assert!(validator.validate(&claims()).is_ok());
        assert!(validator.validate(&Claims::new()).is_err());
    }
}
