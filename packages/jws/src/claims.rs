//! Claims set payload representation.

use crate::error::{JwtError, JwtResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::Error as _};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Issuer claim name
pub const ISSUER: &str = "iss";
/// Subject claim name
pub const SUBJECT: &str = "sub";
/// Audience claim name
pub const AUDIENCE: &str = "aud";
/// Expiration time claim name
pub const EXPIRES: &str = "exp";
/// Not-before claim name
pub const NOT_BEFORE: &str = "nbf";
/// Issued-at claim name
pub const ISSUED: &str = "iat";
/// JWT ID claim name
pub const ID: &str = "jti";

const REGISTERED_NAMES: [&str; 7] = [ISSUER, SUBJECT, AUDIENCE, EXPIRES, NOT_BEFORE, ISSUED, ID];

// Largest magnitude below which every integer is exact in an f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Seconds since 1970-01-01T00:00:00Z UTC, ignoring leap seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct NumericTime(f64);

impl NumericTime {
    /// Wrap a raw number of seconds. No validation happens here; non-finite
    /// values are rejected when the claims get serialized.
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// Representation of `t`, or `None` when `t` lies outside the range of
    /// nanosecond timestamps (roughly years 1677 through 2262).
    #[must_use]
    pub fn new(t: DateTime<Utc>) -> Option<Self> {
        t.timestamp_nanos_opt().map(|n| Self(n as f64 / 1e9))
    }

    /// Seconds since the epoch
    #[inline]
    #[must_use]
    pub const fn secs(self) -> f64 {
        self.0
    }

    /// Calendar time, or `None` for non-finite or out-of-range values.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let nanos = (self.0 * 1e9).round();
        if !(nanos.is_finite() && nanos >= i64::MIN as f64 && nanos < i64::MAX as f64) {
            return None;
        }
        let nanos = nanos as i64;
        let subsec = u32::try_from(nanos.rem_euclid(1_000_000_000)).ok()?;
        DateTime::from_timestamp(nanos.div_euclid(1_000_000_000), subsec)
    }
}

impl From<f64> for NumericTime {
    fn from(secs: f64) -> Self {
        Self(secs)
    }
}

/// RFC 3339 in UTC; the fraction has trailing zeros trimmed and is omitted
/// on whole seconds.
impl fmt::Display for NumericTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(t) = self.to_datetime() else {
            return write!(f, "{}", self.0);
        };
        write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S"))?;
        let nanos = t.timestamp_subsec_nanos();
        if nanos != 0 {
            let fraction = format!("{nanos:09}");
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }
        f.write_str("Z")
    }
}

impl Serialize for NumericTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !self.0.is_finite() {
            return Err(S::Error::custom(format!(
                "numeric time {} is not representable in JSON",
                self.0
            )));
        }
        if self.0.fract() == 0.0 && self.0.abs() < MAX_EXACT_INTEGER {
            return serializer.serialize_i64(self.0 as i64);
        }
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for NumericTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self)
    }
}

/// The IANA registered "JSON Web Token Claims".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registered {
    /// Principal that issued the token
    pub issuer: Option<String>,
    /// Principal that is the subject of the token
    pub subject: Option<String>,
    /// Recipients the token is intended for
    pub audiences: Vec<String>,
    /// Time on or after which the token must not be accepted
    pub expires: Option<NumericTime>,
    /// Time before which the token must not be accepted
    pub not_before: Option<NumericTime>,
    /// Time at which the token was issued
    pub issued: Option<NumericTime>,
    /// Unique identifier for the token
    pub id: Option<String>,
}

/// Claims set payload.
///
/// For signing, fill [`Claims::registered`] and [`Claims::set`] freely. Claims
/// returned by verification carry the complete payload object in `set`
/// (registered names included) and the exact payload bytes in [`Claims::raw`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims {
    /// Registered claims
    pub registered: Registered,
    /// Claims mapped by name
    pub set: Map<String, Value>,
    raw: Vec<u8>,
}

impl Claims {
    /// Empty claims set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the issuer
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.registered.issuer = Some(issuer.into());
        self
    }

    /// Set the subject
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.registered.subject = Some(subject.into());
        self
    }

    /// Set the audiences
    #[must_use]
    pub fn with_audiences<I, S>(mut self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registered.audiences = audiences.into_iter().map(Into::into).collect();
        self
    }

    /// Set the expiration time
    #[must_use]
    pub fn with_expires(mut self, expires: impl Into<NumericTime>) -> Self {
        self.registered.expires = Some(expires.into());
        self
    }

    /// Set the not-before time
    #[must_use]
    pub fn with_not_before(mut self, not_before: impl Into<NumericTime>) -> Self {
        self.registered.not_before = Some(not_before.into());
        self
    }

    /// Set the issued-at time
    #[must_use]
    pub fn with_issued(mut self, issued: impl Into<NumericTime>) -> Self {
        self.registered.issued = Some(issued.into());
        self
    }

    /// Set the token identifier
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.registered.id = Some(id.into());
        self
    }

    /// Add a claim to the set
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set.insert(name.into(), value);
        self
    }

    /// Serialize `value` into the claims set under `name`.
    ///
    /// # Errors
    /// [`JwtError::Encoding`] when `value` has no JSON representation.
    pub fn insert<T: Serialize + ?Sized>(&mut self, name: impl Into<String>, value: &T) -> JwtResult<()> {
        let value = serde_json::to_value(value)?;
        self.set.insert(name.into(), value);
        Ok(())
    }

    /// The payload JSON this value was parsed from; empty when the claims
    /// were not produced by verification.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Audiences, in token order.
    #[must_use]
    pub fn audiences(&self) -> &[String] {
        &self.registered.audiences
    }

    /// The claim when present and if its representation is a JSON string.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        let registered = match name {
            ISSUER => self.registered.issuer.as_deref(),
            SUBJECT => self.registered.subject.as_deref(),
            ID => self.registered.id.as_deref(),
            _ => None,
        };
        registered.or_else(|| self.set.get(name).and_then(Value::as_str))
    }

    /// The claim when present and if its representation is a JSON number.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        let registered = match name {
            EXPIRES => self.registered.expires,
            NOT_BEFORE => self.registered.not_before,
            ISSUED => self.registered.issued,
            _ => None,
        };
        registered
            .map(NumericTime::secs)
            .or_else(|| self.set.get(name).and_then(Value::as_f64))
    }

    /// The claim as JSON, registered fields taking precedence over the set.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        let registered = match name {
            AUDIENCE => audience_value(&self.registered.audiences),
            EXPIRES => self.registered.expires.and_then(time_value),
            NOT_BEFORE => self.registered.not_before.and_then(time_value),
            ISSUED => self.registered.issued.and_then(time_value),
            _ => self.string(name).map(|s| Value::String(s.to_string())),
        };
        registered.or_else(|| self.set.get(name).cloned())
    }

    /// Whether the claims may be accepted for processing at `at`.
    ///
    /// When `at` has no numeric representation the claims are only accepted
    /// if they carry neither an expiration nor a not-before time.
    #[must_use]
    pub fn valid_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_at_numeric(NumericTime::new(at))
    }

    pub(crate) fn valid_at_numeric(&self, at: Option<NumericTime>) -> bool {
        let Some(now) = at else {
            // with time limits present there is no way to be sure
            return self.registered.not_before.is_none() && self.registered.expires.is_none();
        };
        if self.registered.expires.is_some_and(|exp| exp <= now) {
            return false;
        }
        if self.registered.not_before.is_some_and(|nbf| nbf > now) {
            return false;
        }
        true
    }

    /// Canonical payload JSON: members sorted by name, registered fields
    /// replacing set entries of the same name.
    ///
    /// # Errors
    /// [`JwtError::Encoding`] for non-finite numeric times, set values
    /// without a JSON representation, or a set entry under a registered name
    /// whose JSON type [`Claims::from_json`] would reject.
    pub fn to_json(&self) -> JwtResult<Vec<u8>> {
        let r = &self.registered;
        for (name, unset) in [
            (ISSUER, r.issuer.is_none()),
            (SUBJECT, r.subject.is_none()),
            (AUDIENCE, r.audiences.is_empty()),
            (EXPIRES, r.expires.is_none()),
            (NOT_BEFORE, r.not_before.is_none()),
            (ISSUED, r.issued.is_none()),
            (ID, r.id.is_none()),
        ] {
            if unset {
                check_registered_shape(&self.set, name)?;
            }
        }

        let mut payload: BTreeMap<&str, Value> =
            self.set.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();

        for (name, value) in [(ISSUER, &r.issuer), (SUBJECT, &r.subject), (ID, &r.id)] {
            if let Some(s) = value {
                payload.insert(name, Value::String(s.clone()));
            }
        }
        if let Some(aud) = audience_value(&r.audiences) {
            payload.insert(AUDIENCE, aud);
        }
        for (name, value) in [(EXPIRES, r.expires), (NOT_BEFORE, r.not_before), (ISSUED, r.issued)] {
            if let Some(t) = value {
                payload.insert(name, serde_json::to_value(t)?);
            }
        }

        Ok(serde_json::to_vec(&payload)?)
    }

    /// Parse a payload, keeping `raw` as the claims' raw bytes.
    ///
    /// # Errors
    /// [`JwtError::MalformedToken`] when the payload is not a JSON object or a
    /// registered claim has the wrong JSON type.
    pub fn from_json(raw: &[u8]) -> JwtResult<Self> {
        let set: Map<String, Value> = serde_json::from_slice(raw)
            .map_err(|e| JwtError::malformed(format!("payload is not a JSON object: {e}")))?;

        let registered = Registered {
            issuer: string_claim(&set, ISSUER)?,
            subject: string_claim(&set, SUBJECT)?,
            audiences: audience_claim(&set)?,
            expires: time_claim(&set, EXPIRES)?,
            not_before: time_claim(&set, NOT_BEFORE)?,
            issued: time_claim(&set, ISSUED)?,
            id: string_claim(&set, ID)?,
        };

        Ok(Self {
            registered,
            set,
            raw: raw.to_vec(),
        })
    }

    /// Set entries whose names are not registered claim names.
    pub fn extensions(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.set
            .iter()
            .filter(|(k, _)| !is_registered_name(k))
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Whether `name` is one of the seven registered claim names.
#[must_use]
pub fn is_registered_name(name: &str) -> bool {
    REGISTERED_NAMES.contains(&name)
}

fn audience_value(audiences: &[String]) -> Option<Value> {
    match audiences {
        [] => None,
        [single] => Some(Value::String(single.clone())),
        many => Some(Value::Array(many.iter().cloned().map(Value::String).collect())),
    }
}

fn time_value(t: NumericTime) -> Option<Value> {
    serde_json::to_value(t).ok()
}

// Set entries that reach the payload under a registered name must parse back.
fn check_registered_shape(set: &Map<String, Value>, name: &str) -> JwtResult<()> {
    let parsed = match name {
        AUDIENCE => audience_claim(set).map(drop),
        EXPIRES | NOT_BEFORE | ISSUED => time_claim(set, name).map(drop),
        _ => string_claim(set, name).map(drop),
    };
    parsed.map_err(|e| match e {
        JwtError::MalformedToken(msg) => JwtError::Encoding(msg),
        other => other,
    })
}

fn string_claim(set: &Map<String, Value>, name: &str) -> JwtResult<Option<String>> {
    match set.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(JwtError::malformed(format!("claim {name} is not a string"))),
    }
}

fn time_claim(set: &Map<String, Value>, name: &str) -> JwtResult<Option<NumericTime>> {
    match set.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|secs| Some(NumericTime(secs)))
            .ok_or_else(|| JwtError::malformed(format!("claim {name} is out of range"))),
        Some(_) => Err(JwtError::malformed(format!("claim {name} is not a number"))),
    }
}

fn audience_claim(set: &Map<String, Value>) -> JwtResult<Vec<String>> {
    match set.get(AUDIENCE) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| JwtError::malformed("audience array holds a non-string"))
            })
            .collect(),
        Some(_) => Err(JwtError::malformed(
            "claim aud is neither a string nor an array",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn registered_fields_serialize_in_name_order() {
        let claims = Claims::new()
            .with_subject("joe")
            .with_issuer("issuer")
            .with_expires(1_300_819_380.0)
            .with_claim("admin", json!(true));
        let payload = String::from_utf8(claims.to_json().unwrap()).unwrap();
        assert_eq!(
            payload,
            r#"{"admin":true,"exp":1300819380,"iss":"issuer","sub":"joe"}"#
        );
    }

    #[test]
    fn fractional_time_stays_fractional() {
        let claims = Claims::new().with_issued(1.5);
        assert_eq!(claims.to_json().unwrap(), br#"{"iat":1.5}"#);
    }

    #[test]
    fn registered_fields_override_set() {
        let claims = Claims::new()
            .with_claim(SUBJECT, json!("from-set"))
            .with_subject("from-registered");
        assert_eq!(claims.to_json().unwrap(), br#"{"sub":"from-registered"}"#);
        assert_eq!(claims.string(SUBJECT), Some("from-registered"));
    }

    #[test]
    fn non_finite_time_is_an_encoding_error() {
        for secs in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = Claims::new().with_issued(secs).to_json().unwrap_err();
            assert!(matches!(err, JwtError::Encoding(_)), "{secs}: {err:?}");
        }
    }

    #[test]
    fn audience_forms() {
        let one = Claims::new().with_audiences(["a"]);
        assert_eq!(one.to_json().unwrap(), br#"{"aud":"a"}"#);
        let two = Claims::new().with_audiences(["a", "b"]);
        assert_eq!(two.to_json().unwrap(), br#"{"aud":["a","b"]}"#);

        assert_eq!(Claims::from_json(br#"{"aud":"a"}"#).unwrap().audiences(), ["a"]);
        assert_eq!(
            Claims::from_json(br#"{"aud":["b","a"]}"#).unwrap().audiences(),
            ["b", "a"]
        );
        assert!(Claims::from_json(br#"{"aud":["a",1]}"#).unwrap_err().is_malformed());
        assert!(Claims::from_json(br#"{"aud":{}}"#).unwrap_err().is_malformed());
    }

    #[test]
    fn parse_keeps_raw_and_full_set() {
        let raw = br#"{"iss":"malory","exp":1.25,"scope":["read"]}"#;
        let claims = Claims::from_json(raw).unwrap();
        assert_eq!(claims.raw(), raw);
        assert_eq!(claims.registered.issuer.as_deref(), Some("malory"));
        assert_eq!(claims.registered.expires, Some(NumericTime::from_secs(1.25)));
        assert_eq!(claims.set.get(ISSUER), Some(&json!("malory")));
        assert_eq!(claims.number(EXPIRES), Some(1.25));
        let extensions: Vec<_> = claims.extensions().map(|(k, _)| k).collect();
        assert_eq!(extensions, ["scope"]);
    }

    #[test]
    fn parse_rejects_wrong_shapes() {
        assert!(Claims::from_json(b"[]").unwrap_err().is_malformed());
        assert!(Claims::from_json(b"{").unwrap_err().is_malformed());
        assert!(Claims::from_json(br#"{"sub":5}"#).unwrap_err().is_malformed());
        assert!(Claims::from_json(br#"{"nbf":"soon"}"#).unwrap_err().is_malformed());
    }

    #[test]
    fn null_registered_claims_are_absent() {
        let claims = Claims::from_json(br#"{"exp":null,"sub":null}"#).unwrap();
        assert_eq!(claims.registered, Registered::default());
    }

    #[test]
    fn accessors_check_json_type() {
        let claims = Claims::new()
            .with_claim("n", json!(42))
            .with_claim("s", json!("x"));
        assert_eq!(claims.string("n"), None);
        assert_eq!(claims.number("s"), None);
        assert_eq!(claims.number("n"), Some(42.0));
        assert_eq!(claims.string("absent"), None);
    }

    #[test]
    fn value_reads_registered_fields() {
        let claims = Claims::new().with_audiences(["a", "b"]).with_expires(10.0);
        assert_eq!(claims.value(AUDIENCE), Some(json!(["a", "b"])));
        assert_eq!(claims.value(EXPIRES), Some(json!(10)));
        assert_eq!(claims.value(ISSUER), None);
    }

    #[test]
    fn insert_serializes_values() {
        let mut claims = Claims::new();
        claims.insert("roles", &["admin", "ops"]).unwrap();
        assert_eq!(claims.set.get("roles"), Some(&json!(["admin", "ops"])));

        let mut bad = BTreeMap::new();
        bad.insert((1, 2), "tuple keys have no JSON form");
        let err = claims.insert("bad", &bad).unwrap_err();
        assert!(matches!(err, JwtError::Encoding(_)));
    }

    #[test]
    fn numeric_time_conversions() {
        let t = Utc.with_ymd_and_hms(2009, 2, 13, 23, 31, 30).unwrap();
        let n = NumericTime::new(t).unwrap();
        assert_eq!(n.secs(), 1_234_567_890.0);
        assert_eq!(n.to_datetime(), Some(t));
        assert_eq!(n.to_string(), "2009-02-13T23:31:30Z");
        assert_eq!(NumericTime::from_secs(0.5).to_string(), "1970-01-01T00:00:00.5Z");
        assert_eq!(NumericTime::from_secs(1.25).to_string(), "1970-01-01T00:00:01.25Z");
        assert_eq!(
            NumericTime::from_secs(-0.000_000_001).to_string(),
            "1969-12-31T23:59:59.999999999Z"
        );
        assert_eq!(NumericTime::from_secs(f64::NAN).to_datetime(), None);

        let ancient = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(NumericTime::new(ancient), None);
    }
}
