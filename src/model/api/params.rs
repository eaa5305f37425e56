use std::fmt::{Display, Formatter};
use std::ops::Deref;

use once_cell::sync::Lazy;
use regex::Regex;
use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};
use thiserror::Error;

/// UK postcode format, including the special `GIR 0AA`.
static POSTCODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "(?i)^(GIR ?0AA|[A-PR-UWYZ]([0-9]{1,2}|([A-HK-Y][0-9]([0-9ABEHMNPRV-Y])?)|[0-9][A-HJKPS-UW]) ?[0-9][ABD-HJLNP-UW-Z]{2})$",
    )
    .expect("postcode pattern is valid")
});

/// Longest PIN accepted in a path.
pub const MAX_PIN_LENGTH: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("Voter name must be one or more ASCII letters: {0:?}")]
    Name(String),
    #[error("Not a UK postcode: {0:?}")]
    Postcode(String),
    #[error("PIN must be 1 to {} digits", MAX_PIN_LENGTH)]
    Pin,
}

/// A first-name filter: an unanchored, case-insensitive substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterName(String);

impl VoterName {
    pub fn parse(name: &str) -> Result<Self, ParamError> {
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(name.to_string()))
        } else {
            Err(ParamError::Name(name.to_string()))
        }
    }
}

/// A UK postcode filter, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postcode(String);

impl Postcode {
    pub fn parse(postcode: &str) -> Result<Self, ParamError> {
        if POSTCODE.is_match(postcode) {
            Ok(Self(postcode.to_string()))
        } else {
            Err(ParamError::Postcode(postcode.to_string()))
        }
    }
}

/// A voter PIN as typed at a booth.
#[derive(Clone, PartialEq, Eq)]
pub struct PinCode(String);

impl PinCode {
    pub fn parse(pin: &str) -> Result<Self, ParamError> {
        if (1..=MAX_PIN_LENGTH).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(pin.to_string()))
        } else {
            Err(ParamError::Pin)
        }
    }
}

impl std::fmt::Debug for PinCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PinCode(***)")
    }
}

macro_rules! string_param {
    ($($ty:ident),*) => {
        $(
            impl Deref for $ty {
                type Target = str;

                fn deref(&self) -> &Self::Target {
                    &self.0
                }
            }

            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl<'a> FromParam<'a> for $ty {
                type Error = ParamError;

                fn from_param(param: &'a str) -> Result<Self, Self::Error> {
                    Self::parse(param)
                }
            }

            impl UriDisplay<Path> for $ty {
                fn fmt(&self, f: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
                    f.write_value(&self.0)
                }
            }

            impl_from_uri_param_identity!([Path] $ty);
        )*
    };
}

string_param!(VoterName, Postcode, PinCode);
