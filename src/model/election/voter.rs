use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::StationId;

pub type VoterId = u32;

/// A registered voter, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: VoterId,
    pub first_name: String,
    pub last_name: String,
    pub addr_line_1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr_line_2: Option<String>,
    pub postcode: String,
    pub date_of_birth: NaiveDate,
    pub phone: String,
    /// The station the voter is registered at.
    pub station_id: StationId,
    /// Whether this voter's vote has been used. Only ever goes from false to true.
    #[serde(default)]
    pub used_vote: bool,
    /// Whether this voter currently holds a valid PIN.
    #[serde(default)]
    pub active_pin: bool,
}

impl Voter {
    pub fn flag(&self, flag: VoterFlag) -> bool {
        match flag {
            VoterFlag::UsedVote => self.used_vote,
            VoterFlag::ActivePin => self.active_pin,
        }
    }

    pub fn raise(&mut self, flag: VoterFlag) {
        match flag {
            VoterFlag::UsedVote => self.used_vote = true,
            VoterFlag::ActivePin => self.active_pin = true,
        }
    }
}

impl Display for Voter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// The monotonic boolean flags on a voter record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoterFlag {
    UsedVote,
    ActivePin,
}

impl VoterFlag {
    /// The stored field name.
    pub fn field(self) -> &'static str {
        match self {
            Self::UsedVote => "used_vote",
            Self::ActivePin => "active_pin",
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl Voter {
        pub fn example() -> Self {
            Self {
                id: 1,
                first_name: "James".to_string(),
                last_name: "Bond".to_string(),
                addr_line_1: "007 Spy Street".to_string(),
                addr_line_2: None,
                postcode: "SW7 3BH".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1970, 7, 7).unwrap(),
                phone: "+447654353205".to_string(),
                station_id: 1,
                used_vote: false,
                active_pin: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_full_name() {
        assert_eq!(Voter::example().to_string(), "James Bond");
    }

    #[test]
    fn flags_default_to_false() {
        let json = r#"{
            "_id": 9,
            "first_name": "Eve",
            "last_name": "Polastri",
            "addr_line_1": "1 Canal Road",
            "postcode": "DN14 5AA",
            "date_of_birth": "1980-01-02",
            "phone": "+447700900000",
            "station_id": 2
        }"#;
        let voter: Voter = rocket::serde::json::from_str(json).unwrap();
        assert!(!voter.used_vote);
        assert!(!voter.active_pin);
        assert_eq!(voter.addr_line_2, None);
    }

    #[test]
    fn raising_a_flag_leaves_the_other() {
        let mut voter = Voter::example();
        voter.raise(VoterFlag::ActivePin);
        assert!(voter.flag(VoterFlag::ActivePin));
        assert!(!voter.flag(VoterFlag::UsedVote));

        voter.raise(VoterFlag::ActivePin);
        assert!(voter.active_pin);
    }
}
