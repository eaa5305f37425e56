use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::election::{
    Candidate, CandidateId, Constituency, ConstituencyId, IssuedPin, Party, PartyId, Station,
    StationId, Voter, VoterId,
};

/// A complete, serialisable copy of the election data, used to seed and
/// inspect a [`super::MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub constituencies: Vec<Constituency>,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub voters: Vec<Voter>,
    #[serde(default)]
    pub parties: Vec<Party>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub pins: Vec<IssuedPin>,
}

impl Snapshot {
    /// Check every cross-reference, as [`super::MemoryStore::from_snapshot`] does.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        Tables::try_from(self.clone()).map(|_| ())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Duplicate {0} ID {1}")]
    DuplicateId(&'static str, u32),
    #[error("Station {0} references unknown constituency {1}")]
    StationConstituency(StationId, ConstituencyId),
    #[error("Voter {0} references unknown station {1}")]
    VoterStation(VoterId, StationId),
    #[error("Candidate {0} references unknown constituency {1}")]
    CandidateConstituency(CandidateId, ConstituencyId),
    #[error("Candidate {0} references unknown party {1}")]
    CandidateParty(CandidateId, PartyId),
    #[error("PIN issued to unknown voter {0}")]
    PinVoter(VoterId),
    #[error("PIN code issued to more than one voter")]
    DuplicatePin,
}

/// Indexed, validated election data.
#[derive(Debug, Default)]
pub(super) struct Tables {
    pub constituencies: BTreeMap<ConstituencyId, Constituency>,
    pub stations: BTreeMap<StationId, Station>,
    pub voters: BTreeMap<VoterId, Voter>,
    pub parties: BTreeMap<PartyId, Party>,
    pub candidates: BTreeMap<CandidateId, Candidate>,
    pub pins: BTreeMap<VoterId, IssuedPin>,
}

fn index<T>(
    kind: &'static str,
    items: Vec<T>,
    id: impl Fn(&T) -> u32,
) -> Result<BTreeMap<u32, T>, SnapshotError> {
    let mut map = BTreeMap::new();
    for item in items {
        let key = id(&item);
        if map.insert(key, item).is_some() {
            return Err(SnapshotError::DuplicateId(kind, key));
        }
    }
    Ok(map)
}

impl TryFrom<Snapshot> for Tables {
    type Error = SnapshotError;

    fn try_from(snapshot: Snapshot) -> Result<Self, Self::Error> {
        let tables = Self {
            constituencies: index("constituency", snapshot.constituencies, |c| c.id)?,
            stations: index("station", snapshot.stations, |s| s.id)?,
            voters: index("voter", snapshot.voters, |v| v.id)?,
            parties: index("party", snapshot.parties, |p| p.id)?,
            candidates: index("candidate", snapshot.candidates, |c| c.id)?,
            pins: index("PIN", snapshot.pins, |p| p.voter_id)?,
        };

        for station in tables.stations.values() {
            if !tables.constituencies.contains_key(&station.constituency_id) {
                return Err(SnapshotError::StationConstituency(
                    station.id,
                    station.constituency_id,
                ));
            }
        }
        for voter in tables.voters.values() {
            if !tables.stations.contains_key(&voter.station_id) {
                return Err(SnapshotError::VoterStation(voter.id, voter.station_id));
            }
        }
        for candidate in tables.candidates.values() {
            if !tables.constituencies.contains_key(&candidate.constituency_id) {
                return Err(SnapshotError::CandidateConstituency(
                    candidate.id,
                    candidate.constituency_id,
                ));
            }
            if !tables.parties.contains_key(&candidate.party_id) {
                return Err(SnapshotError::CandidateParty(candidate.id, candidate.party_id));
            }
        }
        let mut codes = HashSet::new();
        for pin in tables.pins.values() {
            if !tables.voters.contains_key(&pin.voter_id) {
                return Err(SnapshotError::PinVoter(pin.voter_id));
            }
            if !codes.insert(pin.code.as_str()) {
                return Err(SnapshotError::DuplicatePin);
            }
        }

        Ok(tables)
    }
}

impl From<&Tables> for Snapshot {
    fn from(tables: &Tables) -> Self {
        Self {
            constituencies: tables.constituencies.values().cloned().collect(),
            stations: tables.stations.values().cloned().collect(),
            voters: tables.voters.values().cloned().collect(),
            parties: tables.parties.values().cloned().collect(),
            candidates: tables.candidates.values().cloned().collect(),
            pins: tables.pins.values().cloned().collect(),
        }
    }
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use chrono::NaiveDate;

    use super::*;

    pub const RICHMOND_PARK: ConstituencyId = 1;
    pub const BRIGG_AND_GOOLE: ConstituencyId = 2;
    pub const UNCONTESTED: ConstituencyId = 3;

    pub const KENSINGTON_LIBRARY: StationId = 1;
    pub const GOOLE_TOWN_HALL: StationId = 2;
    pub const EMPTY_HALL: StationId = 3;
    pub const MISSING_STATION: StationId = 99;

    pub const ELIGIBLE_VOTER: VoterId = 1;
    pub const INELIGIBLE_VOTER: VoterId = 2;
    pub const SECOND_ELIGIBLE_VOTER: VoterId = 3;
    pub const GOOLE_VOTER: VoterId = 4;
    pub const MISSING_VOTER: VoterId = 23;

    pub const BOND_CANDIDATE: CandidateId = 1;
    pub const BOOTHROYD_CANDIDATE: CandidateId = 2;
    pub const LEITER_CANDIDATE: CandidateId = 3;

    fn voter(
        id: VoterId,
        first_name: &str,
        last_name: &str,
        postcode: &str,
        station_id: StationId,
        used_vote: bool,
    ) -> Voter {
        Voter {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            addr_line_1: "007 Spy Street".to_string(),
            addr_line_2: None,
            postcode: postcode.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1970, 7, 7).unwrap(),
            phone: "+447654353205".to_string(),
            station_id,
            used_vote,
            active_pin: false,
        }
    }

    fn station(id: StationId, name: &str, postcode: &str, constituency_id: ConstituencyId) -> Station {
        Station {
            id,
            name: name.to_string(),
            addr_line_1: "53 Queen's Gate".to_string(),
            addr_line_2: None,
            postcode: postcode.to_string(),
            constituency_id,
        }
    }

    fn candidate(
        id: CandidateId,
        first_name: &str,
        last_name: &str,
        constituency_id: ConstituencyId,
        party_id: PartyId,
    ) -> Candidate {
        Candidate {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            constituency_id,
            party_id,
            votes: 0,
        }
    }

    impl Snapshot {
        pub fn example() -> Self {
            Self {
                constituencies: vec![
                    Constituency {
                        id: RICHMOND_PARK,
                        name: "Richmond Park".to_string(),
                    },
                    Constituency {
                        id: BRIGG_AND_GOOLE,
                        name: "Brigg & Goole".to_string(),
                    },
                    Constituency {
                        id: UNCONTESTED,
                        name: "Uncontested".to_string(),
                    },
                ],
                stations: vec![
                    station(KENSINGTON_LIBRARY, "Kensington Library", "SW7 3XZ", RICHMOND_PARK),
                    station(GOOLE_TOWN_HALL, "Goole Town Hall", "DN14 5AA", BRIGG_AND_GOOLE),
                    station(EMPTY_HALL, "Empty Hall", "M1 1AE", UNCONTESTED),
                ],
                voters: vec![
                    voter(ELIGIBLE_VOTER, "James", "Bond", "SW7 3BH", KENSINGTON_LIBRARY, false),
                    voter(INELIGIBLE_VOTER, "James", "Bond", "SW7 7MQ", KENSINGTON_LIBRARY, true),
                    voter(SECOND_ELIGIBLE_VOTER, "Jane", "Moneypenny", "SW7 3BH", KENSINGTON_LIBRARY, false),
                    voter(GOOLE_VOTER, "Eve", "Polastri", "DN14 5AA", GOOLE_TOWN_HALL, false),
                ],
                parties: vec![
                    Party {
                        id: 1,
                        name: "Independent Spies".to_string(),
                    },
                    Party {
                        id: 2,
                        name: "Secret Service".to_string(),
                    },
                ],
                candidates: vec![
                    candidate(BOND_CANDIDATE, "M", "Bond", RICHMOND_PARK, 1),
                    candidate(BOOTHROYD_CANDIDATE, "Q", "Boothroyd", RICHMOND_PARK, 2),
                    candidate(LEITER_CANDIDATE, "Felix", "Leiter", BRIGG_AND_GOOLE, 1),
                ],
                pins: vec![],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_is_valid() {
        let tables = Tables::try_from(Snapshot::example()).unwrap();
        assert_eq!(Snapshot::from(&tables), Snapshot::example());
    }

    #[test]
    fn rejects_dangling_references() {
        let mut snapshot = Snapshot::example();
        snapshot.stations[0].constituency_id = 42;
        assert_eq!(
            Tables::try_from(snapshot).unwrap_err(),
            SnapshotError::StationConstituency(1, 42)
        );

        let mut snapshot = Snapshot::example();
        snapshot.voters[0].station_id = 42;
        assert_eq!(
            Tables::try_from(snapshot).unwrap_err(),
            SnapshotError::VoterStation(1, 42)
        );

        let mut snapshot = Snapshot::example();
        snapshot.candidates[0].party_id = 42;
        assert_eq!(
            Tables::try_from(snapshot).unwrap_err(),
            SnapshotError::CandidateParty(1, 42)
        );

        let mut snapshot = Snapshot::example();
        snapshot.pins.push(IssuedPin::new(42, "1234"));
        assert_eq!(
            Tables::try_from(snapshot).unwrap_err(),
            SnapshotError::PinVoter(42)
        );
    }

    #[test]
    fn rejects_duplicates() {
        let mut snapshot = Snapshot::example();
        let copy = snapshot.voters[0].clone();
        snapshot.voters.push(copy);
        assert_eq!(
            Tables::try_from(snapshot).unwrap_err(),
            SnapshotError::DuplicateId("voter", 1)
        );

        let mut snapshot = Snapshot::example();
        snapshot.pins.push(IssuedPin::new(1, "1234"));
        snapshot.pins.push(IssuedPin::new(3, "1234"));
        assert_eq!(
            Tables::try_from(snapshot).unwrap_err(),
            SnapshotError::DuplicatePin
        );
    }

    #[test]
    fn missing_tables_default_to_empty() {
        let snapshot: Snapshot =
            rocket::serde::json::from_str(r#"{"parties": [{"_id": 1, "name": "Green"}]}"#).unwrap();
        assert_eq!(snapshot.parties.len(), 1);
        assert!(snapshot.voters.is_empty());
    }
}
