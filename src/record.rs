use std::{fmt, num::ParseIntError};

use crate::error::ParseError;

/// One building entry. Two records are duplicates only when all four fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record {
    city: String,
    street: String,
    house: i32,
    floor: i32,
}

impl Record {
    pub fn new(city: impl Into<String>, street: impl Into<String>, house: i32, floor: i32) -> Self {
        Record {
            city: city.into(),
            street: street.into(),
            house,
            floor,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn house(&self) -> i32 {
        self.house
    }

    pub fn floor(&self) -> i32 {
        self.floor
    }
}

impl fmt::Display for Record {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(
            out,
            "City: {}, Street: {} House: {}, Floor: {}",
            self.city, self.street, self.house, self.floor
        )
    }
}

/// The four attribute values of an input element, still in string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub city: String,
    pub street: String,
    pub house: String,
    pub floor: String,
}

impl RawItem {
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        house: impl Into<String>,
        floor: impl Into<String>,
    ) -> Self {
        RawItem {
            city: city.into(),
            street: street.into(),
            house: house.into(),
            floor: floor.into(),
        }
    }
}

impl TryFrom<RawItem> for Record {
    type Error = ParseError;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let house = parse_field("house", &raw.house)?;
        let floor = parse_field("floor", &raw.floor)?;
        Ok(Record {
            city: raw.city,
            street: raw.street,
            house,
            floor,
        })
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<i32, ParseError> {
    value
        .parse()
        .map_err(|source: ParseIntError| ParseError::InvalidNumber {
            field,
            value: value.to_owned(),
            source,
        })
}
