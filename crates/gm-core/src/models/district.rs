//! Delivery districts and their flat delivery fees.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct District {
    pub name: String,
    pub city: String,
    /// Minor currency unit.
    pub delivery_fee: u64,
}

impl District {
    pub fn new(name: &str, city: &str, delivery_fee: u64) -> Self {
        Self {
            name: name.into(),
            city: city.into(),
            delivery_fee,
        }
    }
}

/// The districts served out of the box.
pub fn default_districts() -> Vec<District> {
    vec![
        District::new("Ouaga 2000", "Ouagadougou", 1500),
        District::new("Patte d'Oie", "Ouagadougou", 1000),
        District::new("Dassasgho", "Ouagadougou", 1000),
        District::new("Pissy", "Ouagadougou", 1500),
        District::new("Koulouba", "Ouagadougou", 500),
        District::new("Sya", "Bobo-Dioulasso", 1000),
        District::new("Sarala", "Bobo-Dioulasso", 1000),
    ]
}

/// Find a district by name, and by city when one is given.
///
/// Without a city the name must be unambiguous across the table.
pub fn find_district<'a>(
    districts: &'a [District],
    name: &str,
    city: Option<&str>,
) -> Option<&'a District> {
    let mut matches = districts
        .iter()
        .filter(|d| d.name == name && city.is_none_or(|c| d.city == c));
    let first = matches.next()?;
    match matches.next() {
        Some(_) => None,
        None => Some(first),
    }
}
