//! Text search over fetched lists.
//!
//! The clinic API may or may not honour `search` parameters, so list pages
//! apply the same predicate to whatever comes back.

use crate::backend::{Appointment, ClinicService, Consultation, Pet, Triage, User};

/// A record that can be matched against a free-text query.
pub trait Searchable {
    /// Fields the query is matched against.
    fn search_fields(&self) -> Vec<&str>;

    /// Case-insensitive substring match on any field.
    ///
    /// `needle` must already be lowercased (see [`normalize_query`]).
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Trim and lowercase a query; blank queries become `None`.
#[must_use]
pub fn normalize_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

/// Keep the records matching `query`; all of them when the query is blank.
#[must_use]
pub fn filter_by_query<T: Searchable>(items: Vec<T>, query: Option<&str>) -> Vec<T> {
    match normalize_query(query) {
        Some(needle) => items.into_iter().filter(|i| i.matches(&needle)).collect(),
        None => items,
    }
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        ];
        fields.extend(self.phone.as_deref());
        fields
    }
}

impl Searchable for Pet {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.species.as_str()];
        fields.extend(self.breed.as_deref());
        fields.extend(self.owner_name.as_deref());
        fields.extend(self.microchip.as_deref());
        fields
    }
}

impl Searchable for ClinicService {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }
}

impl Searchable for Appointment {
    fn search_fields(&self) -> Vec<&str> {
        [
            self.pet_name.as_deref(),
            self.owner_name.as_deref(),
            self.veterinarian_name.as_deref(),
            self.service_name.as_deref(),
            self.reason.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Searchable for Consultation {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.diagnosis.as_str()];
        fields.extend(self.pet_name.as_deref());
        fields.extend(self.veterinarian_name.as_deref());
        fields.extend(self.treatment.as_deref());
        fields
    }
}

impl Searchable for Triage {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.symptoms.as_str()];
        fields.extend(self.pet_name.as_deref());
        fields
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pet(name: &str, species: &str, owner: &str) -> Pet {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "ownerId": 2,
            "ownerName": owner,
            "name": name,
            "species": species,
        }))
        .unwrap()
    }

    #[test]
    fn test_query_matches_any_field_case_insensitively() {
        let pets = vec![
            pet("Rex", "Dog", "Luis Gómez"),
            pet("Mia", "Cat", "Ana Ruiz"),
            pet("Kiwi", "Bird", "Luis Gómez"),
        ];

        let by_owner = filter_by_query(pets.clone(), Some("  LUIS "));
        assert_eq!(by_owner.len(), 2);

        let by_species = filter_by_query(pets.clone(), Some("cat"));
        assert_eq!(by_species.len(), 1);
        assert_eq!(by_species[0].name, "Mia");

        assert_eq!(filter_by_query(pets.clone(), Some("")).len(), 3);
        assert_eq!(filter_by_query(pets, None).len(), 3);
    }

    #[test]
    fn test_no_match_gives_empty_list() {
        let pets = vec![pet("Rex", "Dog", "Luis")];
        assert!(filter_by_query(pets, Some("hamster")).is_empty());
    }
}
