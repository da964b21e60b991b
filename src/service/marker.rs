use std::collections::HashSet;

use bitflags::bitflags;
use serde::Serialize;
use uuid::Uuid;

use crate::models::Party;

bitflags! {
    /// How the current user relates to a party.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Relation: u8 {
        const HOSTS = 0b01;
        const ATTENDS = 0b10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Own,
    Attending,
    Public,
}

impl MarkerKind {
    pub fn color(self) -> &'static str {
        match self {
            MarkerKind::Own => "#a21caf",
            MarkerKind::Attending => "#ef4444",
            MarkerKind::Public => "#6b7280",
        }
    }
}

impl From<Relation> for MarkerKind {
    fn from(relation: Relation) -> Self {
        if relation.contains(Relation::HOSTS) {
            MarkerKind::Own
        } else if relation.contains(Relation::ATTENDS) {
            MarkerKind::Attending
        } else {
            MarkerKind::Public
        }
    }
}

pub fn relation(party_id: &Uuid, hosted: &HashSet<Uuid>, attending: &HashSet<Uuid>) -> Relation {
    let mut rel = Relation::empty();
    rel.set(Relation::HOSTS, hosted.contains(party_id));
    rel.set(Relation::ATTENDS, attending.contains(party_id));
    rel
}

/// Own beats attending beats public.
pub fn classify(party: &Party, hosted: &HashSet<Uuid>, attending: &HashSet<Uuid>) -> MarkerKind {
    relation(&party.id, hosted, attending).into()
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub id: Uuid,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: MarkerKind,
    pub color: &'static str,
}

/// Builds markers for the parties that carry coordinates, skipping the rest.
pub fn markers(parties: &[Party], hosted: &HashSet<Uuid>, attending: &HashSet<Uuid>) -> Vec<Marker> {
    parties
        .iter()
        .filter_map(|party| {
            let (latitude, longitude) = party.coordinates()?;
            let kind = classify(party, hosted, attending);
            Some(Marker {
                id: party.id,
                title: party.title.clone(),
                latitude,
                longitude,
                kind,
                color: kind.color(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn party(coords: Option<(f64, f64)>) -> Party {
        Party {
            id: Uuid::new_v4(),
            title: "Open Air".into(),
            description: None,
            location: "Zürich".into(),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            datetime: Utc::now(),
            genre: None,
            dresscode: None,
            entry_fee: None,
            is_public: true,
            created_by: Uuid::new_v4(),
            access_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(true, true, MarkerKind::Own)]
    #[case(true, false, MarkerKind::Own)]
    #[case(false, true, MarkerKind::Attending)]
    #[case(false, false, MarkerKind::Public)]
    fn classification_precedence(
        #[case] hosts: bool,
        #[case] attends: bool,
        #[case] expected: MarkerKind,
    ) {
        let p = party(None);
        let hosted: HashSet<Uuid> = if hosts { HashSet::from([p.id]) } else { HashSet::new() };
        let attending: HashSet<Uuid> = if attends { HashSet::from([p.id]) } else { HashSet::new() };
        assert_eq!(classify(&p, &hosted, &attending), expected);
    }

    #[test]
    fn colors_are_distinct() {
        let colors: HashSet<&str> = [MarkerKind::Own, MarkerKind::Attending, MarkerKind::Public]
            .into_iter()
            .map(MarkerKind::color)
            .collect();
        assert_eq!(colors.len(), 3);
    }

    #[test]
    fn parties_without_coordinates_get_no_marker() {
        let located = party(Some((47.37, 8.54)));
        let unlocated = party(None);
        let hosted = HashSet::from([located.id]);

        let built = markers(&[located.clone(), unlocated], &hosted, &HashSet::new());

        assert_eq!(built.len(), 1);
        assert_eq!(built[0].id, located.id);
        assert_eq!(built[0].kind, MarkerKind::Own);
        assert_eq!(built[0].color, "#a21caf");
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(MarkerKind::Attending).unwrap(), "attending");
    }
}
