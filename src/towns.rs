use crate::models::Coordinate;

/// Places we know how to put on the map. Anything else is dropped per year.
pub const TOWN_COORDS: [(&str, Coordinate); 15] = [
    ("Utrecht", Coordinate { lat: 52.0907, lon: 5.1214 }),
    ("Amersfoort", Coordinate { lat: 52.1561, lon: 5.3878 }),
    ("Veenendaal", Coordinate { lat: 52.0286, lon: 5.5589 }),
    ("Lelystad", Coordinate { lat: 52.5185, lon: 5.4714 }),
    ("Almere", Coordinate { lat: 52.3508, lon: 5.2647 }),
    ("Dronten", Coordinate { lat: 52.5250, lon: 5.7181 }),
    ("Arnhem", Coordinate { lat: 51.9851, lon: 5.8987 }),
    ("Nijmegen", Coordinate { lat: 51.8126, lon: 5.8372 }),
    ("Apeldoorn", Coordinate { lat: 52.2112, lon: 5.9699 }),
    ("Zwolle", Coordinate { lat: 52.5168, lon: 6.0830 }),
    ("Enschede", Coordinate { lat: 52.2215, lon: 6.8937 }),
    ("Deventer", Coordinate { lat: 52.2550, lon: 6.1639 }),
    ("Leeuwarden", Coordinate { lat: 53.2012, lon: 5.7999 }),
    ("Sneek", Coordinate { lat: 53.0323, lon: 5.6589 }),
    ("Drachten", Coordinate { lat: 53.1123, lon: 6.0989 }),
];

/// Exact, case-sensitive lookup.
pub fn lookup(town: &str) -> Option<Coordinate> {
    TOWN_COORDS
        .iter()
        .find(|(name, _)| *name == town)
        .map(|(_, coord)| *coord)
}

pub fn is_known(town: &str) -> bool {
    lookup(town).is_some()
}
