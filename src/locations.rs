//! Static table of known wash sites.

use serde::Serialize;

/// Geographic coordinates of a site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A known wash site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Site {
    /// Display name, also the lookup key after normalization.
    pub name: String,
    pub coordinates: Coordinates,
}

impl Site {
    /// Key used for per-site configuration sections (`coral_springs`).
    pub fn config_key(&self) -> String {
        self.name.to_lowercase().replace(' ', "_")
    }
}

/// Immutable lookup table from site name to coordinates.
#[derive(Debug, Clone)]
pub struct LocationTable {
    sites: Vec<Site>,
}

impl LocationTable {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    /// Resolve a user-supplied name. Surrounding whitespace and case are ignored.
    pub fn resolve(&self, name: &str) -> Option<&Site> {
        let normalized = normalize_name(name);
        self.sites.iter().find(|site| site.name == normalized)
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }
}

impl Default for LocationTable {
    fn default() -> Self {
        let site = |name: &str, lat, lon| Site {
            name: name.to_string(),
            coordinates: Coordinates { lat, lon },
        };
        Self::new(vec![
            site("Coral Springs", 26.2712, -80.2706),
            site("Margate", 26.2445, -80.2064),
            site("Parkland", 26.3108, -80.2232),
        ])
    }
}

/// Trim and title-case a name: "  coral SPRINGS " becomes "Coral Springs".
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.trim().chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("margate"), "Margate");
        assert_eq!(normalize_name("  coral SPRINGS "), "Coral Springs");
        assert_eq!(normalize_name("PARKLAND"), "Parkland");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_resolve_known_sites() {
        let table = LocationTable::default();

        let margate = table.resolve("margate").unwrap();
        assert_eq!(margate.coordinates, Coordinates { lat: 26.2445, lon: -80.2064 });

        let coral = table.resolve("Coral Springs").unwrap();
        assert_eq!(coral.coordinates.lat, 26.2712);

        assert!(table.resolve(" parkland").is_some());
    }

    #[test]
    fn test_resolve_unknown_site() {
        let table = LocationTable::default();
        assert!(table.resolve("Boca Raton").is_none());
        assert!(table.resolve("").is_none());
    }

    #[test]
    fn test_config_key() {
        let table = LocationTable::default();
        assert_eq!(table.resolve("coral springs").unwrap().config_key(), "coral_springs");
        assert_eq!(table.resolve("margate").unwrap().config_key(), "margate");
    }

    #[test]
    fn test_default_table_has_three_sites() {
        assert_eq!(LocationTable::default().sites().len(), 3);
    }
}
