//! Static signal topology loading
//!
//! The remote side exports its signal installations as JSON:
//!
//! ```json
//! { "<landmark group>": [ { "<pole>": [ {"landmark_id": "1"}, {"pos_x": "10.5"}, {"pos_y": "-3.0"} ] } ] }
//! ```
//!
//! Coordinates are decimal strings; `pos_y` is negated on load to move from the
//! remote's left-handed frame into the shared planar frame. Every pole of a
//! group shares the group's member list.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use contracts::{ContractError, InstallationId, InstallationSpec, Location};
use serde_json::Value;

type RawTopology = BTreeMap<String, Vec<BTreeMap<String, Vec<BTreeMap<String, Value>>>>>;

/// Loads the remote static signal topology
pub struct TopologyLoader;

impl TopologyLoader {
    /// Load installations from a topology file
    ///
    /// # Errors
    /// `ContractError::Topology` when the file is missing, unreadable or malformed.
    pub fn load_from_path(path: &Path) -> Result<Vec<InstallationSpec>, ContractError> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ContractError::topology(&origin, format!("cannot read file: {e}")))?;
        Self::load_from_str(&content, &origin)
    }

    /// Load installations from JSON text; `origin` only labels errors
    pub fn load_from_str(content: &str, origin: &str) -> Result<Vec<InstallationSpec>, ContractError> {
        let raw: RawTopology = serde_json::from_str(content)
            .map_err(|e| ContractError::topology(origin, format!("invalid JSON: {e}")))?;

        let mut installations = Vec::new();
        let mut seen: HashSet<InstallationId> = HashSet::new();

        for (group_key, poles) in &raw {
            let mut members: Vec<(InstallationId, Location)> = Vec::new();

            for pole in poles {
                for (pole_key, entries) in pole {
                    let (id, location) = parse_pole(entries).map_err(|message| {
                        ContractError::topology(
                            origin,
                            format!("group '{group_key}', pole '{pole_key}': {message}"),
                        )
                    })?;
                    if !seen.insert(id.clone()) {
                        return Err(ContractError::topology(
                            origin,
                            format!("landmark id '{id}' declared more than once"),
                        ));
                    }
                    members.push((id, location));
                }
            }

            let cluster: Vec<InstallationId> = members.iter().map(|(id, _)| id.clone()).collect();
            installations.extend(members.into_iter().map(|(id, location)| InstallationSpec {
                id,
                location,
                cluster: cluster.clone(),
            }));
        }

        Ok(installations)
    }
}

fn parse_pole(entries: &[BTreeMap<String, Value>]) -> Result<(InstallationId, Location), String> {
    let mut id: Option<String> = None;
    let mut x = 0.0;
    let mut y = 0.0;

    for entry in entries {
        if let Some(value) = entry.get("landmark_id") {
            id = Some(match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => return Err(format!("landmark_id must be a string, got {other}")),
            });
        }
        if let Some(value) = entry.get("pos_x") {
            x = parse_coordinate("pos_x", value)?;
        }
        if let Some(value) = entry.get("pos_y") {
            y = -parse_coordinate("pos_y", value)?;
        }
    }

    let id = id.filter(|s| !s.is_empty()).ok_or("missing landmark_id")?;
    Ok((InstallationId::from(id), Location::new(x, y, 0.0)))
}

fn parse_coordinate(field: &str, value: &Value) -> Result<f64, String> {
    let parsed = match value {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("{field} '{s}' is not a number: {e}"))?,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("{field} {n} out of range"))?,
        other => return Err(format!("{field} must be a decimal string, got {other}")),
    };
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(format!("{field} is not finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_GROUPS: &str = r#"{
        "965": [
            { "pole_a": [ {"landmark_id": "1001"}, {"pos_x": "10.0"}, {"pos_y": "5.0"} ] },
            { "pole_b": [ {"landmark_id": "1002"}, {"pos_x": "-10.0"}, {"pos_y": "-5.0"} ] }
        ],
        "971": [
            { "pole_c": [ {"landmark_id": "2001"}, {"pos_x": "100.0"}, {"pos_y": "0"} ] }
        ]
    }"#;

    #[test]
    fn test_load_clusters_and_negates_y() {
        let installations = TopologyLoader::load_from_str(TWO_GROUPS, "inline").unwrap();
        assert_eq!(installations.len(), 3);

        let a = &installations[0];
        assert_eq!(a.id, "1001");
        assert_eq!(a.location, Location::new(10.0, -5.0, 0.0));
        assert_eq!(a.cluster, vec![InstallationId::from("1001"), "1002".into()]);

        let b = &installations[1];
        assert_eq!(b.location, Location::new(-10.0, 5.0, 0.0));
        assert_eq!(b.cluster, a.cluster);

        let c = &installations[2];
        assert_eq!(c.cluster, vec![InstallationId::from("2001")]);
    }

    #[test]
    fn test_missing_landmark_id() {
        let content = r#"{ "1": [ { "p": [ {"pos_x": "1"}, {"pos_y": "2"} ] } ] }"#;
        let err = TopologyLoader::load_from_str(content, "inline").unwrap_err();
        assert!(matches!(err, ContractError::Topology { .. }));
        assert!(err.to_string().contains("missing landmark_id"));
    }

    #[test]
    fn test_bad_coordinate() {
        let content = r#"{ "1": [ { "p": [ {"landmark_id": "7"}, {"pos_x": "east"} ] } ] }"#;
        let err = TopologyLoader::load_from_str(content, "inline").unwrap_err();
        assert!(err.to_string().contains("pos_x"));
    }

    #[test]
    fn test_duplicate_landmark_rejected() {
        let content = r#"{
            "1": [ { "p": [ {"landmark_id": "7"} ] } ],
            "2": [ { "q": [ {"landmark_id": "7"} ] } ]
        }"#;
        assert!(TopologyLoader::load_from_str(content, "inline").is_err());
    }

    #[test]
    fn test_unparsable_json() {
        let err = TopologyLoader::load_from_str("{ not json", "inline").unwrap_err();
        assert!(matches!(err, ContractError::Topology { .. }));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_GROUPS.as_bytes()).unwrap();
        let installations = TopologyLoader::load_from_path(file.path()).unwrap();
        assert_eq!(installations.len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let err = TopologyLoader::load_from_path(Path::new("/nonexistent/topology.json"))
            .unwrap_err();
        assert!(matches!(err, ContractError::Topology { .. }));
    }
}
