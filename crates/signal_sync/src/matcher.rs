//! Topology Matcher
//!
//! Assigns each host signal group to one cluster of remote installations:
//! nearest installation within the match radius, same number of approaches
//! as cluster members, no member already taken. Groups are processed in
//! announcement order, so the first group to claim a cluster keeps it.

use std::fmt;
use std::sync::Arc;

use contracts::{GroupAssignment, GroupId, InstallationId, SignalGroup};
use tracing::{debug, info, instrument, warn};

use crate::installation::InstallationTable;
use crate::ordering::{sort_around, ApproachOrdering, Clockwise};

/// 1-based approach index of every indication, in the group's link order
///
/// The index increments whenever the incoming edge differs from the
/// previous indication's.
pub fn approach_indices(group: &SignalGroup) -> Vec<usize> {
    let mut indices = Vec::with_capacity(group.indications.len());
    let mut current = 0;
    let mut previous: Option<&str> = None;
    for indication in &group.indications {
        let edge = indication.incoming_edge();
        if previous != Some(edge) {
            current += 1;
            previous = Some(edge);
        }
        indices.push(current);
    }
    indices
}

/// Result of matching one group
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(GroupAssignment),
    /// Group has no indications, hence no anchor
    NoAnchor,
    /// Nearest installation lies outside the match radius (or none exists)
    OutOfRange { nearest_distance: Option<f64> },
    CardinalityMismatch { approaches: usize, cluster_size: usize },
    /// A cluster member already belongs to an earlier group
    Conflict { installation: InstallationId },
}

impl MatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            MatchOutcome::Matched(_) => "matched",
            MatchOutcome::NoAnchor => "no_anchor",
            MatchOutcome::OutOfRange { .. } => "out_of_range",
            MatchOutcome::CardinalityMismatch { .. } => "cardinality_mismatch",
            MatchOutcome::Conflict { .. } => "conflict",
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::Matched(a) => write!(f, "matched {} installations", a.installations.len()),
            MatchOutcome::NoAnchor => write!(f, "group has no indications"),
            MatchOutcome::OutOfRange {
                nearest_distance: Some(d),
            } => write!(f, "nearest installation {d:.2} m away"),
            MatchOutcome::OutOfRange {
                nearest_distance: None,
            } => write!(f, "no installations known"),
            MatchOutcome::CardinalityMismatch {
                approaches,
                cluster_size,
            } => write!(f, "{approaches} approaches vs {cluster_size} cluster members"),
            MatchOutcome::Conflict { installation } => {
                write!(f, "installation {installation} already matched")
            }
        }
    }
}

/// Diagnostics of one matching pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    pub assignments: Vec<GroupAssignment>,
    pub unmatched_groups: Vec<(GroupId, MatchOutcome)>,
    /// Installations without a group after the pass
    pub unmatched_installations: usize,
}

impl MatchReport {
    pub fn is_full_coverage(&self) -> bool {
        self.unmatched_groups.is_empty() && self.unmatched_installations == 0
    }
}

#[derive(Debug, Clone)]
pub struct TopologyMatcher {
    match_radius_m: f64,
    ordering: Arc<dyn ApproachOrdering>,
}

impl TopologyMatcher {
    /// Matcher with the clockwise approach ordering
    pub fn new(match_radius_m: f64) -> Self {
        Self::with_ordering(match_radius_m, Arc::new(Clockwise))
    }

    pub fn with_ordering(match_radius_m: f64, ordering: Arc<dyn ApproachOrdering>) -> Self {
        Self {
            match_radius_m,
            ordering,
        }
    }

    /// Match one group, marking the installations it claims
    #[instrument(
        level = "debug",
        name = "topology_match_group",
        skip(self, group, table),
        fields(group_id = %group.group_id, indications = group.indications.len())
    )]
    pub fn match_group(&self, group: &SignalGroup, table: &mut InstallationTable) -> MatchOutcome {
        let outcome = self.try_match(group, table);
        metrics::counter!("signal_match_total", "outcome" => outcome.label()).increment(1);
        match &outcome {
            MatchOutcome::Matched(assignment) => debug!(
                installations = ?assignment.installations,
                "signal group matched"
            ),
            other => debug!(reason = %other, "signal group unmatched"),
        }
        outcome
    }

    fn try_match(&self, group: &SignalGroup, table: &mut InstallationTable) -> MatchOutcome {
        let Some(anchor) = group.anchor() else {
            return MatchOutcome::NoAnchor;
        };

        let cluster = match table.nearest(&anchor) {
            Some((nearest, distance)) if distance <= self.match_radius_m => {
                nearest.cluster().to_vec()
            }
            Some((_, distance)) => {
                return MatchOutcome::OutOfRange {
                    nearest_distance: Some(distance),
                }
            }
            None => {
                return MatchOutcome::OutOfRange {
                    nearest_distance: None,
                }
            }
        };

        let indices = approach_indices(group);
        let approaches = indices.last().copied().unwrap_or(0);
        if approaches != cluster.len() {
            return MatchOutcome::CardinalityMismatch {
                approaches,
                cluster_size: cluster.len(),
            };
        }

        let mut members = Vec::with_capacity(cluster.len());
        for id in &cluster {
            match table.get(id) {
                Some(inst) if inst.is_matched() => {
                    return MatchOutcome::Conflict {
                        installation: id.clone(),
                    }
                }
                Some(inst) => members.push((id.clone(), *inst.location())),
                // cluster member missing from the topology
                None => {
                    return MatchOutcome::CardinalityMismatch {
                        approaches,
                        cluster_size: table_members(&cluster, table),
                    }
                }
            }
        }

        sort_around(self.ordering.as_ref(), &anchor, &mut members, |(_, loc)| *loc);

        for (position, (id, _)) in members.iter().enumerate() {
            let count = indices.iter().filter(|&&i| i == position + 1).count();
            if let Some(inst) = table.get_mut(id) {
                inst.mark_matched(count);
            }
        }

        MatchOutcome::Matched(GroupAssignment {
            group_id: group.group_id.clone(),
            installations: members.into_iter().map(|(id, _)| id).collect(),
        })
    }

    /// Match every group in announcement order and log coverage
    #[instrument(
        name = "topology_match",
        skip(self, groups, table),
        fields(groups = groups.len(), installations = table.len())
    )]
    pub fn match_all(&self, groups: &[SignalGroup], table: &mut InstallationTable) -> MatchReport {
        let mut report = MatchReport::default();
        for group in groups {
            match self.match_group(group, table) {
                MatchOutcome::Matched(assignment) => report.assignments.push(assignment),
                other => report.unmatched_groups.push((group.group_id.clone(), other)),
            }
        }
        report.unmatched_installations = table.unmatched_count();

        metrics::gauge!("signal_unmatched_groups").set(report.unmatched_groups.len() as f64);
        metrics::gauge!("signal_unmatched_installations")
            .set(report.unmatched_installations as f64);

        if report.is_full_coverage() {
            info!(
                assignments = report.assignments.len(),
                "all signal groups and installations matched"
            );
        } else {
            warn!(
                assignments = report.assignments.len(),
                unmatched_groups = report.unmatched_groups.len(),
                unmatched_installations = report.unmatched_installations,
                "signal topology only partially matched"
            );
        }
        report
    }
}

fn table_members(cluster: &[InstallationId], table: &InstallationTable) -> usize {
    cluster.iter().filter(|id| table.get(id).is_some()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{InstallationSpec, Location, SignalIndication};

    fn cluster(ids: &[&str], locations: &[(f64, f64)]) -> Vec<InstallationSpec> {
        let members: Vec<InstallationId> = ids.iter().map(|id| InstallationId::from(*id)).collect();
        ids.iter()
            .zip(locations)
            .map(|(id, (x, y))| InstallationSpec {
                id: (*id).into(),
                location: Location::new(*x, *y, 0.0),
                cluster: members.clone(),
            })
            .collect()
    }

    fn group(id: &str, anchor: (f64, f64), lanes: &[&str]) -> SignalGroup {
        SignalGroup {
            group_id: id.into(),
            indications: lanes
                .iter()
                .map(|lane| SignalIndication {
                    incoming_lane: (*lane).into(),
                    position: Location::new(anchor.0, anchor.1, 0.0),
                })
                .collect(),
        }
    }

    /// Four poles around (100, 100)
    fn junction() -> Vec<InstallationSpec> {
        cluster(
            &["p_n", "p_e", "p_s", "p_w"],
            &[(100.0, 108.0), (108.0, 100.0), (100.0, 92.0), (92.0, 100.0)],
        )
    }

    #[test]
    fn test_approach_indices_count_edge_changes() {
        let g = group("g", (0.0, 0.0), &["a_0", "a_1", "b_0", "c_0", "c_1", "c_2"]);
        assert_eq!(approach_indices(&g), vec![1, 1, 2, 3, 3, 3]);
        assert!(approach_indices(&group("e", (0.0, 0.0), &[])).is_empty());
    }

    #[test]
    fn test_match_orders_clockwise_and_counts_indications() {
        let mut table = InstallationTable::new(junction());
        let g = group(
            "G1",
            (100.0, 101.0),
            &["w_0", "w_1", "n_0", "e_0", "e_1", "e_2", "s_0"],
        );
        let outcome = TopologyMatcher::new(15.0).match_group(&g, &mut table);

        let MatchOutcome::Matched(assignment) = outcome else {
            panic!("expected match, got {outcome:?}");
        };
        assert_eq!(assignment.group_id, "G1");
        // west, north, east, south around the anchor
        assert_eq!(
            assignment.installations,
            vec![
                InstallationId::from("p_w"),
                "p_n".into(),
                "p_e".into(),
                "p_s".into()
            ]
        );
        let counts: Vec<usize> = assignment
            .installations
            .iter()
            .map(|id| table.get(id).unwrap().number_of_indications())
            .collect();
        assert_eq!(counts, vec![2, 1, 3, 1]);
        assert!(table.iter().all(|i| i.is_matched()));
    }

    #[test]
    fn test_out_of_range() {
        let mut table = InstallationTable::new(junction());
        let g = group("far", (500.0, 500.0), &["a_0", "b_0", "c_0", "d_0"]);
        let outcome = TopologyMatcher::new(15.0).match_group(&g, &mut table);
        assert!(matches!(outcome, MatchOutcome::OutOfRange { nearest_distance: Some(d) } if d > 15.0));
        assert_eq!(table.unmatched_count(), 4);
    }

    #[test]
    fn test_cardinality_mismatch() {
        let mut table = InstallationTable::new(junction());
        let g = group("G", (100.0, 100.0), &["a_0", "a_1", "b_0"]);
        let outcome = TopologyMatcher::new(15.0).match_group(&g, &mut table);
        assert_eq!(
            outcome,
            MatchOutcome::CardinalityMismatch {
                approaches: 2,
                cluster_size: 4
            }
        );
        assert_eq!(table.unmatched_count(), 4);
    }

    #[test]
    fn test_conflict_leaves_no_assignment() {
        let mut specs = junction();
        // "solo" declares p_e as its only member, so matching G0 claims p_e
        specs.push(InstallationSpec {
            id: "solo".into(),
            location: Location::new(300.0, 300.0, 0.0),
            cluster: vec!["p_e".into()],
        });
        let mut table = InstallationTable::new(specs);
        let matcher = TopologyMatcher::new(15.0);

        let first = group("G0", (300.0, 300.0), &["x_0"]);
        assert!(matches!(
            matcher.match_group(&first, &mut table),
            MatchOutcome::Matched(_)
        ));

        let g1 = group("G1", (100.0, 100.0), &["a_0", "b_0", "c_0", "d_0"]);
        let report = matcher.match_all(&[g1], &mut table);
        assert!(report.assignments.is_empty());
        assert_eq!(report.unmatched_groups.len(), 1);
        assert_eq!(
            report.unmatched_groups[0].1,
            MatchOutcome::Conflict {
                installation: "p_e".into()
            }
        );
        assert!(table.get("p_n").is_some_and(|i| !i.is_matched()));
    }

    #[test]
    fn test_first_announced_wins() {
        let mut table = InstallationTable::new(junction());
        let lanes = ["a_0", "b_0", "c_0", "d_0"];
        let report = TopologyMatcher::new(15.0).match_all(
            &[
                group("first", (100.0, 101.0), &lanes),
                group("second", (101.0, 100.0), &lanes),
            ],
            &mut table,
        );
        assert_eq!(report.assignments.len(), 1);
        assert_eq!(report.assignments[0].group_id, "first");
        assert_eq!(report.unmatched_groups[0].0, "second");
        assert_eq!(report.unmatched_installations, 0);
    }

    #[test]
    fn test_assignments_are_disjoint() {
        let mut specs = junction();
        specs.extend(cluster(&["q_a", "q_b"], &[(200.0, 205.0), (200.0, 195.0)]));
        specs.extend(cluster(&["r_a"], &[(400.0, 400.0)]));
        let mut table = InstallationTable::new(specs);

        let report = TopologyMatcher::new(15.0).match_all(
            &[
                group("J1", (100.0, 100.0), &["a_0", "b_0", "c_0", "d_0"]),
                group("J2", (200.0, 200.0), &["a_0", "b_0"]),
                group("J2b", (200.0, 201.0), &["a_0", "b_0"]),
                group("J3", (400.0, 401.0), &["z_0", "z_1"]),
            ],
            &mut table,
        );
        let mut seen = std::collections::HashSet::new();
        for assignment in &report.assignments {
            for id in &assignment.installations {
                assert!(seen.insert(id.clone()), "{id} assigned twice");
            }
        }
        assert_eq!(report.assignments.len(), 3);
        assert_eq!(report.unmatched_installations, 0);
    }

    #[derive(Debug)]
    struct ByEasting;

    impl ApproachOrdering for ByEasting {
        fn compare(
            &self,
            _anchor: &Location,
            a: &Location,
            b: &Location,
        ) -> std::cmp::Ordering {
            a.x.total_cmp(&b.x)
        }
    }

    #[test]
    fn test_injected_ordering() {
        let mut table = InstallationTable::new(junction());
        let matcher = TopologyMatcher::with_ordering(15.0, Arc::new(ByEasting));
        let g = group("G", (100.0, 100.0), &["a_0", "b_0", "c_0", "d_0"]);
        let MatchOutcome::Matched(assignment) = matcher.match_group(&g, &mut table) else {
            panic!("expected match");
        };
        assert_eq!(assignment.installations[0], "p_w");
        assert_eq!(assignment.installations[3], "p_e");
    }
}
