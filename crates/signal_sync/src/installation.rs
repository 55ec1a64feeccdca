//! Remote signal installations and their current state

use std::collections::BTreeMap;

use contracts::{
    CoarseIndication, FineIndication, InstallationId, InstallationSpec, Location,
};

use crate::reducer::StateReducer;

/// One remote signal head ("pole")
#[derive(Debug, Clone, PartialEq)]
pub struct SignalInstallation {
    id: InstallationId,
    location: Location,
    cluster: Vec<InstallationId>,
    /// Set once by the matcher
    number_of_indications: usize,
    matched: bool,
    fine_state: Vec<FineIndication>,
    coarse_state: CoarseIndication,
}

impl SignalInstallation {
    pub fn new(spec: InstallationSpec) -> Self {
        Self {
            id: spec.id,
            location: spec.location,
            cluster: spec.cluster,
            number_of_indications: 0,
            matched: false,
            fine_state: Vec::new(),
            coarse_state: CoarseIndication::Off,
        }
    }

    pub fn id(&self) -> &InstallationId {
        &self.id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Declared landmark cluster, this installation included
    pub fn cluster(&self) -> &[InstallationId] {
        &self.cluster
    }

    pub fn number_of_indications(&self) -> usize {
        self.number_of_indications
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    pub fn fine_state(&self) -> &[FineIndication] {
        &self.fine_state
    }

    pub fn coarse_state(&self) -> CoarseIndication {
        self.coarse_state
    }

    pub(crate) fn mark_matched(&mut self, number_of_indications: usize) {
        self.matched = true;
        self.number_of_indications = number_of_indications;
        self.fine_state = vec![FineIndication::OFF; number_of_indications];
    }

    /// Store host states and return the reduced coarse state
    pub fn apply_fine(
        &mut self,
        states: &[FineIndication],
        reducer: &StateReducer,
    ) -> CoarseIndication {
        self.fine_state = states.to_vec();
        self.coarse_state = reducer.reduce(states);
        self.coarse_state
    }

    /// Store a remote state and return its expansion over this
    /// installation's indications
    pub fn apply_coarse(
        &mut self,
        coarse: CoarseIndication,
        reducer: &StateReducer,
    ) -> &[FineIndication] {
        self.coarse_state = coarse;
        self.fine_state = reducer.expand(coarse, self.number_of_indications);
        &self.fine_state
    }
}

/// Every installation of the remote static topology, keyed by id
#[derive(Debug, Clone, Default)]
pub struct InstallationTable {
    installations: BTreeMap<InstallationId, SignalInstallation>,
}

impl InstallationTable {
    pub fn new(specs: impl IntoIterator<Item = InstallationSpec>) -> Self {
        let installations = specs
            .into_iter()
            .map(|spec| (spec.id.clone(), SignalInstallation::new(spec)))
            .collect();
        Self { installations }
    }

    pub fn len(&self) -> usize {
        self.installations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installations.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SignalInstallation> {
        self.installations.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SignalInstallation> {
        self.installations.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalInstallation> {
        self.installations.values()
    }

    /// Closest installation in the plane; ties keep the lowest id
    pub fn nearest(&self, point: &Location) -> Option<(&SignalInstallation, f64)> {
        self.installations
            .values()
            .map(|inst| (inst, inst.location.planar_distance(point)))
            .fold(None, |best, (inst, distance)| match best {
                Some((_, best_distance)) if best_distance <= distance => best,
                _ => Some((inst, distance)),
            })
    }

    pub fn unmatched_count(&self) -> usize {
        self.installations.values().filter(|i| !i.matched).count()
    }
}
