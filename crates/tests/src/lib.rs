//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Responsibilities:
//! - scenarios: topology conflicts, unregistered vehicles, temporal ordering
//! - trace replay e2e tests against the mock remote

#[cfg(test)]
mod support {
    use contracts::{
        FineIndication, InboundEvent, InboundKind, InstallationSpec, Location, OutboundEvent,
        SignalGroup, SignalIndication, SimTime,
    };
    use tokio::sync::mpsc;

    pub const SECOND: SimTime = 1_000_000_000;

    /// Static topology JSON of a four-way junction at the origin.
    /// `pos_y` is given in the remote frame (negated on load).
    pub const JUNCTION_TOPOLOGY: &str = r#"{
        "965": [
            { "west":  [ {"landmark_id": "w"}, {"pos_x": "-10.0"}, {"pos_y": "0.0"} ] },
            { "north": [ {"landmark_id": "n"}, {"pos_x": "0.0"},   {"pos_y": "-10.0"} ] },
            { "east":  [ {"landmark_id": "e"}, {"pos_x": "10.0"},  {"pos_y": "0.0"} ] },
            { "south": [ {"landmark_id": "s"}, {"pos_x": "0.0"},   {"pos_y": "10.0"} ] }
        ]
    }"#;

    pub fn event(time: SimTime, kind: InboundKind) -> InboundEvent {
        InboundEvent {
            time,
            sender: "sumo".into(),
            kind,
        }
    }

    pub fn installation(id: &str, x: f64, y: f64, cluster: &[&str]) -> InstallationSpec {
        InstallationSpec {
            id: id.into(),
            location: Location::new(x, y, 0.0),
            cluster: cluster.iter().map(|c| (*c).into()).collect(),
        }
    }

    pub fn junction() -> Vec<InstallationSpec> {
        let cluster = ["w", "n", "e", "s"];
        vec![
            installation("w", -10.0, 0.0, &cluster),
            installation("n", 0.0, 10.0, &cluster),
            installation("e", 10.0, 0.0, &cluster),
            installation("s", 0.0, -10.0, &cluster),
        ]
    }

    pub fn group(id: &str, lanes: &[(&str, f64, f64)]) -> SignalGroup {
        SignalGroup {
            group_id: id.into(),
            indications: lanes
                .iter()
                .map(|(lane, x, y)| SignalIndication {
                    incoming_lane: (*lane).into(),
                    position: Location::new(*x, *y, 0.0),
                })
                .collect(),
        }
    }

    /// G1 controls one lane per approach of the junction
    pub fn junction_group() -> SignalGroup {
        group(
            "G1",
            &[
                ("west_0", -9.0, 0.0),
                ("north_0", 0.0, 9.0),
                ("east_0", 9.0, 0.0),
                ("south_0", 0.0, -9.0),
            ],
        )
    }

    pub fn drain(rx: &mut mpsc::UnboundedReceiver<OutboundEvent>) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn kinds(events: &[OutboundEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.kind.name()).collect()
    }

    pub const OFF: FineIndication = FineIndication::OFF;
}

#[cfg(test)]
mod scenario_tests {
    use contracts::{
        BridgeConfig, GroupId, InboundKind, OutboundKind, VehiclePosition, VehicleState,
    };
    use coordinator::{BridgeState, Coordinator, CoordinatorError, GrantOutcome};
    use host_adapter::ChannelHost;
    use remote_link::MockRemoteSimulator;
    use signal_sync::{InstallationTable, MatchOutcome, TopologyMatcher};

    use crate::support::*;

    /// G1's cluster shares an installation with an earlier group: no
    /// assignment for G1 and one more unmatched group in the diagnostics
    #[test]
    fn test_conflicting_group_is_not_matched() {
        let mut specs = junction();
        specs.push(installation("solo", 300.0, 300.0, &["e"]));
        let mut table = InstallationTable::new(specs);
        let matcher = TopologyMatcher::new(15.0);

        let first = matcher.match_all(&[group("G0", &[("x_0", 300.0, 300.0)])], &mut table);
        assert_eq!(first.assignments.len(), 1);
        assert!(first.unmatched_groups.is_empty());

        let report = matcher.match_all(&[junction_group()], &mut table);
        assert!(report.assignments.is_empty());
        assert_eq!(report.unmatched_groups.len(), first.unmatched_groups.len() + 1);
        assert!(matches!(
            &report.unmatched_groups[0].1,
            MatchOutcome::Conflict { installation } if installation == "e"
        ));
        assert!(["w", "n", "s"]
            .iter()
            .all(|id| table.get(id).is_some_and(|i| !i.is_matched())));
    }

    #[tokio::test]
    async fn test_conflicting_group_gets_no_subscription() {
        let mut specs = junction();
        specs.push(installation("solo", 300.0, 300.0, &["e"]));
        let (host, mut rx) = ChannelHost::new("host");
        let coordinator = Coordinator::new(
            BridgeConfig::default(),
            MockRemoteSimulator::new(),
            host,
            specs,
        );
        coordinator.initialize(0).await.unwrap();
        coordinator
            .submit(event(
                0,
                InboundKind::SignalTopology {
                    groups: vec![group("G0", &[("x_0", 300.0, 300.0)]), junction_group()],
                },
            ))
            .unwrap();
        coordinator.grant(0).await.unwrap();

        let subscriptions: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e.kind {
                OutboundKind::SignalSubscription { group_id } => Some(group_id),
                _ => None,
            })
            .collect();
        assert_eq!(subscriptions, vec![GroupId::from("G0")]);

        let (g0, g1) = coordinator
            .inspect(|r| (r.is_assigned("G0"), r.is_assigned("G1")))
            .await;
        assert!(g0);
        assert!(!g1);
    }

    #[tokio::test]
    async fn test_update_for_unregistered_vehicle_is_dropped() {
        let remote = MockRemoteSimulator::new();
        let (host, _rx) = ChannelHost::new("host");
        let coordinator =
            Coordinator::new(BridgeConfig::default(), remote.clone(), host, Vec::new());
        coordinator.initialize(0).await.unwrap();

        let v1 = VehicleState {
            id: "v1".into(),
            position: VehiclePosition::default(),
            heading: 0.0,
            slope: 0.0,
            signals: Default::default(),
            direction: Default::default(),
        };
        coordinator
            .submit(event(
                0,
                InboundKind::VehicleUpdates {
                    added: Vec::new(),
                    updated: vec![v1],
                    removed: Vec::new(),
                },
            ))
            .unwrap();

        let outcome = coordinator.grant(0).await.unwrap();
        assert!(matches!(outcome, GrantOutcome::Stepped(_)));
        assert_eq!(coordinator.state().await, BridgeState::Running);
        assert!(coordinator.inspect(|r| r.vehicle("v1").is_none()).await);
        assert_eq!(coordinator.inspect(|r| r.vehicle_count()).await, 0);
        assert_eq!(remote.vehicle_count(), 0);
    }

    #[tokio::test]
    async fn test_future_event_fails_before_remote_step() {
        let remote = MockRemoteSimulator::new();
        let (host, _rx) = ChannelHost::new("host");
        let coordinator =
            Coordinator::new(BridgeConfig::default(), remote.clone(), host, Vec::new());
        coordinator.initialize(0).await.unwrap();

        coordinator
            .submit(event(5000, InboundKind::Routes { routes: Vec::new() }))
            .unwrap();
        let err = coordinator.grant(4000).await.unwrap_err();

        assert!(matches!(
            err,
            CoordinatorError::TemporalOrderingViolation {
                event_time: 5000,
                granted: 4000,
                ..
            }
        ));
        assert_eq!(remote.steps_taken(), 0);
        assert_eq!(coordinator.state().await, BridgeState::Failed);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use config_loader::{ConfigLoader, TopologyLoader};
    use contracts::{
        BridgeConfig, FineIndication, InboundKind, InstallationSpec, Location, OutboundKind,
        SignalManager, VehicleId,
    };
    use coordinator::{BridgeState, Coordinator};
    use host_adapter::{
        parse_trace, ChannelHost, FanoutHost, JsonLinesHost, JsonLinesHostConfig, TraceDriver,
    };
    use remote_link::{parse_script, MockRemoteSimulator};
    use tokio::sync::watch;

    use crate::support::*;

    const HOST_TRACE: &str = r#"
# t = 0: topology, routes, one host vehicle
{"time": 0, "sender": "sumo", "type": "signal_topology", "groups": [{"group_id": "G1", "indications": [{"incoming_lane": "west_0", "position": {"x": -9.0, "y": 0.0, "z": 0.0}}, {"incoming_lane": "north_0", "position": {"x": 0.0, "y": 9.0, "z": 0.0}}, {"incoming_lane": "east_0", "position": {"x": 9.0, "y": 0.0, "z": 0.0}}, {"incoming_lane": "south_0", "position": {"x": 0.0, "y": -9.0, "z": 0.0}}]}]}
{"time": 0, "sender": "sumo", "type": "routes", "routes": [{"id": "route_0", "edges": ["e1", "e2"]}]}
{"time": 0, "sender": "sumo", "type": "vehicle_registration", "vehicle_id": "v1", "vehicle_type": {"name": "PKW", "length": 4.5, "width": 1.8, "height": 1.5, "vehicle_class": "car"}}
{"time": 0, "sender": "sumo", "type": "vehicle_updates", "added": [{"id": "v1", "position": {"cartesian": {"x": 5.0, "y": 5.0, "z": 0.0}, "geo": {"latitude": 0.0, "longitude": 0.0, "altitude": 0.0}}, "heading": 90.0}]}
{"grant": 0}
{"time": 500000000, "sender": "sumo", "type": "signal_states", "groups": [{"group_id": "G1", "states": [{"red": false, "green": true, "yellow": false}, {"red": true, "green": false, "yellow": false}, {"red": false, "green": false, "yellow": true}, {"red": true, "green": false, "yellow": false}]}]}
{"time": 1000000000, "sender": "sumo", "type": "vehicle_updates", "updated": [{"id": "v1", "position": {"cartesian": {"x": 6.0, "y": 5.0, "z": 0.0}, "geo": {"latitude": 0.0, "longitude": 0.0, "altitude": 0.0}}, "heading": 90.0}]}
{"time": 1000000000, "sender": "carla", "type": "vehicle_updates", "removed": ["v1"]}
{"grant": 1000000000}
{"grant": 2000000000}
"#;

    const REMOTE_SCRIPT: &str = r#"
{"spawn_requests": [{"actor_id": "c1", "type_id": "vehicle.audi.tt", "class_id": "car", "length": 4.2, "width": 1.9, "height": 1.4, "route": "c1_route"}]}
{"move_requests": [{"actor_id": "c1", "location": {"x": 20.0, "y": 1.0, "z": 0.0}, "yaw": 180.0}]}
{"destroy_requests": [{"actor_id": "c1"}]}
"#;

    /// Config and topology written to disk and loaded the way the CLI does
    fn load_fixture(config: &str) -> (tempfile::TempDir, BridgeConfig, Vec<InstallationSpec>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("topology.json"), JUNCTION_TOPOLOGY).unwrap();
        let config_path = dir.path().join("bridge.toml");
        std::fs::write(&config_path, config).unwrap();

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        let topology = config.topology_path.clone().unwrap();
        let installations = TopologyLoader::load_from_path(&topology).unwrap();
        (dir, config, installations)
    }

    #[tokio::test]
    async fn test_trace_round_trip_with_host_signals() {
        let (_dir, config, installations) =
            load_fixture("update_interval_ms = 1000\ntopology_path = \"topology.json\"\n");
        assert_eq!(installations.len(), 4);
        assert_eq!(installations[1].location, Location::new(0.0, 10.0, 0.0));

        let remote = MockRemoteSimulator::new().with_script(parse_script(REMOTE_SCRIPT).unwrap());
        let (host, mut rx) = ChannelHost::new("host");
        let coordinator = Arc::new(Coordinator::new(config, remote.clone(), host, installations));

        let (_tx, shutdown) = watch::channel(false);
        let summary = TraceDriver::new(Arc::clone(&coordinator))
            .run(parse_trace(HOST_TRACE).unwrap(), shutdown)
            .await
            .unwrap();
        assert_eq!(summary.grants, 3);
        assert_eq!(summary.events_submitted, 7);
        assert_eq!(summary.metrics.total_steps, 3);
        assert_eq!(summary.metrics.events_ignored, 1);

        let events = drain(&mut rx);
        assert_eq!(
            kinds(&events),
            vec![
                "time_advance_request",
                // grant 0
                "signal_subscription",
                "route_registration",
                "vehicle_registration",
                "federate_assignment",
                "time_advance_request",
                // grant 1s
                "vehicle_updates",
                "time_advance_request",
                // grant 2s
                "vehicle_updates",
                "time_advance_request",
            ]
        );

        match &events[2].kind {
            OutboundKind::RouteRegistration { route } => {
                assert_eq!(route.id, "c1_route");
                assert_eq!(route.edges, vec!["e2".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &events[6].kind {
            OutboundKind::VehicleUpdates { updated, .. } => {
                assert_eq!(updated.len(), 1);
                assert_eq!(updated[0].id, "c1");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(events[6].time, SECOND);
        match &events[8].kind {
            OutboundKind::VehicleUpdates { removed, .. } => {
                assert_eq!(removed, &vec![VehicleId::from("c1")])
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            events[9].kind,
            OutboundKind::TimeAdvanceRequest { requested } if requested == 3 * SECOND
        ));

        // host signal states pushed per installation, in approach order
        assert_eq!(remote.signal_state("w").as_deref(), Some("G"));
        assert_eq!(remote.signal_state("n").as_deref(), Some("r"));
        assert_eq!(remote.signal_state("e").as_deref(), Some("y"));
        assert_eq!(remote.signal_state("s").as_deref(), Some("r"));

        // host vehicle followed, own removal ignored
        let v1 = remote.vehicle("v1").unwrap();
        assert_eq!(v1.location, Location::new(6.0, 5.0, 0.0));
        assert!(coordinator.inspect(|r| r.vehicle("c1").is_none()).await);

        let report = coordinator.shutdown().await.unwrap();
        assert_eq!(report.steps_executed, 3);
        assert_eq!(report.discarded_events, 0);
        assert_eq!(coordinator.state().await, BridgeState::Stopped);
        assert!(!remote.is_connected());
    }

    #[tokio::test]
    async fn test_remote_signals_published_to_host() {
        let (_dir, config, installations) = load_fixture(
            "signal_manager = \"remote\"\ntopology_path = \"topology.json\"\n",
        );
        assert_eq!(config.signal_manager, SignalManager::Remote);

        let script = parse_script(
            "{}\n{\"signal_updates\": [{\"installation_id\": \"w\", \"state\": \"G\"}]}\n",
        )
        .unwrap();
        let remote = MockRemoteSimulator::new().with_script(script);
        let (host, mut rx) = ChannelHost::new("host");
        let coordinator = Arc::new(Coordinator::new(config, remote, host, installations));

        coordinator.initialize(0).await.unwrap();
        coordinator
            .submit(event(
                0,
                InboundKind::SignalTopology {
                    groups: vec![junction_group()],
                },
            ))
            .unwrap();
        coordinator.grant(0).await.unwrap();
        coordinator.grant(SECOND).await.unwrap();

        let changes: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e.kind, OutboundKind::SignalStateChange { .. }))
            .collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].time, 2 * SECOND);
        match &changes[0].kind {
            OutboundKind::SignalStateChange { group_id, states } => {
                assert_eq!(group_id, "G1");
                assert_eq!(states, &vec![FineIndication::GREEN, OFF, OFF, OFF]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fanout_outputs_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let (channel, mut rx) = ChannelHost::new("channel");
        let file = JsonLinesHost::new("jsonl", JsonLinesHostConfig::new(&path)).unwrap();
        let fanout = FanoutHost::new("outputs").add(channel, 4).add(file, 4);

        let remote = MockRemoteSimulator::new().with_script(parse_script(REMOTE_SCRIPT).unwrap());
        let coordinator = Arc::new(Coordinator::new(
            BridgeConfig::default(),
            remote,
            fanout,
            Vec::new(),
        ));

        let trace = parse_trace("{\"grant\": 0}\n{\"grant\": 1000000000}\n{\"grant\": 2000000000}\n")
            .unwrap();
        let (_tx, shutdown) = watch::channel(false);
        TraceDriver::new(Arc::clone(&coordinator))
            .run(trace, shutdown)
            .await
            .unwrap();
        coordinator.shutdown().await.unwrap();

        let from_channel = drain(&mut rx);
        let written = std::fs::read_to_string(&path).unwrap();
        let from_file: Vec<serde_json::Value> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(from_channel.len(), from_file.len());
        for (event, line) in from_channel.iter().zip(&from_file) {
            assert_eq!(line["type"], event.kind.name());
            assert_eq!(line["time"], event.time);
            assert!(line["recorded_at"].is_string());
        }
    }

    #[tokio::test]
    async fn test_shutdown_discards_pending_events() {
        let (host, _rx) = ChannelHost::new("host");
        let coordinator = Arc::new(Coordinator::new(
            BridgeConfig::default(),
            MockRemoteSimulator::new(),
            host,
            Vec::new(),
        ));

        let trace = parse_trace(
            "{\"grant\": 0}\n{\"time\": 1000000000, \"sender\": \"sumo\", \"type\": \"routes\", \"routes\": []}\n",
        )
        .unwrap();
        let (_tx, shutdown) = watch::channel(false);
        let summary = TraceDriver::new(Arc::clone(&coordinator))
            .run(trace, shutdown)
            .await
            .unwrap();
        assert_eq!(summary.events_submitted, 1);

        let report = coordinator.shutdown().await.unwrap();
        assert_eq!(report.discarded_events, 1);
        assert!(coordinator
            .submit(event(2 * SECOND, InboundKind::Routes { routes: Vec::new() }))
            .is_err());
    }
}
