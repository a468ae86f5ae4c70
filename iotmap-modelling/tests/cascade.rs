//! End-to-end rebuild behavior over the in-memory store.

use iotmap_core::{AppType, Layer, NodeId, NodeRecord, Protocol, Role, RoleSet, Transmission};
use iotmap_modelling::{ModelError, Modeller, ModellingParams};
use iotmap_store::{GraphStore, MemoryStore, ResultKind};

fn tx(t: f64, src: &str, dst: &str) -> Transmission {
    Transmission {
        protocol: Protocol::Zigbee,
        timestamp: t,
        dl_src: src.to_string(),
        dl_dst: dst.to_string(),
        nwk_src: src.to_string(),
        nwk_dst: dst.to_string(),
        app_type: AppType::new(1).unwrap(),
        data: String::new(),
    }
}

fn node(id: u32) -> NodeRecord {
    let addr = format!("0x{id}");
    NodeRecord::new(NodeId(id), Layer::Datalink, [addr.clone()], [addr])
}

fn seeded_modeller(ids: &[u32]) -> Modeller<MemoryStore> {
    let modeller = Modeller::new(MemoryStore::new());
    let nodes: Vec<NodeRecord> = ids.iter().map(|id| node(*id)).collect();
    modeller.seed_nodes(&nodes).unwrap();
    modeller
}

/// A request from 1, forwarded by 2 to 3 shortly after.
fn forwarding_feed() -> Vec<Transmission> {
    vec![tx(1.0, "0x1", "0x2"), tx(1.3, "0x2", "0x3")]
}

fn role_at(modeller: &Modeller<MemoryStore>, layer: Layer, id: u32) -> RoleSet {
    modeller
        .store()
        .snapshot()
        .node(layer, NodeId(id))
        .unwrap()
        .role
        .clone()
}

#[test]
fn full_pipeline_builds_an_interaction() {
    let modeller = seeded_modeller(&[1, 2, 3]);
    let feed = forwarding_feed();
    let params = ModellingParams::default();

    let report = modeller
        .rebuild(Layer::Application, "interact", &params, Some(&feed))
        .unwrap();

    assert_eq!(report.output.interactions, 1);
    let snapshot = modeller.store().snapshot();
    let interactions: Vec<_> = snapshot.interact_edges().collect();
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].src, NodeId(1));
    assert_eq!(interactions[0].dst, NodeId(3));

    assert_eq!(
        role_at(&modeller, Layer::Transport, 2),
        RoleSet::of([Role::Controller])
    );

    let rows = snapshot.results();
    assert!(rows.iter().any(|r| r.kind == ResultKind::Interact));
    assert!(rows.iter().any(|r| r.kind == ResultKind::Trans));
}

#[test]
fn controller_scenario_matches_the_windows() {
    // delta2 = 0.5 catches the 0.3 s forwarding delay...
    let modeller = seeded_modeller(&[1, 2, 3]);
    let params = ModellingParams {
        tdelta2: 0.5,
        ..ModellingParams::default()
    };
    let report = modeller
        .rebuild(
            Layer::Transport,
            "transport_transmission",
            &params,
            Some(&forwarding_feed()),
        )
        .unwrap();

    assert_eq!(report.output.controllers.len(), 1);
    let record = &report.output.controllers[0];
    assert_eq!(
        (
            record.origin,
            record.sent_at,
            record.controller,
            record.forwarded_at,
            record.destination
        ),
        (NodeId(1), 1.0, NodeId(2), 1.3, NodeId(3))
    );
    assert_eq!(
        role_at(&modeller, Layer::Transport, 2),
        RoleSet::of([Role::Controller])
    );

    // ...while delta2 = 0.1 leaves node 2 untouched.
    let modeller = seeded_modeller(&[1, 2, 3]);
    let params = ModellingParams {
        tdelta2: 0.1,
        ..ModellingParams::default()
    };
    let report = modeller
        .rebuild(
            Layer::Transport,
            "transport_transmission",
            &params,
            Some(&forwarding_feed()),
        )
        .unwrap();

    assert!(report.output.controllers.is_empty());
    assert_eq!(
        role_at(&modeller, Layer::Transport, 2),
        RoleSet::of([Role::Source, Role::Sink])
    );
}

#[test]
fn negative_tdelta2_disables_controller_detection() {
    let modeller = seeded_modeller(&[1, 2, 3]);
    let params = ModellingParams {
        tdelta2: -1.0,
        ..ModellingParams::default()
    };
    let report = modeller
        .rebuild(
            Layer::Transport,
            "transport_transmission",
            &params,
            Some(&forwarding_feed()),
        )
        .unwrap();

    assert!(report.output.controllers.is_empty());
    assert_eq!(
        role_at(&modeller, Layer::Transport, 2),
        RoleSet::of([Role::Source, Role::Sink])
    );
}

#[test]
fn rebuilding_transport_twice_is_idempotent() {
    let modeller = seeded_modeller(&[1, 2, 3]);
    let feed = forwarding_feed();
    let params = ModellingParams::default();

    modeller
        .rebuild(Layer::Transport, "transport_transmission", &params, Some(&feed))
        .unwrap();
    let first = modeller.store().snapshot();

    // Same layer-2 data, same thresholds, no feed this time.
    modeller
        .rebuild(Layer::Transport, "transport_transmission", &params, None)
        .unwrap();
    let second = modeller.store().snapshot();

    assert_eq!(first, second);
}

#[test]
fn rebuilding_network_wipes_everything_above() {
    let modeller = seeded_modeller(&[1, 2, 3]);
    let feed = forwarding_feed();
    let params = ModellingParams::default();
    modeller
        .rebuild(Layer::Application, "interact", &params, Some(&feed))
        .unwrap();

    modeller
        .rebuild(Layer::Network, "nwk_transmission", &params, None)
        .unwrap();

    let snapshot = modeller.store().snapshot();
    assert!(snapshot.has_nodes_at(Layer::Network));
    assert!(!snapshot.has_nodes_at(Layer::Transport));
    assert!(!snapshot.has_nodes_at(Layer::Application));
    assert_eq!(snapshot.trans_edges().count(), 0);
    assert_eq!(snapshot.interact_edges().count(), 0);
}

#[test]
fn missing_network_layer_is_rebuilt_on_demand() {
    let modeller = seeded_modeller(&[1, 2, 3]);
    let params = ModellingParams::default();
    modeller
        .rebuild(
            Layer::Datalink,
            "node_transmission",
            &params,
            Some(&forwarding_feed()),
        )
        .unwrap();

    // No feed: the cascade must derive layer 3 from the stored links.
    let report = modeller
        .rebuild(Layer::Transport, "transport_transmission", &params, None)
        .unwrap();

    assert_eq!(report.output.edges_created, 2);
    assert!(modeller.store().snapshot().has_nodes_at(Layer::Network));
}

#[test]
fn unknown_pattern_fails_without_mutation() {
    let modeller = seeded_modeller(&[1, 2, 3]);
    let params = ModellingParams::default();
    modeller
        .rebuild(
            Layer::Transport,
            "transport_transmission",
            &params,
            Some(&forwarding_feed()),
        )
        .unwrap();
    let before = modeller.store().snapshot();

    let err = modeller
        .rebuild(Layer::Transport, "bogus", &params, Some(&forwarding_feed()))
        .unwrap_err();

    assert_eq!(
        err,
        ModelError::UnknownPattern {
            layer: Layer::Transport,
            name: "bogus".to_string()
        }
    );
    assert_eq!(modeller.store().snapshot(), before);
}

#[test]
fn rebuild_without_any_layer_two_data_fails() {
    let modeller = Modeller::new(MemoryStore::new());
    let params = ModellingParams::default();

    let err = modeller
        .rebuild(Layer::Transport, "transport_transmission", &params, None)
        .unwrap_err();
    assert_eq!(err, ModelError::MissingLayer(Layer::Datalink));

    let err = modeller
        .rebuild(Layer::Datalink, "node_transmission", &params, None)
        .unwrap_err();
    assert_eq!(err, ModelError::MissingFeed);
}

#[test]
fn unknown_addresses_are_dropped_not_fatal() {
    let modeller = seeded_modeller(&[1, 2]);
    let params = ModellingParams::default();
    let feed = vec![tx(1.0, "0x1", "0x2"), tx(2.0, "0x1", "0xdead")];

    let report = modeller
        .rebuild(Layer::Datalink, "node_transmission", &params, Some(&feed))
        .unwrap();

    assert_eq!(report.output.edges_created, 1);
    assert_eq!(report.output.dropped, 1);
}
