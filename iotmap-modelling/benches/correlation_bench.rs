use criterion::{criterion_group, criterion_main, Criterion};
use iotmap_core::{AppType, Layer, NodeId, NodeRecord, Protocol, Transmission};
use iotmap_modelling::{Modeller, ModellingParams};
use iotmap_store::MemoryStore;

const NODES: u32 = 12;
const TRANSMISSIONS: usize = 1_000;

fn addr(id: u32) -> String {
    format!("0x{id:04x}")
}

/// Deterministic pseudo-traffic: bursts of requests with close replies.
fn synthetic_feed() -> Vec<Transmission> {
    let mut feed = Vec::with_capacity(TRANSMISSIONS);
    for i in 0..TRANSMISSIONS {
        let src = (i as u32 * 7) % NODES + 1;
        let mut dst = (i as u32 * 13 + 3) % NODES + 1;
        if dst == src {
            dst = dst % NODES + 1;
        }
        feed.push(Transmission {
            protocol: Protocol::Zigbee,
            timestamp: i as f64 * 0.05,
            dl_src: addr(src),
            dl_dst: addr(dst),
            nwk_src: addr(src),
            nwk_dst: addr(dst),
            app_type: AppType::new(1).unwrap(),
            data: String::new(),
        });
    }
    feed
}

fn seeded_modeller() -> Modeller<MemoryStore> {
    let modeller = Modeller::new(MemoryStore::new());
    let nodes: Vec<NodeRecord> = (1..=NODES)
        .map(|id| NodeRecord::new(NodeId(id), Layer::Datalink, [addr(id)], [addr(id)]))
        .collect();
    modeller.seed_nodes(&nodes).unwrap();
    modeller
}

fn bench_transport_rebuild(c: &mut Criterion) {
    let modeller = seeded_modeller();
    let feed = synthetic_feed();
    let params = ModellingParams::default();

    c.bench_function("transport_rebuild_1k", |b| {
        b.iter(|| {
            modeller
                .rebuild(
                    Layer::Transport,
                    "transport_transmission",
                    &params,
                    Some(&feed),
                )
                .unwrap()
        })
    });
}

fn bench_application_rebuild(c: &mut Criterion) {
    let modeller = seeded_modeller();
    let feed = synthetic_feed();
    let params = ModellingParams::default();
    modeller
        .rebuild(
            Layer::Transport,
            "transport_transmission",
            &params,
            Some(&feed),
        )
        .unwrap();

    c.bench_function("application_rebuild_1k", |b| {
        b.iter(|| {
            modeller
                .rebuild(Layer::Application, "interact", &params, None)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_transport_rebuild, bench_application_rebuild);
criterion_main!(benches);
