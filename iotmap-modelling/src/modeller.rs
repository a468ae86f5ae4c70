//! The rebuild cascade.
//!
//! A rebuild of layer L first makes sure the layer below exists
//! (recursively rebuilding it from stored layer-2 data when it does not),
//! wipes L and everything above it, duplicates the node population into
//! L, and runs the selected pattern, all inside one store transaction,
//! so a failed rebuild leaves the previous graph untouched. Every layer
//! at or above 3 is thereby a deterministic function of layer 2 plus the
//! chosen thresholds and patterns.

use crate::error::ModelError;
use crate::patterns::{Pattern, PatternOutput, PatternParams, PatternRegistry};
use iotmap_core::{Layer, LinkKind, NodeRecord, Transmission};
use iotmap_store::{GraphState, GraphStore};
use tracing::{info, instrument, warn};

/// Correlation thresholds for one rebuild run, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModellingParams {
    /// Delay for an object to respond to a request (transport phase 1).
    pub tdelta1: f64,
    /// Delay for an object to forward a packet (transport phase 2);
    /// negative disables controller detection.
    pub tdelta2: f64,
    /// Delay for a controller to forward a packet (application layer).
    pub adelta: f64,
}

impl Default for ModellingParams {
    fn default() -> Self {
        Self {
            tdelta1: 0.6,
            tdelta2: 0.7,
            adelta: 1.5,
        }
    }
}

impl ModellingParams {
    pub fn phase_two_delta(&self) -> Option<f64> {
        (self.tdelta2 >= 0.0).then_some(self.tdelta2)
    }
}

/// Outcome of one layer rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildReport {
    pub layer: Layer,
    pub pattern: String,
    pub output: PatternOutput,
}

/// Drives layer rebuilds against a graph store.
pub struct Modeller<S> {
    store: S,
    registry: PatternRegistry,
}

impl<S: GraphStore> Modeller<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            registry: PatternRegistry::default(),
        }
    }

    pub fn with_registry(store: S, registry: PatternRegistry) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Upsert the layer-2 node population.
    pub fn seed_nodes(&self, nodes: &[NodeRecord]) -> Result<(), ModelError> {
        self.store.run_in_transaction(|g| {
            for node in nodes {
                let mut node = node.clone();
                node.layer = Layer::Datalink;
                g.create_node(node);
            }
            Ok(())
        })
    }

    /// Rebuild `layer` with the pattern selected by name.
    ///
    /// A feed forces the datalink layer (and everything above) to be
    /// rebuilt from scratch first; without one, lower layers are rebuilt
    /// only if missing.
    #[instrument(skip(self, params, feed), fields(layer = %layer, pattern = pattern_name))]
    pub fn rebuild(
        &self,
        layer: Layer,
        pattern_name: &str,
        params: &ModellingParams,
        feed: Option<&[Transmission]>,
    ) -> Result<RebuildReport, ModelError> {
        // Unknown names fail here, before any store mutation.
        let pattern = *self.registry.get(layer, pattern_name)?;
        let registry = &self.registry;
        let output = self
            .store
            .run_in_transaction(|g| rebuild_layer(g, registry, layer, &pattern, params, feed))?;
        info!(
            edges = output.edges_created,
            dropped = output.dropped,
            "layer rebuilt"
        );
        Ok(RebuildReport {
            layer,
            pattern: pattern_name.to_string(),
            output,
        })
    }
}

fn pattern_params<'a>(params: &ModellingParams, feed: &'a [Transmission]) -> PatternParams<'a> {
    PatternParams {
        transmissions: feed,
        delta1: params.tdelta1,
        delta2: params.phase_two_delta(),
        adelta: params.adelta,
    }
}

fn default_pattern(registry: &PatternRegistry, layer: Layer) -> Result<Pattern, ModelError> {
    registry
        .get(layer, PatternRegistry::default_name(layer))
        .copied()
}

fn rebuild_layer(
    g: &mut GraphState,
    registry: &PatternRegistry,
    layer: Layer,
    pattern: &Pattern,
    params: &ModellingParams,
    feed: Option<&[Transmission]>,
) -> Result<PatternOutput, ModelError> {
    match layer {
        Layer::Datalink => {
            let feed = feed.ok_or(ModelError::MissingFeed)?;
            rebuild_datalink(g, pattern, params, feed)
        }
        Layer::Network => rebuild_network(g, registry, pattern, params, feed),
        Layer::Transport => rebuild_transport(g, registry, pattern, params, feed),
        Layer::Application => rebuild_application(g, registry, pattern, params, feed),
    }
}

fn ensure_datalink(g: &GraphState) -> Result<(), ModelError> {
    if g.has_nodes_at(Layer::Datalink) {
        Ok(())
    } else {
        Err(ModelError::MissingLayer(Layer::Datalink))
    }
}

fn rebuild_datalink(
    g: &mut GraphState,
    pattern: &Pattern,
    params: &ModellingParams,
    feed: &[Transmission],
) -> Result<PatternOutput, ModelError> {
    ensure_datalink(g)?;
    if feed.is_empty() {
        warn!("rebuilding the datalink layer from an empty feed");
    }
    g.wipe_from(Layer::Network);
    g.clear_links(LinkKind::Dl);
    g.clear_visual(Layer::Datalink);
    (pattern.run)(g, &pattern_params(params, feed))
}

fn rebuild_network(
    g: &mut GraphState,
    registry: &PatternRegistry,
    pattern: &Pattern,
    params: &ModellingParams,
    feed: Option<&[Transmission]>,
) -> Result<PatternOutput, ModelError> {
    if let Some(feed) = feed {
        let datalink = default_pattern(registry, Layer::Datalink)?;
        rebuild_datalink(g, &datalink, params, feed)?;
    } else {
        ensure_datalink(g)?;
        g.wipe_from(Layer::Network);
    }
    g.duplicate_layer(Layer::Datalink, Layer::Network);
    (pattern.run)(g, &pattern_params(params, &[]))
}

fn ensure_network(
    g: &mut GraphState,
    registry: &PatternRegistry,
    params: &ModellingParams,
) -> Result<(), ModelError> {
    if g.has_nodes_at(Layer::Network) {
        return Ok(());
    }
    let network = default_pattern(registry, Layer::Network)?;
    rebuild_network(g, registry, &network, params, None)?;
    Ok(())
}

fn rebuild_transport(
    g: &mut GraphState,
    registry: &PatternRegistry,
    pattern: &Pattern,
    params: &ModellingParams,
    feed: Option<&[Transmission]>,
) -> Result<PatternOutput, ModelError> {
    if let Some(feed) = feed {
        let network = default_pattern(registry, Layer::Network)?;
        rebuild_network(g, registry, &network, params, Some(feed))?;
    } else {
        ensure_network(g, registry, params)?;
        g.wipe_from(Layer::Transport);
    }
    // Transport nodes carry layer-2 addresses, joined against the
    // layer-3 edges by the pattern.
    g.duplicate_layer(Layer::Datalink, Layer::Transport);
    (pattern.run)(g, &pattern_params(params, &[]))
}

fn ensure_transport(
    g: &mut GraphState,
    registry: &PatternRegistry,
    params: &ModellingParams,
) -> Result<(), ModelError> {
    if g.has_nodes_at(Layer::Transport) {
        return Ok(());
    }
    let transport = default_pattern(registry, Layer::Transport)?;
    rebuild_transport(g, registry, &transport, params, None)?;
    Ok(())
}

fn rebuild_application(
    g: &mut GraphState,
    registry: &PatternRegistry,
    pattern: &Pattern,
    params: &ModellingParams,
    feed: Option<&[Transmission]>,
) -> Result<PatternOutput, ModelError> {
    if let Some(feed) = feed {
        let transport = default_pattern(registry, Layer::Transport)?;
        rebuild_transport(g, registry, &transport, params, Some(feed))?;
    } else {
        ensure_transport(g, registry, params)?;
        g.wipe_from(Layer::Application);
    }
    // Application nodes inherit the transport roles.
    g.duplicate_layer(Layer::Transport, Layer::Application);
    (pattern.run)(g, &pattern_params(params, &[]))
}
