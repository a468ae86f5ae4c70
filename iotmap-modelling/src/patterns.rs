//! Per-layer registry of named construction strategies.
//!
//! Each layer maps pattern names to a typed function value sharing one
//! `(state, params) -> output` contract, so alternative correlation
//! heuristics can be added without touching the rebuild cascade. Unknown
//! names are rejected up front, before any store mutation.

use crate::application::interact;
use crate::datalink::node_transmission;
use crate::error::ModelError;
use crate::network::nwk_transmission;
use crate::transport::{transport_transmission, ControllerRecord, ResponseRecord};
use iotmap_core::{Layer, Transmission};
use iotmap_store::GraphState;
use once_cell::sync::Lazy;

/// Common contract every pattern implementation satisfies.
pub type PatternFn =
    fn(&mut GraphState, &PatternParams<'_>) -> Result<PatternOutput, ModelError>;

/// Inputs shared by all pattern functions.
///
/// Each builder reads the subset it needs: the datalink builder consumes
/// `transmissions`, the transport builder the two deltas, the application
/// builder `adelta`.
#[derive(Debug, Clone, Copy)]
pub struct PatternParams<'a> {
    pub transmissions: &'a [Transmission],
    /// Response window: maximum request-to-response gap (seconds).
    pub delta1: f64,
    /// Forwarding window for controller detection; `None` skips phase 2.
    pub delta2: Option<f64>,
    /// Causal window between consecutive hops of an interaction.
    pub adelta: f64,
}

/// What a pattern run produced, for diagnostics and metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternOutput {
    /// Detected request/response pairs (transport phase 1).
    pub responses: Vec<ResponseRecord>,
    /// Detected forwarding chains (transport phase 2).
    pub controllers: Vec<ControllerRecord>,
    /// Edges newly created at the rebuilt layer.
    pub edges_created: usize,
    /// Interaction edges newly created (application layer).
    pub interactions: usize,
    /// Input records dropped for matching no known node.
    pub dropped: usize,
}

/// One named strategy for one layer.
#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    pub layer: Layer,
    pub name: &'static str,
    pub description: &'static str,
    pub run: PatternFn,
}

static BUILTIN: Lazy<PatternRegistry> = Lazy::new(|| PatternRegistry {
    entries: vec![
        Pattern {
            layer: Layer::Datalink,
            name: "node_transmission",
            description: "Represent point to point communications",
            run: node_transmission,
        },
        Pattern {
            layer: Layer::Network,
            name: "nwk_transmission",
            description: "Represent end to end communications",
            run: nwk_transmission,
        },
        Pattern {
            layer: Layer::Transport,
            name: "transport_transmission",
            description: "Represent the data flow of bidirectional communications",
            run: transport_transmission,
        },
        Pattern {
            layer: Layer::Application,
            name: "interact",
            description: "Represent interactions between nodes according to a time inspection",
            run: interact,
        },
    ],
});

/// Name -> description -> implementation mapping, per layer.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    entries: Vec<Pattern>,
}

impl PatternRegistry {
    /// The registry holding the four builders shipped with the engine.
    pub fn builtin() -> &'static PatternRegistry {
        &BUILTIN
    }

    /// Add or replace a strategy under `(layer, name)`.
    pub fn register(&mut self, pattern: Pattern) {
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|p| p.layer == pattern.layer && p.name == pattern.name)
        {
            *slot = pattern;
        } else {
            self.entries.push(pattern);
        }
    }

    /// Resolve a pattern, rejecting unknown names with a named failure.
    pub fn get(&self, layer: Layer, name: &str) -> Result<&Pattern, ModelError> {
        self.entries
            .iter()
            .find(|p| p.layer == layer && p.name == name)
            .ok_or_else(|| ModelError::UnknownPattern {
                layer,
                name: name.to_string(),
            })
    }

    pub fn available(&self, layer: Layer) -> impl Iterator<Item = &Pattern> {
        self.entries.iter().filter(move |p| p.layer == layer)
    }

    /// The strategy the cascade uses when rebuilding a lower layer.
    pub fn default_name(layer: Layer) -> &'static str {
        match layer {
            Layer::Datalink => "node_transmission",
            Layer::Network => "nwk_transmission",
            Layer::Transport => "transport_transmission",
            Layer::Application => "interact",
        }
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_layer() {
        let registry = PatternRegistry::builtin();
        for layer in Layer::ALL {
            let name = PatternRegistry::default_name(layer);
            let pattern = registry.get(layer, name).unwrap();
            assert_eq!(pattern.layer, layer);
            assert!(!pattern.description.is_empty());
        }
    }

    #[test]
    fn unknown_name_is_a_named_failure() {
        let registry = PatternRegistry::builtin();
        let err = registry.get(Layer::Transport, "bogus").unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownPattern {
                layer: Layer::Transport,
                name: "bogus".to_string()
            }
        );
    }

    #[test]
    fn register_replaces_same_name() {
        fn noop(
            _: &mut GraphState,
            _: &PatternParams<'_>,
        ) -> Result<PatternOutput, ModelError> {
            Ok(PatternOutput::default())
        }

        let mut registry = PatternRegistry::default();
        registry.register(Pattern {
            layer: Layer::Transport,
            name: "transport_transmission",
            description: "replacement",
            run: noop,
        });
        let pattern = registry
            .get(Layer::Transport, "transport_transmission")
            .unwrap();
        assert_eq!(pattern.description, "replacement");
        assert_eq!(registry.available(Layer::Transport).count(), 1);
    }
}
