//! Network layer builder: end-to-end re-keying of datalink edges.
//!
//! A 1:1 step, no correlation: every `dlLink` whose recorded addresses are
//! consistent with a layer-3 source (datalink AND network address) and a
//! layer-3 destination (network address) becomes one `nwkLink` carrying
//! the same property set.

use crate::error::ModelError;
use crate::patterns::{PatternOutput, PatternParams};
use iotmap_core::{Layer, LinkEdge, LinkKind, NodeId};
use iotmap_store::GraphState;
use tracing::debug;

pub(crate) fn nwk_transmission(
    g: &mut GraphState,
    _params: &PatternParams<'_>,
) -> Result<PatternOutput, ModelError> {
    let mut output = PatternOutput::default();

    let links: Vec<LinkEdge> = g.links(LinkKind::Dl).cloned().collect();
    for link in links {
        let tx = link.tx;
        let src = g
            .find_by_dl_and_nwk(Layer::Network, &tx.dl_src, &tx.nwk_src)
            .map(|n| n.id);
        let dst = g.find_by_nwk(Layer::Network, &tx.nwk_dst).map(|n| n.id);
        let (Some(src), Some(dst)) = (src, dst) else {
            debug!(
                nwk_src = %tx.nwk_src,
                nwk_dst = %tx.nwk_dst,
                "datalink edge has no consistent network endpoints, skipping"
            );
            output.dropped += 1;
            continue;
        };
        g.add_link(LinkEdge {
            kind: LinkKind::Nwk,
            src,
            dst,
            tx,
        });
        output.edges_created += 1;
    }

    let pairs: Vec<(NodeId, NodeId)> = g.links(LinkKind::Nwk).map(|l| (l.src, l.dst)).collect();
    for (src, dst) in pairs {
        g.merge_visual(Layer::Network, src, dst);
    }

    Ok(output)
}
