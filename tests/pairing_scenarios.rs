use std::collections::HashSet;

use approx::assert_relative_eq;
use scl_linearizer::prelude::*;

fn set(nodes: &[(NodeId, f64, f64, f64)]) -> NodeSet {
    nodes.iter().map(|&(id, x, y, z)| Node::new(id, x, y, z)).collect()
}

#[test]
fn three_top_nodes_against_five_bottom_nodes() {
    let top = set(&[(1, 0.0, 0.0, 0.0), (2, 2.0, 0.0, 0.0), (3, 4.0, 0.0, 0.0)]);
    let bottom = set(&[
        (10, -1.0, 0.0, 1.0),
        (11, 0.1, 0.0, 1.0),
        (12, 1.0, 0.0, 1.0),
        (13, 2.1, 0.0, 1.0),
        (14, 3.9, 0.0, 1.0),
    ]);

    let pairing = pair_nodes(&top, &bottom, PairingStrategy::Assignment, None).unwrap();
    assert_eq!(pairing.len(), 3);
    assert!(pairing.is_injective());
    assert_eq!(pairing.ids(), vec![(1, 11), (2, 13), (3, 14)]);

    let used: HashSet<NodeId> = pairing.iter().map(|p| p.second.id).collect();
    assert_eq!(used.len(), 3);
}

#[test]
fn larger_first_set_keeps_argument_order() {
    let top = set(&[
        (1, 0.0, 0.0, 0.0),
        (2, 1.0, 0.0, 0.0),
        (3, 2.0, 0.0, 0.0),
    ]);
    let bottom = set(&[(20, 1.05, 0.0, 3.0)]);
    let pairing = pair_nodes(&top, &bottom, PairingStrategy::Assignment, None).unwrap();
    assert_eq!(pairing.ids(), vec![(2, 20)]);
}

#[test]
fn graph_pairing_follows_the_mesh() {
    // a bent strip: the straight-line nearest bottom node of 1 is 21, but
    // along the mesh 1 reaches 20 first
    let nodes = [
        (1, 0.0, 0.0, 0.0),
        (2, 1.0, 0.0, 0.0),
        (20, 0.0, 0.0, 1.0),
        (21, 0.0, 0.0, -0.8),
        (22, 1.0, 0.0, 1.0),
    ];
    let locations: NodeLocations = nodes.iter().map(|&(id, x, y, z)| Node::new(id, x, y, z)).collect();
    let connectivity = ElementConnectivity::new(vec![vec![1, 2, 22, 20], vec![21, 20]]);
    let mesh = MeshGraph::build(&connectivity, &locations).unwrap();

    let top = set(&[(1, 0.0, 0.0, 0.0)]);
    let bottom = set(&[(20, 0.0, 0.0, 1.0), (21, 0.0, 0.0, -0.8)]);

    let straight = pair_nodes(&top, &bottom, PairingStrategy::Assignment, None).unwrap();
    assert_eq!(straight.ids(), vec![(1, 21)]);

    let geodesic = pair_nodes(&top, &bottom, PairingStrategy::Graph, Some(&mesh)).unwrap();
    assert_eq!(geodesic.ids(), vec![(1, 20)]);
    assert_relative_eq!(geodesic.pairs()[0].distance, 1.0, epsilon = 1e-12);
}

#[test]
fn unsupported_and_empty_inputs_fail() {
    let top = set(&[(1, 0.0, 0.0, 0.0)]);
    let empty = NodeSet::default();
    assert!(matches!(
        pair_nodes(&top, &empty, PairingStrategy::Assignment, None),
        Err(LinearizationError::InvalidInput(_))
    ));
    assert!(matches!(
        pair_nodes(&top, &top, PairingStrategy::NearestK(4), None),
        Err(LinearizationError::NotImplemented(_))
    ));
    assert!(matches!(
        pair_nodes(&top, &top, PairingStrategy::Graph, None),
        Err(LinearizationError::InvalidInput(_))
    ));
}
