use super::kruskal::minimum_spanning_tree;
use super::munkres::{minimal_assignment, symmetric_matching};

/// Christofides construction over a symmetric cost closure: minimum
/// spanning tree, minimum-weight perfect matching on the odd-degree
/// vertices, Eulerian union, Hierholzer extraction, shortcut to a
/// Hamiltonian cycle. Returns a cycle visiting every node once.
pub fn christofides_tour(nb_nodes: usize, cost: impl Fn(usize, usize) -> i64) -> Vec<usize> {
    if nb_nodes <= 2 {
        return (0..nb_nodes).collect();
    }

    let tree = minimum_spanning_tree(nb_nodes, &cost);

    let mut degree = vec![0usize; nb_nodes];
    for &(i, j) in &tree {
        degree[i] += 1;
        degree[j] += 1;
    }
    let odd: Vec<usize> = (0..nb_nodes).filter(|&i| degree[i] % 2 == 1).collect();

    // Minimum-weight matching on the odd vertices; self-assignment is
    // priced out of the assignment problem.
    let forbidden = i64::MAX / 4;
    let odd_costs: Vec<Vec<i64>> = odd
        .iter()
        .map(|&i| {
            odd.iter()
                .map(|&j| if i == j { forbidden } else { cost(i, j) })
                .collect()
        })
        .collect();
    let assignment = minimal_assignment(&odd_costs);
    let matching = symmetric_matching(&odd_costs, &assignment);

    // Eulerian multigraph: tree edges plus matching edges.
    let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); nb_nodes];
    let mut edge_used = Vec::new();
    let mut add_edge = |adjacency: &mut Vec<Vec<(usize, usize)>>,
                        edge_used: &mut Vec<bool>,
                        i: usize,
                        j: usize| {
        let id = edge_used.len();
        edge_used.push(false);
        adjacency[i].push((j, id));
        adjacency[j].push((i, id));
    };
    for &(i, j) in &tree {
        add_edge(&mut adjacency, &mut edge_used, i, j);
    }
    for &(a, b) in &matching {
        add_edge(&mut adjacency, &mut edge_used, odd[a], odd[b]);
    }

    // Hierholzer circuit extraction.
    let mut stack = vec![0usize];
    let mut circuit = Vec::with_capacity(edge_used.len() + 1);
    let mut next_edge = vec![0usize; nb_nodes];
    while let Some(&node) = stack.last() {
        let mut advanced = false;
        while next_edge[node] < adjacency[node].len() {
            let (to, id) = adjacency[node][next_edge[node]];
            next_edge[node] += 1;
            if !edge_used[id] {
                edge_used[id] = true;
                stack.push(to);
                advanced = true;
                break;
            }
        }
        if !advanced {
            circuit.push(node);
            stack.pop();
        }
    }

    // Shortcut repeated nodes to a Hamiltonian cycle.
    let mut seen = vec![false; nb_nodes];
    let mut tour = Vec::with_capacity(nb_nodes);
    for node in circuit {
        if !seen[node] {
            seen[node] = true;
            tour.push(node);
        }
    }
    tour
}
