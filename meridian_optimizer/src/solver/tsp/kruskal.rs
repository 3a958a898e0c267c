/// Union-find with path compression and union by rank.
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Kruskal minimum spanning tree over a complete graph given by a cost
/// closure. Returns the tree edges.
pub fn minimum_spanning_tree(
    nb_nodes: usize,
    cost: impl Fn(usize, usize) -> i64,
) -> Vec<(usize, usize)> {
    let mut edges: Vec<(i64, usize, usize)> = Vec::with_capacity(nb_nodes * nb_nodes / 2);
    for i in 0..nb_nodes {
        for j in i + 1..nb_nodes {
            edges.push((cost(i, j), i, j));
        }
    }
    edges.sort_unstable();

    let mut uf = UnionFind::new(nb_nodes);
    let mut tree = Vec::with_capacity(nb_nodes.saturating_sub(1));
    for (_, i, j) in edges {
        if uf.union(i, j) {
            tree.push((i, j));
            if tree.len() + 1 == nb_nodes {
                break;
            }
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(4);
        assert!(uf.union(0, 1));
        assert!(uf.union(2, 3));
        assert!(!uf.union(1, 0));
        assert_ne!(uf.find(0), uf.find(2));
        assert!(uf.union(1, 3));
        assert_eq!(uf.find(0), uf.find(2));
    }

    #[test]
    fn test_mst_on_line() {
        // Nodes on a line: the tree is the chain of unit edges.
        let tree = minimum_spanning_tree(4, |i, j| (i as i64 - j as i64).abs());
        assert_eq!(tree.len(), 3);
        assert!(tree.iter().all(|&(i, j)| (i as i64 - j as i64).abs() == 1));
    }
}
