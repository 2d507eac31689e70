//! An undirected multigraph with O(1) edge deletion.
//!
//! Nodes and edges live in slot arrays with free lists, addressed by the
//! index newtypes [`GraphNode`] and [`GraphEdge`]. Every edge knows its two
//! endpoints and its position in both incidence lists, so edges can be
//! unlinked in constant time — the t-decomposition's graph emission deletes
//! marker edge pairs while merging, and node merging splices whole
//! incidence lists.
//!
//! Self-loops are allowed; a loop occurs twice in the incidence list of its
//! node, once per end.

use core::fmt;

const END: usize = usize::MAX;

/// Node identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphNode(pub usize);

/// Edge identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphEdge(pub usize);

impl GraphNode {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl GraphEdge {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
struct NodeData {
    /// First arc (2·edge + end) of the incidence list, or `END`.
    first_arc: usize,
    in_use: bool,
    /// Next slot in the free list when not in use.
    next_free: usize,
}

#[derive(Clone, Debug)]
struct EdgeData {
    /// Endpoint node of each end.
    nodes: [usize; 2],
    /// Next arc in the incidence list of `nodes[end]`.
    next: [usize; 2],
    /// Previous arc, or `END` at the list head.
    prev: [usize; 2],
    in_use: bool,
}

/// An undirected multigraph with slot-allocated nodes and edges.
#[derive(Clone, Default)]
pub struct Graph {
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
    first_free_node: usize,
    first_free_edge: usize,
    num_nodes: usize,
    num_edges: usize,
}

impl Graph {
    pub fn new() -> Graph {
        Graph {
            nodes: Vec::new(),
            edges: Vec::new(),
            first_free_node: END,
            first_free_edge: END,
            num_nodes: 0,
            num_edges: 0,
        }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Graph {
        let mut g = Graph::new();
        g.nodes.reserve(nodes);
        g.edges.reserve(edges);
        g
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Upper bound (exclusive) on node indices ever handed out.
    #[inline]
    pub fn node_bound(&self) -> usize {
        self.nodes.len()
    }

    /// Upper bound (exclusive) on edge indices ever handed out.
    #[inline]
    pub fn edge_bound(&self) -> usize {
        self.edges.len()
    }

    pub fn add_node(&mut self) -> GraphNode {
        let v = if self.first_free_node != END {
            let v = self.first_free_node;
            self.first_free_node = self.nodes[v].next_free;
            self.nodes[v].first_arc = END;
            self.nodes[v].in_use = true;
            v
        } else {
            self.nodes.push(NodeData {
                first_arc: END,
                in_use: true,
                next_free: END,
            });
            self.nodes.len() - 1
        };
        self.num_nodes += 1;
        GraphNode(v)
    }

    pub fn add_edge(&mut self, u: GraphNode, v: GraphNode) -> GraphEdge {
        debug_assert!(self.nodes[u.0].in_use && self.nodes[v.0].in_use);
        let e = if self.first_free_edge != END {
            let e = self.first_free_edge;
            self.first_free_edge = self.edges[e].next[0];
            e
        } else {
            self.edges.push(EdgeData {
                nodes: [0, 0],
                next: [END, END],
                prev: [END, END],
                in_use: false,
            });
            self.edges.len() - 1
        };
        self.edges[e].nodes = [u.0, v.0];
        self.edges[e].in_use = true;
        for end in 0..2 {
            self.link_arc(2 * e + end);
        }
        self.num_edges += 1;
        GraphEdge(e)
    }

    /// The two endpoints of `e`, in creation order.
    #[inline]
    pub fn edge_ends(&self, e: GraphEdge) -> (GraphNode, GraphNode) {
        let data = &self.edges[e.0];
        (GraphNode(data.nodes[0]), GraphNode(data.nodes[1]))
    }

    /// The first endpoint of `e`.
    #[inline]
    pub fn edge_u(&self, e: GraphEdge) -> GraphNode {
        GraphNode(self.edges[e.0].nodes[0])
    }

    /// The second endpoint of `e`.
    #[inline]
    pub fn edge_v(&self, e: GraphEdge) -> GraphNode {
        GraphNode(self.edges[e.0].nodes[1])
    }

    /// Removes edge `e` by unlinking both of its arcs.
    pub fn delete_edge(&mut self, e: GraphEdge) {
        debug_assert!(self.edges[e.0].in_use);
        for end in 0..2 {
            self.unlink_arc(2 * e.0 + end);
        }
        self.edges[e.0].in_use = false;
        self.edges[e.0].next[0] = self.first_free_edge;
        self.first_free_edge = e.0;
        self.num_edges -= 1;
    }

    /// Removes node `v` together with any still-incident edges.
    pub fn delete_node(&mut self, v: GraphNode) {
        debug_assert!(self.nodes[v.0].in_use);
        while self.nodes[v.0].first_arc != END {
            let e = GraphEdge(self.nodes[v.0].first_arc / 2);
            self.delete_edge(e);
        }
        self.nodes[v.0].in_use = false;
        self.nodes[v.0].next_free = self.first_free_node;
        self.first_free_node = v.0;
        self.num_nodes -= 1;
    }

    /// Redirects every edge incident to `from` so that it is incident to
    /// `into` instead; `from` ends up isolated.
    pub fn merge_nodes(&mut self, into: GraphNode, from: GraphNode) {
        debug_assert!(into != from);
        while self.nodes[from.0].first_arc != END {
            let arc = self.nodes[from.0].first_arc;
            self.unlink_arc(arc);
            self.edges[arc / 2].nodes[arc % 2] = into.0;
            self.link_arc(arc);
        }
    }

    /// Iterates over all live nodes.
    pub fn nodes(&self) -> impl Iterator<Item = GraphNode> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, data)| data.in_use)
            .map(|(v, _)| GraphNode(v))
    }

    /// Iterates over all live edges.
    pub fn edges(&self) -> impl Iterator<Item = GraphEdge> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, data)| data.in_use)
            .map(|(e, _)| GraphEdge(e))
    }

    /// Iterates over the incidences of `v` as `(edge, other endpoint)`.
    ///
    /// A self-loop at `v` is reported twice.
    pub fn incident(&self, v: GraphNode) -> Incident<'_> {
        Incident {
            graph: self,
            arc: self.nodes[v.0].first_arc,
        }
    }

    /// Degree of `v`, counting self-loops twice.
    pub fn degree(&self, v: GraphNode) -> usize {
        self.incident(v).count()
    }

    fn link_arc(&mut self, arc: usize) {
        let v = self.edges[arc / 2].nodes[arc % 2];
        let head = self.nodes[v].first_arc;
        self.edges[arc / 2].next[arc % 2] = head;
        self.edges[arc / 2].prev[arc % 2] = END;
        if head != END {
            self.edges[head / 2].prev[head % 2] = arc;
        }
        self.nodes[v].first_arc = arc;
    }

    fn unlink_arc(&mut self, arc: usize) {
        let v = self.edges[arc / 2].nodes[arc % 2];
        let prev = self.edges[arc / 2].prev[arc % 2];
        let next = self.edges[arc / 2].next[arc % 2];
        if prev == END {
            self.nodes[v].first_arc = next;
        } else {
            self.edges[prev / 2].next[prev % 2] = next;
        }
        if next != END {
            self.edges[next / 2].prev[next % 2] = prev;
        }
    }
}

/// Iterator over the incidences of one node.
pub struct Incident<'a> {
    graph: &'a Graph,
    arc: usize,
}

impl Iterator for Incident<'_> {
    /// `(edge, other endpoint)`.
    type Item = (GraphEdge, GraphNode);

    fn next(&mut self) -> Option<Self::Item> {
        if self.arc == END {
            return None;
        }
        let edge = self.arc / 2;
        let end = self.arc % 2;
        let other = self.graph.edges[edge].nodes[1 - end];
        self.arc = self.graph.edges[edge].next[end];
        Some((GraphEdge(edge), GraphNode(other)))
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Graph {{ {} nodes, {} edges: ",
            self.num_nodes, self.num_edges
        )?;
        for e in self.edges() {
            let (u, v) = self.edge_ends(e);
            write!(f, "{}=({},{}) ", e.0, u.0, v.0)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_delete_reuses_slots() {
        let mut g = Graph::new();
        let a = g.add_node();
        let b = g.add_node();
        let e = g.add_edge(a, b);
        assert_eq!(g.num_edges(), 1);
        g.delete_edge(e);
        assert_eq!(g.num_edges(), 0);
        let f = g.add_edge(b, a);
        assert_eq!(f.index(), e.index());
    }

    #[test]
    fn merge_moves_incidences() {
        let mut g = Graph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        g.add_edge(a, c);
        g.add_edge(b, c);
        let e = g.add_edge(a, b);
        g.merge_nodes(a, b);
        assert_eq!(g.degree(a), 4);
        let (u, v) = g.edge_ends(e);
        assert_eq!((u, v), (a, a));
        g.delete_node(b);
        assert_eq!(g.num_nodes(), 2);
    }

    #[test]
    fn loops_count_twice() {
        let mut g = Graph::new();
        let a = g.add_node();
        g.add_edge(a, a);
        assert_eq!(g.degree(a), 2);
    }
}
