//! The t-decomposition: a dynamic representation of a graphic matroid as a
//! forest of *members* (parallel, series, rigid, loop) linked by marker
//! edge pairs.
//!
//! Members and their edges live in slot pools with free lists; member and
//! node identity is maintained by union-find through the `representative_*`
//! fields, so merging a member into its parent or identifying two nodes is
//! a single pointer write plus lazy path compression.
//!
//! A column is added in two phases. [`TDec::add_column_check`] builds the
//! *reduced decomposition* — the subtree of members touched by the column's
//! rows — classifies every reduced member against the closed case tables
//! for its type, and reports whether the column keeps the represented
//! matroid graphic. [`TDec::add_column_apply`] then reorganises the members
//! (splitting series and parallel members, merging along the terminal
//! path) and inserts the new column edge.

use fixedbitset::FixedBitSet;

use crate::graph::{Graph, GraphEdge};

pub(super) const NONE: usize = usize::MAX;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum MemberType {
    Parallel,
    Series,
    Rigid,
    Loop,
}

/// What a decomposition edge stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum EdgeElement {
    /// Not assigned yet, or a marker edge.
    None,
    Row(usize),
    Column(usize),
}

#[derive(Clone, Debug)]
struct EdgeData {
    element: EdgeElement,
    /// Owning member (subject to union-find), or `NONE` when free.
    member: usize,
    /// Head node; only meaningful inside rigid members.
    head: usize,
    /// Tail node; only meaningful inside rigid members.
    tail: usize,
    /// Previous edge in the member's edge ring.
    prev: usize,
    /// Next edge in the member's edge ring; doubles as the free-list link.
    next: usize,
    /// Child member linked to this edge if it is a marker of a parent.
    child_member: usize,
}

#[derive(Clone, Debug)]
struct MemberData {
    mtype: MemberType,
    /// Representative of this member, or `NONE` if this is representative.
    representative: usize,
    /// Parent member; only valid for representative members.
    parent: usize,
    num_edges: usize,
    /// Marker edge inside this member pointing to the parent.
    marker_to_parent: usize,
    /// Marker edge inside the parent linked to this member.
    marker_of_parent: usize,
    first_edge: usize,
    /// Visit stamp for the parallel parent/child marker normalisation.
    last_parallel_check_visit: u64,
}

#[derive(Clone, Debug)]
struct NodeData {
    /// Representative of this node towards the root, `NONE` at a root;
    /// doubles as the free-list link.
    representative: usize,
}

/// The member types a reduced member can take on during a column check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum RType {
    Unset,
    /// Path edges plus the parent marker close a cycle; the member can be
    /// replaced by marking its parent marker as a path edge.
    CycleChild,
    /// Exactly one terminal lies in this member or its descendants.
    SingleChild,
    /// Both terminals lie in this member or its descendants.
    DoubleChild,
    /// Root of the reduced decomposition.
    Root,
}

#[derive(Clone, Debug)]
struct ReducedMember {
    member: usize,
    root_member: usize,
    depth: usize,
    rtype: RType,
    num_children: usize,
    children_start: usize,
    /// Head of this member's list of path edges (index into `path_edges`).
    first_path_edge: usize,
    /// For rigid members: end nodes of the (up to two) paths inside.
    rigid_end_nodes: [usize; 4],
}

#[derive(Copy, Clone, Debug)]
struct PathEdge {
    edge: usize,
    next_sibling: usize,
    next_overall: usize,
}

#[derive(Clone, Debug)]
struct ReducedComponent {
    root: usize,
    root_depth: usize,
    terminal_member: [usize; 2],
    terminal_node: [usize; 2],
    num_terminals: usize,
}

/// Scratch state for one column addition, reused across columns.
#[derive(Default)]
pub(crate) struct NewColumn {
    pub(super) remains_graphic: bool,
    reduced_members: Vec<ReducedMember>,
    /// member → index into `reduced_members`, or `NONE`.
    member_reduced: Vec<usize>,
    /// member → reduced member minimising depth in its component.
    member_minimizer: Vec<usize>,
    reduced_components: Vec<ReducedComponent>,
    path_edges: Vec<PathEdge>,
    first_path_edge_overall: usize,
    children_storage: Vec<usize>,
    nodes_degree: Vec<u32>,
    edges_in_path: FixedBitSet,
}

impl NewColumn {
    pub(super) fn new() -> NewColumn {
        NewColumn {
            remains_graphic: true,
            first_path_edge_overall: NONE,
            ..Default::default()
        }
    }

    #[inline]
    fn in_path(&self, edge: usize) -> bool {
        edge < self.edges_in_path.len() && self.edges_in_path.contains(edge)
    }

    fn mark_path(&mut self, edge: usize, value: bool) {
        if self.edges_in_path.len() <= edge {
            self.edges_in_path.grow(edge + 1);
        }
        self.edges_in_path.set(edge, value);
    }

    fn children(&self, reduced: usize) -> &[usize] {
        let rm = &self.reduced_members[reduced];
        &self.children_storage[rm.children_start..rm.children_start + rm.num_children]
    }
}

/// The t-decomposition itself.
pub(crate) struct TDec {
    members: Vec<MemberData>,
    edges: Vec<EdgeData>,
    first_free_edge: usize,
    nodes: Vec<NodeData>,
    first_free_node: usize,
    /// row → its edge, or `NONE`.
    row_edges: Vec<usize>,
    pub(super) num_rows: usize,
    num_live_edges: usize,
    num_marker_pairs: usize,
    parallel_check_visit: u64,
}

impl TDec {
    pub(super) fn new(mem_rows: usize) -> TDec {
        TDec {
            members: Vec::with_capacity(64),
            edges: Vec::with_capacity(256),
            first_free_edge: NONE,
            nodes: Vec::with_capacity(128),
            first_free_node: NONE,
            row_edges: vec![NONE; mem_rows],
            num_rows: 0,
            num_live_edges: 0,
            num_marker_pairs: 0,
            parallel_check_visit: 0,
        }
    }

    // ----- union-find over members and nodes ------------------------------

    #[inline]
    fn is_representative(&self, member: usize) -> bool {
        self.members[member].representative == NONE
    }

    fn find_member(&mut self, member: usize) -> usize {
        let mut root = member;
        while self.members[root].representative != NONE {
            root = self.members[root].representative;
        }
        let mut current = member;
        while self.members[current].representative != NONE {
            let next = self.members[current].representative;
            if next != root {
                self.members[current].representative = root;
            }
            current = next;
        }
        root
    }

    fn find_member_parent(&mut self, member: usize) -> usize {
        debug_assert!(self.is_representative(member));
        let parent = self.members[member].parent;
        if parent == NONE {
            NONE
        } else {
            self.find_member(parent)
        }
    }

    fn find_edge_member(&mut self, edge: usize) -> usize {
        let member = self.edges[edge].member;
        self.find_member(member)
    }

    fn find_node(&mut self, node: usize) -> usize {
        debug_assert!(node != NONE);
        let mut root = node;
        while self.nodes[root].representative != NONE {
            root = self.nodes[root].representative;
        }
        let mut current = node;
        while self.nodes[current].representative != NONE {
            let next = self.nodes[current].representative;
            if next != root {
                self.nodes[current].representative = root;
            }
            current = next;
        }
        root
    }

    fn find_edge_tail(&mut self, edge: usize) -> usize {
        let tail = self.edges[edge].tail;
        self.find_node(tail)
    }

    fn find_edge_head(&mut self, edge: usize) -> usize {
        let head = self.edges[edge].head;
        self.find_node(head)
    }

    // ----- pool allocation ------------------------------------------------

    fn create_node(&mut self) -> usize {
        if self.first_free_node != NONE {
            let node = self.first_free_node;
            self.first_free_node = self.nodes[node].representative;
            self.nodes[node].representative = NONE;
            node
        } else {
            self.nodes.push(NodeData {
                representative: NONE,
            });
            self.nodes.len() - 1
        }
    }

    fn create_edge(&mut self, member: usize) -> usize {
        debug_assert!(member == NONE || self.is_representative(member));
        let edge = if self.first_free_edge != NONE {
            let edge = self.first_free_edge;
            self.first_free_edge = self.edges[edge].next;
            edge
        } else {
            self.edges.push(EdgeData {
                element: EdgeElement::None,
                member: NONE,
                head: NONE,
                tail: NONE,
                prev: NONE,
                next: NONE,
                child_member: NONE,
            });
            self.edges.len() - 1
        };
        self.edges[edge].tail = NONE;
        self.edges[edge].head = NONE;
        self.edges[edge].element = EdgeElement::None;
        self.edges[edge].member = member;
        self.edges[edge].child_member = NONE;
        self.num_live_edges += 1;
        edge
    }

    fn free_edge(&mut self, edge: usize) {
        self.edges[edge].member = NONE;
        self.edges[edge].next = self.first_free_edge;
        self.first_free_edge = edge;
    }

    fn create_member(&mut self, mtype: MemberType) -> usize {
        self.members.push(MemberData {
            mtype,
            representative: NONE,
            parent: NONE,
            num_edges: 0,
            marker_to_parent: NONE,
            marker_of_parent: NONE,
            first_edge: NONE,
            last_parallel_check_visit: 0,
        });
        self.members.len() - 1
    }

    // ----- member edge rings ----------------------------------------------

    fn add_edge_to_members_edge_list(&mut self, edge: usize) {
        let member = self.find_edge_member(edge);
        let first = self.members[member].first_edge;
        if first != NONE {
            debug_assert!(self.members[member].num_edges > 0);
            let last = self.edges[first].prev;
            self.edges[edge].next = first;
            self.edges[edge].prev = last;
            self.edges[first].prev = edge;
            self.edges[last].next = edge;
        } else {
            debug_assert_eq!(self.members[member].num_edges, 0);
            self.edges[edge].next = edge;
            self.edges[edge].prev = edge;
        }
        self.members[member].first_edge = edge;
        self.members[member].num_edges += 1;
    }

    fn remove_edge_from_members_edge_list(&mut self, edge: usize) {
        let member = self.find_edge_member(edge);
        if self.members[member].num_edges == 1 {
            self.members[member].first_edge = NONE;
        } else {
            if self.members[member].first_edge == edge {
                self.members[member].first_edge = self.edges[edge].next;
            }
            debug_assert!(self.members[member].first_edge != edge);
            let prev = self.edges[edge].prev;
            let next = self.edges[edge].next;
            self.edges[prev].next = next;
            self.edges[next].prev = prev;
        }
        self.members[member].num_edges -= 1;
    }

    /// Replaces `old_edge` in its member's ring by `new_edge`, which must
    /// belong to the same member but not be linked in yet.
    fn replace_edge_in_members_edge_list(&mut self, old_edge: usize, new_edge: usize) {
        let member = self.find_edge_member(old_edge);
        self.edges[new_edge].tail = self.edges[old_edge].tail;
        self.edges[new_edge].head = self.edges[old_edge].head;
        self.edges[new_edge].next = self.edges[old_edge].next;
        self.edges[new_edge].prev = self.edges[old_edge].prev;
        let next = self.edges[old_edge].next;
        let prev = self.edges[old_edge].prev;
        self.edges[next].prev = new_edge;
        self.edges[prev].next = new_edge;
        if self.members[member].first_edge == old_edge {
            self.members[member].first_edge = new_edge;
        }
    }

    /// Collects a member's edge ring into a vector (for iteration while
    /// mutating).
    fn member_edges(&self, member: usize) -> Vec<usize> {
        let mut result = Vec::with_capacity(self.members[member].num_edges);
        let first = self.members[member].first_edge;
        if first == NONE {
            return result;
        }
        let mut edge = first;
        loop {
            result.push(edge);
            edge = self.edges[edge].next;
            if edge == first {
                break;
            }
        }
        result
    }

    /// Creates the marker edge pair linking `parent_member` and
    /// `child_member`; returns `(marker_of_parent, marker_to_parent)`.
    /// Neither edge is added to its member's ring.
    fn create_marker_edge_pair(
        &mut self,
        parent_member: usize,
        marker_of_parent_tail: usize,
        marker_of_parent_head: usize,
        child_member: usize,
        marker_to_parent_tail: usize,
        marker_to_parent_head: usize,
    ) -> (usize, usize) {
        debug_assert!(self.is_representative(parent_member));
        debug_assert!(self.is_representative(child_member));

        let marker_of_parent = self.create_edge(parent_member);
        self.edges[marker_of_parent].tail = marker_of_parent_tail;
        self.edges[marker_of_parent].head = marker_of_parent_head;
        self.edges[marker_of_parent].child_member = child_member;

        let marker_to_parent = self.create_edge(child_member);
        self.edges[marker_to_parent].tail = marker_to_parent_tail;
        self.edges[marker_to_parent].head = marker_to_parent_head;

        self.members[child_member].parent = parent_member;
        self.members[child_member].marker_of_parent = marker_of_parent;
        self.members[child_member].marker_to_parent = marker_to_parent;
        self.num_marker_pairs += 1;

        (marker_of_parent, marker_to_parent)
    }

    // ----- graph emission -------------------------------------------------

    /// Emits the realised graph, merging marker edge pairs, and fills
    /// `forest[r]` / `coforest[c]` with the graph edges of row r / column c.
    pub(super) fn to_graph(
        &mut self,
        forest: &mut [GraphEdge],
        coforest: &mut [GraphEdge],
    ) -> Graph {
        let mut graph = Graph::with_capacity(self.nodes.len(), self.edges.len());
        let mut dec_nodes_to_graph = vec![NONE; self.nodes.len()];
        let mut dec_edges_to_graph = vec![NONE; self.edges.len()];
        let mut edge_elements = vec![EdgeElement::None; self.edges.len()];

        for v in 0..self.nodes.len() {
            if self.nodes[v].representative == NONE {
                dec_nodes_to_graph[v] = graph.add_node().index();
            }
        }

        for member in 0..self.members.len() {
            if !self.is_representative(member) {
                continue;
            }
            let edges = self.member_edges(member);
            debug_assert!(!edges.is_empty());
            match self.members[member].mtype {
                MemberType::Rigid => {
                    for &edge in &edges {
                        let head = self.find_edge_head(edge);
                        let tail = self.find_edge_tail(edge);
                        let e = graph.add_edge(
                            crate::graph::GraphNode(dec_nodes_to_graph[head]),
                            crate::graph::GraphNode(dec_nodes_to_graph[tail]),
                        );
                        dec_edges_to_graph[edge] = e.index();
                        edge_elements[e.index()] = self.edges[edge].element;
                    }
                }
                MemberType::Parallel => {
                    let head = graph.add_node();
                    let tail = graph.add_node();
                    for &edge in &edges {
                        let e = graph.add_edge(head, tail);
                        dec_edges_to_graph[edge] = e.index();
                        edge_elements[e.index()] = self.edges[edge].element;
                    }
                }
                MemberType::Series => {
                    let first_node = graph.add_node();
                    let mut v = first_node;
                    for &edge in edges.iter().skip(1) {
                        let w = graph.add_node();
                        let e = graph.add_edge(v, w);
                        dec_edges_to_graph[edge] = e.index();
                        edge_elements[e.index()] = self.edges[edge].element;
                        v = w;
                    }
                    let e = graph.add_edge(v, first_node);
                    dec_edges_to_graph[edges[0]] = e.index();
                    edge_elements[e.index()] = self.edges[edges[0]].element;
                }
                MemberType::Loop => {
                    let v = graph.add_node();
                    let e = graph.add_edge(v, v);
                    dec_edges_to_graph[edges[0]] = e.index();
                    edge_elements[e.index()] = self.edges[edges[0]].element;
                }
            }
        }

        // Merge respective parent and child marker edges.
        for m in 0..self.members.len() {
            if !self.is_representative(m) || self.members[m].parent == NONE {
                continue;
            }
            let parent = GraphEdge(dec_edges_to_graph[self.members[m].marker_of_parent]);
            let child = GraphEdge(dec_edges_to_graph[self.members[m].marker_to_parent]);
            let (parent_u, parent_v) = graph.edge_ends(parent);
            let (child_u, child_v) = graph.edge_ends(child);

            graph.merge_nodes(parent_u, child_u);
            graph.delete_node(child_u);
            graph.merge_nodes(parent_v, child_v);
            graph.delete_node(child_v);

            graph.delete_edge(parent);
            graph.delete_edge(child);
        }

        // Drop nodes of degree zero.
        let isolated: Vec<_> = graph.nodes().filter(|&v| graph.degree(v) == 0).collect();
        for v in isolated {
            graph.delete_node(v);
        }

        for e in graph.edges() {
            match edge_elements[e.index()] {
                EdgeElement::Row(r) => forest[r] = e,
                EdgeElement::Column(c) => coforest[c] = e,
                EdgeElement::None => {}
            }
        }

        graph
    }

    /// Adds a single-edge parallel member for a row not seen in any column
    /// yet.
    pub(super) fn add_row_member(&mut self, row: usize) {
        let member = self.create_member(MemberType::Parallel);
        let edge = self.create_edge(member);
        self.add_edge_to_members_edge_list(edge);
        self.edges[edge].element = EdgeElement::Row(row);
        if self.row_edges.len() <= row {
            self.row_edges.resize(row + 1, NONE);
        }
        self.row_edges[row] = edge;
        if row >= self.num_rows {
            self.num_rows = row + 1;
        }
    }

    // ----- check phase ----------------------------------------------------

    /// Removes all path edges of the previous iteration and resets the
    /// node degrees they touched.
    fn remove_all_path_edges(&mut self, col: &mut NewColumn) {
        let mut index = col.first_path_edge_overall;
        while index != NONE {
            let edge = col.path_edges[index].edge;
            col.edges_in_path.set(edge, false);
            let member = self.find_edge_member(edge);
            if self.members[member].mtype == MemberType::Rigid {
                let tail = self.find_edge_tail(edge);
                let head = self.find_edge_head(edge);
                if tail < col.nodes_degree.len() && head < col.nodes_degree.len() {
                    col.nodes_degree[tail] = 0;
                    col.nodes_degree[head] = 0;
                }
            }
            index = col.path_edges[index].next_overall;
        }
        col.first_path_edge_overall = NONE;
        col.path_edges.clear();
    }

    /// Ensures that the child marker for `child_member` inside `member` is
    /// not parallel to `member`'s own parent marker; if it is, the child is
    /// relocated into a parallel member shared with the parent marker.
    ///
    /// This situation only arises when a component was reordered to receive
    /// a new root.
    fn parallel_parent_child_check_member(&mut self, member: usize, child_member: usize) {
        let mut member = member;
        let mut child_member = child_member;
        loop {
            if self.members[child_member].last_parallel_check_visit == self.parallel_check_visit {
                return;
            }
            self.members[child_member].last_parallel_check_visit = self.parallel_check_visit;
            let mut parent_member = self.find_member_parent(member);
            if parent_member == NONE {
                return;
            }

            if self.members[member].mtype == MemberType::Rigid {
                let child_marker_edge = self.members[child_member].marker_of_parent;
                let marker_to_parent = self.members[member].marker_to_parent;
                let nodes = [
                    self.find_edge_tail(child_marker_edge),
                    self.find_edge_head(child_marker_edge),
                    self.find_edge_tail(marker_to_parent),
                    self.find_edge_head(marker_to_parent),
                ];
                if (nodes[0] == nodes[2] && nodes[1] == nodes[3])
                    || (nodes[0] == nodes[3] && nodes[1] == nodes[2])
                {
                    if self.members[parent_member].mtype != MemberType::Parallel {
                        // Interpose a parallel member holding the two
                        // markers.
                        let new_parallel = self.create_member(MemberType::Parallel);
                        let marker_of_parent = self.members[member].marker_of_parent;
                        let (new_marker_of_parent, new_marker_to_parent) = self
                            .create_marker_edge_pair(
                                parent_member,
                                self.edges[marker_of_parent].tail,
                                self.edges[marker_of_parent].head,
                                new_parallel,
                                NONE,
                                NONE,
                            );
                        self.replace_edge_in_members_edge_list(
                            marker_of_parent,
                            new_marker_of_parent,
                        );
                        self.edges[marker_of_parent].child_member = member;
                        self.edges[marker_of_parent].member = new_parallel;
                        self.edges[marker_of_parent].tail = NONE;
                        self.edges[marker_of_parent].head = NONE;
                        self.add_edge_to_members_edge_list(marker_of_parent);
                        self.add_edge_to_members_edge_list(new_marker_to_parent);
                        self.members[member].parent = new_parallel;
                        self.members[member].marker_of_parent = marker_of_parent;
                        self.members[member].marker_to_parent = marker_to_parent;
                        parent_member = new_parallel;
                    }
                    debug_assert!(self.members[parent_member].mtype == MemberType::Parallel);

                    self.remove_edge_from_members_edge_list(child_marker_edge);
                    self.edges[child_marker_edge].member = parent_member;
                    self.add_edge_to_members_edge_list(child_marker_edge);
                    self.edges[child_marker_edge].tail = NONE;
                    self.edges[child_marker_edge].head = NONE;
                    self.members[child_member].parent = parent_member;
                }
            }

            child_member = member;
            member = parent_member;
        }
    }

    fn parallel_parent_child_check_reduced_members(&mut self, rows: &[usize]) {
        self.parallel_check_visit += 1;
        for &row in rows {
            if row >= self.num_rows {
                continue;
            }
            let edge = self.row_edges[row];
            if edge == NONE {
                continue;
            }
            let member = self.find_edge_member(edge);
            let parent_member = self.find_member_parent(member);
            if parent_member != NONE {
                self.parallel_parent_child_check_member(parent_member, member);
            }
        }
    }

    /// Creates (or finds) the reduced member for `member`, creating all of
    /// its ancestors' reduced members as needed.
    fn create_reduced_members(&mut self, col: &mut NewColumn, member: usize) -> usize {
        if col.member_reduced[member] != NONE {
            // Known reduced member; remember paths of low depth for the
            // component root.
            let reduced = col.member_reduced[member];
            let root_member = col.reduced_members[reduced].root_member;
            let minimizer = col.member_minimizer[root_member];
            if minimizer == NONE
                || col.reduced_members[reduced].depth < col.reduced_members[minimizer].depth
            {
                col.member_minimizer[root_member] = reduced;
            }
            return reduced;
        }

        let parent_member = self.find_member_parent(member);
        let parent_reduced = if parent_member != NONE {
            self.create_reduced_members(col, parent_member)
        } else {
            NONE
        };

        let reduced = col.reduced_members.len();
        col.member_reduced[member] = reduced;
        let (depth, root_member) = if parent_reduced != NONE {
            col.reduced_members[parent_reduced].num_children += 1;
            (
                col.reduced_members[parent_reduced].depth + 1,
                col.reduced_members[parent_reduced].root_member,
            )
        } else {
            (0, member)
        };
        col.reduced_members.push(ReducedMember {
            member,
            root_member,
            depth,
            rtype: RType::Unset,
            num_children: 0,
            children_start: 0,
            first_path_edge: NONE,
            rigid_end_nodes: [NONE; 4],
        });
        if parent_reduced == NONE {
            col.reduced_components.push(ReducedComponent {
                root: reduced,
                root_depth: 0,
                terminal_member: [NONE; 2],
                terminal_node: [NONE; 2],
                num_terminals: 0,
            });
        }
        reduced
    }

    fn compute_reduced_decomposition(&mut self, col: &mut NewColumn, rows: &[usize]) {
        col.reduced_members.clear();
        col.reduced_components.clear();
        if col.member_reduced.len() < self.members.len() {
            col.member_reduced.resize(self.members.len(), NONE);
            col.member_minimizer.resize(self.members.len(), NONE);
        }

        for &row in rows {
            let edge = if row < self.num_rows {
                self.row_edges[row]
            } else {
                NONE
            };
            if edge == NONE {
                continue;
            }
            let member = self.find_edge_member(edge);
            let reduced = self.create_reduced_members(col, member);
            let root_member = col.reduced_members[reduced].root_member;
            if col.member_minimizer[root_member] == NONE {
                col.member_minimizer[root_member] = reduced;
            }
        }

        // Redirect component roots to the depth minimizers.
        for i in 0..col.reduced_components.len() {
            let root_member = col.reduced_members[col.reduced_components[i].root].member;
            let minimizer = col.member_minimizer[root_member];
            col.reduced_components[i].root_depth = col.reduced_members[minimizer].depth;
            col.reduced_components[i].root = minimizer;
            col.reduced_components[i].num_terminals = 0;
        }

        // Lay out children storage for members at or below their root.
        col.children_storage.clear();
        let mut used = 0usize;
        for m in 0..col.reduced_members.len() {
            let root_member = col.reduced_members[m].root_member;
            let minimizer_depth =
                col.reduced_members[col.member_minimizer[root_member]].depth;
            if col.reduced_members[m].depth >= minimizer_depth {
                col.reduced_members[m].children_start = used;
                used += col.reduced_members[m].num_children;
                col.reduced_members[m].num_children = 0;
            }
        }
        col.children_storage.resize(used, NONE);

        for m in 0..col.reduced_members.len() {
            let root_member = col.reduced_members[m].root_member;
            let minimizer_depth =
                col.reduced_members[col.member_minimizer[root_member]].depth;
            if col.reduced_members[m].depth <= minimizer_depth {
                continue;
            }
            let parent_member = self.find_member_parent(col.reduced_members[m].member);
            let parent_reduced = if parent_member != NONE {
                col.member_reduced[parent_member]
            } else {
                NONE
            };
            if parent_reduced != NONE {
                let slot = col.reduced_members[parent_reduced].children_start
                    + col.reduced_members[parent_reduced].num_children;
                col.children_storage[slot] = m;
                col.reduced_members[parent_reduced].num_children += 1;
            }
        }

        // Clean up the minimizer entries for the next column.
        for m in 0..col.reduced_members.len() {
            let root_member = col.reduced_members[m].root_member;
            col.member_minimizer[root_member] = NONE;
        }
    }

    /// Registers `edge` as a path edge of `reduced`, updating node degrees
    /// inside rigid members.
    fn create_path_edge(&mut self, col: &mut NewColumn, edge: usize, reduced: usize) {
        let index = col.path_edges.len();
        col.path_edges.push(PathEdge {
            edge,
            next_sibling: col.reduced_members[reduced].first_path_edge,
            next_overall: col.first_path_edge_overall,
        });
        col.reduced_members[reduced].first_path_edge = index;
        col.first_path_edge_overall = index;
        col.mark_path(edge, true);

        let member = col.reduced_members[reduced].member;
        let member = self.find_member(member);
        if self.members[member].mtype == MemberType::Rigid {
            let tail = self.find_edge_tail(edge);
            let head = self.find_edge_head(edge);
            if col.nodes_degree.len() < self.nodes.len() {
                col.nodes_degree.resize(self.nodes.len(), 0);
            }
            col.nodes_degree[tail] += 1;
            col.nodes_degree[head] += 1;
        }
    }

    fn create_reduced_decomposition_path_edges(&mut self, col: &mut NewColumn, rows: &[usize]) {
        for m in 0..col.reduced_members.len() {
            col.reduced_members[m].first_path_edge = NONE;
        }
        for &row in rows {
            let edge = if row < self.num_rows {
                self.row_edges[row]
            } else {
                NONE
            };
            if edge != NONE {
                let member = self.find_edge_member(edge);
                let reduced = col.member_reduced[member];
                debug_assert!(reduced != NONE);
                self.create_path_edge(col, edge, reduced);
            }
        }
    }

    fn count_path_edges(&self, col: &NewColumn, reduced: usize) -> usize {
        let mut count = 0;
        let mut index = col.reduced_members[reduced].first_path_edge;
        while index != NONE {
            count += 1;
            index = col.path_edges[index].next_sibling;
        }
        count
    }

    /// Counts the children of `reduced` that must contain one or two path
    /// ends, and collects up to two of their child marker edges.
    fn count_children_types(&mut self, col: &NewColumn, reduced: usize) -> (usize, usize, [usize; 2]) {
        let mut num_one_end = 0;
        let mut num_two_ends = 0;
        let mut child_marker_edges = [NONE, NONE];
        let mut next_marker = 0;

        for i in 0..col.reduced_members[reduced].num_children {
            let child = col.children_storage[col.reduced_members[reduced].children_start + i];
            match col.reduced_members[child].rtype {
                RType::SingleChild => {
                    if next_marker < 2 {
                        let member = self.find_member(col.reduced_members[child].member);
                        child_marker_edges[next_marker] = self.members[member].marker_of_parent;
                        next_marker += 1;
                    }
                    num_one_end += 1;
                }
                RType::DoubleChild => {
                    if next_marker < 2 {
                        let member = self.find_member(col.reduced_members[child].member);
                        child_marker_edges[next_marker] = self.members[member].marker_of_parent;
                        next_marker += 1;
                    }
                    num_two_ends += 1;
                }
                _ => {}
            }
        }
        (num_one_end, num_two_ends, child_marker_edges)
    }

    fn determine_type_parallel(
        &mut self,
        col: &mut NewColumn,
        reduced: usize,
        num_one_end: usize,
        num_two_ends: usize,
        depth: usize,
    ) {
        if depth == 0 {
            // A parallel root always works.
            col.reduced_members[reduced].rtype = RType::Root;
            return;
        }
        let has_path_edge = col.reduced_members[reduced].first_path_edge != NONE;
        if 2 * num_two_ends + num_one_end == 0 && has_path_edge {
            col.reduced_members[reduced].rtype = RType::CycleChild;
        } else if num_one_end == 1 {
            col.reduced_members[reduced].rtype = RType::SingleChild;
        } else if num_one_end + 2 * num_two_ends == 2 {
            if has_path_edge {
                col.remains_graphic = false;
            } else {
                col.reduced_members[reduced].rtype = RType::DoubleChild;
            }
        } else {
            // A parallel leaf of the reduced decomposition must contain a
            // path edge.
            debug_assert!(has_path_edge);
            col.reduced_members[reduced].rtype = RType::CycleChild;
        }
    }

    fn determine_type_series(
        &mut self,
        col: &mut NewColumn,
        reduced: usize,
        num_one_end: usize,
        num_two_ends: usize,
        depth: usize,
    ) {
        let member = self.find_member(col.reduced_members[reduced].member);
        debug_assert!(self.members[member].mtype == MemberType::Series);
        let count_path_edges = self.count_path_edges(col, reduced);
        let num_edges = self.members[member].num_edges;

        if depth == 0 {
            // The series member is the root of the reduced decomposition
            // but not of the whole decomposition.
            debug_assert!(self.members[member].parent != NONE);
            col.remains_graphic = num_two_ends == 0;
            col.reduced_members[reduced].rtype = if count_path_edges == num_edges - 1 {
                RType::CycleChild
            } else {
                RType::Root
            };
            return;
        }

        if count_path_edges == num_edges - 1 {
            col.reduced_members[reduced].rtype = RType::CycleChild;
        } else if count_path_edges + num_two_ends == num_edges - 1 {
            debug_assert_eq!(num_two_ends, 1);
            col.reduced_members[reduced].rtype = RType::DoubleChild;
        } else if num_two_ends == 1 {
            col.remains_graphic = false;
        } else if num_one_end == 1 {
            col.reduced_members[reduced].rtype = RType::SingleChild;
        } else if num_one_end == 2 {
            col.reduced_members[reduced].rtype = RType::DoubleChild;
        } else {
            debug_assert_eq!(num_one_end, 0);
            debug_assert_eq!(num_two_ends, 0);
            col.reduced_members[reduced].rtype = RType::SingleChild;
        }
    }

    fn determine_type_rigid(
        &mut self,
        col: &mut NewColumn,
        reduced: usize,
        num_one_end: usize,
        num_two_ends: usize,
        child_marker_edges: [usize; 2],
        depth: usize,
    ) {
        let member = self.find_member(col.reduced_members[reduced].member);
        debug_assert!(self.members[member].mtype == MemberType::Rigid);

        let mut parent_marker_nodes = [NONE, NONE];
        if depth > 0 {
            let marker = self.members[member].marker_to_parent;
            parent_marker_nodes = [self.find_edge_tail(marker), self.find_edge_head(marker)];
        }
        let mut child_marker_nodes = [NONE; 4];
        for i in 0..2 {
            if child_marker_edges[i] != NONE {
                child_marker_nodes[2 * i] = self.find_edge_tail(child_marker_edges[i]);
                child_marker_nodes[2 * i + 1] = self.find_edge_head(child_marker_edges[i]);
            }
        }

        // Collect the path end nodes: nodes of path-degree one. Degree
        // three or more, or more than four ends, is never graphic.
        let mut path_end_nodes = [NONE; 4];
        let mut num_path_end_nodes = 0;
        let mut index = col.reduced_members[reduced].first_path_edge;
        while index != NONE {
            let edge = col.path_edges[index].edge;
            let nodes = [self.find_edge_head(edge), self.find_edge_tail(edge)];
            for &v in &nodes {
                if col.nodes_degree[v] >= 3 {
                    col.remains_graphic = false;
                    return;
                }
                if col.nodes_degree[v] == 1 {
                    if num_path_end_nodes == 4 {
                        col.remains_graphic = false;
                        return;
                    }
                    path_end_nodes[num_path_end_nodes] = v;
                    num_path_end_nodes += 1;
                }
            }
            index = col.path_edges[index].next_sibling;
        }

        // With two paths, order the quadruple so that ends 0/1 belong to
        // one path and ends 0 and 2 lie on the parent marker.
        if num_path_end_nodes == 4 {
            let mut node_edges: hashbrown::HashMap<usize, [usize; 2]> = hashbrown::HashMap::new();
            let mut index = col.reduced_members[reduced].first_path_edge;
            while index != NONE {
                let edge = col.path_edges[index].edge;
                let nodes = [self.find_edge_head(edge), self.find_edge_tail(edge)];
                for &v in &nodes {
                    let slots = node_edges.entry(v).or_insert([NONE, NONE]);
                    if slots[0] == NONE {
                        slots[0] = edge;
                    } else {
                        slots[1] = edge;
                    }
                }
                index = col.path_edges[index].next_sibling;
            }

            // Walk the path starting at end node 0.
            let mut previous_edge = NONE;
            let mut current_node = path_end_nodes[0];
            loop {
                let slots = node_edges[&current_node];
                let mut edge = slots[0];
                if edge == previous_edge {
                    edge = slots[1];
                }
                if edge == NONE {
                    break;
                }
                previous_edge = edge;
                let v = self.find_edge_head(edge);
                current_node = if v != current_node {
                    v
                } else {
                    self.find_edge_tail(edge)
                };
            }

            if current_node == path_end_nodes[2] {
                path_end_nodes[2] = path_end_nodes[1];
                path_end_nodes[1] = current_node;
            } else if current_node == path_end_nodes[3] {
                path_end_nodes[3] = path_end_nodes[1];
                path_end_nodes[1] = current_node;
            }

            if path_end_nodes[2] != parent_marker_nodes[0]
                && path_end_nodes[2] != parent_marker_nodes[1]
            {
                path_end_nodes.swap(2, 3);
            }
        }

        // End node 0 should lie on the parent marker if any end does.
        if num_path_end_nodes >= 2
            && path_end_nodes[0] != parent_marker_nodes[0]
            && path_end_nodes[0] != parent_marker_nodes[1]
        {
            path_end_nodes.swap(0, 1);
        }

        if depth == 0 {
            match num_path_end_nodes {
                0 => {
                    // No path edges: two adjacent single-end children are
                    // needed.
                    if num_one_end == 2
                        && (child_marker_nodes[0] == child_marker_nodes[2]
                            || child_marker_nodes[0] == child_marker_nodes[3]
                            || child_marker_nodes[1] == child_marker_nodes[2]
                            || child_marker_nodes[1] == child_marker_nodes[3])
                    {
                        col.reduced_members[reduced].rtype = RType::Root;
                    } else {
                        col.remains_graphic = false;
                    }
                }
                2 => {
                    if num_one_end == 1 {
                        let mut adjacent = false;
                        for i in 0..2 {
                            for j in 0..2 {
                                if path_end_nodes[i] == child_marker_nodes[j] {
                                    adjacent = true;
                                }
                            }
                        }
                        if adjacent {
                            col.reduced_members[reduced].rtype = RType::Root;
                        } else {
                            col.remains_graphic = false;
                        }
                    } else if num_one_end == 2 {
                        let mut matched = [false, false];
                        for i in 0..2 {
                            for j in 0..4 {
                                if path_end_nodes[i] == child_marker_nodes[j] {
                                    matched[j / 2] = true;
                                }
                            }
                        }
                        if matched[0] && matched[1] {
                            col.reduced_members[reduced].rtype = RType::Root;
                        } else {
                            col.remains_graphic = false;
                        }
                    } else if num_two_ends == 0 {
                        col.reduced_members[reduced].rtype = RType::Root;
                    } else {
                        debug_assert_eq!(num_two_ends, 1);
                        if (child_marker_nodes[0] == path_end_nodes[0]
                            && child_marker_nodes[1] == path_end_nodes[1])
                            || (child_marker_nodes[0] == path_end_nodes[1]
                                && child_marker_nodes[1] == path_end_nodes[0])
                        {
                            col.reduced_members[reduced].rtype = RType::Root;
                        } else {
                            col.remains_graphic = false;
                        }
                    }
                }
                _ => {
                    debug_assert_eq!(num_path_end_nodes, 4);
                    col.remains_graphic = false;
                }
            }
        } else {
            // Non-root rigid member.
            let mut parent_marker_degrees = [
                col.nodes_degree[parent_marker_nodes[0]] as i32,
                col.nodes_degree[parent_marker_nodes[1]] as i32,
            ];

            if num_path_end_nodes == 0 {
                debug_assert!(num_one_end + num_two_ends > 0);
                if num_one_end == 0 {
                    col.remains_graphic = false;
                } else if num_one_end == 1 {
                    if child_marker_nodes[0] == parent_marker_nodes[0]
                        || child_marker_nodes[0] == parent_marker_nodes[1]
                        || child_marker_nodes[1] == parent_marker_nodes[0]
                        || child_marker_nodes[1] == parent_marker_nodes[1]
                    {
                        col.reduced_members[reduced].rtype = RType::SingleChild;
                    } else {
                        col.remains_graphic = false;
                    }
                } else {
                    // Two single-end children below a non-root member.
                    let mut child_marker_parent_node = [-1i32, -1i32];
                    let mut is_parallel = false;
                    for i in 0..4 {
                        for (j, &pm) in parent_marker_nodes.iter().enumerate() {
                            if child_marker_nodes[i] == pm {
                                if child_marker_parent_node[i / 2] >= 0 {
                                    is_parallel = true;
                                }
                                child_marker_parent_node[i / 2] = j as i32;
                            }
                        }
                    }
                    if !is_parallel
                        && child_marker_parent_node[0] >= 0
                        && child_marker_parent_node[1] >= 0
                        && child_marker_parent_node[0] != child_marker_parent_node[1]
                    {
                        col.reduced_members[reduced].rtype = RType::DoubleChild;
                    } else {
                        col.remains_graphic = false;
                    }
                }
            } else if num_path_end_nodes == 2 {
                if num_one_end == 1 {
                    let mut parent_marker_nodes = parent_marker_nodes;
                    if parent_marker_nodes[0] != path_end_nodes[0] {
                        parent_marker_nodes.swap(0, 1);
                        parent_marker_degrees.swap(0, 1);
                    }
                    if parent_marker_nodes[0] != path_end_nodes[0] {
                        col.remains_graphic = false;
                        return;
                    }
                    if parent_marker_nodes[1] == path_end_nodes[1] {
                        // The path closes a cycle with the parent marker.
                        if child_marker_nodes[0] == parent_marker_nodes[0]
                            || child_marker_nodes[0] == parent_marker_nodes[1]
                            || child_marker_nodes[1] == parent_marker_nodes[0]
                            || child_marker_nodes[1] == parent_marker_nodes[1]
                        {
                            col.reduced_members[reduced].rtype = RType::SingleChild;
                        } else {
                            col.remains_graphic = false;
                        }
                    } else if child_marker_nodes[0] == path_end_nodes[1]
                        || child_marker_nodes[1] == path_end_nodes[1]
                    {
                        col.reduced_members[reduced].rtype = RType::SingleChild;
                    } else if child_marker_nodes[0] == parent_marker_nodes[1]
                        || child_marker_nodes[1] == parent_marker_nodes[1]
                    {
                        col.reduced_members[reduced].rtype = RType::DoubleChild;
                    } else {
                        col.remains_graphic = false;
                    }
                } else if num_one_end == 2 {
                    let other_parent_node = if path_end_nodes[0] == parent_marker_nodes[0] {
                        parent_marker_nodes[1]
                    } else if path_end_nodes[0] == parent_marker_nodes[1] {
                        parent_marker_nodes[0]
                    } else {
                        col.remains_graphic = false;
                        return;
                    };
                    // A path closing a cycle with the parent marker is only
                    // allowed at the root.
                    if path_end_nodes[1] == other_parent_node {
                        col.remains_graphic = false;
                        return;
                    }
                    let mut child_matched = [false, false];
                    let mut path_end_matched = false;
                    let mut other_parent_matched = false;
                    for i in 0..4 {
                        if child_marker_nodes[i] == path_end_nodes[1] {
                            child_matched[i / 2] = true;
                            path_end_matched = true;
                        }
                        if child_marker_nodes[i] == other_parent_node {
                            child_matched[i / 2] = true;
                            other_parent_matched = true;
                        }
                    }
                    if child_matched[0] && child_matched[1] && path_end_matched && other_parent_matched
                    {
                        col.reduced_members[reduced].rtype = RType::DoubleChild;
                    } else {
                        col.remains_graphic = false;
                    }
                } else if num_two_ends == 0 {
                    if (parent_marker_degrees[0] % 2 == 0 && parent_marker_degrees[1] == 1)
                        || (parent_marker_degrees[0] == 1 && parent_marker_degrees[1] % 2 == 0)
                    {
                        col.reduced_members[reduced].rtype = RType::SingleChild;
                    } else if parent_marker_degrees[0] == 1 && parent_marker_degrees[1] == 1 {
                        col.reduced_members[reduced].rtype = RType::CycleChild;
                    } else {
                        col.remains_graphic = false;
                    }
                } else {
                    debug_assert_eq!(num_two_ends, 1);
                    if (path_end_nodes[0] == parent_marker_nodes[0]
                        && parent_marker_nodes[1] == child_marker_nodes[0]
                        && child_marker_nodes[1] == path_end_nodes[1])
                        || (path_end_nodes[0] == parent_marker_nodes[0]
                            && parent_marker_nodes[1] == child_marker_nodes[1]
                            && child_marker_nodes[0] == path_end_nodes[1])
                        || (path_end_nodes[0] == parent_marker_nodes[1]
                            && parent_marker_nodes[0] == child_marker_nodes[0]
                            && child_marker_nodes[1] == path_end_nodes[1])
                        || (path_end_nodes[0] == parent_marker_nodes[1]
                            && parent_marker_nodes[0] == child_marker_nodes[1]
                            && child_marker_nodes[0] == path_end_nodes[1])
                    {
                        col.reduced_members[reduced].rtype = RType::DoubleChild;
                    } else {
                        col.remains_graphic = false;
                    }
                }
            } else {
                debug_assert_eq!(num_path_end_nodes, 4);
                // Both paths must start at the parent marker edge.
                if path_end_nodes[0] != parent_marker_nodes[0]
                    && path_end_nodes[0] != parent_marker_nodes[1]
                {
                    col.remains_graphic = false;
                    return;
                }
                if path_end_nodes[2] != parent_marker_nodes[0]
                    && path_end_nodes[2] != parent_marker_nodes[1]
                {
                    col.remains_graphic = false;
                    return;
                }

                if num_one_end == 1 {
                    let path_connects = [
                        path_end_nodes[1] == child_marker_nodes[0]
                            || path_end_nodes[1] == child_marker_nodes[1],
                        path_end_nodes[3] == child_marker_nodes[0]
                            || path_end_nodes[3] == child_marker_nodes[1],
                    ];
                    if path_connects[0] || path_connects[1] {
                        col.reduced_members[reduced].rtype = RType::DoubleChild;
                    } else {
                        col.remains_graphic = false;
                    }
                } else if num_one_end == 2 {
                    let mut path_connected = [false, false];
                    let mut child_connected = [false, false];
                    for i in 0..2 {
                        for j in 0..4 {
                            if path_end_nodes[1 + 2 * i] == child_marker_nodes[j] {
                                path_connected[i] = true;
                                child_connected[j / 2] = true;
                            }
                        }
                    }
                    if path_connected[0] && path_connected[1] && child_connected[0] && child_connected[1]
                    {
                        col.reduced_members[reduced].rtype = RType::DoubleChild;
                    } else {
                        col.remains_graphic = false;
                    }
                } else if num_two_ends == 0 {
                    col.reduced_members[reduced].rtype = RType::DoubleChild;
                } else {
                    debug_assert_eq!(num_two_ends, 1);
                    if (path_end_nodes[1] == child_marker_nodes[0]
                        && path_end_nodes[3] == child_marker_nodes[1])
                        || (path_end_nodes[1] == child_marker_nodes[1]
                            && path_end_nodes[3] == child_marker_nodes[0])
                    {
                        col.reduced_members[reduced].rtype = RType::DoubleChild;
                    } else {
                        col.remains_graphic = false;
                    }
                }
            }
        }

        col.reduced_members[reduced].rigid_end_nodes = path_end_nodes;
    }

    /// Determines the type of `reduced` and all its children.
    fn determine_types(&mut self, col: &mut NewColumn, component: usize, reduced: usize, depth: usize) {
        let children: Vec<usize> = col.children(reduced).to_vec();
        for child in children {
            self.determine_types(col, component, child, depth + 1);
            if !col.remains_graphic {
                return;
            }
        }

        let (num_one_end, num_two_ends, child_marker_edges) = self.count_children_types(col, reduced);
        if 2 * num_two_ends + num_one_end > 2 {
            col.remains_graphic = false;
            return;
        }

        let is_root = reduced == col.reduced_components[component].root;
        let member = self.find_member(col.reduced_members[reduced].member);
        match self.members[member].mtype {
            MemberType::Parallel => {
                self.determine_type_parallel(col, reduced, num_one_end, num_two_ends, depth)
            }
            MemberType::Series => {
                self.determine_type_series(col, reduced, num_one_end, num_two_ends, depth)
            }
            MemberType::Rigid => self.determine_type_rigid(
                col,
                reduced,
                num_one_end,
                num_two_ends,
                child_marker_edges,
                depth,
            ),
            MemberType::Loop => unreachable!("loop members carry no rows"),
        }

        // A cycle child propagates its parent marker as a path edge.
        if col.remains_graphic && !is_root && col.reduced_members[reduced].rtype == RType::CycleChild
        {
            let parent_member = self.find_member_parent(member);
            let parent_reduced = col.member_reduced[parent_member];
            let marker_of_parent = self.members[member].marker_of_parent;
            self.create_path_edge(col, marker_of_parent, parent_reduced);
        }
    }

    /// Phase one of adding a column: decides whether the column with ones
    /// in `rows` keeps the decomposition graphic, leaving the structure
    /// untouched.
    pub(super) fn add_column_check(&mut self, col: &mut NewColumn, rows: &[usize]) {
        self.remove_all_path_edges(col);
        self.parallel_parent_child_check_reduced_members(rows);

        col.remains_graphic = true;
        if col.nodes_degree.len() < self.nodes.len() {
            col.nodes_degree.resize(self.nodes.len(), 0);
        }
        col.edges_in_path.grow(self.edges.len() + 1);

        self.compute_reduced_decomposition(col, rows);
        self.create_reduced_decomposition_path_edges(col, rows);

        for i in 0..col.reduced_components.len() {
            let root = col.reduced_components[i].root;
            self.determine_types(col, i, root, 0);
            if !col.remains_graphic {
                break;
            }
        }

        for m in 0..col.reduced_members.len() {
            let member = col.reduced_members[m].member;
            col.member_reduced[member] = NONE;
        }
    }

    // ----- apply phase ----------------------------------------------------

    fn add_terminal(&mut self, col: &mut NewColumn, component: usize, member: usize, node: usize) {
        let comp = &mut col.reduced_components[component];
        debug_assert!(self.members[member].representative == NONE);
        debug_assert!(node != NONE || self.members[member].mtype == MemberType::Parallel);
        if comp.num_terminals < 2 {
            comp.terminal_member[comp.num_terminals] = member;
            comp.terminal_node[comp.num_terminals] = node;
            comp.num_terminals += 1;
        }
    }

    /// Creates members, edges and reduced components for rows that are new
    /// to the decomposition.
    fn complete_reduced_decomposition(&mut self, col: &mut NewColumn, rows: &[usize]) {
        let mut new_num_rows = self.num_rows;
        for &row in rows {
            let edge = if row < self.num_rows {
                self.row_edges[row]
            } else {
                NONE
            };
            if edge == NONE && row + 1 > new_num_rows {
                new_num_rows = row + 1;
            }
        }

        if new_num_rows > self.num_rows {
            if self.row_edges.len() < new_num_rows {
                self.row_edges.resize(new_num_rows, NONE);
            }
            for r in self.num_rows..new_num_rows {
                let member = self.create_member(MemberType::Parallel);
                let edge = self.create_edge(member);
                self.add_edge_to_members_edge_list(edge);
                self.edges[edge].element = EdgeElement::Row(r);
                self.row_edges[r] = edge;
            }
        }

        for &row in rows {
            if row >= self.num_rows {
                let edge = self.row_edges[row];
                let member = self.find_edge_member(edge);
                let reduced = col.reduced_members.len();
                col.reduced_members.push(ReducedMember {
                    member,
                    root_member: NONE,
                    depth: 0,
                    rtype: RType::Root,
                    num_children: 0,
                    children_start: col.children_storage.len(),
                    first_path_edge: NONE,
                    rigid_end_nodes: [NONE; 4],
                });
                self.create_path_edge(col, edge, reduced);
                col.reduced_components.push(ReducedComponent {
                    root: reduced,
                    root_depth: 0,
                    terminal_member: [NONE; 2],
                    terminal_node: [NONE; 2],
                    num_terminals: 0,
                });
            }
        }

        self.num_rows = new_num_rows;
    }

    /// Moves the reduced root downwards while it closes a cycle with the
    /// marker edge of a unique single- or double-end child.
    fn move_reduced_root(&mut self, col: &mut NewColumn, component: usize) {
        let mut reduced = col.reduced_components[component].root;
        let mut member = self.find_member(col.reduced_members[reduced].member);

        let (num_one_end, num_two_ends, child_marker_edges) = self.count_children_types(col, reduced);

        let mut cycle_with_unique_end_child = match self.members[member].mtype {
            MemberType::Parallel => num_two_ends == 1 || num_one_end == 1,
            MemberType::Rigid => {
                if num_two_ends == 1 || num_one_end == 1 {
                    let child_marker_nodes = [
                        self.find_edge_tail(child_marker_edges[0]),
                        self.find_edge_head(child_marker_edges[0]),
                    ];
                    let ends = col.reduced_members[reduced].rigid_end_nodes;
                    ends[2] == NONE
                        && ((ends[0] == child_marker_nodes[0] && ends[1] == child_marker_nodes[1])
                            || (ends[0] == child_marker_nodes[1]
                                && ends[1] == child_marker_nodes[0]))
                } else {
                    false
                }
            }
            // For a series root the parent marker is no path edge, so no
            // cycle with a child marker can close.
            MemberType::Series | MemberType::Loop => false,
        };

        if !cycle_with_unique_end_child {
            return;
        }

        while cycle_with_unique_end_child {
            // Descend into the unique single- or double-end child.
            let mut next_reduced = NONE;
            for i in 0..col.reduced_members[reduced].num_children {
                let child = col.children_storage[col.reduced_members[reduced].children_start + i];
                let t = col.reduced_members[child].rtype;
                if t == RType::SingleChild || t == RType::DoubleChild {
                    next_reduced = child;
                    break;
                }
            }
            debug_assert!(next_reduced != NONE);
            reduced = next_reduced;
            let child_member = self.find_member(col.reduced_members[reduced].member);
            let marker_to_parent = self.members[child_member].marker_to_parent;
            self.create_path_edge(col, marker_to_parent, reduced);

            member = child_member;
            let (one, two, markers) = self.count_children_types(col, reduced);

            cycle_with_unique_end_child = match self.members[member].mtype {
                MemberType::Parallel => one == 1 || two == 1,
                MemberType::Rigid => {
                    if one == 1 || two == 1 {
                        let parent_marker_nodes = [
                            self.find_edge_tail(self.members[member].marker_to_parent),
                            self.find_edge_head(self.members[member].marker_to_parent),
                        ];
                        let child_marker_nodes = [
                            self.find_edge_tail(markers[0]),
                            self.find_edge_head(markers[0]),
                        ];
                        let ends = col.reduced_members[reduced].rigid_end_nodes;
                        let num_end_nodes = if ends[0] == NONE {
                            0
                        } else if ends[2] == NONE {
                            2
                        } else {
                            4
                        };
                        if num_end_nodes == 0 {
                            // Without path edges the child marker would be
                            // parallel to the parent marker, which typing
                            // catches.
                            false
                        } else {
                            let end_nodes = if num_end_nodes == 4 {
                                [ends[1], ends[3]]
                            } else if ends[0] == parent_marker_nodes[0] {
                                [parent_marker_nodes[1], ends[1]]
                            } else {
                                debug_assert!(ends[0] == parent_marker_nodes[1]);
                                [parent_marker_nodes[0], ends[1]]
                            };
                            (end_nodes[0] == child_marker_nodes[0]
                                && end_nodes[1] == child_marker_nodes[1])
                                || (end_nodes[0] == child_marker_nodes[1]
                                    && end_nodes[1] == child_marker_nodes[0])
                        }
                    } else {
                        false
                    }
                }
                MemberType::Series => {
                    if one == 1 || two == 1 {
                        self.count_path_edges(col, reduced) == self.members[member].num_edges - 1
                    } else {
                        false
                    }
                }
                MemberType::Loop => false,
            };
        }

        col.reduced_components[component].root = reduced;
    }

    fn set_edge_nodes(&mut self, edge: usize, tail: usize, head: usize) {
        self.edges[edge].tail = tail;
        self.edges[edge].head = head;
    }

    fn flip_edge(&mut self, edge: usize) {
        let e = &mut self.edges[edge];
        core::mem::swap(&mut e.tail, &mut e.head);
    }

    /// Merges `member` into its parent, identifying the marker edges'
    /// endpoints (head with head if `head_to_head`) and splicing the edge
    /// rings. The parent becomes rigid.
    fn merge_member_into_parent(&mut self, member: usize, head_to_head: bool) {
        let member = self.find_member(member);
        let parent_member = self.find_member_parent(member);
        debug_assert!(parent_member != NONE);

        let parent_edge = self.members[member].marker_of_parent;
        let child_edge = self.members[member].marker_to_parent;
        let parent_edge_nodes = [
            self.find_edge_tail(parent_edge),
            self.find_edge_head(parent_edge),
        ];
        let child_edge_nodes = [
            self.find_edge_tail(child_edge),
            self.find_edge_head(child_edge),
        ];

        // Identify nodes and members.
        self.nodes[child_edge_nodes[0]].representative =
            parent_edge_nodes[if head_to_head { 0 } else { 1 }];
        self.nodes[child_edge_nodes[1]].representative =
            parent_edge_nodes[if head_to_head { 1 } else { 0 }];
        self.members[member].representative = parent_member;

        // Splice the member's edges into the parent's ring, dropping the
        // two marker edges.
        if self.members[parent_member].first_edge == parent_edge {
            self.members[parent_member].first_edge = self.edges[parent_edge].next;
        }
        let pe_next = self.edges[parent_edge].next;
        let pe_prev = self.edges[parent_edge].prev;
        let ce_next = self.edges[child_edge].next;
        let ce_prev = self.edges[child_edge].prev;
        self.edges[pe_next].prev = ce_prev;
        self.edges[pe_prev].next = ce_next;
        self.edges[ce_next].prev = pe_prev;
        self.edges[ce_prev].next = pe_next;
        self.members[parent_member].num_edges += self.members[member].num_edges - 2;
        self.num_live_edges -= 2;
        self.free_edge(parent_edge);
        self.free_edge(child_edge);
        self.members[parent_member].mtype = MemberType::Rigid;
    }

    /// Gives the edges of a node-less parallel member a fresh node pair.
    fn create_parallel_nodes(&mut self, member: usize) {
        let member = self.find_member(member);
        debug_assert!(self.members[member].mtype == MemberType::Parallel);
        let edges = self.member_edges(member);
        if self.edges[edges[0]].head != NONE {
            debug_assert!(self.edges[edges[0]].tail != NONE);
            return;
        }
        let tail = self.create_node();
        let head = self.create_node();
        for edge in edges {
            debug_assert!(self.edges[edge].tail == NONE && self.edges[edge].head == NONE);
            self.edges[edge].tail = tail;
            self.edges[edge].head = head;
        }
    }

    /// Splits `edge1` and `edge2` off `parallel` into a child parallel
    /// member; returns the child.
    fn split_parallel(&mut self, parallel: usize, edge1: usize, edge2: usize) -> usize {
        let child_parallel = self.create_member(MemberType::Parallel);
        let (marker_of_parent, marker_of_child) =
            self.create_marker_edge_pair(parallel, NONE, NONE, child_parallel, NONE, NONE);
        self.add_edge_to_members_edge_list(marker_of_parent);
        self.add_edge_to_members_edge_list(marker_of_child);

        for edge in [edge1, edge2] {
            self.remove_edge_from_members_edge_list(edge);
            self.edges[edge].member = child_parallel;
            self.add_edge_to_members_edge_list(edge);
            let child = self.edges[edge].child_member;
            if child != NONE {
                let child = self.find_member(child);
                self.members[child].parent = child_parallel;
            }
        }
        child_parallel
    }

    /// Replaces `edge` by a marker to a new parallel member containing it;
    /// returns the new parallel.
    fn create_edge_parallel(&mut self, edge: usize) -> usize {
        let parent_member = self.find_edge_member(edge);
        let new_parallel = self.create_member(MemberType::Parallel);
        self.members[new_parallel].parent = parent_member;

        let (marker_of_parent, marker_to_parent) = self.create_marker_edge_pair(
            parent_member,
            self.edges[edge].tail,
            self.edges[edge].head,
            new_parallel,
            NONE,
            NONE,
        );
        self.edges[marker_of_parent].next = self.edges[edge].next;
        self.edges[marker_of_parent].prev = self.edges[edge].prev;
        debug_assert!(self.edges[marker_of_parent].next != marker_of_parent);
        let next = self.edges[marker_of_parent].next;
        let prev = self.edges[marker_of_parent].prev;
        self.edges[next].prev = marker_of_parent;
        self.edges[prev].next = marker_of_parent;
        if self.members[parent_member].first_edge == edge {
            self.members[parent_member].first_edge = marker_of_parent;
        }

        self.add_edge_to_members_edge_list(marker_to_parent);
        self.edges[edge].member = new_parallel;
        self.add_edge_to_members_edge_list(edge);
        new_parallel
    }

    /// Splits the edges of series `member` whose path membership equals
    /// `predicate_value` into a new series member hanging off a connecting
    /// parallel.
    ///
    /// Returns `(representative_edge, new_series)`: with zero matching
    /// edges both are `NONE`; with one, the edge itself is representative;
    /// otherwise the child marker of the connecting parallel represents the
    /// squeezed-off series.
    fn split_series(
        &mut self,
        col: &NewColumn,
        member: usize,
        predicate_value: bool,
    ) -> (usize, usize) {
        debug_assert!(self.members[member].mtype == MemberType::Series);

        let mut num_satisfying = 0;
        let mut some_satisfying_edge = NONE;
        for edge in self.member_edges(member) {
            if col.in_path(edge) == predicate_value {
                some_satisfying_edge = edge;
                num_satisfying += 1;
            }
        }

        if num_satisfying == 0 {
            return (NONE, NONE);
        }
        if num_satisfying == 1 {
            return (some_satisfying_edge, NONE);
        }

        let series = self.create_member(MemberType::Series);
        let parallel = self.create_member(MemberType::Parallel);
        let (parallel_child_marker, series_parent_marker) =
            self.create_marker_edge_pair(parallel, NONE, NONE, series, NONE, NONE);
        self.add_edge_to_members_edge_list(series_parent_marker);
        self.add_edge_to_members_edge_list(parallel_child_marker);

        // Move all matching edges over to the new series member, keeping
        // their cyclic order.
        let marker_to_parent = self.members[member].marker_to_parent;
        let mut first_edge = self.members[member].first_edge;
        let mut edge = first_edge;
        let mut encountered_staying_edge = false;
        loop {
            if col.in_path(edge) != predicate_value {
                encountered_staying_edge = true;
                edge = self.edges[edge].next;
            } else {
                debug_assert!(edge != marker_to_parent);

                let old_prev = self.edges[edge].prev;
                let old_next = self.edges[edge].next;
                self.edges[old_prev].next = old_next;
                self.edges[old_next].prev = old_prev;
                self.members[member].num_edges -= 1;

                let new_prev = self.edges[series_parent_marker].prev;
                self.edges[new_prev].next = edge;
                self.edges[series_parent_marker].prev = edge;
                self.edges[edge].prev = new_prev;
                self.edges[edge].next = series_parent_marker;
                self.edges[edge].member = series;
                let child = self.edges[edge].child_member;
                if child != NONE {
                    let child = self.find_member(child);
                    self.members[child].parent = series;
                }
                self.members[series].num_edges += 1;

                if edge == first_edge {
                    self.members[member].first_edge = old_next;
                    first_edge = old_next;
                }
                edge = old_next;
            }
            if edge == first_edge && encountered_staying_edge {
                break;
            }
        }

        let (member_child_marker, parallel_parent_marker) =
            self.create_marker_edge_pair(member, NONE, NONE, parallel, NONE, NONE);
        self.add_edge_to_members_edge_list(parallel_parent_marker);
        let first_edge = self.members[member].first_edge;
        let old_prev = self.edges[first_edge].prev;
        self.edges[member_child_marker].next = first_edge;
        self.edges[member_child_marker].prev = old_prev;
        self.edges[old_prev].next = member_child_marker;
        self.edges[first_edge].prev = member_child_marker;
        self.members[member].num_edges += 1;

        (member_child_marker, series)
    }

    fn process_parallel(&mut self, col: &mut NewColumn, component: usize, reduced: usize, depth: usize) {
        let mut member = self.find_member(col.reduced_members[reduced].member);
        let (num_one_end, num_two_ends, child_marker_edges) =
            self.count_children_types(col, reduced);

        if depth == 0 {
            if num_one_end == 0 && num_two_ends == 0 {
                debug_assert!(col.reduced_members[reduced].first_path_edge != NONE);
                self.add_terminal(col, component, member, NONE);
                self.add_terminal(col, component, member, NONE);
                return;
            }
            debug_assert_eq!(num_one_end, 2);
            debug_assert_eq!(col.reduced_components[component].num_terminals, 2);

            if self.members[member].num_edges > 3 {
                // The two child markers move into a fresh parallel child.
                member = self.split_parallel(member, child_marker_edges[0], child_marker_edges[1]);
                col.reduced_members[reduced].member = member;
            }
            debug_assert_eq!(self.members[member].num_edges, 3);
            self.create_parallel_nodes(member);
            let child0 = self.edges[child_marker_edges[0]].child_member;
            self.merge_member_into_parent(child0, true);
            let child1 = self.edges[child_marker_edges[1]].child_member;
            let head_to_head = col.reduced_members[reduced].first_path_edge == NONE
                && col.reduced_members[reduced].rtype != RType::DoubleChild;
            self.merge_member_into_parent(child1, head_to_head);
        } else {
            // An inner parallel has exactly one single-end child; a leaf
            // parallel would be a cycle child.
            debug_assert_eq!(num_one_end, 1);
            let tail = self.create_node();
            let head = self.create_node();
            for edge in self.member_edges(member) {
                self.set_edge_nodes(edge, tail, head);
            }
            let child = self.edges[child_marker_edges[0]].child_member;
            let head_to_head = col.reduced_members[reduced].first_path_edge == NONE;
            self.merge_member_into_parent(child, head_to_head);
        }
    }

    fn process_rigid(&mut self, col: &mut NewColumn, component: usize, reduced: usize, depth: usize) {
        let member = self.find_member(col.reduced_members[reduced].member);
        let (num_one_end, num_two_ends, child_marker_edges) = self.count_children_types(col, reduced);

        let marker_to_parent = self.members[member].marker_to_parent;
        let parent_marker_nodes = if marker_to_parent != NONE {
            [
                self.find_edge_tail(marker_to_parent),
                self.find_edge_head(marker_to_parent),
            ]
        } else {
            [NONE, NONE]
        };
        let mut child_marker_nodes = [NONE; 4];
        for i in 0..2 {
            if child_marker_edges[i] != NONE {
                child_marker_nodes[2 * i] = self.find_edge_tail(child_marker_edges[i]);
                child_marker_nodes[2 * i + 1] = self.find_edge_head(child_marker_edges[i]);
            }
        }

        let mut path_end_nodes = col.reduced_members[reduced].rigid_end_nodes;
        let mut num_path_end_nodes = if path_end_nodes[0] == NONE {
            0
        } else if path_end_nodes[2] == NONE {
            2
        } else {
            4
        };

        if depth == 0 {
            // Root rigid member.
            if marker_to_parent != NONE && col.in_path(marker_to_parent) {
                // The parent marker is a path edge; adjust the end nodes.
                if num_path_end_nodes == 0 {
                    path_end_nodes[0] = parent_marker_nodes[0];
                    path_end_nodes[1] = parent_marker_nodes[1];
                    num_path_end_nodes = 1;
                } else if num_path_end_nodes == 2 {
                    if path_end_nodes[0] == parent_marker_nodes[0] {
                        path_end_nodes[0] = parent_marker_nodes[1];
                    } else if path_end_nodes[0] == parent_marker_nodes[1] {
                        path_end_nodes[0] = parent_marker_nodes[0];
                    }
                } else {
                    path_end_nodes[0] = path_end_nodes[3];
                    path_end_nodes[2] = NONE;
                    path_end_nodes[3] = NONE;
                    num_path_end_nodes = 2;
                }
            }
            debug_assert!(num_path_end_nodes <= 2);

            if num_one_end == 0 && num_two_ends == 0 {
                self.add_terminal(col, component, member, path_end_nodes[0]);
                self.add_terminal(col, component, member, path_end_nodes[1]);
            } else if num_one_end == 1 {
                let terminal = if path_end_nodes[0] == child_marker_nodes[0]
                    || path_end_nodes[0] == child_marker_nodes[1]
                {
                    path_end_nodes[1]
                } else {
                    path_end_nodes[0]
                };
                self.add_terminal(col, component, member, terminal);
                let child_member = self.edges[child_marker_edges[0]].child_member;
                let child_member = self.find_member(child_member);
                let head_to_head = path_end_nodes[0] == child_marker_nodes[1]
                    || path_end_nodes[1] == child_marker_nodes[1];
                self.merge_member_into_parent(child_member, head_to_head);
            } else {
                debug_assert_eq!(num_one_end, 2);
                debug_assert_eq!(col.reduced_components[component].num_terminals, 2);

                let mut child_member = [
                    self.find_member(self.edges[child_marker_edges[0]].child_member),
                    self.find_member(self.edges[child_marker_edges[1]].child_member),
                ];
                let mut child_marker_nodes = child_marker_nodes;

                // Count incident path end nodes per child marker.
                let mut num_incident = [0usize; 2];
                for c in 0..2 {
                    for i in 0..num_path_end_nodes {
                        for j in 0..2 {
                            if path_end_nodes[i] == child_marker_nodes[2 * c + j] {
                                num_incident[c] += 1;
                            }
                        }
                    }
                }
                // A child marker incident to both path ends goes second.
                if num_incident[0] == 2 {
                    child_member.swap(0, 1);
                    child_marker_nodes.swap(0, 2);
                    child_marker_nodes.swap(1, 3);
                }

                // Parallel child markers are bundled into a new parallel.
                if (child_marker_nodes[0] == child_marker_nodes[2]
                    && child_marker_nodes[1] == child_marker_nodes[3])
                    || (child_marker_nodes[0] == child_marker_nodes[3]
                        && child_marker_nodes[1] == child_marker_nodes[2])
                {
                    let new_parallel = self.create_member(MemberType::Parallel);
                    self.members[new_parallel].parent = member;
                    self.members[child_member[0]].parent = new_parallel;
                    self.members[child_member[1]].parent = new_parallel;

                    let (marker_of_parent, marker_to_parent) = self.create_marker_edge_pair(
                        member,
                        child_marker_nodes[0],
                        child_marker_nodes[1],
                        new_parallel,
                        NONE,
                        NONE,
                    );
                    self.replace_edge_in_members_edge_list(child_marker_edges[0], marker_of_parent);
                    self.add_edge_to_members_edge_list(marker_to_parent);
                    self.edges[child_marker_edges[0]].member = new_parallel;
                    self.add_edge_to_members_edge_list(child_marker_edges[0]);
                    self.remove_edge_from_members_edge_list(child_marker_edges[1]);
                    self.edges[child_marker_edges[1]].member = new_parallel;
                    self.add_edge_to_members_edge_list(child_marker_edges[1]);

                    self.edges[child_marker_edges[0]].tail = NONE;
                    self.edges[child_marker_edges[0]].head = NONE;
                    self.edges[child_marker_edges[1]].tail = NONE;
                    self.edges[child_marker_edges[1]].head = NONE;

                    self.create_parallel_nodes(new_parallel);
                    let inner0 = self.edges[child_marker_edges[0]].child_member;
                    self.merge_member_into_parent(inner0, true);
                    let inner1 = self.edges[child_marker_edges[1]].child_member;
                    self.merge_member_into_parent(inner1, num_path_end_nodes == 0);
                    return;
                }

                let mut path_end_nodes = path_end_nodes;
                if num_path_end_nodes == 0 {
                    // Fake a zero-length path at the node shared by the two
                    // child markers.
                    if child_marker_nodes[0] == child_marker_nodes[2]
                        || child_marker_nodes[0] == child_marker_nodes[3]
                    {
                        path_end_nodes[0] = child_marker_nodes[0];
                        path_end_nodes[1] = child_marker_nodes[0];
                    } else {
                        debug_assert!(
                            child_marker_nodes[1] == child_marker_nodes[2]
                                || child_marker_nodes[1] == child_marker_nodes[3]
                        );
                        path_end_nodes[0] = child_marker_nodes[1];
                        path_end_nodes[1] = child_marker_nodes[1];
                    }
                }

                if path_end_nodes[0] != child_marker_nodes[0]
                    && path_end_nodes[0] != child_marker_nodes[1]
                {
                    path_end_nodes.swap(0, 1);
                }
                debug_assert!(
                    path_end_nodes[0] == child_marker_nodes[0]
                        || path_end_nodes[0] == child_marker_nodes[1]
                );
                self.merge_member_into_parent(
                    child_member[0],
                    path_end_nodes[0] == child_marker_nodes[1],
                );
                self.merge_member_into_parent(
                    child_member[1],
                    path_end_nodes[1] == child_marker_nodes[3],
                );
            }
        } else {
            // Non-root rigid member.
            if num_one_end == 0 && num_two_ends == 0 {
                debug_assert!(col.reduced_members[reduced].first_path_edge != NONE);
                debug_assert!(path_end_nodes[0] != NONE);
                self.add_terminal(col, component, member, path_end_nodes[1]);
                if parent_marker_nodes[0] == path_end_nodes[0] {
                    self.flip_edge(marker_to_parent);
                }
            } else {
                debug_assert_eq!(num_one_end, 1);
                if num_path_end_nodes >= 2 {
                    // Ensure the child marker is incident to end node 1.
                    let mut path_end_nodes = path_end_nodes;
                    if path_end_nodes[1] != child_marker_nodes[0]
                        && path_end_nodes[1] != child_marker_nodes[1]
                    {
                        path_end_nodes.swap(0, 1);
                    }
                    debug_assert!(
                        path_end_nodes[1] == child_marker_nodes[0]
                            || path_end_nodes[1] == child_marker_nodes[1]
                    );
                    let mut parent_marker_nodes = parent_marker_nodes;
                    if path_end_nodes[0] == parent_marker_nodes[0] {
                        self.flip_edge(marker_to_parent);
                        parent_marker_nodes.swap(0, 1);
                    }
                    debug_assert!(path_end_nodes[0] == parent_marker_nodes[1]);
                    let child = self.find_member(self.edges[child_marker_edges[0]].child_member);
                    self.merge_member_into_parent(
                        child,
                        path_end_nodes[1] == child_marker_nodes[1],
                    );
                } else {
                    // No path: parent and child markers must be adjacent.
                    if parent_marker_nodes[0] == child_marker_nodes[0]
                        || parent_marker_nodes[0] == child_marker_nodes[1]
                    {
                        self.flip_edge(marker_to_parent);
                    }
                    let child = self.edges[child_marker_edges[0]].child_member;
                    let head_to_head = parent_marker_nodes[0] == child_marker_nodes[1]
                        || parent_marker_nodes[1] == child_marker_nodes[1];
                    self.merge_member_into_parent(child, head_to_head);
                }
            }
        }
    }

    fn process_series(&mut self, col: &mut NewColumn, component: usize, reduced: usize, depth: usize) {
        let mut member = self.find_member(col.reduced_members[reduced].member);
        let (num_one_end, num_two_ends, child_marker_edges) = self.count_children_types(col, reduced);

        if depth == 0 {
            // With a double-end child the reduced root would have moved.
            debug_assert_eq!(num_two_ends, 0);

            if num_one_end == 0 {
                debug_assert!(col.reduced_members[reduced].first_path_edge != NONE);
                let representative_edge;
                if self.members[member].marker_to_parent != NONE
                    && col.in_path(self.members[member].marker_to_parent)
                {
                    // Parent marker is a path edge: squeeze off all
                    // non-path edges.
                    let (edge, _) = self.split_series(col, member, false);
                    representative_edge = edge;
                } else if col.reduced_members[reduced].rtype == RType::CycleChild {
                    // Terminal nodes are the parent marker edge's nodes.
                    let marker_of_parent = self.members[member].marker_of_parent;
                    let parent = self.find_edge_member(marker_of_parent);
                    if self.members[parent].mtype == MemberType::Parallel {
                        self.add_terminal(col, component, parent, NONE);
                        self.add_terminal(col, component, parent, NONE);
                    } else {
                        debug_assert!(self.members[parent].mtype == MemberType::Rigid);
                        let tail = self.find_edge_tail(marker_of_parent);
                        let head = self.find_edge_head(marker_of_parent);
                        self.add_terminal(col, component, parent, tail);
                        self.add_terminal(col, component, parent, head);
                    }
                    return;
                } else {
                    // Squeeze off all path edges.
                    let (edge, _) = self.split_series(col, member, true);
                    representative_edge = edge;
                }

                let mut child_member = self.edges[representative_edge].child_member;
                let mut tail = NONE;
                let mut head = NONE;
                if child_member == NONE {
                    child_member = self.create_edge_parallel(representative_edge);
                } else {
                    child_member = self.find_member(child_member);
                    if self.members[child_member].mtype == MemberType::Rigid {
                        tail = self.find_edge_tail(self.members[child_member].marker_to_parent);
                        head = self.find_edge_head(self.members[child_member].marker_to_parent);
                    }
                }
                debug_assert_eq!(col.reduced_components[component].num_terminals, 0);
                self.add_terminal(col, component, child_member, tail);
                self.add_terminal(col, component, child_member, head);
            } else if num_one_end == 1 {
                if self.members[member].marker_to_parent != NONE
                    && col.in_path(self.members[member].marker_to_parent)
                {
                    // Parent marker is one of the path edges.
                    debug_assert!(col.reduced_members[reduced].first_path_edge != NONE);
                    if col.path_edges[col.reduced_members[reduced].first_path_edge].next_sibling
                        != NONE
                    {
                        let (_, new_series) = self.split_series(col, member, false);
                        debug_assert!(new_series != NONE);
                        member = new_series;
                        col.reduced_members[reduced].member = member;
                        let marker = self.members[member].marker_to_parent;
                        self.create_path_edge(col, marker, reduced);
                    }
                    col.mark_path(child_marker_edges[0], true);
                    let (non_path_edge, _) = self.split_series(col, member, false);
                    col.mark_path(child_marker_edges[0], false);

                    let a = self.create_node();
                    let b = self.create_node();
                    let c = if self.members[member].num_edges == 3 {
                        let c = self.create_node();
                        self.set_edge_nodes(non_path_edge, a, c);
                        c
                    } else {
                        a
                    };
                    let marker = self.members[member].marker_to_parent;
                    self.set_edge_nodes(marker, a, b);
                    self.set_edge_nodes(child_marker_edges[0], c, b);
                    self.add_terminal(col, component, member, a);
                    let child = self.edges[child_marker_edges[0]].child_member;
                    self.merge_member_into_parent(child, true);
                    self.members[member].mtype = MemberType::Rigid;
                } else {
                    // Parent marker is not a path edge.
                    debug_assert!(col.reduced_members[reduced].first_path_edge != NONE);
                    let (path_edge, _) = self.split_series(col, member, true);
                    if path_edge != NONE {
                        self.create_path_edge(col, path_edge, reduced);
                    }

                    if self.members[member].num_edges > 3 {
                        col.mark_path(child_marker_edges[0], true);
                        let (_, new_series) = self.split_series(col, member, true);
                        col.mark_path(child_marker_edges[0], false);
                        debug_assert!(new_series != NONE);
                        member = new_series;
                        col.reduced_members[reduced].member = member;
                    }
                    debug_assert_eq!(self.members[member].num_edges, 3);

                    let a = self.create_node();
                    let b = self.create_node();
                    let c = self.create_node();
                    let marker = self.members[member].marker_to_parent;
                    self.set_edge_nodes(marker, b, c);
                    self.set_edge_nodes(path_edge, a, b);
                    self.set_edge_nodes(child_marker_edges[0], c, a);
                    self.add_terminal(col, component, member, b);
                    let child = self.edges[child_marker_edges[0]].child_member;
                    self.merge_member_into_parent(child, true);
                    self.members[member].mtype = MemberType::Rigid;
                }
            } else {
                debug_assert_eq!(num_one_end, 2);

                let mut path_edge = NONE;
                let mut non_path_edge = NONE;
                if col.reduced_members[reduced].rtype != RType::DoubleChild {
                    // Parent marker is not a path edge.
                    let (edge, _) = self.split_series(col, member, true);
                    path_edge = edge;
                    let keep = if path_edge != NONE { 4 } else { 3 };
                    if self.members[member].num_edges > keep {
                        if path_edge != NONE {
                            self.create_path_edge(col, path_edge, reduced);
                        }
                        col.mark_path(child_marker_edges[0], true);
                        col.mark_path(child_marker_edges[1], true);
                        let (_, new_series) = self.split_series(col, member, true);
                        col.mark_path(child_marker_edges[0], false);
                        col.mark_path(child_marker_edges[1], false);
                        debug_assert!(new_series != NONE);
                        member = new_series;
                        col.reduced_members[reduced].member = member;
                    }
                    non_path_edge = self.members[member].marker_to_parent;
                } else {
                    debug_assert!(col.in_path(self.members[member].marker_to_parent));
                    debug_assert!(col.reduced_members[reduced].first_path_edge != NONE);

                    if col.path_edges[col.reduced_members[reduced].first_path_edge].next_sibling
                        != NONE
                    {
                        let (_, new_series) = self.split_series(col, member, false);
                        debug_assert!(new_series != NONE);
                        member = new_series;
                        col.reduced_members[reduced].member = member;
                        let marker = self.members[member].marker_to_parent;
                        self.create_path_edge(col, marker, reduced);
                    }
                    path_edge = self.members[member].marker_to_parent;

                    if self.members[member].num_edges > 3 {
                        col.mark_path(child_marker_edges[0], true);
                        col.mark_path(child_marker_edges[1], true);
                        let (edge, _) = self.split_series(col, member, false);
                        non_path_edge = edge;
                        col.mark_path(child_marker_edges[0], false);
                        col.mark_path(child_marker_edges[1], false);
                    }
                }
                debug_assert!(path_edge != NONE || non_path_edge != NONE);

                // a <--child0-- b --path-- c --child1--> d --non-path-- a
                let a = self.create_node();
                let b = self.create_node();
                let c = if path_edge != NONE {
                    self.create_node()
                } else {
                    b
                };
                let d = if non_path_edge != NONE {
                    self.create_node()
                } else {
                    a
                };
                self.set_edge_nodes(child_marker_edges[0], a, b);
                self.set_edge_nodes(child_marker_edges[1], d, c);
                if path_edge != NONE {
                    self.set_edge_nodes(path_edge, b, c);
                }
                if non_path_edge != NONE {
                    self.set_edge_nodes(non_path_edge, d, a);
                }

                let child0 = self.edges[child_marker_edges[0]].child_member;
                self.merge_member_into_parent(child0, true);
                let child1 = self.edges[child_marker_edges[1]].child_member;
                self.merge_member_into_parent(child1, true);
                self.members[member].mtype = MemberType::Rigid;
            }
        } else {
            // Non-root series member: necessarily a single child.
            debug_assert_eq!(col.reduced_members[reduced].rtype, RType::SingleChild);

            if num_one_end == 0 {
                debug_assert_eq!(num_two_ends, 0);
                debug_assert!(col.reduced_components[component].num_terminals < 2);
                debug_assert!(col.reduced_members[reduced].first_path_edge != NONE);

                // Squeeze off the path edges, then the non-path edges.
                let (path_edge, _) = self.split_series(col, member, true);
                debug_assert!(path_edge != NONE);
                self.create_path_edge(col, path_edge, reduced);

                debug_assert!(self.members[member].num_edges >= 3);
                let non_path_edge;
                if self.members[member].num_edges == 3 {
                    let marker = self.members[member].marker_to_parent;
                    let mut candidate = self.edges[marker].next;
                    if candidate == path_edge {
                        candidate = self.edges[candidate].next;
                    }
                    non_path_edge = candidate;
                } else {
                    let marker = self.members[member].marker_to_parent;
                    col.mark_path(marker, true);
                    let (edge, _) = self.split_series(col, member, false);
                    non_path_edge = edge;
                    col.mark_path(marker, false);
                }
                debug_assert_eq!(self.members[member].num_edges, 3);

                // Build the triangle so that the path leaves through the
                // parent marker's head node.
                let a = self.create_node();
                let b = self.create_node();
                let c = self.create_node();
                let marker = self.members[member].marker_to_parent;
                self.set_edge_nodes(marker, a, b);
                self.set_edge_nodes(path_edge, b, c);
                self.set_edge_nodes(non_path_edge, c, a);
                self.add_terminal(col, component, member, c);
                self.members[member].mtype = MemberType::Rigid;
            } else {
                debug_assert_eq!(num_one_end, 1);

                let (path_edge, _) = self.split_series(col, member, true);
                if path_edge != NONE {
                    self.create_path_edge(col, path_edge, reduced);
                }

                debug_assert!(self.members[member].num_edges >= 3);
                let num_non_path_edges =
                    self.members[member].num_edges - 2 - usize::from(path_edge != NONE);
                let non_path_edge;
                if num_non_path_edges == 0 {
                    non_path_edge = NONE;
                } else if num_non_path_edges == 1 {
                    let marker = self.members[member].marker_to_parent;
                    let mut candidate = self.edges[marker].next;
                    while candidate == child_marker_edges[0] || candidate == path_edge {
                        candidate = self.edges[candidate].next;
                    }
                    non_path_edge = candidate;
                } else {
                    let marker = self.members[member].marker_to_parent;
                    col.mark_path(marker, true);
                    col.mark_path(child_marker_edges[0], true);
                    let (edge, _) = self.split_series(col, member, false);
                    non_path_edge = edge;
                    col.mark_path(marker, false);
                    col.mark_path(child_marker_edges[0], false);
                }
                debug_assert!(self.members[member].num_edges <= 4);

                let a = self.create_node();
                let b = self.create_node();
                let c = self.create_node();
                let marker = self.members[member].marker_to_parent;
                self.set_edge_nodes(marker, a, b);
                if self.members[member].num_edges == 4 {
                    let d = self.create_node();
                    self.set_edge_nodes(path_edge, b, c);
                    self.set_edge_nodes(child_marker_edges[0], d, c);
                    self.set_edge_nodes(non_path_edge, d, a);
                } else if non_path_edge == NONE {
                    self.set_edge_nodes(path_edge, b, c);
                    self.set_edge_nodes(child_marker_edges[0], a, c);
                } else {
                    debug_assert!(path_edge == NONE);
                    self.set_edge_nodes(child_marker_edges[0], c, b);
                    self.set_edge_nodes(non_path_edge, a, c);
                }

                let child = self.edges[child_marker_edges[0]].child_member;
                self.merge_member_into_parent(child, true);
                self.members[member].mtype = MemberType::Rigid;
            }
        }
    }

    /// Processes a reduced component in depth-first order: squeezes series
    /// members, detects terminals, and merges members along the terminal
    /// path.
    fn process_component(&mut self, col: &mut NewColumn, component: usize, reduced: usize, depth: usize) {
        if col.reduced_members[reduced].rtype == RType::CycleChild && depth > 0 {
            return;
        }

        let children: Vec<usize> = col.children(reduced).to_vec();
        for child in children {
            if col.reduced_members[child].rtype != RType::CycleChild {
                self.process_component(col, component, child, depth + 1);
            }
        }

        let member = self.find_member(col.reduced_members[reduced].member);
        match self.members[member].mtype {
            MemberType::Parallel => self.process_parallel(col, component, reduced, depth),
            MemberType::Series => self.process_series(col, component, reduced, depth),
            MemberType::Rigid => self.process_rigid(col, component, reduced, depth),
            MemberType::Loop => unreachable!("loop members carry no rows"),
        }
    }

    /// Re-roots the component so that `new_root` becomes its root member.
    fn reorder_component(&mut self, new_root: usize) {
        debug_assert!(self.is_representative(new_root));
        if self.members[new_root].parent == NONE {
            return;
        }
        let mut member = self.find_member_parent(new_root);
        let mut new_parent = new_root;
        let mut new_marker_to_parent = self.members[new_root].marker_of_parent;
        let mut marker_of_new_parent = self.members[new_root].marker_to_parent;
        loop {
            let old_parent = self.find_member_parent(member);
            let old_marker_to_parent = self.members[member].marker_to_parent;
            let old_marker_of_parent = self.members[member].marker_of_parent;

            self.members[member].marker_to_parent = new_marker_to_parent;
            self.members[member].marker_of_parent = marker_of_new_parent;
            self.members[member].parent = new_parent;
            self.edges[marker_of_new_parent].child_member = member;
            self.edges[new_marker_to_parent].child_member = NONE;

            if old_marker_to_parent == NONE {
                break;
            }
            new_parent = member;
            new_marker_to_parent = old_marker_of_parent;
            marker_of_new_parent = old_marker_to_parent;
            member = old_parent;
        }
        self.members[new_root].parent = NONE;
        self.members[new_root].marker_to_parent = NONE;
        self.members[new_root].marker_of_parent = NONE;
    }

    /// Phase two of adding a column: restructures the decomposition so that
    /// the rows of the column form a path and inserts the column edge.
    pub(super) fn add_column_apply(&mut self, col: &mut NewColumn, column: usize, rows: &[usize]) {
        debug_assert!(col.remains_graphic);

        self.complete_reduced_decomposition(col, rows);

        let mut component_new_edges = vec![NONE; col.reduced_components.len()];
        let mut max_depth_component = NONE;
        for i in 0..col.reduced_components.len() {
            self.move_reduced_root(col, i);
            if max_depth_component == NONE
                || col.reduced_components[i].root_depth
                    > col.reduced_components[max_depth_component].root_depth
            {
                max_depth_component = i;
            }
            let root = col.reduced_components[i].root;
            self.process_component(col, i, root, 0);

            debug_assert_eq!(col.reduced_components[i].num_terminals, 2);
            let terminal_member = self.find_member(col.reduced_components[i].terminal_member[0]);
            debug_assert_eq!(
                terminal_member,
                self.find_member(col.reduced_components[i].terminal_member[1])
            );

            let new_edge = self.create_edge(NONE);
            component_new_edges[i] = new_edge;
            self.edges[new_edge].member = terminal_member;
            self.edges[new_edge].head = col.reduced_components[i].terminal_node[0];
            self.edges[new_edge].tail = col.reduced_components[i].terminal_node[1];
            self.add_edge_to_members_edge_list(new_edge);
        }

        for c in 0..col.reduced_components.len() {
            if c != max_depth_component {
                let member = self.find_edge_member(component_new_edges[c]);
                self.reorder_component(member);
            }
        }

        if col.reduced_components.is_empty() {
            // Zero column: a loop member.
            let loop_member = self.create_member(MemberType::Loop);
            let loop_edge = self.create_edge(loop_member);
            self.add_edge_to_members_edge_list(loop_edge);
            self.edges[loop_edge].element = EdgeElement::Column(column);
        } else if col.reduced_components.len() == 1 {
            let column_edge = component_new_edges[0];
            self.edges[column_edge].element = EdgeElement::Column(column);
            self.edges[column_edge].child_member = NONE;
        } else {
            // Several components: a new series member ties together one
            // marker edge per component plus the column edge.
            let series = self.create_member(MemberType::Series);
            let column_edge = self.create_edge(series);
            self.edges[column_edge].element = EdgeElement::Column(column);
            self.add_edge_to_members_edge_list(column_edge);

            for (i, &new_edge) in component_new_edges.iter().enumerate() {
                let marker_edge = self.create_edge(series);
                self.add_edge_to_members_edge_list(marker_edge);
                let partner_member = self.find_edge_member(new_edge);

                if i == max_depth_component {
                    self.members[series].parent = partner_member;
                    self.members[series].marker_to_parent = marker_edge;
                    self.members[series].marker_of_parent = new_edge;
                    self.edges[new_edge].child_member = series;
                } else {
                    self.edges[marker_edge].child_member = partner_member;
                    self.members[partner_member].marker_of_parent = marker_edge;
                    self.members[partner_member].marker_to_parent = new_edge;
                    self.members[partner_member].parent = series;
                }
                self.num_marker_pairs += 1;
            }
        }

        col.reduced_members.clear();
        col.reduced_components.clear();
        col.children_storage.clear();
    }
}
