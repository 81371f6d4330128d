use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

/// Words as nodes, links as edges weighted by their index in the linkage.
pub struct LinkGraph {
    graph: UnGraph<usize, usize>,
    nodes: Vec<NodeIndex>,
}

impl LinkGraph {
    pub fn new(num_words: usize) -> Self {
        let mut graph = UnGraph::with_capacity(num_words, num_words);
        let nodes = (0..num_words).map(|w| graph.add_node(w)).collect();
        Self { graph, nodes }
    }

    /// Builds the graph from `(left, right)` word pairs; edge weights are the pair indices.
    pub fn from_links<I>(num_words: usize, links: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut graph = Self::new(num_words);
        for (i, (left, right)) in links.into_iter().enumerate() {
            graph.add_link(left, right, i);
        }
        graph
    }

    pub fn add_link(&mut self, left: usize, right: usize, link: usize) {
        self.graph.add_edge(self.nodes[left], self.nodes[right], link);
    }

    pub fn degree(&self, word: usize) -> usize {
        self.graph.edges(self.nodes[word]).count()
    }

    /// Walks from `start` without ever entering `blocked` or crossing a link `skip`
    /// rejects. Returns the words reached (sorted, `start` included) and the links
    /// touched along the way (sorted).
    pub fn reach<F>(&self, start: usize, blocked: Option<usize>, skip: F) -> (Vec<usize>, Vec<usize>)
    where
        F: Fn(usize) -> bool,
    {
        let mut visited = vec![false; self.nodes.len()];
        let mut links = Vec::new();
        let mut stack = vec![self.nodes[start]];
        visited[start] = true;

        while let Some(current) = stack.pop() {
            for edge in self.graph.edges(current) {
                let link = *edge.weight();
                if skip(link) {
                    continue;
                }
                let target = self.graph[edge.target()];
                if Some(target) == blocked {
                    continue;
                }
                if !links.contains(&link) {
                    links.push(link);
                }
                if !visited[target] {
                    visited[target] = true;
                    stack.push(edge.target());
                }
            }
        }

        let words = visited.iter().enumerate().filter(|(_, v)| **v).map(|(w, _)| w).collect();
        links.sort_unstable();
        (words, links)
    }

    /// True if every word with at least one link belongs to a single component.
    pub fn is_connected(&self) -> bool {
        let linked: Vec<usize> = (0..self.nodes.len()).filter(|&w| self.degree(w) > 0).collect();
        match linked.first() {
            None => true,
            Some(&first) => {
                let (reached, _) = self.reach(first, None, |_| false);
                linked.iter().all(|w| reached.binary_search(w).is_ok())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reach_stops_at_blocked_word() {
        // LEFT-WALL the flag was wet . RIGHT-WALL
        let links = vec![(0, 5), (0, 2), (1, 2), (2, 3), (3, 4), (5, 6)];
        let graph = LinkGraph::from_links(7, links);

        let (words, touched) = graph.reach(2, Some(0), |_| false);
        assert_eq!(words, vec![1, 2, 3, 4]);
        assert_eq!(touched, vec![2, 3, 4]);
    }

    #[test]
    fn test_skipped_links_are_not_crossed() {
        let graph = LinkGraph::from_links(4, vec![(0, 1), (1, 2), (2, 3)]);
        let (words, _) = graph.reach(1, None, |link| link == 1);
        assert_eq!(words, vec![0, 1]);
    }

    #[test]
    fn test_connectivity() {
        let joined = LinkGraph::from_links(4, vec![(0, 1), (1, 3)]);
        assert!(joined.is_connected());
        assert_eq!(joined.degree(2), 0);

        let split = LinkGraph::from_links(4, vec![(0, 1), (2, 3)]);
        assert!(!split.is_connected());
    }
}
