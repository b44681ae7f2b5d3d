//! Layered topological sort over same-tick edges.

/// Kahn's algorithm, emitting one stage per layer.
///
/// A stage holds every not-yet-placed node whose same-tick predecessors are
/// all in earlier stages, in ascending index (declaration) order. Parallel
/// edges count once per edge. On a cycle, returns the unplaced nodes.
pub(crate) fn layered_order(
    node_count: usize,
    edges: &[(usize, usize)],
) -> Result<Vec<Vec<usize>>, Vec<usize>> {
    let mut in_degree = vec![0usize; node_count];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for &(from, to) in edges {
        in_degree[to] += 1;
        successors[from].push(to);
    }

    let mut placed = vec![false; node_count];
    let mut stages = Vec::new();
    let mut frontier: Vec<usize> = (0..node_count).filter(|&n| in_degree[n] == 0).collect();

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for &node in &frontier {
            placed[node] = true;
            for &succ in &successors[node] {
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    next.push(succ);
                }
            }
        }
        next.sort_unstable();
        stages.push(std::mem::replace(&mut frontier, next));
    }

    let unplaced: Vec<usize> = (0..node_count).filter(|&n| !placed[n]).collect();
    if unplaced.is_empty() {
        Ok(stages)
    } else {
        Err(unplaced)
    }
}
