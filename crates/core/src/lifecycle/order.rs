//! Startup ordering: depth-first topological sort over singleton services.

use std::collections::HashMap;

use super::{LifecycleError, Lifetime};

/// The parts of a registration the sort looks at.
pub(crate) struct Node<'a> {
    pub name: &'a str,
    pub lifetime: Lifetime,
    pub dependencies: &'a [String],
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Compute the order in which singletons are started.
///
/// Every singleton appears after each singleton it declares as a
/// dependency. Dependencies on scoped or transient services are resolved
/// lazily by the factory and impose no ordering. Ties keep registration
/// order.
pub(crate) fn initialization_order(nodes: &[Node<'_>]) -> Result<Vec<usize>, LifecycleError> {
    let by_name: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.name, index))
        .collect();

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());

    for index in 0..nodes.len() {
        if nodes[index].lifetime == Lifetime::Singleton {
            visit(index, nodes, &by_name, &mut marks, &mut order)?;
        }
    }

    Ok(order)
}

fn visit(
    index: usize,
    nodes: &[Node<'_>],
    by_name: &HashMap<&str, usize>,
    marks: &mut [Mark],
    order: &mut Vec<usize>,
) -> Result<(), LifecycleError> {
    match marks[index] {
        Mark::Done => return Ok(()),
        Mark::Visiting => {
            return Err(LifecycleError::CircularDependency(
                nodes[index].name.to_string(),
            ))
        }
        Mark::Unvisited => {}
    }

    marks[index] = Mark::Visiting;

    for dependency in nodes[index].dependencies {
        let Some(&dep_index) = by_name.get(dependency.as_str()) else {
            return Err(LifecycleError::MissingDependency {
                service: nodes[index].name.to_string(),
                dependency: dependency.clone(),
            });
        };
        if nodes[dep_index].lifetime != Lifetime::Singleton {
            continue;
        }
        visit(dep_index, nodes, by_name, marks, order)?;
    }

    marks[index] = Mark::Done;
    order.push(index);
    Ok(())
}
