use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use strand_http::protocol::Request;
use tracing::trace;

use crate::responder::Responder;
use crate::router::route::Route;
use crate::router::trie::Trie;

/// One `/`-separated piece of a route pattern.
///
/// The derived order puts literals before captures before the wildcard,
/// which is the order a matcher tries them in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    Literal(String),
    Parameter(String),
    Wildcard,
}

impl Segment {
    pub fn parse(segment: &str) -> Self {
        if segment == "*" {
            return Segment::Wildcard;
        }
        match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => Segment::Parameter(name.to_string()),
            _ => Segment::Literal(segment.to_string()),
        }
    }

    /// The segments of a pattern; empty segments are skipped, so trailing
    /// and doubled slashes don't matter.
    pub fn parse_path(path: &str) -> impl Iterator<Item = Segment> + '_ {
        split_path(path).map(Segment::parse)
    }

    /// Equal segments, except that captures match whatever their names.
    pub fn same_shape(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Parameter(_), Segment::Parameter(_)) => true,
            (a, b) => a == b,
        }
    }

    fn cmp_literal(&self, other: &str) -> Ordering {
        match self {
            Segment::Literal(literal) => literal.as_str().cmp(other),
            Segment::Parameter(_) | Segment::Wildcard => Ordering::Greater,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(literal) => f.write_str(literal),
            Segment::Parameter(name) => write!(f, ":{name}"),
            Segment::Wildcard => f.write_str("*"),
        }
    }
}

pub(crate) fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Whether two patterns match exactly the same request paths.
pub(crate) fn same_pattern(a: &str, b: &str) -> bool {
    let a: Vec<Segment> = Segment::parse_path(a).collect();
    let b: Vec<Segment> = Segment::parse_path(b).collect();
    a.len() == b.len() && a.iter().zip(&b).all(|(a, b)| a.same_shape(b))
}

pub(crate) fn parameter_names(path: &str) -> impl Iterator<Item = String> + '_ {
    Segment::parse_path(path).filter_map(|segment| match segment {
        Segment::Parameter(name) => Some(name),
        _ => None,
    })
}

/// Matches request paths against route patterns with a segment trie.
///
/// At every level a literal child is tried first (binary search), then
/// each capture, then the wildcard; a branch that fails further down is
/// backtracked. The wildcard consumes any number of remaining segments,
/// including none.
pub struct TrieRouteMatcher {
    trie: Trie<Segment, usize>,
    routes: Vec<Route>,
}

impl TrieRouteMatcher {
    pub fn new(routes: Vec<Route>) -> Self {
        let mut trie = Trie::new();
        for (index, route) in routes.iter().enumerate() {
            trie.insert(Segment::parse_path(route.path()), Some(index));
        }
        Self { trie, routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn trie(&self) -> &Trie<Segment, usize> {
        &self.trie
    }

    /// Finds the route for the request path and returns its responder for
    /// the request method.
    ///
    /// Captured parameters are written to the request's path parameters.
    pub fn match_route(&self, request: &mut Request) -> Option<Arc<dyn Responder>> {
        let (index, captured) = {
            let segments: Vec<&str> = split_path(request.path()).collect();
            let mut captured = Vec::new();
            let index = search(&self.trie, &segments, &mut captured)?;
            let captured: Vec<(String, String)> = captured.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
            (index, captured)
        };

        let route = self.routes.get(index)?;
        trace!(pattern = route.path(), path = request.path(), "matched route");
        request.path_parameters_mut().extend(captured);
        Some(route.responder(request.method()))
    }
}

impl fmt::Debug for TrieRouteMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrieRouteMatcher").field("routes", &self.routes).finish_non_exhaustive()
    }
}

fn search<'t, 'p>(
    node: &'t Trie<Segment, usize>,
    segments: &[&'p str],
    captured: &mut Vec<(&'t str, &'p str)>,
) -> Option<usize> {
    if let Some((&segment, rest)) = segments.split_first() {
        if let Some(found) = node.child_by(|prefix| prefix.cmp_literal(segment)).and_then(|child| search(child, rest, captured)) {
            return Some(found);
        }

        let children = node.children();
        let parameters = children.partition_point(|child| matches!(child.prefix(), Some(Segment::Literal(_))));
        for child in &children[parameters..] {
            let Some(Segment::Parameter(name)) = child.prefix() else {
                break;
            };
            captured.push((name.as_str(), segment));
            if let Some(found) = search(child, rest, captured) {
                return Some(found);
            }
            captured.pop();
        }
    } else if let Some(&index) = node.payload().filter(|_| node.is_ending()) {
        return Some(index);
    }

    let wildcard = node.children().last().filter(|child| child.prefix() == Some(&Segment::Wildcard))?;
    (0..=segments.len()).rev().find_map(|skip| search(wildcard, &segments[skip..], captured))
}
