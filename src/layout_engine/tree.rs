use std::sync::Arc;

use tracing::debug;

use super::engine::{Axis, Direction, LayoutEngine, WindowPlacement};
use crate::common::geometry::Rect;
use crate::model::monitor::Monitor;
use crate::sys::gateway::WindowHandle;

/// Smallest fraction of a split a child may occupy after a resize.
const MIN_WEIGHT: f64 = 0.05;

#[derive(Debug, Clone)]
enum Node {
    Leaf(WindowHandle),
    Split { axis: Axis, children: Vec<(f64, Node)> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    fn axis(self) -> Axis {
        match self {
            Edge::Left | Edge::Right => Axis::Horizontal,
            Edge::Top | Edge::Bottom => Axis::Vertical,
        }
    }

    fn is_leading(self) -> bool { matches!(self, Edge::Left | Edge::Top) }
}

/// A tree of horizontal/vertical splits. Each split holds (weight, child)
/// pairs whose weights sum to 1.0 of the parent's extent along the split
/// axis. Adding a window splits the focused leaf; removing a leaf
/// renormalizes its siblings.
#[derive(Debug, Clone, Default)]
pub struct TreeEngine {
    root: Option<Node>,
    focused: Option<WindowHandle>,
}

impl TreeEngine {
    pub fn new() -> Self { Self::default() }

    pub fn debug_tree(&self) -> String {
        fn convert(node: &Node, weight: Option<f64>) -> ascii_tree::Tree {
            match node {
                Node::Leaf(w) => {
                    let label = match weight {
                        Some(weight) => format!("window {w} ({weight:.2})"),
                        None => format!("window {w}"),
                    };
                    ascii_tree::Tree::Leaf(vec![label])
                }
                Node::Split { axis, children } => ascii_tree::Tree::Node(
                    format!("{axis:?}"),
                    children
                        .iter()
                        .map(|(weight, child)| convert(child, Some(*weight)))
                        .collect(),
                ),
            }
        }
        let mut out = String::new();
        if let Some(root) = &self.root {
            let _ = ascii_tree::write_tree(&mut out, &convert(root, None));
        }
        out
    }

    pub fn inserting(&self, window: WindowHandle, direction: Direction) -> TreeEngine {
        let mut next = self.clone();
        if next.contains_window(window) {
            return next;
        }
        match next.root.take() {
            None => next.root = Some(Node::Leaf(window)),
            Some(mut root) => {
                let target = self
                    .focused
                    .and_then(|w| find_path(&root, w))
                    .unwrap_or_else(|| last_leaf_path(&root));
                insert_at(&mut root, &target, window, direction);
                next.root = Some(root);
            }
        }
        next.focused = Some(window);
        next
    }

    pub fn removing(&self, window: WindowHandle) -> TreeEngine {
        let mut next = self.clone();
        if let Some(root) = next.root.take() {
            next.root = without(root, window);
        }
        if next.focused == Some(window) {
            next.focused = None;
        }
        next
    }

    pub fn focusing(&self, window: WindowHandle) -> TreeEngine {
        let mut next = self.clone();
        if next.contains_window(window) {
            next.focused = Some(window);
        }
        next
    }

    pub fn equalizing(&self) -> TreeEngine {
        let mut next = self.clone();
        next.root = next.root.as_ref().map(equalized);
        next
    }

    /// Adjusts split weights after a user drag/resize of `window` from
    /// `old_frame` to `new_frame` within `area`.
    pub fn resizing(
        &self,
        window: WindowHandle,
        old_frame: Rect<i32>,
        new_frame: Rect<i32>,
        area: Rect<i32>,
    ) -> TreeEngine {
        let mut next = self.clone();
        let Some(mut root) = next.root.take() else {
            return next;
        };
        let deltas = [
            (Edge::Left, new_frame.x - old_frame.x),
            (Edge::Right, new_frame.max_x() - old_frame.max_x()),
            (Edge::Top, new_frame.y - old_frame.y),
            (Edge::Bottom, new_frame.max_y() - old_frame.max_y()),
        ];
        for (edge, delta) in deltas {
            if delta != 0 {
                apply_edge_delta(&mut root, area, window, edge, delta);
            }
        }
        next.root = Some(root);
        next
    }
}

fn make_split(direction: Direction, old: Node, window: WindowHandle) -> Node {
    let new = Node::Leaf(window);
    let children = if direction.is_leading() {
        vec![(0.5, new), (0.5, old)]
    } else {
        vec![(0.5, old), (0.5, new)]
    };
    Node::Split { axis: direction.axis(), children }
}

fn insert_at(root: &mut Node, path: &[usize], window: WindowHandle, direction: Direction) {
    let Some((&idx, parent_path)) = path.split_last() else {
        // The target leaf is the root itself.
        let old = std::mem::replace(root, Node::Leaf(window));
        *root = make_split(direction, old, window);
        return;
    };

    let parent = node_at_mut(root, parent_path);
    let Node::Split { axis, children } = parent else {
        unreachable!("path interior must be splits");
    };
    if *axis == direction.axis() {
        // Same orientation: the new sibling takes half the leaf's share.
        let half = children[idx].0 / 2.0;
        children[idx].0 = half;
        let pos = if direction.is_leading() { idx } else { idx + 1 };
        children.insert(pos, (half, Node::Leaf(window)));
    } else {
        let old = std::mem::replace(&mut children[idx].1, Node::Leaf(window));
        children[idx].1 = make_split(direction, old, window);
    }
}

fn node_at_mut<'a>(mut node: &'a mut Node, path: &[usize]) -> &'a mut Node {
    for &i in path {
        match node {
            Node::Split { children, .. } => node = &mut children[i].1,
            Node::Leaf(_) => unreachable!("path descends past a leaf"),
        }
    }
    node
}

fn node_at<'a>(mut node: &'a Node, path: &[usize]) -> &'a Node {
    for &i in path {
        match node {
            Node::Split { children, .. } => node = &children[i].1,
            Node::Leaf(_) => unreachable!("path descends past a leaf"),
        }
    }
    node
}

fn find_path(node: &Node, window: WindowHandle) -> Option<Vec<usize>> {
    match node {
        Node::Leaf(w) => (*w == window).then(Vec::new),
        Node::Split { children, .. } => {
            for (i, (_, child)) in children.iter().enumerate() {
                if let Some(mut path) = find_path(child, window) {
                    path.insert(0, i);
                    return Some(path);
                }
            }
            None
        }
    }
}

fn last_leaf_path(node: &Node) -> Vec<usize> {
    let mut path = Vec::new();
    let mut cur = node;
    while let Node::Split { children, .. } = cur {
        path.push(children.len() - 1);
        cur = &children.last().unwrap().1;
    }
    path
}

/// Removes `window`, collapsing single-child splits and renormalizing the
/// remaining siblings to sum to 1.0.
fn without(node: Node, window: WindowHandle) -> Option<Node> {
    match node {
        Node::Leaf(w) if w == window => None,
        leaf @ Node::Leaf(_) => Some(leaf),
        Node::Split { axis, children } => {
            let mut kept: Vec<(f64, Node)> = Vec::with_capacity(children.len());
            for (weight, child) in children {
                if let Some(child) = without(child, window) {
                    kept.push((weight, child));
                }
            }
            match kept.len() {
                0 => None,
                1 => Some(kept.pop().unwrap().1),
                _ => {
                    let sum: f64 = kept.iter().map(|(w, _)| w).sum();
                    for entry in &mut kept {
                        entry.0 /= sum;
                    }
                    Some(Node::Split { axis, children: kept })
                }
            }
        }
    }
}

fn equalized(node: &Node) -> Node {
    match node {
        Node::Leaf(w) => Node::Leaf(*w),
        Node::Split { axis, children } => {
            let share = 1.0 / children.len() as f64;
            Node::Split {
                axis: *axis,
                children: children.iter().map(|(_, child)| (share, equalized(child))).collect(),
            }
        }
    }
}

fn collect_windows(node: &Node, out: &mut Vec<WindowHandle>) {
    match node {
        Node::Leaf(w) => out.push(*w),
        Node::Split { children, .. } => {
            for (_, child) in children {
                collect_windows(child, out);
            }
        }
    }
}

fn child_rects(axis: Axis, rect: Rect<i32>, weights: &[f64]) -> Vec<Rect<i32>> {
    let total: f64 = weights.iter().sum();
    let extent = f64::from(match axis {
        Axis::Horizontal => rect.width,
        Axis::Vertical => rect.height,
    });
    let base = match axis {
        Axis::Horizontal => rect.x,
        Axis::Vertical => rect.y,
    };
    let mut rects = Vec::with_capacity(weights.len());
    let mut cursor = base;
    let mut acc = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        acc += weight / total;
        // The final child snaps to the far edge so rounding leaves no gap.
        let end = if i == weights.len() - 1 {
            match axis {
                Axis::Horizontal => rect.max_x(),
                Axis::Vertical => rect.max_y(),
            }
        } else {
            base + (extent * acc).round() as i32
        };
        rects.push(match axis {
            Axis::Horizontal => Rect::new(cursor, rect.y, end - cursor, rect.height),
            Axis::Vertical => Rect::new(rect.x, cursor, rect.width, end - cursor),
        });
        cursor = end;
    }
    rects
}

fn layout_node(node: &Node, rect: Rect<i32>, out: &mut Vec<WindowPlacement>) {
    match node {
        Node::Leaf(window) => out.push(WindowPlacement { window: *window, frame: rect }),
        Node::Split { axis, children } => {
            let weights: Vec<f64> = children.iter().map(|(w, _)| *w).collect();
            for ((_, child), child_rect) in
                children.iter().zip(child_rects(*axis, rect, &weights))
            {
                layout_node(child, child_rect, out);
            }
        }
    }
}

fn rect_for_path(node: &Node, rect: Rect<i32>, path: &[usize]) -> Rect<i32> {
    let Some((&idx, rest)) = path.split_first() else { return rect };
    match node {
        Node::Leaf(_) => rect,
        Node::Split { axis, children } => {
            let weights: Vec<f64> = children.iter().map(|(w, _)| *w).collect();
            let child_rect = child_rects(*axis, rect, &weights)[idx];
            rect_for_path(&children[idx].1, child_rect, rest)
        }
    }
}

/// Transfers weight between the resized leaf's subtree and its neighbor at
/// the deepest ancestor split whose boundary is the moved edge.
fn apply_edge_delta(
    root: &mut Node,
    area: Rect<i32>,
    window: WindowHandle,
    edge: Edge,
    delta_px: i32,
) {
    let Some(path) = find_path(root, window) else { return };
    for k in (0..path.len()).rev() {
        let parent_path = &path[..k];
        let idx = path[k];
        let (axis, len) = match node_at(root, parent_path) {
            Node::Split { axis, children } => (*axis, children.len()),
            Node::Leaf(_) => continue,
        };
        if axis != edge.axis() {
            continue;
        }
        let neighbor = if edge.is_leading() {
            if idx == 0 {
                continue; // the moved edge is this split's outer boundary
            }
            idx - 1
        } else {
            if idx + 1 >= len {
                continue;
            }
            idx + 1
        };

        let parent_rect = rect_for_path(root, area, parent_path);
        let extent = f64::from(match axis {
            Axis::Horizontal => parent_rect.width,
            Axis::Vertical => parent_rect.height,
        });
        if extent <= 0.0 {
            return;
        }
        // A leading edge moving inward shrinks this subtree; a trailing edge
        // moving outward grows it.
        let mut frac = f64::from(delta_px) / extent;
        if edge.is_leading() {
            frac = -frac;
        }

        let Node::Split { children, .. } = node_at_mut(root, parent_path) else {
            unreachable!();
        };
        let transfer = frac
            .min(children[neighbor].0 - MIN_WEIGHT)
            .max(MIN_WEIGHT - children[idx].0);
        children[idx].0 += transfer;
        children[neighbor].0 -= transfer;
        debug!(?edge, delta_px, transfer, "adjusted split weights after user resize");
        return;
    }
}

impl LayoutEngine for TreeEngine {
    fn name(&self) -> &'static str { "tree" }

    fn do_layout(&self, rect: Rect<i32>, _monitor: &Monitor) -> Vec<WindowPlacement> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            layout_node(root, rect, &mut out);
        }
        out
    }

    fn add_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        Arc::new(self.inserting(window, Direction::Right))
    }

    fn add_window_in_direction(
        &self,
        window: WindowHandle,
        direction: Direction,
    ) -> Arc<dyn LayoutEngine> {
        Arc::new(self.inserting(window, direction))
    }

    fn remove_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        Arc::new(self.removing(window))
    }

    fn contains_window(&self, window: WindowHandle) -> bool {
        self.root.as_ref().is_some_and(|root| find_path(root, window).is_some())
    }

    fn windows(&self) -> Vec<WindowHandle> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            collect_windows(root, &mut out);
        }
        out
    }

    fn clone_engine(&self) -> Arc<dyn LayoutEngine> { Arc::new(self.clone()) }

    fn focus_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        Arc::new(self.focusing(window))
    }

    fn equalize(&self) -> Arc<dyn LayoutEngine> { Arc::new(self.equalizing()) }

    fn user_resized(
        &self,
        window: WindowHandle,
        old_frame: Rect<i32>,
        new_frame: Rect<i32>,
        area: Rect<i32>,
    ) -> Arc<dyn LayoutEngine> {
        Arc::new(self.resizing(window, old_frame, new_frame, area))
    }
}
