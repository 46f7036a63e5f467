//! Advisory coordinates for new topics.

use crate::model::node::Position;

/// Horizontal step from a root parent.
pub const ROOT_CHILD_DX: f64 = 200.0;
/// Vertical step per existing child of a root parent.
pub const ROOT_CHILD_DY: f64 = 100.0;
/// Perpendicular spacing between siblings on a continued branch.
pub const SIBLING_SPACING: f64 = 80.0;

/// Suggests a position for the next child of a topic at `parent`.
///
/// With a grandparent the branch direction grandparent -> parent is
/// continued, and siblings fan out perpendicular to it, alternating sides.
/// Without one (or when parent and grandparent coincide) children stack
/// to the right of the parent. The result is always finite: when either
/// layout overflows, the child falls back to the stacked layout, and then
/// to the parent's own position.
pub fn place_child(parent: Position, grandparent: Option<Position>, child_count: usize) -> Position {
    grandparent
        .and_then(|grandparent| continue_branch(parent, grandparent, child_count))
        .filter(Position::is_finite)
        .or_else(|| Some(stack_beside(parent, child_count)).filter(Position::is_finite))
        .unwrap_or(parent)
}

fn continue_branch(parent: Position, grandparent: Position, child_count: usize) -> Option<Position> {
    let (dx, dy) = (parent.x - grandparent.x, parent.y - grandparent.y);
    let length = dx.hypot(dy);
    if length <= f64::EPSILON {
        return None;
    }

    let base = Position::new(parent.x + dx, parent.y + dy);
    if child_count == 0 {
        return Some(base);
    }

    let (perp_x, perp_y) = (-dy / length * SIBLING_SPACING, dx / length * SIBLING_SPACING);
    let slot = sibling_slot(child_count);
    Some(Position::new(base.x + perp_x * slot, base.y + perp_y * slot))
}

fn stack_beside(parent: Position, child_count: usize) -> Position {
    Position::new(
        parent.x + ROOT_CHILD_DX,
        parent.y + ROOT_CHILD_DY * child_count as f64,
    )
}

/// Signed perpendicular multiplier: -1, 1, -2, 2, -3, ... for counts 1, 2, 3, ...
fn sibling_slot(child_count: usize) -> f64 {
    let count = child_count as f64;
    if child_count % 2 == 0 {
        count / 2.0
    } else {
        -((count + 1.0) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_children_stack_downwards() {
        let parent = Position::new(1000.0, 1000.0);
        assert_eq!(place_child(parent, None, 0), Position::new(1200.0, 1000.0));
        assert_eq!(place_child(parent, None, 3), Position::new(1200.0, 1300.0));
    }

    #[test]
    fn branch_direction_is_continued() {
        let grandparent = Position::new(0.0, 0.0);
        let parent = Position::new(200.0, 0.0);
        assert_eq!(
            place_child(parent, Some(grandparent), 0),
            Position::new(400.0, 0.0)
        );
    }

    #[test]
    fn siblings_alternate_sides_of_the_branch() {
        let grandparent = Position::new(0.0, 0.0);
        let parent = Position::new(200.0, 0.0);
        assert_eq!(
            place_child(parent, Some(grandparent), 1),
            Position::new(400.0, -80.0)
        );
        assert_eq!(
            place_child(parent, Some(grandparent), 2),
            Position::new(400.0, 80.0)
        );
        assert_eq!(
            place_child(parent, Some(grandparent), 3),
            Position::new(400.0, -160.0)
        );
    }

    #[test]
    fn coincident_grandparent_falls_back_to_root_layout() {
        let point = Position::new(50.0, 50.0);
        assert_eq!(place_child(point, Some(point), 1), Position::new(250.0, 150.0));
    }

    #[test]
    fn overflowing_branch_falls_back_to_a_finite_position() {
        let grandparent = Position::new(-1e308, 0.0);
        let parent = Position::new(1e308, 0.0);
        let placed = place_child(parent, Some(grandparent), 1);
        assert!(placed.is_finite());
        assert_eq!(placed, Position::new(1e308 + ROOT_CHILD_DX, ROOT_CHILD_DY));

        let edge = Position::new(f64::MAX, f64::MAX);
        assert!(place_child(edge, None, usize::MAX).is_finite());
    }
}
