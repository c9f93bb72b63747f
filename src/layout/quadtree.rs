use eframe::egui::{Rect, Vec2, pos2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Square cell of a Barnes-Hut region tree built over a subset of the
/// simulation points. Each cell carries the mass and centroid that stand in
/// for its members when they act from far away.
pub(super) struct Cell {
    pub(super) region: Rect,
    pub(super) centroid: Vec2,
    pub(super) mass: f32,
    pub(super) members: Vec<usize>,
    children: Vec<Cell>,
}

fn square_region(points: &[Vec2], members: &[usize]) -> Option<Rect> {
    let mut bounds = Rect::NOTHING;
    for &index in members {
        bounds.extend_with(points[index].to_pos2());
    }

    if !bounds.is_finite() {
        return None;
    }

    let side = bounds.size().max_elem().max(1.0) + 2.0;
    Some(Rect::from_center_size(bounds.center(), Vec2::splat(side)))
}

fn quadrant(region: Rect, point: Vec2) -> usize {
    let center = region.center();
    usize::from(point.x >= center.x) | (usize::from(point.y >= center.y) << 1)
}

fn quadrant_region(region: Rect, quadrant: usize) -> Rect {
    let center = region.center();
    let (min, max) = (region.min, region.max);
    match quadrant {
        0 => Rect::from_min_max(min, center),
        1 => Rect::from_min_max(pos2(center.x, min.y), pos2(max.x, center.y)),
        2 => Rect::from_min_max(pos2(min.x, center.y), pos2(center.x, max.y)),
        _ => Rect::from_min_max(center, max),
    }
}

impl Cell {
    pub(super) fn build(points: &[Vec2], members: Vec<usize>) -> Option<Self> {
        if members.is_empty() {
            return None;
        }

        let region = square_region(points, &members)?;
        Some(Self::grow(region, members, points, 0))
    }

    fn grow(region: Rect, members: Vec<usize>, points: &[Vec2], depth: usize) -> Self {
        let mass = members.len() as f32;
        let centroid = members
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + points[index])
            / mass;

        let mut cell = Self {
            region,
            centroid,
            mass,
            members,
            children: Vec::new(),
        };
        if depth >= MAX_DEPTH || cell.members.len() <= LEAF_CAPACITY {
            return cell;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &cell.members {
            buckets[quadrant(region, points[index])].push(index);
        }

        // coincident points would otherwise recurse until MAX_DEPTH
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return cell;
        }

        cell.children = buckets
            .into_iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(slot, bucket)| {
                Self::grow(quadrant_region(region, slot), bucket, points, depth + 1)
            })
            .collect();
        cell.members.clear();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(super) fn children(&self) -> &[Cell] {
        &self.children
    }

    pub(super) fn width(&self) -> f32 {
        self.region.width()
    }

    /// Opening criterion for the charge walk: the cell may act through its
    /// centroid on `point` when it is small relative to the distance.
    pub(super) fn is_far_from(&self, point: Vec2, theta: f32) -> bool {
        if self.mass <= 1.0 || self.region.contains(point.to_pos2()) {
            return false;
        }

        let distance = (self.centroid - point).length().max(0.0001);
        self.width() / distance < theta
    }

    /// Whether any member of `self` may come within `reach` of a member of
    /// `other`, judged on the cell regions alone.
    pub(super) fn within_reach(&self, other: &Cell, reach: f32) -> bool {
        let (a, b) = (self.region, other.region);
        let dx = (a.min.x - b.max.x).max(b.min.x - a.max.x).max(0.0);
        let dy = (a.min.y - b.max.y).max(b.min.y - a.max.y).max(0.0);
        (dx * dx) + (dy * dy) <= reach * reach
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    #[test]
    fn mass_and_centroid_cover_the_subset() {
        let points = vec![vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(500.0, 500.0)];
        let tree = Cell::build(&points, vec![0, 1]).unwrap();

        assert_eq!(tree.mass, 2.0);
        assert_eq!(tree.centroid, vec2(5.0, 0.0));
        assert!(tree.region.contains(pos2(10.0, 0.0)));
        assert!(!tree.region.contains(points[2].to_pos2()));
    }

    #[test]
    fn splits_once_past_leaf_capacity() {
        let points = (0..40)
            .map(|index| vec2((index % 8) as f32 * 30.0, (index / 8) as f32 * 30.0))
            .collect::<Vec<_>>();
        let tree = Cell::build(&points, (0..points.len()).collect()).unwrap();

        assert!(!tree.is_leaf());
        assert!(tree.members.is_empty());
        let total = tree.children().iter().map(|child| child.mass).sum::<f32>();
        assert_eq!(total, 40.0);
        assert!(
            tree.children()
                .iter()
                .all(|child| tree.region.contains_rect(child.region))
        );
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let points = vec![vec2(3.0, 3.0); 20];
        let tree = Cell::build(&points, (0..20).collect()).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.members.len(), 20);
    }

    #[test]
    fn empty_subset_builds_nothing() {
        assert!(Cell::build(&[vec2(1.0, 1.0)], Vec::new()).is_none());
        assert!(Cell::build(&[vec2(f32::NAN, 1.0)], vec![0]).is_none());
    }

    #[test]
    fn far_cells_are_approximated_and_near_ones_opened() {
        let points = (0..12)
            .map(|index| vec2(index as f32, (index % 3) as f32))
            .collect::<Vec<_>>();
        let tree = Cell::build(&points, (0..12).collect()).unwrap();

        assert!(tree.is_far_from(vec2(1000.0, 0.0), 0.9));
        assert!(!tree.is_far_from(vec2(5.0, 1.0), 0.9));
    }

    #[test]
    fn reach_is_measured_between_regions() {
        let points = vec![vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let left = Cell::build(&points, vec![0]).unwrap();
        let right = Cell::build(&points, vec![1]).unwrap();

        assert!(!left.within_reach(&right, 50.0));
        assert!(left.within_reach(&right, 98.0));
        assert!(left.within_reach(&left, 0.0));
    }
}
