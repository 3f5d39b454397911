//! Positioned text annotations with hit-testing, selection and drag.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::Point;
use crate::state::{Color, FONT_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextId(u64);

impl TextId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextAnnotation {
    pub id: TextId,
    pub content: String,
    /// Canonical pixel position: left edge of the ink, vertical middle of the line.
    /// The ink edge sits one left side bearing right of a `fillText` pen origin.
    pub position: Point,
    pub color: Color,
    pub font_size: f32,
}

impl TextAnnotation {
    /// Circular hit radius approximating the rendered footprint.
    pub fn hit_radius(&self) -> f32 {
        self.font_size * 2.0
    }
}

#[derive(Debug, Default)]
pub struct TextLayer {
    annotations: Vec<TextAnnotation>,
    last_id: u64,
    selected: Option<TextId>,
    dragging: bool,
}

impl TextLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotations in draw order (earliest first).
    pub fn annotations(&self) -> &[TextAnnotation] {
        &self.annotations
    }

    pub fn get(&self, id: TextId) -> Option<&TextAnnotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn selected(&self) -> Option<TextId> {
        self.selected
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Topmost annotation whose hit circle contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<TextId> {
        self.annotations
            .iter()
            .rev()
            .find(|a| a.position.distance(point) < a.hit_radius())
            .map(|a| a.id)
    }

    /// Appends a new annotation unless `point` hits an existing one or
    /// `content` is empty.
    pub fn place(
        &mut self,
        point: Point,
        content: &str,
        color: Color,
        font_size: f32,
    ) -> Option<TextId> {
        if content.is_empty() || self.hit_test(point).is_some() {
            return None;
        }
        self.last_id += 1;
        let id = TextId(self.last_id);
        self.annotations.push(TextAnnotation {
            id,
            content: content.to_string(),
            position: point,
            color,
            font_size: FONT_SIZE.clamp(font_size),
        });
        debug!(id = id.get(), x = point.x, y = point.y, "text placed");
        Some(id)
    }

    /// Selects `id` if present. Returns whether the selection changed to it.
    pub fn select(&mut self, id: TextId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if self.selected != Some(id) {
            self.dragging = false;
        }
        self.selected = Some(id);
        true
    }

    pub fn deselect(&mut self) {
        self.selected = None;
        self.dragging = false;
    }

    /// Selects `id` and starts dragging it. Ignored while another drag is in flight.
    pub fn begin_drag(&mut self, id: TextId) -> bool {
        if self.dragging && self.selected != Some(id) {
            return false;
        }
        if !self.select(id) {
            return false;
        }
        self.dragging = true;
        true
    }

    /// Moves `id` to `point`; only applies to the selected annotation mid-drag.
    pub fn update_position(&mut self, id: TextId, point: Point) -> bool {
        if !self.dragging || self.selected != Some(id) {
            return false;
        }
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(annotation) => {
                annotation.position = point;
                true
            }
            None => false,
        }
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Replaces content and style in place. Empty content is rejected.
    pub fn update(&mut self, id: TextId, content: &str, color: Color, font_size: f32) -> bool {
        if content.is_empty() {
            return false;
        }
        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        annotation.content = content.to_string();
        annotation.color = color;
        annotation.font_size = FONT_SIZE.clamp(font_size);
        true
    }

    pub fn delete(&mut self, id: TextId) -> Option<TextAnnotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        if self.selected == Some(id) {
            self.deselect();
        }
        debug!(id = id.get(), "text deleted");
        Some(self.annotations.remove(index))
    }

    /// Removes every annotation. Ids keep counting up from where they were.
    pub fn clear_all(&mut self) {
        self.annotations.clear();
        self.deselect();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn layer_with(points: &[(f32, f32)]) -> (TextLayer, Vec<TextId>) {
        let mut layer = TextLayer::new();
        let ids = points
            .iter()
            .map(|&(x, y)| {
                // place far apart first, then move into position
                let id = layer
                    .place(Point::new(10_000.0 * (layer.len() as f32 + 1.0), 0.0), "t", Color::WHITE, 20.0)
                    .unwrap();
                layer.begin_drag(id);
                layer.update_position(id, Point::new(x, y));
                layer.end_drag();
                id
            })
            .collect();
        (layer, ids)
    }

    #[test]
    fn place_appends_and_returns_fresh_ids() {
        let mut layer = TextLayer::new();
        let a = layer.place(Point::new(10.0, 10.0), "a", Color::WHITE, 20.0).unwrap();
        let b = layer.place(Point::new(200.0, 10.0), "b", Color::BLACK, 30.0).unwrap();
        assert!(b > a);
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.annotations()[1].content, "b");
    }

    #[test]
    fn place_rejects_empty_content_and_hits() {
        let mut layer = TextLayer::new();
        assert!(layer.place(Point::new(0.0, 0.0), "", Color::WHITE, 20.0).is_none());
        layer.place(Point::new(50.0, 50.0), "x", Color::WHITE, 20.0).unwrap();
        // within 2 x fontSize of the existing one
        assert!(layer.place(Point::new(70.0, 60.0), "y", Color::WHITE, 20.0).is_none());
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn hit_radius_is_twice_font_size() {
        let mut layer = TextLayer::new();
        let id = layer.place(Point::new(100.0, 100.0), "x", Color::WHITE, 20.0).unwrap();
        assert_eq!(layer.hit_test(Point::new(139.0, 100.0)), Some(id));
        assert_eq!(layer.hit_test(Point::new(140.0, 100.0)), None);
    }

    #[test]
    fn hit_test_prefers_most_recent_annotation() {
        let (layer, ids) = layer_with(&[(50.0, 50.0), (55.0, 50.0)]);
        assert_eq!(layer.hit_test(Point::new(52.0, 50.0)), Some(ids[1]));
    }

    #[test]
    fn drag_moves_only_selected_annotation() {
        let mut layer = TextLayer::new();
        let a = layer.place(Point::new(10.0, 10.0), "a", Color::WHITE, 10.0).unwrap();
        let b = layer.place(Point::new(300.0, 300.0), "b", Color::WHITE, 10.0).unwrap();

        // not dragging yet
        assert!(!layer.update_position(a, Point::new(1.0, 1.0)));

        assert!(layer.begin_drag(a));
        assert!(!layer.update_position(b, Point::new(0.0, 0.0)));
        assert!(layer.update_position(a, Point::new(40.0, 45.0)));
        layer.end_drag();
        assert!(!layer.update_position(a, Point::new(99.0, 99.0)));

        assert_eq!(layer.get(a).unwrap().position, Point::new(40.0, 45.0));
        assert_eq!(layer.get(b).unwrap().position, Point::new(300.0, 300.0));
        assert_eq!(layer.selected(), Some(a));
    }

    #[test]
    fn only_one_drag_in_flight() {
        let mut layer = TextLayer::new();
        let a = layer.place(Point::new(10.0, 10.0), "a", Color::WHITE, 10.0).unwrap();
        let b = layer.place(Point::new(300.0, 300.0), "b", Color::WHITE, 10.0).unwrap();
        assert!(layer.begin_drag(a));
        assert!(!layer.begin_drag(b));
        assert_eq!(layer.selected(), Some(a));
    }

    #[test]
    fn deleting_selected_clears_selection() {
        let mut layer = TextLayer::new();
        let a = layer.place(Point::new(10.0, 10.0), "a", Color::WHITE, 10.0).unwrap();
        layer.begin_drag(a);
        let removed = layer.delete(a).unwrap();
        assert_eq!(removed.id, a);
        assert_eq!(layer.selected(), None);
        assert!(!layer.is_dragging());
        assert!(layer.delete(a).is_none());
    }

    #[test]
    fn select_unknown_id_is_ignored() {
        let mut layer = TextLayer::new();
        let a = layer.place(Point::new(10.0, 10.0), "a", Color::WHITE, 10.0).unwrap();
        layer.delete(a);
        assert!(!layer.select(a));
        assert_eq!(layer.selected(), None);
    }

    #[test]
    fn update_changes_content_and_clamps_size() {
        let mut layer = TextLayer::new();
        let a = layer.place(Point::new(10.0, 10.0), "a", Color::WHITE, 10.0).unwrap();
        assert!(layer.update(a, "hello", Color::BLACK, 900.0));
        let ann = layer.get(a).unwrap();
        assert_eq!(ann.content, "hello");
        assert_eq!(ann.color, Color::BLACK);
        assert_eq!(ann.font_size, 200.0);
        assert!(!layer.update(a, "", Color::BLACK, 20.0));
        assert_eq!(layer.get(a).unwrap().content, "hello");
    }

    #[test]
    fn ids_stay_unique_across_clear_all() {
        let mut layer = TextLayer::new();
        let mut seen = HashSet::new();
        for round in 0..3 {
            for i in 0..50 {
                let p = Point::new(i as f32 * 1000.0, round as f32 * 1000.0);
                let id = layer.place(p, "x", Color::WHITE, 10.0).unwrap();
                assert!(seen.insert(id), "duplicate id {id:?}");
            }
            layer.clear_all();
            assert!(layer.is_empty());
        }
        assert_eq!(seen.len(), 150);
    }
}
