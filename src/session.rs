//! Editor session: owns every layer and routes user intents to them.
//!
//! The session has no image (`mode()` is `None`) until one is installed, then
//! is in exactly one of [`Mode::Adjust`], [`Mode::Paint`] or [`Mode::Text`].
//! Pointer events go to the paint layer in paint mode, to the text layer in
//! text mode, and nowhere in adjust mode. Loading an image is split into
//! [`Session::begin_load`] / [`Session::finish_load`] so decoding can happen
//! elsewhere; while a load is pending, drawing and text edits are ignored.

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{EditorError, Result};
use crate::geometry::{self, DisplayRect, Point};
use crate::paint::{BlendMode, Brush, PaintLayer};
use crate::state::{BrushSettings, Color, FilterChannel, FilterParameters, Mode, TextDraft, ZOOM};
use crate::text::{TextId, TextLayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// Pointer left the element; ends strokes and drags like `Up`.
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Pointer intent in display space.
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
    /// On-screen box of the image element. `None` means the image is shown
    /// 1:1 at the origin, so display and canonical coordinates coincide.
    #[serde(default)]
    pub bounds: Option<DisplayRect>,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            x,
            y,
            bounds: None,
        }
    }

    pub fn within(mut self, bounds: DisplayRect) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// A user intent, dispatched with [`Session::dispatch`].
pub enum Command {
    SetMode { mode: Mode },
    SetFilter { channel: FilterChannel, value: f32 },
    ResetFilters,
    SetZoom { zoom: f32 },
    SetBrushColor { color: Color },
    SetBrushSize { size: f32 },
    SetEraser { enabled: bool },
    ClearPaint,
    SetTextContent { content: String },
    SetTextColor { color: Color },
    SetTextSize { size: f32 },
    UpdateSelectedText,
    DeleteSelectedText,
    ClearText,
    Pointer(PointerEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Installed { width: u32, height: u32 },
    /// A newer load was started after this one; the result was dropped.
    Superseded,
}

/// Decodes an encoded raster (PNG, JPEG, ...) from memory.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(EditorError::Decode)
}

pub struct Session {
    image: Option<RgbaImage>,
    mode: Mode,
    filters: FilterParameters,
    paint: PaintLayer,
    text: TextLayer,
    zoom: f32,
    brush: BrushSettings,
    draft: TextDraft,
    pending: Option<LoadTicket>,
    last_ticket: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_tools(BrushSettings::default(), TextDraft::default())
    }

    pub fn with_tools(brush: BrushSettings, draft: TextDraft) -> Self {
        Self {
            image: None,
            mode: Mode::Adjust,
            filters: FilterParameters::default(),
            paint: PaintLayer::unallocated(),
            text: TextLayer::new(),
            zoom: 1.0,
            brush,
            draft,
            pending: None,
            last_ticket: 0,
        }
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| img.dimensions())
    }

    /// Active mode, or `None` while no image is loaded.
    pub fn mode(&self) -> Option<Mode> {
        self.image.as_ref().map(|_| self.mode)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn filters(&self) -> &FilterParameters {
        &self.filters
    }

    pub fn paint_layer(&self) -> &PaintLayer {
        &self.paint
    }

    pub fn text_layer(&self) -> &TextLayer {
        &self.text
    }

    pub fn text_layer_mut(&mut self) -> &mut TextLayer {
        &mut self.text
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn brush_mut(&mut self) -> &mut BrushSettings {
        &mut self.brush
    }

    pub fn text_draft(&self) -> &TextDraft {
        &self.draft
    }

    pub fn text_draft_mut(&mut self) -> &mut TextDraft {
        &mut self.draft
    }

    /// Layers may be drawn into: an image is loaded, no load is pending and
    /// the paint layer matches the image.
    fn is_ready(&self) -> bool {
        self.pending.is_none() && self.dimensions() == Some(self.paint.dimensions())
    }

    // ---- image lifecycle -------------------------------------------------

    /// Decodes `bytes` and installs the result. On failure the session keeps
    /// its previous image and layers.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<LoadOutcome> {
        let ticket = self.begin_load();
        self.finish_load(ticket, decode(bytes))
    }

    /// Marks a load as in flight. Any active stroke or drag ends here so no
    /// later pointer event lands in layers that are about to be replaced.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.paint.end_stroke();
        self.text.end_drag();
        self.last_ticket += 1;
        let ticket = LoadTicket(self.last_ticket);
        self.pending = Some(ticket);
        debug!(ticket = ticket.0, "image load started");
        ticket
    }

    /// Completes the load identified by `ticket`. Results for tickets that
    /// are no longer the latest are dropped.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        decoded: Result<DynamicImage>,
    ) -> Result<LoadOutcome> {
        if self.pending != Some(ticket) {
            debug!(ticket = ticket.0, "stale image load dropped");
            return Ok(LoadOutcome::Superseded);
        }
        self.pending = None;
        match decoded {
            Ok(img) => {
                let (width, height) = self.install_image(img);
                Ok(LoadOutcome::Installed { width, height })
            }
            Err(err) => {
                warn!(error = %err, "image load failed; keeping previous session state");
                Err(err)
            }
        }
    }

    /// Replaces the image and resets every piece of per-image state.
    pub fn install_image(&mut self, img: DynamicImage) -> (u32, u32) {
        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();
        self.image = Some(rgba);
        self.pending = None;
        self.mode = Mode::Adjust;
        self.filters.reset();
        self.paint.reallocate(width, height);
        self.text.clear_all();
        self.zoom = 1.0;
        info!(width, height, "image loaded");
        (width, height)
    }

    // ---- adjust ------------------------------------------------------------

    /// Switches mode. Ignored without an image. Leaving a mode ends any
    /// stroke or drag it owns.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.image.is_none() {
            return false;
        }
        if mode != self.mode {
            self.paint.end_stroke();
            self.text.end_drag();
            debug!(from = ?self.mode, to = ?mode, "mode switch");
        }
        self.mode = mode;
        true
    }

    pub fn set_filter(&mut self, channel: FilterChannel, value: f32) -> f32 {
        self.filters.set(channel, value)
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.zoom = ZOOM.clamp(zoom);
        self.zoom
    }

    // ---- paint -------------------------------------------------------------

    fn active_brush(&self) -> Brush {
        Brush {
            color: self.brush.color(),
            radius: self.brush.radius(),
            mode: if self.brush.eraser() {
                BlendMode::Erase
            } else {
                BlendMode::Paint
            },
        }
    }

    /// Rasterizes a complete stroke through canonical `points`.
    pub fn paint_stroke(&mut self, points: &[Point], brush: Brush) {
        let Some((&first, rest)) = points.split_first() else {
            return;
        };
        if !self.is_ready() {
            return;
        }
        self.paint.begin_stroke(first, brush);
        for &p in rest {
            self.paint.extend_stroke(p);
        }
        self.paint.end_stroke();
    }

    pub fn clear_paint(&mut self) {
        if self.is_ready() {
            self.paint.clear();
        }
    }

    // ---- text --------------------------------------------------------------

    pub fn place_text(
        &mut self,
        point: Point,
        content: &str,
        color: Color,
        font_size: f32,
    ) -> Option<TextId> {
        if !self.is_ready() {
            return None;
        }
        self.text.place(point, content, color, font_size)
    }

    /// Selects `id` and copies its content and style into the text draft.
    pub fn select_text(&mut self, id: TextId) -> bool {
        if !self.is_ready() || !self.text.select(id) {
            return false;
        }
        self.mirror_selection();
        true
    }

    fn mirror_selection(&mut self) {
        let Some(annotation) = self.text.selected().and_then(|id| self.text.get(id)) else {
            return;
        };
        self.draft.content = annotation.content.clone();
        self.draft.set_color(annotation.color);
        self.draft.set_font_size(annotation.font_size);
    }

    /// Writes the draft back into the selected annotation.
    pub fn update_selected_text(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(id) = self.text.selected() else {
            return false;
        };
        self.text.update(
            id,
            &self.draft.content,
            self.draft.color(),
            self.draft.font_size(),
        )
    }

    pub fn delete_selected_text(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(id) = self.text.selected() else {
            return false;
        };
        let removed = self.text.delete(id).is_some();
        if removed {
            self.draft.content.clear();
        }
        removed
    }

    pub fn clear_text(&mut self) {
        if self.is_ready() {
            self.text.clear_all();
        }
    }

    // ---- pointer routing ---------------------------------------------------

    /// Routes a pointer event to the layer owned by the active mode.
    /// Returns whether a layer consumed it.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        if !self.is_ready() {
            return false;
        }
        let size = self.dimensions();
        let bounds = match (event.bounds, size) {
            (Some(bounds), _) => bounds,
            (None, Some((w, h))) => DisplayRect::identity(w, h),
            (None, None) => return false,
        };
        // mid-layout events map to the origin sentinel; they must not draw there
        if bounds.is_degenerate() {
            return false;
        }
        let point = geometry::to_canonical(Point::new(event.x, event.y), &bounds, size);

        match self.mode {
            Mode::Adjust => false,
            Mode::Paint => self.paint_pointer(event.kind, point),
            Mode::Text => self.text_pointer(event.kind, point),
        }
    }

    fn paint_pointer(&mut self, kind: PointerKind, point: Point) -> bool {
        match kind {
            PointerKind::Down => {
                let brush = self.active_brush();
                self.paint.begin_stroke(point, brush);
            }
            PointerKind::Move => {
                if !self.paint.is_stroking() {
                    return false;
                }
                self.paint.extend_stroke(point);
            }
            PointerKind::Up | PointerKind::Leave => self.paint.end_stroke(),
        }
        true
    }

    fn text_pointer(&mut self, kind: PointerKind, point: Point) -> bool {
        match kind {
            PointerKind::Down => {
                if let Some(id) = self.text.hit_test(point) {
                    if self.text.begin_drag(id) {
                        self.mirror_selection();
                    }
                } else if !self.draft.content.is_empty() {
                    let content = std::mem::take(&mut self.draft.content);
                    self.text
                        .place(point, &content, self.draft.color(), self.draft.font_size());
                    self.text.deselect();
                } else {
                    self.text.deselect();
                }
                true
            }
            PointerKind::Move => match self.text.selected() {
                Some(id) if self.text.is_dragging() => self.text.update_position(id, point),
                _ => false,
            },
            PointerKind::Up | PointerKind::Leave => {
                self.text.end_drag();
                true
            }
        }
    }

    // ---- command dispatch --------------------------------------------------

    /// Applies one command. Returns `false` when it was ignored because its
    /// preconditions did not hold.
    pub fn dispatch(&mut self, command: Command) -> bool {
        match command {
            Command::SetMode { mode } => return self.set_mode(mode),
            Command::SetFilter { channel, value } => {
                self.set_filter(channel, value);
            }
            Command::ResetFilters => self.reset_filters(),
            Command::SetZoom { zoom } => {
                self.set_zoom(zoom);
            }
            Command::SetBrushColor { color } => self.brush.set_color(color),
            Command::SetBrushSize { size } => {
                self.brush.set_size(size);
            }
            Command::SetEraser { enabled } => self.brush.set_eraser(enabled),
            Command::ClearPaint => {
                if !self.is_ready() {
                    return false;
                }
                self.clear_paint();
            }
            Command::SetTextContent { content } => self.draft.content = content,
            Command::SetTextColor { color } => self.draft.set_color(color),
            Command::SetTextSize { size } => {
                self.draft.set_font_size(size);
            }
            Command::UpdateSelectedText => return self.update_selected_text(),
            Command::DeleteSelectedText => return self.delete_selected_text(),
            Command::ClearText => {
                if !self.is_ready() {
                    return false;
                }
                self.clear_text();
            }
            Command::Pointer(event) => return self.handle_pointer(event),
        }
        true
    }
}
