//! Vector-graphics overlay commands.
//!
//! A [`VgCommand`] is a tag plus a fixed number of `f32` parameters. The
//! free constructor functions ([`move_to`], [`rect`], …) are the intended way
//! to build commands; each one produces the arity the viewer expects for its
//! tag, so a stream built from them always decodes. [`VgCommand::new`] is the
//! checked escape hatch for callers that carry raw tags around.
//!
//! ## Wire format
//!
//! ```text
//! tag:     i8
//! params:  f32[arity(tag)]   (little-endian, absent for zero-arity tags)
//! ```

use std::fmt;

use crate::error::TevError;

// ── VgKind ───────────────────────────────────────────────────────

/// Drawing operation tag, in sync with the viewer's command enumeration.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VgKind {
    Save = 0,
    Restore = 1,
    FillColor = 2,
    Fill = 3,
    StrokeColor = 4,
    Stroke = 5,
    BeginPath = 6,
    ClosePath = 7,
    PathWinding = 8,
    DebugDumpPathCache = 9,
    MoveTo = 10,
    LineTo = 11,
    ArcTo = 12,
    Arc = 13,
    BezierTo = 14,
    Circle = 15,
    Ellipse = 16,
    QuadTo = 17,
    Rect = 18,
    RoundedRect = 19,
    RoundedRectVarying = 20,
}

impl VgKind {
    /// Every kind, in tag order.
    pub const ALL: [VgKind; 21] = [
        VgKind::Save,
        VgKind::Restore,
        VgKind::FillColor,
        VgKind::Fill,
        VgKind::StrokeColor,
        VgKind::Stroke,
        VgKind::BeginPath,
        VgKind::ClosePath,
        VgKind::PathWinding,
        VgKind::DebugDumpPathCache,
        VgKind::MoveTo,
        VgKind::LineTo,
        VgKind::ArcTo,
        VgKind::Arc,
        VgKind::BezierTo,
        VgKind::Circle,
        VgKind::Ellipse,
        VgKind::QuadTo,
        VgKind::Rect,
        VgKind::RoundedRect,
        VgKind::RoundedRectVarying,
    ];

    /// The wire tag.
    pub const fn tag(self) -> i8 {
        self as i8
    }

    /// Number of `f32` parameters that follow the tag.
    pub const fn arity(self) -> usize {
        match self {
            VgKind::Save
            | VgKind::Restore
            | VgKind::Fill
            | VgKind::Stroke
            | VgKind::BeginPath
            | VgKind::ClosePath
            | VgKind::DebugDumpPathCache => 0,
            VgKind::PathWinding => 1,
            VgKind::MoveTo | VgKind::LineTo => 2,
            VgKind::Circle => 3,
            VgKind::FillColor
            | VgKind::StrokeColor
            | VgKind::Ellipse
            | VgKind::QuadTo
            | VgKind::Rect => 4,
            VgKind::ArcTo | VgKind::RoundedRect => 5,
            VgKind::Arc | VgKind::BezierTo => 6,
            VgKind::RoundedRectVarying => 8,
        }
    }

    /// Human-readable name, used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            VgKind::Save => "Save",
            VgKind::Restore => "Restore",
            VgKind::FillColor => "FillColor",
            VgKind::Fill => "Fill",
            VgKind::StrokeColor => "StrokeColor",
            VgKind::Stroke => "Stroke",
            VgKind::BeginPath => "BeginPath",
            VgKind::ClosePath => "ClosePath",
            VgKind::PathWinding => "PathWinding",
            VgKind::DebugDumpPathCache => "DebugDumpPathCache",
            VgKind::MoveTo => "MoveTo",
            VgKind::LineTo => "LineTo",
            VgKind::ArcTo => "ArcTo",
            VgKind::Arc => "Arc",
            VgKind::BezierTo => "BezierTo",
            VgKind::Circle => "Circle",
            VgKind::Ellipse => "Ellipse",
            VgKind::QuadTo => "QuadTo",
            VgKind::Rect => "Rect",
            VgKind::RoundedRect => "RoundedRect",
            VgKind::RoundedRectVarying => "RoundedRectVarying",
        }
    }
}

impl TryFrom<i8> for VgKind {
    type Error = TevError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|idx| VgKind::ALL.get(idx).copied())
            .ok_or(TevError::UnknownVariant {
                type_name: "VgKind",
                value: value as i64,
            })
    }
}

impl fmt::Display for VgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Winding ──────────────────────────────────────────────────────

/// Path winding direction for [`path_winding`] and [`arc`].
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    CounterClockwise = 1,
    Clockwise = 2,
}

impl Winding {
    fn as_param(self) -> f32 {
        self as i32 as f32
    }
}

// ── VgCommand ────────────────────────────────────────────────────

/// One drawing instruction of an overlay stream.
#[derive(Debug, Clone, PartialEq)]
pub struct VgCommand {
    kind: VgKind,
    params: Vec<f32>,
}

impl VgCommand {
    /// Build a command from a raw kind and parameter list.
    ///
    /// Fails with [`TevError::ArityMismatch`] if `params` does not have
    /// exactly [`VgKind::arity`] entries.
    pub fn new(kind: VgKind, params: Vec<f32>) -> Result<Self, TevError> {
        if params.len() != kind.arity() {
            return Err(TevError::ArityMismatch {
                kind: kind.name(),
                expected: kind.arity(),
                actual: params.len(),
            });
        }
        Ok(Self { kind, params })
    }

    fn from_parts<const N: usize>(kind: VgKind, params: [f32; N]) -> Self {
        debug_assert_eq!(N, kind.arity());
        Self {
            kind,
            params: params.to_vec(),
        }
    }

    pub fn kind(&self) -> VgKind {
        self.kind
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Serialized size in bytes: one tag byte plus the parameters.
    pub fn encoded_len(&self) -> usize {
        1 + self.params.len() * std::mem::size_of::<f32>()
    }
}

// ── Constructors ─────────────────────────────────────────────────

pub fn save() -> VgCommand {
    VgCommand::from_parts(VgKind::Save, [])
}

pub fn restore() -> VgCommand {
    VgCommand::from_parts(VgKind::Restore, [])
}

pub fn fill_color(r: f32, g: f32, b: f32, a: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::FillColor, [r, g, b, a])
}

pub fn fill() -> VgCommand {
    VgCommand::from_parts(VgKind::Fill, [])
}

pub fn stroke_color(r: f32, g: f32, b: f32, a: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::StrokeColor, [r, g, b, a])
}

pub fn stroke() -> VgCommand {
    VgCommand::from_parts(VgKind::Stroke, [])
}

pub fn begin_path() -> VgCommand {
    VgCommand::from_parts(VgKind::BeginPath, [])
}

pub fn close_path() -> VgCommand {
    VgCommand::from_parts(VgKind::ClosePath, [])
}

/// Winding of the sub-path that is currently being built.
pub fn path_winding(winding: Winding) -> VgCommand {
    VgCommand::from_parts(VgKind::PathWinding, [winding.as_param()])
}

/// Asks the viewer to log its path cache. Debugging aid only.
pub fn debug_dump_path_cache() -> VgCommand {
    VgCommand::from_parts(VgKind::DebugDumpPathCache, [])
}

pub fn move_to(x: f32, y: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::MoveTo, [x, y])
}

pub fn line_to(x: f32, y: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::LineTo, [x, y])
}

/// Arc between the tangents `(current, p1)` and `(p1, p2)`.
pub fn arc_to(x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::ArcTo, [x1, y1, x2, y2, radius])
}

/// Circular arc around `(cx, cy)`; angles are in radians.
pub fn arc(
    cx: f32,
    cy: f32,
    radius: f32,
    angle_begin: f32,
    angle_end: f32,
    winding: Winding,
) -> VgCommand {
    VgCommand::from_parts(
        VgKind::Arc,
        [cx, cy, radius, angle_begin, angle_end, winding.as_param()],
    )
}

/// Cubic bezier with control points `c1`, `c2` ending at `(x, y)`.
pub fn bezier_to(c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::BezierTo, [c1x, c1y, c2x, c2y, x, y])
}

pub fn circle(cx: f32, cy: f32, radius: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::Circle, [cx, cy, radius])
}

pub fn ellipse(cx: f32, cy: f32, rx: f32, ry: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::Ellipse, [cx, cy, rx, ry])
}

/// Quadratic bezier with control point `(cx, cy)` ending at `(x, y)`.
pub fn quad_to(cx: f32, cy: f32, x: f32, y: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::QuadTo, [cx, cy, x, y])
}

pub fn rect(x: f32, y: f32, width: f32, height: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::Rect, [x, y, width, height])
}

pub fn rounded_rect(x: f32, y: f32, width: f32, height: f32, radius: f32) -> VgCommand {
    VgCommand::from_parts(VgKind::RoundedRect, [x, y, width, height, radius])
}

/// Rectangle with one radius per corner, clockwise from the top left.
#[allow(clippy::too_many_arguments)]
pub fn rounded_rect_varying(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    radius_top_left: f32,
    radius_top_right: f32,
    radius_bottom_right: f32,
    radius_bottom_left: f32,
) -> VgCommand {
    VgCommand::from_parts(
        VgKind::RoundedRectVarying,
        [
            x,
            y,
            width,
            height,
            radius_top_left,
            radius_top_right,
            radius_bottom_right,
            radius_bottom_left,
        ],
    )
}

// ── Tests ────────────────────────────────────────────────────────
