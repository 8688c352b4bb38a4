//! Applies diffs to a live board and its shadow model in lockstep.
//!
//! # Responsibility
//! - Create drawings for `added` descriptors and record host-assigned kiids.
//! - Apply `changed` properties to board objects, mirror them into the
//!   shadow model, then refresh the entry hash.
//! - Report unresolvable entries and unusable values without aborting.
//!
//! # Invariants
//! - Geometry updates dispatch on the board object's shape kind, which must
//!   match the shadow entry's `shape` tag.
//! - A property is written to the shadow entry only after the board accepted it.
//! - A failed add performs no board mutation and no shadow mutation.

use crate::board::{BoardDrawing, BoardFootprint, BoardHandle, NewShape, ShapeSpec};
use crate::config::ApplierConfig;
use crate::model::diff::{CategoryDiff, ChangedEntry, Diff};
use crate::model::geometry::{
    parse_arc_points, parse_length, parse_point, parse_points, Geometry, RectSides, ShapeKind,
    PROP_CENTER, PROP_END, PROP_POINTS, PROP_RADIUS, PROP_SHAPE, PROP_START,
};
use crate::model::kiid::Kiid;
use crate::model::shadow::{Category, ShadowEntry, ShadowModel};
use crate::service::report::{ApplyError, ApplyReport, LookupSide};
use log::{debug, info};
use serde_json::{Map, Value};
use std::time::Instant;

pub const PROP_REF: &str = "ref";
pub const PROP_POS: &str = "pos";
pub const PROP_ROT: &str = "rot";
pub const PROP_LAYER: &str = "layer";
pub const PROP_3D_MODELS: &str = "3d_models";

enum PropertyError {
    Invalid(String),
    Unimplemented(&'static str),
}

impl From<String> for PropertyError {
    fn from(value: String) -> Self {
        Self::Invalid(value)
    }
}

/// Diff application service over a borrowed board.
///
/// The board is exclusively borrowed for the applier's lifetime, so no other
/// caller can mutate it while a diff is being applied.
pub struct DiffApplier<'b, B: BoardHandle> {
    board: &'b mut B,
    config: ApplierConfig,
}

impl<'b, B: BoardHandle> DiffApplier<'b, B> {
    pub fn new(board: &'b mut B) -> Self {
        Self::with_config(board, ApplierConfig::default())
    }

    pub fn with_config(board: &'b mut B, config: ApplierConfig) -> Self {
        Self { board, config }
    }

    pub fn config(&self) -> &ApplierConfig {
        &self.config
    }

    /// Applies drawings, then footprints.
    pub fn apply(&mut self, shadow: &mut ShadowModel, diff: &Diff) -> ApplyReport {
        let started_at = Instant::now();
        info!(
            "event=diff_apply module=service status=start drawings_added={} drawings_changed={} footprints_changed={}",
            diff.drawings.added.len(),
            diff.drawings.changed.len(),
            diff.footprints.changed.len()
        );

        let mut report = self.apply_drawings(shadow, &diff.drawings);
        report.merge(self.apply_footprints(shadow, &diff.footprints));

        info!(
            "event=diff_apply module=service status={} duration_ms={} added={} updated={} errors={} gaps={}",
            if report.is_clean() { "ok" } else { "partial" },
            started_at.elapsed().as_millis(),
            report.added.len(),
            report.updated.len(),
            report.errors().count(),
            report.gaps().count()
        );
        report
    }

    /// Applies the drawing section of a diff.
    pub fn apply_drawings(
        &mut self,
        shadow: &mut ShadowModel,
        drawings: &CategoryDiff,
    ) -> ApplyReport {
        let mut report = self.add_drawings(shadow, &drawings.added);

        for change in &drawings.changed {
            self.update_drawing(shadow, change, &mut report);
        }

        for kiid in &drawings.removed {
            report.record(
                Category::Drawings,
                ApplyError::NotImplemented {
                    kiid: Some(kiid.clone()),
                    what: "removing drawings",
                },
            );
        }

        report
    }

    /// Applies the footprint section of a diff.
    pub fn apply_footprints(
        &mut self,
        shadow: &mut ShadowModel,
        footprints: &CategoryDiff,
    ) -> ApplyReport {
        let mut report = ApplyReport::new();

        for _ in &footprints.added {
            report.record(
                Category::Footprints,
                ApplyError::NotImplemented {
                    kiid: None,
                    what: "adding footprints",
                },
            );
        }

        for change in &footprints.changed {
            self.update_footprint(shadow, change, &mut report);
        }

        for kiid in &footprints.removed {
            report.record(
                Category::Footprints,
                ApplyError::NotImplemented {
                    kiid: Some(kiid.clone()),
                    what: "removing footprints",
                },
            );
        }

        report
    }

    /// Creates drawings and appends them to the shadow model under their new kiids.
    ///
    /// The kiid is only known once the host created the object. When the host
    /// hands back a kiid the shadow model already tracks, the entry is reported
    /// as a duplicate lookup and the shadow keeps its existing entry; the new
    /// board object stays, since object removal is not available here.
    pub fn add_drawings(
        &mut self,
        shadow: &mut ShadowModel,
        added: &[Map<String, Value>],
    ) -> ApplyReport {
        let mut report = ApplyReport::new();

        for descriptor in added {
            let kiid = match self.add_drawing(descriptor) {
                Ok(kiid) => kiid,
                Err(err) => {
                    report.record(Category::Drawings, err);
                    continue;
                }
            };

            if shadow.contains(Category::Drawings, &kiid) {
                report.record(
                    Category::Drawings,
                    ApplyError::Lookup {
                        kiid,
                        side: LookupSide::Duplicate,
                    },
                );
                continue;
            }

            shadow
                .drawings
                .push(ShadowEntry::new(kiid.clone(), descriptor.clone()));
            report.added.push(kiid);
        }

        report
    }

    /// Creates one drawing on the board and returns its host-assigned kiid.
    ///
    /// # Errors
    /// - `UnsupportedShape` when the descriptor's shape is unknown or its
    ///   geometry is malformed. The board is not touched in that case.
    pub fn add_drawing(&mut self, descriptor: &Map<String, Value>) -> Result<Kiid, ApplyError> {
        let geometry = Geometry::from_properties(descriptor)
            .map_err(|err| ApplyError::UnsupportedShape(err.to_string()))?;
        let spec = ShapeSpec::from_geometry(&geometry).ok_or_else(|| {
            ApplyError::UnsupportedShape(format!("{} drawing has no host encoding", geometry.kind()))
        })?;

        let kiid = self.board.add_shape(NewShape {
            layer: self.config.edge_layer,
            width: self.config.stroke_width,
            spec,
        });
        debug!(
            "event=drawing_add module=service status=ok kiid={} shape={}",
            kiid,
            geometry.kind()
        );
        Ok(kiid)
    }

    fn update_drawing(
        &mut self,
        shadow: &mut ShadowModel,
        change: &ChangedEntry,
        report: &mut ApplyReport,
    ) {
        let kiid = &change.id;
        let Some(entry) = shadow.find_mut(Category::Drawings, kiid) else {
            report.record(Category::Drawings, lookup_error(kiid, LookupSide::Shadow));
            return;
        };
        let Some(drawing) = self.board.find_drawing_by_id(kiid) else {
            report.record(Category::Drawings, lookup_error(kiid, LookupSide::Board));
            return;
        };

        let kind = drawing.shape_kind();
        if entry.shape_kind() != Some(kind) {
            report.record(
                Category::Drawings,
                ApplyError::ShapeMismatch {
                    kiid: kiid.clone(),
                    board: kind,
                    shadow: entry.shape_kind(),
                },
            );
            return;
        }

        let mut applied = 0;
        for (property, value) in &change.properties {
            match apply_drawing_property(drawing, kind, property, value) {
                Ok(()) => {
                    entry.set_property(property.clone(), value.clone());
                    applied += 1;
                }
                Err(reason) => report.record(
                    Category::Drawings,
                    ApplyError::InvalidValue {
                        kiid: kiid.clone(),
                        property: property.clone(),
                        reason,
                    },
                ),
            }
        }

        entry.refresh_hash();
        if applied > 0 {
            debug!(
                "event=drawing_update module=service status=ok kiid={} shape={} properties={}",
                kiid, kind, applied
            );
            report.updated.push(kiid.clone());
        }
    }

    fn update_footprint(
        &mut self,
        shadow: &mut ShadowModel,
        change: &ChangedEntry,
        report: &mut ApplyReport,
    ) {
        let kiid = &change.id;
        let Some(entry) = shadow.find_mut(Category::Footprints, kiid) else {
            report.record(Category::Footprints, lookup_error(kiid, LookupSide::Shadow));
            return;
        };
        let Some(footprint) = self.board.find_footprint_by_id(kiid) else {
            report.record(Category::Footprints, lookup_error(kiid, LookupSide::Board));
            return;
        };

        let mut applied = 0;
        for (property, value) in &change.properties {
            match apply_footprint_property(footprint, &self.config, property, value) {
                Ok(()) => {
                    entry.set_property(property.clone(), value.clone());
                    applied += 1;
                }
                Err(PropertyError::Invalid(reason)) => report.record(
                    Category::Footprints,
                    ApplyError::InvalidValue {
                        kiid: kiid.clone(),
                        property: property.clone(),
                        reason,
                    },
                ),
                Err(PropertyError::Unimplemented(what)) => report.record(
                    Category::Footprints,
                    ApplyError::NotImplemented {
                        kiid: Some(kiid.clone()),
                        what,
                    },
                ),
            }
        }

        entry.refresh_hash();
        if applied > 0 {
            debug!(
                "event=footprint_update module=service status=ok kiid={} properties={}",
                kiid, applied
            );
            report.updated.push(kiid.clone());
        }
    }
}

fn lookup_error(kiid: &Kiid, side: LookupSide) -> ApplyError {
    ApplyError::Lookup {
        kiid: kiid.clone(),
        side,
    }
}

/// Applies one geometry property. The value is fully parsed before the board is touched.
fn apply_drawing_property<D: BoardDrawing>(
    drawing: &mut D,
    kind: ShapeKind,
    property: &str,
    value: &Value,
) -> Result<(), String> {
    match (kind, property) {
        (ShapeKind::Line, PROP_START) => drawing.set_start(parse_point(value)?),
        (ShapeKind::Line, PROP_END) => drawing.set_end(parse_point(value)?),
        (ShapeKind::Rect, PROP_POINTS) => {
            let points = parse_points(value)?;
            let sides = RectSides::from_points(&points)
                .ok_or_else(|| "point list must not be empty".to_string())?;
            drawing.set_top(sides.top);
            drawing.set_bottom(sides.bottom);
            drawing.set_left(sides.left);
            drawing.set_right(sides.right);
        }
        (ShapeKind::Polygon, PROP_POINTS) => drawing.set_poly_points(parse_points(value)?),
        (ShapeKind::Arc, PROP_POINTS) => {
            let [start, mid, end] = parse_arc_points(value)?;
            drawing.set_arc_geometry(start, mid, end);
        }
        // `set_position` moves the circle; a center setter would also change the radius.
        (ShapeKind::Circle, PROP_CENTER) => {
            let center = parse_point(value)?;
            let current = drawing.center();
            center
                .x
                .checked_sub(current.x)
                .zip(center.y.checked_sub(current.y))
                .and_then(|(dx, dy)| drawing.end().offset(dx, dy))
                .ok_or_else(|| format!("moving to {value} leaves the board coordinate range"))?;
            drawing.set_position(center);
        }
        (ShapeKind::Circle, PROP_RADIUS) => {
            let new_radius = parse_length(value)?;
            if new_radius <= 0 {
                return Err(format!("radius must be positive, got {new_radius}"));
            }
            let end = drawing
                .radius()
                .checked_sub(new_radius)
                .and_then(i64::checked_neg)
                .and_then(|dy| drawing.end().offset(0, dy))
                .ok_or_else(|| {
                    format!("radius {new_radius} leaves the board coordinate range")
                })?;
            drawing.set_end(end);
        }
        (_, PROP_SHAPE) => {
            let requested = value.as_str().and_then(ShapeKind::parse);
            if requested != Some(kind) {
                return Err(format!("shape kind of a {kind} drawing cannot change"));
            }
        }
        (_, other) => return Err(format!("`{other}` does not apply to {kind} drawings")),
    }
    Ok(())
}

fn apply_footprint_property<F: BoardFootprint>(
    footprint: &mut F,
    config: &ApplierConfig,
    property: &str,
    value: &Value,
) -> Result<(), PropertyError> {
    match property {
        PROP_REF => {
            let reference = value
                .as_str()
                .ok_or_else(|| format!("expected reference text, got {value}"))?;
            footprint.set_reference(reference);
        }
        PROP_POS => footprint.set_position(parse_point(value)?),
        PROP_ROT => {
            let degrees = value
                .as_f64()
                .filter(|degrees| degrees.is_finite())
                .ok_or_else(|| format!("expected rotation in degrees, got {value}"))?;
            footprint.set_orientation_degrees(degrees);
        }
        PROP_LAYER => {
            let layer = value
                .as_str()
                .and_then(|side| config.layer_for_side(side))
                .ok_or_else(|| format!("invalid layer {value}, expected \"Top\" or \"Bot\""))?;
            footprint.set_layer(layer);
        }
        PROP_3D_MODELS => return Err(PropertyError::Unimplemented("updating 3d models")),
        other => return Err(format!("`{other}` is not an editable footprint property").into()),
    }
    Ok(())
}
