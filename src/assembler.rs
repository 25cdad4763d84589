// Copyright Catenary Transit Initiatives
// ===========================================================================
// Cable assembly
// ===========================================================================
//
// One full pass over a scene:
//
// 1. Ground elevation per tower (reference markers, terrain, stored value)
// 2. Orientation per tower from its line sequence
// 3. Pose and anchor placement per visible tower
// 4. Span topology
// 5. Lead/trail anchors and the catenary for every link, in parallel
//
// A bad record costs one tower, span or cable, never the pass; every drop is
// reported in `AssemblyOutput::skipped`.
// ===========================================================================

use crate::anchors::{AnchorRequest, AnchorRole, AnchorSource, TemplateSet, TowerPlacement, resolve_anchor, resolve_base_points};
use crate::bearing::orientation_map;
use crate::catenary;
use crate::context::ResolutionContext;
use crate::elevation::{resolve_elevation, snap_to_reference_markers};
use crate::errors::{GeometryError, GeometryResult};
use crate::models::{CablePathResult, ModelTransform, Point3D, Span, Tower};
use crate::overrides::{effective_transform, model_key};
use crate::pose::{TowerPose, compose_pose};
use crate::topology::{TopologyLink, build_topology};
use ahash::AHashMap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkippedKind {
    Tower,
    Span,
    Cable,
}

/// Element left out of the pass, with the reason.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub kind: SkippedKind,
    pub id: String,
    pub reason: String,
}

impl SkippedItem {
    fn new(kind: SkippedKind, id: impl Into<String>, error: &GeometryError) -> Self {
        Self {
            kind,
            id: id.into(),
            reason: error.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssemblyOutput {
    pub paths: Vec<CablePathResult>,
    /// Sorted by tower id.
    pub poses: Vec<TowerPose>,
    pub orientations: AHashMap<String, f64>,
    /// Foundation markers per tower id.
    pub base_points: AHashMap<String, Vec<(String, Point3D)>>,
    pub skipped: Vec<SkippedItem>,
}

struct PlacedTower<'a> {
    transform: ModelTransform,
    placement: TowerPlacement,
    templates: TemplateSet<'a>,
}

fn place_tower<'a>(
    tower: &Tower,
    heading: f64,
    ground: f64,
    ctx: &ResolutionContext<'a>,
) -> GeometryResult<(PlacedTower<'a>, TowerPose)> {
    let settings = ctx.settings;
    let transform = effective_transform(tower, settings);
    let key = model_key(tower, settings);
    let placement = TowerPlacement::new(tower, &transform, key, heading, ground, settings)?;
    let pose = compose_pose(tower, heading, ground, &transform, settings)?;
    Ok((
        PlacedTower {
            transform,
            placement,
            templates: ctx.templates_for(tower),
        },
        pose,
    ))
}

fn anchor_for(
    placed: &PlacedTower,
    link: &TopologyLink,
    tower: &Tower,
    role: AnchorRole,
) -> GeometryResult<Point3D> {
    let anchor = resolve_anchor(&AnchorRequest {
        tower,
        conductor: link.conductor,
        role,
        transform: &placed.transform,
        templates: placed.templates,
        placement: &placed.placement,
    })?;
    if let AnchorSource::Template { candidates, .. } = anchor.source {
        if candidates > 1 {
            debug!(
                tower = %tower.id,
                conductor = %link.conductor.id,
                candidates,
                template = ?anchor.template_name,
                "ambiguous anchor template, using the first match"
            );
        }
    }
    Ok(anchor.point)
}

fn assemble_link(
    link: &TopologyLink,
    placed: &AHashMap<&str, PlacedTower>,
    ctx: &ResolutionContext,
) -> Result<CablePathResult, SkippedItem> {
    let id = link.path_id();
    let fail = |error: GeometryError| SkippedItem::new(SkippedKind::Cable, id.clone(), &error);

    // Towers that failed placement were already reported.
    let (Some(start), Some(end)) = (placed.get(link.start.id.as_str()), placed.get(link.end.id.as_str())) else {
        let missing = if placed.contains_key(link.start.id.as_str()) { link.end } else { link.start };
        return Err(SkippedItem {
            kind: SkippedKind::Cable,
            id: id.clone(),
            reason: format!("tower '{}' could not be placed", missing.id),
        });
    };

    let a = anchor_for(start, link, link.start, AnchorRole::Lead).map_err(fail)?;
    let b = anchor_for(end, link, link.end, AnchorRole::Trail).map_err(fail)?;
    let constant = ctx.settings.tension_constant(link.tension_override());
    let points = catenary::generate(a, b, constant, ctx.settings.subdivisions).map_err(fail)?;

    Ok(CablePathResult {
        id,
        source: link.source,
        tower_start_id: link.start.id.clone(),
        tower_end_id: link.end.id.clone(),
        tower_start_name: link.start.name.clone(),
        tower_end_name: link.end.name.clone(),
        project_id: Some(link.project_id.clone()),
        conductor_id: link.conductor.id.clone(),
        color: link.conductor.color.clone(),
        width: link.conductor.width,
        path: points.iter().map(Point3D::to_array).collect(),
    })
}

/// Runs one resolution pass over a scene.
pub fn assemble(towers: &[Tower], spans: &[Span], ctx: &ResolutionContext) -> AssemblyOutput {
    let settings = ctx.settings;
    let mut output = AssemblyOutput::default();

    let stored = snap_to_reference_markers(
        towers,
        ctx.reference_markers,
        settings.topology.reference_snap_radius_m,
    );
    output.orientations = orientation_map(
        towers,
        settings.alignment_method,
        settings.isolate_parallel_suffixes,
    );

    let mut placed: AHashMap<&str, PlacedTower> = AHashMap::with_capacity(towers.len());
    for tower in towers.iter().filter(|t| !ctx.hidden.is_tower_hidden(t)) {
        let heading = output.orientations.get(&tower.id).copied().unwrap_or(0.0);
        let stored_elevation = stored.get(&tower.id).copied().flatten();
        let (ground, _) = resolve_elevation(tower, stored_elevation, ctx.terrain);

        match place_tower(tower, heading, ground, ctx) {
            Ok((tower_placed, pose)) => {
                let bases = resolve_base_points(&tower_placed.placement, tower_placed.templates);
                if !bases.is_empty() {
                    output.base_points.insert(tower.id.clone(), bases);
                }
                output.poses.push(pose);
                placed.insert(tower.id.as_str(), tower_placed);
            }
            Err(e) => {
                warn!("Skipping tower {}: {}", tower.id, e);
                output
                    .skipped
                    .push(SkippedItem::new(SkippedKind::Tower, tower.id.clone(), &e));
            }
        }
    }
    output.poses.sort_by(|a, b| a.tower_id.cmp(&b.tower_id));

    let topology = build_topology(
        towers,
        spans,
        &settings.conductors,
        ctx.hidden,
        &settings.topology,
    );
    output.skipped.extend(topology.issues.iter().map(|e| {
        let span_id = match e {
            GeometryError::MissingTowerReference { span_id, .. } => span_id.clone(),
            _ => String::new(),
        };
        SkippedItem::new(SkippedKind::Span, span_id, e)
    }));

    let results: Vec<Result<CablePathResult, SkippedItem>> = topology
        .links
        .par_iter()
        .map(|link| assemble_link(link, &placed, ctx))
        .collect();

    for result in results {
        match result {
            Ok(path) => output.paths.push(path),
            Err(skipped) => {
                warn!("Skipping cable {}: {}", skipped.id, skipped.reason);
                output.skipped.push(skipped);
            }
        }
    }

    info!(
        "Assembled {} cables across {} towers ({} skipped)",
        output.paths.len(),
        output.poses.len(),
        output.skipped.len()
    );
    output
}
